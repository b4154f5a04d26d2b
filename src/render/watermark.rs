//! Preview watermark: diagonal hatch lines over the whole image plus a rotated
//! circular stamp in the middle.
//!
//! The overlay is described as SVG, rasterized with `resvg` into a pixmap the
//! size of the source image and alpha-composited on top of it.

use std::fmt::Write as _;
use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};
use once_cell::sync::Lazy;
use resvg::{tiny_skia, usvg};

use super::RenderError;
use crate::consts::{
    WATERMARK_HATCH_ALPHA, WATERMARK_HATCH_COLOR, WATERMARK_HATCH_SPACING,
    WATERMARK_HATCH_WIDTH, WATERMARK_ROTATION_DEG, WATERMARK_STAMP_ALPHA, WATERMARK_STAMP_COLOR,
};

static FONT_DB: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
});

/// Center and radius of the stamp for an image of the given size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampGeometry {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub rotation_deg: f32,
}

impl StampGeometry {
    pub fn for_size(width: u32, height: u32) -> Self {
        Self {
            cx: width as f32 / 2.0,
            cy: height as f32 / 2.0,
            radius: width.min(height) as f32 / 4.0,
            rotation_deg: WATERMARK_ROTATION_DEG,
        }
    }
}

fn escape_xml(text: &str) -> String {
    text.chars()
        .fold(String::with_capacity(text.len()), |mut out, c| {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&apos;"),
                _ => out.push(c),
            }
            out
        })
}

pub fn overlay_svg(width: u32, height: u32, text: &str) -> String {
    let (w, h) = (width as f32, height as f32);
    let geo = StampGeometry::for_size(width, height);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );

    let _ = write!(
        svg,
        r#"<g stroke="{WATERMARK_HATCH_COLOR}" stroke-opacity="{WATERMARK_HATCH_ALPHA}" stroke-width="{WATERMARK_HATCH_WIDTH}">"#
    );
    // 45 degree lines, starting left of the image so the lower-left corner is covered
    let mut offset = -h;
    while offset < w {
        let _ = write!(
            svg,
            r#"<line x1="{offset}" y1="{h}" x2="{}" y2="0"/>"#,
            offset + h
        );
        offset += WATERMARK_HATCH_SPACING;
    }
    svg.push_str("</g>");

    let r = geo.radius;
    let _ = write!(
        svg,
        r#"<g transform="rotate({rot} {cx} {cy})" opacity="{WATERMARK_STAMP_ALPHA}" fill="none" stroke="{WATERMARK_STAMP_COLOR}">"#,
        rot = geo.rotation_deg,
        cx = geo.cx,
        cy = geo.cy,
    );
    let _ = write!(
        svg,
        r#"<circle cx="{}" cy="{}" r="{r}" stroke-width="{}"/>"#,
        geo.cx,
        geo.cy,
        (r * 0.06).max(1.0)
    );
    let _ = write!(
        svg,
        r#"<circle cx="{}" cy="{}" r="{}" stroke-width="{}"/>"#,
        geo.cx,
        geo.cy,
        r * 0.82,
        (r * 0.02).max(0.5)
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-family="sans-serif" font-weight="bold" font-size="{}" text-anchor="middle" dominant-baseline="central" fill="{WATERMARK_STAMP_COLOR}" stroke="none">{}</text>"#,
        geo.cx,
        geo.cy,
        (r * 0.28).max(1.0),
        escape_xml(text)
    );
    svg.push_str("</g></svg>");

    svg
}

fn rasterize_overlay(width: u32, height: u32, text: &str) -> Result<tiny_skia::Pixmap, RenderError> {
    let opts = usvg::Options {
        fontdb: FONT_DB.clone(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(&overlay_svg(width, height, text), &opts)
        .map_err(|e| RenderError::Overlay(e.to_string()))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Overlay(format!("invalid overlay size {width}x{height}")))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    Ok(pixmap)
}

/// Source-over blend of a premultiplied overlay onto a straight-alpha image of the same size
fn composite(base: &mut RgbaImage, overlay: &tiny_skia::Pixmap) {
    for (dst, src) in base.pixels_mut().zip(overlay.pixels()) {
        if src.alpha() == 0 {
            continue;
        }
        let sa = src.alpha() as f32 / 255.0;
        let da = dst.0[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);

        // src channels are already multiplied by sa
        let blend = |s: u8, d: u8| {
            let premul = s as f32 / 255.0 + (d as f32 / 255.0) * da * (1.0 - sa);
            ((premul / out_a) * 255.0).round().clamp(0.0, 255.0) as u8
        };
        dst.0 = [
            blend(src.red(), dst.0[0]),
            blend(src.green(), dst.0[1]),
            blend(src.blue(), dst.0[2]),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        ];
    }
}

/// Decodes `bytes`, stamps the watermark and re-encodes as PNG
pub fn stamp(bytes: &[u8], text: &str) -> Result<Vec<u8>, RenderError> {
    let mut base = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = base.dimensions();

    let overlay = rasterize_overlay(width, height, text)?;
    composite(&mut base, &overlay);

    let mut out = Cursor::new(Vec::new());
    base.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    tracing::debug!("Watermarked {width}x{height} image");

    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_geometry() {
        let geo = StampGeometry::for_size(800, 600);
        assert_eq!(geo.radius, 150.0);
        assert_eq!((geo.cx, geo.cy), (400.0, 300.0));
        assert_eq!(geo.rotation_deg, -15.0);
    }

    #[test]
    fn test_stamp_keeps_dimensions() {
        let out = stamp(&png(64, 48), "AI PREVIEW").unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_stamp_is_deterministic() {
        let input = png(80, 80);
        let first = stamp(&input, "AI PREVIEW").unwrap();
        let second = stamp(&input, "AI PREVIEW").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stamp_changes_pixels() {
        let input = png(80, 80);
        let out = stamp(&input, "AI PREVIEW").unwrap();
        let before = image::load_from_memory(&input).unwrap().to_rgba8();
        let after = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_ne!(before.as_raw(), after.as_raw());
    }

    #[test]
    fn test_overlay_escapes_text() {
        let svg = overlay_svg(100, 100, "<b>&");
        assert!(svg.contains("&lt;b&gt;&amp;"));
        assert!(svg.contains(r#"rotate(-15 50 50)"#));
        assert!(svg.contains(r#"r="25""#));
    }

    fn overlay_pixel(r: u8, g: u8, b: u8, a: u8) -> tiny_skia::Pixmap {
        let mut pixmap = tiny_skia::Pixmap::new(1, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        pixmap
    }

    fn close(actual: [u8; 4], expected: [u8; 4]) -> bool {
        actual
            .iter()
            .zip(expected.iter())
            .all(|(a, e)| (*a as i16 - *e as i16).abs() <= 2)
    }

    #[test]
    fn test_composite_over_transparent_keeps_overlay_color() {
        let mut base = RgbaImage::new(1, 1);
        composite(&mut base, &overlay_pixel(225, 29, 72, 128));
        let px = base.get_pixel(0, 0).0;
        assert!(close(px, [225, 29, 72, 128]), "got {px:?}");
    }

    #[test]
    fn test_composite_over_opaque_and_half_transparent() {
        let mut base = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        composite(&mut base, &overlay_pixel(255, 255, 255, 128));
        let px = base.get_pixel(0, 0).0;
        assert!(close(px, [128, 128, 128, 255]), "got {px:?}");

        // half-transparent red under half-transparent white
        let mut base = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 128]));
        composite(&mut base, &overlay_pixel(255, 255, 255, 128));
        let px = base.get_pixel(0, 0).0;
        // out_a = 0.5 + 0.25 = 0.75; green = 0.5 / 0.75
        assert!(close(px, [255, 170, 170, 191]), "got {px:?}");
    }

    #[test]
    fn test_stamp_rejects_garbage() {
        assert!(matches!(
            stamp(b"not an image", "X"),
            Err(RenderError::Decode(_))
        ));
    }
}
