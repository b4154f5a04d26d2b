use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => "bin",
    }
}

/// Stable download name derived from the content hash, e.g. `remix-1a2b3c4d.png`
pub fn download_name(mime_type: &str, bytes: &[u8]) -> String {
    let hash = hex::encode(Sha256::digest(bytes));
    format!("remix-{}.{}", &hash[..8], extension_for(mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_download_name() {
        let name = download_name("video/mp4", b"video-bytes");
        assert!(name.starts_with("remix-"));
        assert!(name.ends_with(".mp4"));
        assert_eq!(name.len(), "remix-".len() + 8 + ".mp4".len());
        assert_eq!(name, download_name("video/mp4", b"video-bytes"));
        assert_eq!(extension_for("application/pdf"), "bin");
    }
}
