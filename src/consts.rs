use std::time::Duration;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const IMAGE_EDIT_MODEL: &str = "gemini-2.5-flash-image-preview";

pub const VIDEO_GEN_MODEL: &str = "veo-2.0-generate-001";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Delay before each operation status request while a video is being generated
pub const VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How often the cosmetic video status line advances
pub const STATUS_CYCLE_INTERVAL: Duration = Duration::from_secs(4);

pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024; // 20MB

pub const IMAGE_STATUS_MESSAGE: &str = "Editing your photo...";

pub const VIDEO_STATUS_MESSAGES: &[&str] = &[
    "Warming up the animation studio...",
    "Sketching the first frames...",
    "Bringing your photo to life...",
    "Adding motion and lighting...",
    "Rendering the final cut...",
    "Almost there, polishing details...",
];

pub const NO_IMAGE_RETURNED_MESSAGE: &str =
    "The model did not return an image. Try a different photo or rephrase your prompt.";

pub const NO_VIDEO_RETURNED_MESSAGE: &str =
    "Video generation finished but no video was returned. Try again with a different photo or prompt.";

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong while generating. Please try again.";

// Watermark geometry and colors
pub const WATERMARK_TEXT: &str = "AI PREVIEW";
pub const WATERMARK_ROTATION_DEG: f32 = -15.0;
pub const WATERMARK_HATCH_SPACING: f32 = 40.0;
pub const WATERMARK_HATCH_WIDTH: f32 = 2.0;
pub const WATERMARK_HATCH_COLOR: &str = "#ffffff";
pub const WATERMARK_HATCH_ALPHA: f32 = 0.12;
pub const WATERMARK_STAMP_COLOR: &str = "#e11d48";
pub const WATERMARK_STAMP_ALPHA: f32 = 0.55;
