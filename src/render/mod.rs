pub mod media;
pub mod watermark;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to build watermark overlay: {0}")]
    Overlay(String),
    #[error("failed to encode image: {0}")]
    Encode(String),
}
