pub mod client;
pub mod poller;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

use crate::consts::{NO_IMAGE_RETURNED_MESSAGE, NO_VIDEO_RETURNED_MESSAGE};
use crate::types::ImageInput;

pub use client::GeminiClient;
pub use poller::{wait_for_video, PollSettings};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("provider error: {0}")]
    ProviderError(String),
    #[error("{}", NO_IMAGE_RETURNED_MESSAGE)]
    NoImageReturned,
    #[error("{}", NO_VIDEO_RETURNED_MESSAGE)]
    NoVideoReturned,
    #[error("video generation did not finish within {0} seconds")]
    TimedOut(u64),
    #[error("generation was cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Completed calls that carried nothing usable, as opposed to failed calls
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            GenerationError::NoImageReturned | GenerationError::NoVideoReturned
        )
    }
}

/// Opaque name of a long running remote job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStatus {
    pub done: bool,
    pub error: Option<String>,
    pub video_uris: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Remote generative media service
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn edit_image(
        &self,
        image: &ImageInput,
        prompt: &str,
    ) -> Result<GeneratedImage, GenerationError>;

    async fn start_video(
        &self,
        image: &ImageInput,
        prompt: &str,
    ) -> Result<OperationHandle, GenerationError>;

    async fn get_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, GenerationError>;

    async fn download_video(&self, uri: &str) -> Result<GeneratedVideo, GenerationError>;
}
