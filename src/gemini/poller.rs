use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{GenerationError, GenerativeBackend, OperationHandle};
use crate::consts::VIDEO_POLL_INTERVAL;

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the operation reports completion
    pub max_wait: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: VIDEO_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

/// Polls a video operation until it is done and returns the URI of the first video
pub async fn wait_for_video(
    backend: &dyn GenerativeBackend,
    handle: &OperationHandle,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<String, GenerationError> {
    let started = Instant::now();
    let mut attempt: u64 = 0;

    info!("Starting to poll operation {}", handle.0);

    loop {
        if let Some(max_wait) = settings.max_wait {
            if started.elapsed() >= max_wait {
                return Err(GenerationError::TimedOut(max_wait.as_secs()));
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
            _ = tokio::time::sleep(settings.interval) => {}
        }

        attempt += 1;
        let status = tokio::select! {
            _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
            status = backend.get_operation(handle) => status?,
        };

        if status.done {
            if let Some(error) = status.error {
                return Err(GenerationError::ProviderError(error));
            }

            return status
                .video_uris
                .into_iter()
                .next()
                .ok_or(GenerationError::NoVideoReturned);
        }

        // log progress every 6 attempts
        if attempt % 6 == 0 {
            info!(
                "Video generation still in progress... ({} seconds elapsed)",
                started.elapsed().as_secs()
            );
        }
    }
}
