use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::consts::VIDEO_STATUS_MESSAGES;

/// Status line shown after `tick` timer periods, wrapping around the fixed list
pub fn video_status(tick: usize) -> &'static str {
    VIDEO_STATUS_MESSAGES[tick % VIDEO_STATUS_MESSAGES.len()]
}

/// Calls `on_status` with the next message every `interval` until `cancel` fires.
///
/// Purely cosmetic; it has no relation to how far the remote job actually is.
pub async fn cycle_video_status<F, Fut>(
    interval: Duration,
    cancel: CancellationToken,
    mut on_status: F,
) where
    F: FnMut(&'static str) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut tick = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
        tick += 1;
        on_status(video_status(tick)).await;
    }
}
