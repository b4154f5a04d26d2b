use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::prompt::{build_prompt, build_video_prompt};
use super::state::{GeneratedResult, StudioEvent, StudioSnapshot, StudioState};
use super::status::{cycle_video_status, video_status};
use super::upload::encode_upload;
use crate::config::AppConfig;
use crate::consts::IMAGE_STATUS_MESSAGE;
use crate::error::StudioError;
use crate::gemini::{wait_for_video, GenerationError, GenerativeBackend, PollSettings};
use crate::render::media::download_name;
use crate::render::watermark;
use crate::types::{Destination, EditContext, ImageInput, MediaKind};

#[derive(Debug, Clone)]
pub struct StudioSettings {
    pub poll: PollSettings,
    pub status_interval: Duration,
    /// Text of the preview stamp; `None` leaves image results untouched
    pub watermark_text: Option<String>,
}

impl StudioSettings {
    pub fn from_config(conf: &AppConfig) -> Self {
        Self {
            poll: PollSettings {
                interval: conf.poll_interval(),
                max_wait: conf.max_video_wait(),
            },
            status_interval: conf.status_interval(),
            watermark_text: conf.watermark.then(|| conf.watermark_text.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormUpdate {
    pub context: Option<EditContext>,
    pub destination: Option<Destination>,
    pub prompt: Option<String>,
}

#[derive(Default)]
struct Inner {
    state: StudioState,
    in_flight: Option<CancellationToken>,
}

impl Inner {
    fn apply(&mut self, event: StudioEvent) {
        self.state = std::mem::take(&mut self.state).apply(event);
    }

    fn abort_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

/// A downloadable media payload
pub struct MediaFile {
    pub mime_type: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Owns the studio state and runs one generation action at a time
pub struct StudioController {
    inner: Mutex<Inner>,
    backend: Arc<dyn GenerativeBackend>,
    settings: StudioSettings,
}

impl StudioController {
    pub fn new(backend: Arc<dyn GenerativeBackend>, settings: StudioSettings) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner::default()),
            backend,
            settings,
        })
    }

    pub async fn snapshot(&self) -> StudioSnapshot {
        self.inner.lock().await.state.snapshot()
    }

    /// Replaces the selected photo; aborts whatever was running for the previous one
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn select_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        declared_mime: Option<&str>,
    ) -> Result<StudioSnapshot, StudioError> {
        let encoded = encode_upload(file_name, bytes, declared_mime);

        let mut inner = self.inner.lock().await;
        inner.abort_in_flight();
        match encoded {
            Ok(upload) => {
                inner.apply(StudioEvent::FileSelected(upload));
                Ok(inner.state.snapshot())
            }
            Err(e) => Err(Self::reject_locked(&mut inner, file_name, e)),
        }
    }

    /// Surfaces a file that could not be read at all and clears the previous selection
    pub async fn reject_file(&self, file_name: &str, err: StudioError) -> StudioError {
        let mut inner = self.inner.lock().await;
        inner.abort_in_flight();
        Self::reject_locked(&mut inner, file_name, err)
    }

    fn reject_locked(inner: &mut Inner, file_name: &str, err: StudioError) -> StudioError {
        warn!("Rejected upload {file_name}: {err}");
        inner.apply(StudioEvent::FileRejected {
            message: err.user_message(),
        });
        err
    }

    pub async fn update_form(&self, update: FormUpdate) -> StudioSnapshot {
        let mut inner = self.inner.lock().await;
        inner.apply(StudioEvent::FormChanged {
            context: update.context,
            destination: update.destination,
            prompt: update.prompt,
        });
        inner.state.snapshot()
    }

    pub async fn cancel(&self) -> StudioSnapshot {
        let mut inner = self.inner.lock().await;
        if inner.in_flight.is_some() {
            info!("Cancelling in-flight generation");
        }
        inner.abort_in_flight();
        inner.apply(StudioEvent::ActionCancelled);
        inner.state.snapshot()
    }

    pub async fn preview(&self) -> Option<MediaFile> {
        let inner = self.inner.lock().await;
        inner.state.upload.as_ref().map(|u| MediaFile {
            mime_type: u.file.mime_type.clone(),
            file_name: u.file.file_name.clone(),
            bytes: u.file.bytes.clone(),
        })
    }

    pub async fn result(&self) -> Result<MediaFile, StudioError> {
        let inner = self.inner.lock().await;
        let result = inner.state.result.as_ref().ok_or(StudioError::NoResult)?;
        Ok(MediaFile {
            mime_type: result.mime_type().to_string(),
            file_name: download_name(result.mime_type(), result.bytes()),
            bytes: result.bytes().to_vec(),
        })
    }

    /// Validates the form, marks the studio busy and hands out the action's inputs
    async fn begin(
        &self,
        kind: MediaKind,
    ) -> Result<(u64, ImageInput, String, CancellationToken, StudioSnapshot), StudioError> {
        let mut inner = self.inner.lock().await;
        let state = &inner.state;

        if state.is_busy() {
            return Err(StudioError::Busy);
        }
        let Some(upload) = state.upload.as_ref() else {
            return Err(StudioError::MissingFile);
        };
        if !state.can_submit(kind) {
            return Err(StudioError::MissingPrompt);
        }

        let payload = upload.payload.clone();
        let (prompt, status) = match kind {
            MediaKind::Image => (
                build_prompt(state.context, state.destination, &state.prompt),
                IMAGE_STATUS_MESSAGE.to_string(),
            ),
            MediaKind::Video => (
                build_video_prompt(&state.prompt),
                video_status(0).to_string(),
            ),
        };

        inner.apply(StudioEvent::ActionStarted { kind, status });
        let token = CancellationToken::new();
        inner.in_flight = Some(token.clone());

        Ok((
            inner.state.action_id,
            payload,
            prompt,
            token,
            inner.state.snapshot(),
        ))
    }

    /// Records the outcome of an action; the studio is re-submittable afterwards
    async fn finish(&self, action_id: u64, outcome: Result<GeneratedResult, StudioError>) {
        let mut inner = self.inner.lock().await;
        if inner.state.action_id != action_id {
            info!("Discarding outcome of superseded action {action_id}");
            return;
        }
        inner.in_flight = None;

        match outcome {
            Ok(result) => {
                info!("Action {action_id} produced {} result", result.kind());
                inner.apply(StudioEvent::ActionSucceeded { action_id, result });
            }
            Err(StudioError::Generation(GenerationError::Cancelled)) => {
                inner.apply(StudioEvent::ActionCancelled);
            }
            Err(e) => {
                error!("Action {action_id} failed: {e}");
                inner.apply(StudioEvent::ActionFailed {
                    action_id,
                    message: e.user_message(),
                });
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn generate_image(self: &Arc<Self>) -> Result<StudioSnapshot, StudioError> {
        let (action_id, payload, prompt, token, snapshot) = self.begin(MediaKind::Image).await?;

        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.run_image(&payload, &prompt, &token).await;
            this.finish(action_id, outcome).await;
        });

        Ok(snapshot)
    }

    async fn run_image(
        &self,
        payload: &ImageInput,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<GeneratedResult, StudioError> {
        let image = tokio::select! {
            _ = cancel.cancelled() => return Err(GenerationError::Cancelled.into()),
            image = self.backend.edit_image(payload, prompt) => image?,
        };

        let Some(text) = self.settings.watermark_text.clone() else {
            return Ok(GeneratedResult::image(image.mime_type, image.bytes));
        };

        let stamped = tokio::task::spawn_blocking(move || watermark::stamp(&image.bytes, &text))
            .await
            .map_err(|e| {
                StudioError::Render(crate::render::RenderError::Encode(e.to_string()))
            })??;

        Ok(GeneratedResult::image("image/png".to_string(), stamped))
    }

    #[instrument(skip(self))]
    pub async fn generate_video(self: &Arc<Self>) -> Result<StudioSnapshot, StudioError> {
        let (action_id, payload, prompt, token, snapshot) = self.begin(MediaKind::Video).await?;

        let cycler_token = token.child_token();
        {
            let this = self.clone();
            tokio::spawn(cycle_video_status(
                self.settings.status_interval,
                cycler_token.clone(),
                move |status| {
                    let this = this.clone();
                    async move {
                        this.inner.lock().await.apply(StudioEvent::StatusAdvanced {
                            action_id,
                            status: status.to_string(),
                        });
                    }
                },
            ));
        }

        let this = self.clone();
        tokio::spawn(async move {
            let _stop_cycler = cycler_token.drop_guard();
            let outcome = this.run_video(&payload, &prompt, &token).await;
            this.finish(action_id, outcome).await;
        });

        Ok(snapshot)
    }

    async fn run_video(
        &self,
        payload: &ImageInput,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<GeneratedResult, StudioError> {
        let handle = tokio::select! {
            _ = cancel.cancelled() => return Err(GenerationError::Cancelled.into()),
            handle = self.backend.start_video(payload, prompt) => handle?,
        };

        let uri = wait_for_video(self.backend.as_ref(), &handle, self.settings.poll, cancel).await?;

        let video = tokio::select! {
            _ = cancel.cancelled() => return Err(GenerationError::Cancelled.into()),
            video = self.backend.download_video(&uri) => video?,
        };

        Ok(GeneratedResult::Video {
            mime_type: video.mime_type,
            bytes: video.bytes,
        })
    }
}
