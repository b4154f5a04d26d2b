use serde::Serialize;
use utoipa::ToSchema;

use super::upload::Upload;
use crate::render::media::{data_uri, download_name};
use crate::types::{Destination, EditContext, MediaKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Activity {
    #[default]
    Idle,
    Busy { kind: MediaKind, status: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedResult {
    Image {
        mime_type: String,
        bytes: Vec<u8>,
        data_uri: String,
    },
    Video {
        mime_type: String,
        bytes: Vec<u8>,
    },
}

impl GeneratedResult {
    pub fn image(mime_type: String, bytes: Vec<u8>) -> Self {
        let data_uri = data_uri(&mime_type, &bytes);
        GeneratedResult::Image {
            mime_type,
            bytes,
            data_uri,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            GeneratedResult::Image { .. } => MediaKind::Image,
            GeneratedResult::Video { .. } => MediaKind::Video,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            GeneratedResult::Image { mime_type, .. } | GeneratedResult::Video { mime_type, .. } => {
                mime_type
            }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            GeneratedResult::Image { bytes, .. } | GeneratedResult::Video { bytes, .. } => bytes,
        }
    }
}

/// Everything the user can change or observe
#[derive(Debug, Clone, Default)]
pub struct StudioState {
    pub upload: Option<Upload>,
    pub context: EditContext,
    pub destination: Destination,
    pub prompt: String,
    pub activity: Activity,
    pub result: Option<GeneratedResult>,
    /// Bumped whenever the in-flight action is started or abandoned
    pub action_id: u64,
}

#[derive(Debug, Clone)]
pub enum StudioEvent {
    FileSelected(Upload),
    FileRejected { message: String },
    FormChanged {
        context: Option<EditContext>,
        destination: Option<Destination>,
        prompt: Option<String>,
    },
    ActionStarted { kind: MediaKind, status: String },
    StatusAdvanced { action_id: u64, status: String },
    ActionSucceeded { action_id: u64, result: GeneratedResult },
    ActionFailed { action_id: u64, message: String },
    ActionCancelled,
}

impl StudioState {
    pub fn is_busy(&self) -> bool {
        matches!(self.activity, Activity::Busy { .. })
    }

    /// Whether the trigger for `kind` is enabled
    pub fn can_submit(&self, kind: MediaKind) -> bool {
        if self.upload.is_none() || self.is_busy() {
            return false;
        }
        match kind {
            MediaKind::Image => !self.context.requires_text() || !self.prompt.trim().is_empty(),
            MediaKind::Video => true,
        }
    }

    /// Applies one event and returns the next state
    pub fn apply(mut self, event: StudioEvent) -> Self {
        match event {
            StudioEvent::FileSelected(upload) => {
                self.upload = Some(upload);
                self.result = None;
                self.activity = Activity::Idle;
                self.action_id += 1;
            }
            StudioEvent::FileRejected { message } => {
                self.upload = None;
                self.result = None;
                self.activity = Activity::Failed { message };
                self.action_id += 1;
            }
            StudioEvent::FormChanged {
                context,
                destination,
                prompt,
            } => {
                if let Some(context) = context {
                    self.context = context;
                }
                if let Some(destination) = destination {
                    self.destination = destination;
                }
                if let Some(prompt) = prompt {
                    self.prompt = prompt;
                }
            }
            StudioEvent::ActionStarted { kind, status } => {
                self.result = None;
                self.activity = Activity::Busy { kind, status };
                self.action_id += 1;
            }
            StudioEvent::StatusAdvanced { action_id, status } => {
                if action_id == self.action_id {
                    if let Activity::Busy { status: current, .. } = &mut self.activity {
                        *current = status;
                    }
                }
            }
            StudioEvent::ActionSucceeded { action_id, result } => {
                if action_id == self.action_id && self.is_busy() {
                    self.result = Some(result);
                    self.activity = Activity::Idle;
                }
            }
            StudioEvent::ActionFailed { action_id, message } => {
                if action_id == self.action_id && self.is_busy() {
                    self.activity = Activity::Failed { message };
                }
            }
            StudioEvent::ActionCancelled => {
                if self.is_busy() {
                    self.activity = Activity::Idle;
                    self.action_id += 1;
                }
            }
        }
        self
    }

    pub fn snapshot(&self) -> StudioSnapshot {
        let (busy_kind, status, error) = match &self.activity {
            Activity::Idle => (None, None, None),
            Activity::Busy { kind, status } => (Some(*kind), Some(status.clone()), None),
            Activity::Failed { message } => (None, None, Some(message.clone())),
        };

        StudioSnapshot {
            file_name: self.upload.as_ref().map(|u| u.file.file_name.clone()),
            context: self.context,
            destination: self.destination,
            prompt: self.prompt.clone(),
            busy: busy_kind.is_some(),
            busy_kind,
            status,
            error,
            can_generate_image: self.can_submit(MediaKind::Image),
            can_generate_video: self.can_submit(MediaKind::Video),
            result: self.result.as_ref().map(|r| ResultSummary {
                kind: r.kind(),
                mime_type: r.mime_type().to_string(),
                download_name: download_name(r.mime_type(), r.bytes()),
                data_uri: match r {
                    GeneratedResult::Image { data_uri, .. } => Some(data_uri.clone()),
                    GeneratedResult::Video { .. } => None,
                },
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultSummary {
    pub kind: MediaKind,
    pub mime_type: String,
    pub download_name: String,
    /// Present for images; videos are fetched from the result endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudioSnapshot {
    pub file_name: Option<String>,
    pub context: EditContext,
    pub destination: Destination,
    pub prompt: String,
    pub busy: bool,
    /// Which action is running while `busy`
    pub busy_kind: Option<MediaKind>,
    pub status: Option<String>,
    pub error: Option<String>,
    pub can_generate_image: bool,
    pub can_generate_video: bool,
    pub result: Option<ResultSummary>,
}
