use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::consts::GENERIC_FAILURE_MESSAGE;
use crate::gemini::GenerationError;
use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("could not read the selected file: {0}")]
    FileRead(String),
    #[error("select a photo first")]
    MissingFile,
    #[error("enter a prompt for this edit")]
    MissingPrompt,
    #[error("a generation is already in progress")]
    Busy,
    #[error("nothing has been generated yet")]
    NoResult,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl StudioError {
    /// Message shown in the error area of the UI
    pub fn user_message(&self) -> String {
        match self {
            StudioError::Generation(e) if e.is_semantic() => e.to_string(),
            StudioError::Generation(
                e @ (GenerationError::TimedOut(_) | GenerationError::Cancelled),
            ) => e.to_string(),
            StudioError::Generation(_) | StudioError::Render(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            StudioError::FileRead(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StudioError::MissingFile | StudioError::MissingPrompt => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            StudioError::Busy => StatusCode::CONFLICT,
            StudioError::NoResult => StatusCode::NOT_FOUND,
            StudioError::Generation(GenerationError::NetworkError(_))
            | StudioError::Generation(GenerationError::ProviderError(_)) => StatusCode::BAD_GATEWAY,
            StudioError::Generation(GenerationError::TimedOut(_)) => StatusCode::GATEWAY_TIMEOUT,
            StudioError::Generation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StudioError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("request failed: {self}");
        }
        (
            status,
            Json(ErrorBody {
                error: self.user_message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{NO_IMAGE_RETURNED_MESSAGE, NO_VIDEO_RETURNED_MESSAGE};

    #[test]
    fn test_semantic_failures_keep_distinct_messages() {
        assert_eq!(
            StudioError::from(GenerationError::NoImageReturned).user_message(),
            NO_IMAGE_RETURNED_MESSAGE
        );
        assert_eq!(
            StudioError::from(GenerationError::NoVideoReturned).user_message(),
            NO_VIDEO_RETURNED_MESSAGE
        );
    }

    #[test]
    fn test_remote_failures_collapse_to_generic_message() {
        let err = StudioError::from(GenerationError::ProviderError("500 - boom".to_string()));
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err = StudioError::from(GenerationError::NetworkError("dns".to_string()));
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StudioError::Busy.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            StudioError::MissingPrompt.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(StudioError::NoResult.status_code(), StatusCode::NOT_FOUND);
    }
}
