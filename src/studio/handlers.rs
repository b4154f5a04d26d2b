use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use super::controller::MediaFile;
use super::{FormUpdate, StudioSnapshot};
use crate::app_state::AppState;
use crate::error::{ErrorBody, StudioError};
use crate::types::{Destination, EditContext};

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// The photo to edit
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FormRequest {
    pub context: Option<EditContext>,
    pub destination: Option<Destination>,
    pub prompt: Option<String>,
}

fn media_response(file: MediaFile, disposition: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.mime_type),
            (
                header::CONTENT_DISPOSITION,
                format!("{disposition}; filename=\"{}\"", file.file_name.replace('"', "")),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

/// Select the photo to edit
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content_type = "multipart/form-data", content = UploadForm),
    responses(
        (status = 200, description = "Photo selected", body = StudioSnapshot),
        (status = 422, description = "File could not be read as an image", body = ErrorBody),
    ),
    tag = "Studio"
)]
pub async fn upload_photo(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StudioSnapshot>, StudioError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                let err = StudioError::FileRead(e.body_text());
                return Err(app_state.studio.reject_file("upload", err).await);
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let declared_mime = field.content_type().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = StudioError::FileRead(e.body_text());
                return Err(app_state.studio.reject_file(&file_name, err).await);
            }
        };

        let snapshot = app_state
            .studio
            .select_file(&file_name, bytes.to_vec(), declared_mime.as_deref())
            .await?;
        return Ok(Json(snapshot));
    }

    Err(StudioError::MissingFile)
}

/// Change the edit context, destination or prompt text
#[utoipa::path(
    put,
    path = "/form",
    request_body = FormRequest,
    responses(
        (status = 200, description = "Form updated", body = StudioSnapshot),
    ),
    tag = "Studio"
)]
pub async fn update_form(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<FormRequest>,
) -> Json<StudioSnapshot> {
    let snapshot = app_state
        .studio
        .update_form(FormUpdate {
            context: request.context,
            destination: request.destination,
            prompt: request.prompt,
        })
        .await;
    Json(snapshot)
}

/// Current form, busy indicator, error and result summary
#[utoipa::path(
    get,
    path = "/state",
    responses(
        (status = 200, description = "Current studio state", body = StudioSnapshot),
    ),
    tag = "Studio"
)]
pub async fn get_state(State(app_state): State<Arc<AppState>>) -> Json<StudioSnapshot> {
    Json(app_state.studio.snapshot().await)
}

/// Start editing the selected photo
#[utoipa::path(
    post,
    path = "/generate/image",
    responses(
        (status = 202, description = "Image edit started", body = StudioSnapshot),
        (status = 409, description = "A generation is already running", body = ErrorBody),
        (status = 422, description = "No photo selected or prompt missing", body = ErrorBody),
    ),
    tag = "Studio"
)]
pub async fn generate_image(
    State(app_state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<StudioSnapshot>), StudioError> {
    let snapshot = app_state.studio.generate_image().await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// Start animating the selected photo into a short video
#[utoipa::path(
    post,
    path = "/generate/video",
    responses(
        (status = 202, description = "Video generation started", body = StudioSnapshot),
        (status = 409, description = "A generation is already running", body = ErrorBody),
        (status = 422, description = "No photo selected", body = ErrorBody),
    ),
    tag = "Studio"
)]
pub async fn generate_video(
    State(app_state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<StudioSnapshot>), StudioError> {
    let snapshot = app_state.studio.generate_video().await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// Abort the running generation, if any
#[utoipa::path(
    post,
    path = "/cancel",
    responses(
        (status = 200, description = "Studio is idle", body = StudioSnapshot),
    ),
    tag = "Studio"
)]
pub async fn cancel_generation(State(app_state): State<Arc<AppState>>) -> Json<StudioSnapshot> {
    Json(app_state.studio.cancel().await)
}

/// The selected photo
#[utoipa::path(
    get,
    path = "/preview",
    responses(
        (status = 200, description = "Selected photo bytes"),
        (status = 404, description = "No photo selected"),
    ),
    tag = "Studio"
)]
pub async fn get_preview(State(app_state): State<Arc<AppState>>) -> Response {
    match app_state.studio.preview().await {
        Some(file) => media_response(file, "inline"),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// The generated image or video, as a download
#[utoipa::path(
    get,
    path = "/result",
    responses(
        (status = 200, description = "Generated media bytes"),
        (status = 404, description = "Nothing generated yet", body = ErrorBody),
    ),
    tag = "Studio"
)]
pub async fn get_result(State(app_state): State<Arc<AppState>>) -> Result<Response, StudioError> {
    let file = app_state.studio.result().await?;
    Ok(media_response(file, "attachment"))
}
