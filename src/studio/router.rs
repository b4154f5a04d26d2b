use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{app_state::AppState, studio::handlers};

pub fn studio_router<S>(state: Arc<AppState>) -> OpenApiRouter<S> {
    let upload_limit = state.config.max_upload_bytes;

    OpenApiRouter::new()
        .routes(routes!(handlers::upload_photo))
        .routes(routes!(handlers::update_form))
        .routes(routes!(handlers::get_state))
        .routes(routes!(handlers::generate_image))
        .routes(routes!(handlers::generate_video))
        .routes(routes!(handlers::cancel_generation))
        .routes(routes!(handlers::get_preview))
        .routes(routes!(handlers::get_result))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
