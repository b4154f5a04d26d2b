use std::sync::Arc;

use crate::config::AppConfig;
use crate::gemini::{GeminiClient, GenerativeBackend};
use crate::studio::{StudioController, StudioSettings};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub studio: Arc<StudioController>,
}

impl AppState {
    pub fn new(app_config: AppConfig) -> Self {
        let backend: Arc<dyn GenerativeBackend> = Arc::new(GeminiClient::new(&app_config));
        Self::with_backend(app_config, backend)
    }

    pub fn with_backend(app_config: AppConfig, backend: Arc<dyn GenerativeBackend>) -> Self {
        let studio = StudioController::new(backend, StudioSettings::from_config(&app_config));
        Self {
            config: app_config,
            studio,
        }
    }
}
