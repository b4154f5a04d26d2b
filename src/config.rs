use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::consts::{
    DEFAULT_LISTEN_ADDR, GEMINI_API_URL, IMAGE_EDIT_MODEL, MAX_UPLOAD_BYTES,
    STATUS_CYCLE_INTERVAL, VIDEO_GEN_MODEL, VIDEO_POLL_INTERVAL, WATERMARK_TEXT,
};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub api_base_url: String,
    pub image_model: String,
    pub video_model: String,
    pub listen_addr: String,
    pub poll_interval_secs: u64,
    pub status_interval_secs: u64,
    /// Unset keeps polling until the operation reports completion
    pub max_video_wait_secs: Option<u64>,
    pub watermark: bool,
    pub watermark_text: String,
    pub max_upload_bytes: usize,
    pub sentry_dsn: Option<String>,
}

impl AppConfig {
    /// Layers `remix-studio.toml` (optional), `REMIX_STUDIO__*` variables and `GEMINI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("remix-studio").required(false))
            .add_source(
                Environment::with_prefix("REMIX_STUDIO")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("gemini_api_key", std::env::var("GEMINI_API_KEY").ok())?;

        let conf: AppConfig = builder.build()?.try_deserialize()?;
        if conf.gemini_api_key.trim().is_empty() {
            return Err(ConfigError::Message("GEMINI_API_KEY must be set".to_string()));
        }

        Ok(conf)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("gemini_api_key", "")?
            .set_default("api_base_url", GEMINI_API_URL)?
            .set_default("image_model", IMAGE_EDIT_MODEL)?
            .set_default("video_model", VIDEO_GEN_MODEL)?
            .set_default("listen_addr", DEFAULT_LISTEN_ADDR)?
            .set_default("poll_interval_secs", VIDEO_POLL_INTERVAL.as_secs())?
            .set_default("status_interval_secs", STATUS_CYCLE_INTERVAL.as_secs())?
            .set_default("watermark", true)?
            .set_default("watermark_text", WATERMARK_TEXT)?
            .set_default("max_upload_bytes", MAX_UPLOAD_BYTES as u64)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn max_video_wait(&self) -> Option<Duration> {
        self.max_video_wait_secs.map(Duration::from_secs)
    }
}
