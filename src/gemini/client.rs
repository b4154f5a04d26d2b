use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{Client, Response, Url};
use tracing::{error, info};

use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData,
    OperationResponse, PredictRequest, RequestPart, VideoImage, VideoInstance, VideoParameters,
};
use super::{
    GeneratedImage, GeneratedVideo, GenerationError, GenerativeBackend, OperationHandle,
    OperationStatus,
};
use crate::config::AppConfig;
use crate::types::ImageInput;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    image_model: String,
    video_model: String,
}

impl GeminiClient {
    pub fn new(conf: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: conf.gemini_api_key.clone(),
            base_url: conf.api_base_url.trim_end_matches('/').to_string(),
            image_model: conf.image_model.clone(),
            video_model: conf.video_model.clone(),
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    fn operation_url(&self, handle: &OperationHandle) -> String {
        format!("{}/{}", self.base_url, handle.0.trim_start_matches('/'))
    }

    /// Signed video URIs need the API key appended as a query credential
    pub fn signed_download_url(&self, uri: &str) -> Result<Url, GenerationError> {
        let mut url = Url::parse(uri).map_err(|e| {
            GenerationError::ProviderError(format!("Invalid video URI {uri}: {e}"))
        })?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Response, GenerationError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    error!("{what} failed: {status} - {error_text}");

    Err(GenerationError::ProviderError(format!(
        "{what} error: {status} - {error_text}"
    )))
}

/// Pulls the first inline image out of a generateContent response
pub fn extract_image(response: &GenerateContentResponse) -> Result<GeneratedImage, GenerationError> {
    let Some(inline) = response.first_inline_data() else {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            log::warn!("Image edit prompt was blocked: {reason}");
        }
        for candidate in response.candidates.iter().flatten() {
            let text: Vec<&str> = candidate
                .content
                .iter()
                .flat_map(|c| c.parts.iter())
                .filter_map(|p| p.text.as_deref())
                .collect();
            log::warn!(
                "Candidate without image (finish reason {:?}): {}",
                candidate.finish_reason,
                text.join(" ")
            );
        }
        return Err(GenerationError::NoImageReturned);
    };

    let bytes = BASE64.decode(&inline.data).map_err(|e| {
        GenerationError::ProviderError(format!("Failed to decode returned image: {e}"))
    })?;

    Ok(GeneratedImage {
        mime_type: inline.mime_type.clone(),
        bytes,
    })
}

/// Maps an operation resource to its status, surfacing filtered content as an error
pub fn operation_status(operation: OperationResponse) -> OperationStatus {
    let error = operation
        .error
        .as_ref()
        .map(|e| format!("Operation failed with error code {}: {}", e.code, e.message))
        .or_else(|| {
            operation
                .filtered_reasons()
                .map(|r| format!("Content was filtered by Responsible AI practices: {r}"))
        });

    OperationStatus {
        done: operation.done,
        error,
        video_uris: operation.video_uris(),
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn edit_image(
        &self,
        image: &ImageInput,
        prompt: &str,
    ) -> Result<GeneratedImage, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    RequestPart::Inline {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                    RequestPart::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        };

        info!(
            "Sending image edit request to {} ({} base64 bytes)",
            self.image_model,
            image.data.len()
        );

        let response = self
            .client
            .post(self.model_url(&self.image_model, "generateContent"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        let content: GenerateContentResponse = ensure_success(response, "Image edit")
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::ProviderError(format!("Failed to parse response: {e}")))?;

        extract_image(&content)
    }

    async fn start_video(
        &self,
        image: &ImageInput,
        prompt: &str,
    ) -> Result<OperationHandle, GenerationError> {
        let request = PredictRequest {
            instances: vec![VideoInstance {
                prompt: prompt.to_string(),
                image: Some(VideoImage {
                    bytes_base64_encoded: image.data.clone(),
                    mime_type: image.mime_type.clone(),
                }),
            }],
            parameters: VideoParameters {
                aspect_ratio: "16:9".to_string(),
                sample_count: 1,
            },
        };

        let response = self
            .client
            .post(self.model_url(&self.video_model, "predictLongRunning"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        let operation: OperationResponse = ensure_success(response, "Video generation")
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::ProviderError(format!("Failed to parse response: {e}")))?;

        info!(
            "Video generation started with operation: {}",
            operation.name
        );

        Ok(OperationHandle(operation.name))
    }

    async fn get_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, GenerationError> {
        let response = self
            .client
            .get(self.operation_url(handle))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(format!("Failed to poll operation: {e}")))?;

        let operation: OperationResponse = ensure_success(response, "Operation status")
            .await?
            .json()
            .await
            .map_err(|e| {
                GenerationError::ProviderError(format!("Failed to parse operation response: {e}"))
            })?;

        log::debug!("Operation {} done={}", operation.name, operation.done);

        Ok(operation_status(operation))
    }

    async fn download_video(&self, uri: &str) -> Result<GeneratedVideo, GenerationError> {
        let url = self.signed_download_url(uri)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(format!("Failed to download video: {e}")))?;

        let response = ensure_success(response, "Video download").await?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|ct| ct.starts_with("video/"))
            .unwrap_or("video/mp4")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::NetworkError(format!("Failed to read video bytes: {e}")))?;

        info!("Downloaded generated video: {} bytes", bytes.len());

        Ok(GeneratedVideo {
            mime_type,
            bytes: bytes.to_vec(),
        })
    }
}
