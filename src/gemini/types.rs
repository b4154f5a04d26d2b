use serde::{Deserialize, Serialize};

// generateContent

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Inline { inline_data: InlineData },
    Text { text: String },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InlineData {
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(alias = "inlineData")]
    pub inline_data: Option<InlineData>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// First inline media part across all candidates
    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .iter()
            .flatten()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.inline_data.as_ref())
    }
}

// predictLongRunning

#[derive(Serialize)]
pub struct PredictRequest {
    pub instances: Vec<VideoInstance>,
    pub parameters: VideoParameters,
}

#[derive(Serialize)]
pub struct VideoInstance {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<VideoImage>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    pub aspect_ratio: String,
    pub sample_count: u32,
}

#[derive(Deserialize, Debug)]
pub struct OperationResponse {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub response: Option<OperationResult>,
    pub error: Option<OperationError>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    pub rai_media_filtered_reasons: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
pub struct GeneratedSample {
    pub video: Option<VideoRef>,
}

#[derive(Deserialize, Debug)]
pub struct VideoRef {
    pub uri: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct OperationError {
    pub code: i32,
    pub message: String,
}

impl OperationResponse {
    pub fn video_uris(&self) -> Vec<String> {
        self.response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .map(|r| {
                r.generated_samples
                    .iter()
                    .filter_map(|s| s.video.as_ref()?.uri.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn filtered_reasons(&self) -> Option<String> {
        let reasons = self
            .response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .rai_media_filtered_reasons
            .as_ref()?;
        if reasons.is_empty() {
            None
        } else {
            Some(reasons.join("; "))
        }
    }
}
