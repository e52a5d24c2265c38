use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::{
    provider::Provider,
    types::{Analysis, AnalysisResponse},
};

static SYSTEM_PROMPT: &str = "You are an expert productivity assistant and content strategist. \
Your goal is to analyze the content associated with a YouTube video and extract highly actionable insights.";

static NO_TRANSCRIPT_NOTE: &str = "Note: No transcript provided. Please infer the content from the URL \
if it is a well-known video, otherwise provide generic best-practices based on the likely topic \
inferred from the URL structure or title if visible.";

static INSTRUCTIONS: &str = r#"Instructions:
1. Identify the likely title of the video.
2. Write a concise summary (max 3 sentences).
3. Extract 3-5 key highlights or "aha" moments.
4. Extract concrete, actionable steps (Action Items) that the viewer can implement immediately.
5. Suggest 3-5 short, relevant tags for organizing this note (e.g., "Productivity", "React", "Cooking").

Return the response in strict JSON format matching the schema."#;

const SCHEMA_NAME: &str = "video_insight";

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Missing API key for {provider_name}: set the {env_var} environment variable")]
    MissingApiKey {
        provider_name: &'static str,
        env_var: &'static str,
    },

    #[error("A video URL is required")]
    EmptyUrl,

    /// The cause is logged when this is produced and deliberately not carried.
    #[error("Failed to analyze video content. Please check the URL or try adding a transcript.")]
    Failed,
}

/// Root causes behind [`AnalysisError::Failed`]. Logged, never shown.
#[derive(Debug, thiserror::Error)]
enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid API response: {0}")]
    InvalidApiResponse(Value),

    #[error("Response does not match the schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Turns a video reference into a structured [`Analysis`].
#[allow(async_fn_in_trait)]
pub trait ContentAnalyzer {
    async fn analyze(&self, url: &str, transcript: Option<&str>) -> Result<Analysis, AnalysisError>;
}

/// [`ContentAnalyzer`] backed by an OpenAI-compatible chat completions endpoint.
///
/// Every call issues a fresh request; results are not cached and failures are not retried.
pub struct AnalysisClient {
    http: reqwest::Client,
    provider: Provider,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl AnalysisClient {
    /// `api_key` is checked on each call, so a client may be built without one.
    pub fn new(provider: Provider, api_key: Option<String>) -> Self {
        let config = provider.config();
        Self {
            http: reqwest::Client::new(),
            provider,
            api_url: config.api_url.to_string(),
            model: config.model.to_string(),
            api_key,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn analyze(
        &self,
        url: &str,
        transcript: Option<&str>,
    ) -> Result<Analysis, AnalysisError> {
        let Some(api_key) = self.api_key.as_deref().filter(|key| !key.trim().is_empty()) else {
            return Err(AnalysisError::MissingApiKey {
                provider_name: self.provider.name(),
                env_var: self.provider.config().env_var,
            });
        };

        let url = url.trim();
        if url.is_empty() {
            return Err(AnalysisError::EmptyUrl);
        }

        let body = request_body(&self.model, url, transcript);
        debug!(provider = self.provider.name(), model = %self.model, url, "requesting video analysis");

        match self.send(api_key, &body).await {
            Ok(response) => {
                info!(url, title = %response.video_title, "video analyzed");
                Ok(response.into())
            }
            Err(e) => {
                error!(provider = self.provider.name(), url, error = %e, "video analysis failed");
                Err(AnalysisError::Failed)
            }
        }
    }

    async fn send(&self, api_key: &str, body: &Value) -> Result<AnalysisResponse, ServiceError> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }

        let response = response.json::<Value>().await?;
        parse_completion(&response)
    }
}

impl ContentAnalyzer for AnalysisClient {
    async fn analyze(&self, url: &str, transcript: Option<&str>) -> Result<Analysis, AnalysisError> {
        AnalysisClient::analyze(self, url, transcript).await
    }
}

/// Instruction text sent as the user message.
pub fn build_prompt(url: &str, transcript: Option<&str>) -> String {
    let context = match transcript.map(str::trim).filter(|t| !t.is_empty()) {
        Some(transcript) => format!("Transcript/Context: {}", transcript),
        None => NO_TRANSCRIPT_NOTE.to_string(),
    };

    format!(
        "Input:\nVideo URL: {}\n{}\n\n{}",
        url, context, INSTRUCTIONS
    )
}

/// JSON schema the service must answer with.
pub fn response_schema() -> Value {
    let string_array = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "type": "object",
        "properties": {
            "videoTitle": { "type": "string" },
            "summary": { "type": "string" },
            "highlights": string_array,
            "actionItems": string_array,
            "suggestedTags": string_array,
        },
        "required": ["videoTitle", "summary", "highlights", "actionItems", "suggestedTags"],
        "additionalProperties": false,
    })
}

fn request_body(model: &str, url: &str, transcript: Option<&str>) -> Value {
    json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": SYSTEM_PROMPT,
            },
            {
                "role": "user",
                "content": build_prompt(url, transcript),
            },
        ],
        "temperature": 0.3,
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": SCHEMA_NAME,
                "strict": true,
                "schema": response_schema(),
            },
        },
    })
}

fn parse_completion(response: &Value) -> Result<AnalysisResponse, ServiceError> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ServiceError::InvalidApiResponse(response.clone()))?;

    Ok(serde_json::from_str(content)?)
}
