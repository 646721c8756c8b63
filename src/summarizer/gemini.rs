//! Minimal client for the Gemini generative language REST API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Generation API failure.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Transport failure, including timeouts.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Non-2xx response without a readable error body.
    #[error("HTTP error: {0}")]
    HttpStatus(StatusCode),
    /// Error reported by the API.
    #[error("API error: {0}")]
    Api(String),
    /// The response carried no candidate text.
    #[error("empty response")]
    EmptyResponse,
}

#[derive(Serialize, Deserialize, Debug)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    message: String,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

/// A model as reported by the models listing.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Full model name, e.g. `models/gemini-1.5-flash`.
    pub name: String,
    /// Methods the model supports.
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Whether the model supports `generateContent`.
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

#[derive(Deserialize, Debug)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Gemini REST client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client. Every request is bounded by `timeout`.
    pub fn new(
        api_base: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// List available models.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError> {
        let url = format!("{}/models", self.api_base);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("pageSize", "1000")])
            .send()
            .await?;

        let response = check_status(response).await?;
        let list: ModelList = response.json().await?;
        Ok(list.models)
    }

    /// Generate text for a single-part prompt, returning the first candidate's text.
    pub async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/{}:generateContent", self.api_base, model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let parsed: GenerateResponse = response.json().await?;

        if let Some(err) = parsed.error {
            return Err(GenerationError::Api(err.message));
        }

        let text = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Map a non-2xx response to an error, preferring the API's own message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => Err(GenerationError::Api(envelope.error.message)),
        Err(_) => Err(GenerationError::HttpStatus(status)),
    }
}
