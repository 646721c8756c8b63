//! Article summarization through a generation API.
//!
//! A [`Summarizer`] is built once at startup. It either holds a client and a
//! selected model, or runs disabled (no API key) and hands back a fixed
//! placeholder. Summarization never fails: errors become an annotated string.

mod gemini;
mod model;

pub use gemini::{GeminiClient, GenerationError, ModelInfo};
pub use model::{normalize_model_name, select_model, DEFAULT_MODEL, PREFERRED_MODELS};

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SummarizerConfig;
use crate::{BatcherError, Result};

/// Summary stored when summarization is disabled.
pub const NO_SUMMARY: &str = "No summary available.";

/// Prefix of the summary stored when generation fails.
pub const ERROR_SUMMARY_PREFIX: &str = "Error generating summary: ";

#[derive(Debug)]
struct Backend {
    client: GeminiClient,
    model: String,
}

/// Summarizer bound to one generation model.
#[derive(Debug)]
pub struct Summarizer {
    backend: Option<Backend>,
    language: String,
    summary_lines: u32,
}

impl Summarizer {
    /// Build a summarizer from configuration.
    ///
    /// Without an API key the summarizer is disabled. Otherwise the configured
    /// model is used as-is, or one is discovered through the models listing,
    /// falling back to [`DEFAULT_MODEL`] when the listing fails.
    pub async fn from_config(config: &SummarizerConfig) -> Result<Self> {
        if !config.is_enabled() {
            warn!("No generation API key configured; summaries are disabled");
            return Ok(Self::disabled(config));
        }

        let client = GeminiClient::new(
            &config.api_base,
            &config.api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
        .map_err(|e| BatcherError::Summarizer(e.to_string()))?;

        let model = match config.model.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(model) => normalize_model_name(model),
            None => discover_model(&client).await,
        };
        info!(model = %model, "Summarizer ready");

        Ok(Self {
            backend: Some(Backend { client, model }),
            language: config.language.clone(),
            summary_lines: config.summary_lines,
        })
    }

    /// Build a summarizer that never calls the API.
    pub fn disabled(config: &SummarizerConfig) -> Self {
        Self {
            backend: None,
            language: config.language.clone(),
            summary_lines: config.summary_lines,
        }
    }

    /// Whether a generation backend is configured.
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// The selected model, if enabled.
    pub fn model(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.model.as_str())
    }

    /// Build the generation prompt for one article.
    pub fn build_prompt(&self, title: &str, snippet: &str) -> String {
        format!(
            "Summarize the following economic news article in {lines} lines, written in {language}.\n\
             Title: {title}\n\
             Content: {snippet}\n\
             \n\
             Summary:",
            lines = self.summary_lines,
            language = self.language,
        )
    }

    /// Summarize one article.
    ///
    /// Returns [`NO_SUMMARY`] when disabled and an
    /// [`ERROR_SUMMARY_PREFIX`]-annotated string when generation fails.
    pub async fn summarize(&self, title: &str, snippet: &str) -> String {
        let Some(backend) = &self.backend else {
            return NO_SUMMARY.to_string();
        };

        let prompt = self.build_prompt(title, snippet);
        match backend.client.generate_content(&backend.model, &prompt).await {
            Ok(text) => {
                debug!(title, "Summary generated");
                text.trim().to_string()
            }
            Err(e) => {
                warn!(title, error = %e, "Summary generation failed");
                format!("{ERROR_SUMMARY_PREFIX}{e}")
            }
        }
    }
}

async fn discover_model(client: &GeminiClient) -> String {
    match client.list_models().await {
        Ok(models) => {
            let model = select_model(&models);
            debug!(available = models.len(), model = %model, "Model discovery complete");
            model
        }
        Err(e) => {
            warn!(error = %e, "Model discovery failed, using {}", DEFAULT_MODEL);
            DEFAULT_MODEL.to_string()
        }
    }
}
