use async_trait::async_trait;
use common::games::side_stacker::bot::{AdvisoryClient, AdvisoryError};
use serde::{Deserialize, Serialize};

use crate::server_config::AdvisoryConfig;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Gemini `generateContent` over HTTPS.
pub struct GeminiClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    /// Reads the API key from the environment variable named in the config.
    pub fn from_config(config: &AdvisoryConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::new(config, api_key)
    }

    pub fn new(config: &AdvisoryConfig, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!(
                "{}/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl AdvisoryClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, AdvisoryError> {
        let Some(api_key) = &self.api_key else {
            return Err(AdvisoryError::Unavailable);
        };

        // The key travels in the query string, so strip URLs from transport errors.
        let response = self
            .http
            .post(&self.url)
            .query(&[("key", api_key)])
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| AdvisoryError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisoryError::Transport(format!("status {status}")));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AdvisoryError::Transport(e.without_url().to_string()))?;

        body.into_text().ok_or(AdvisoryError::Unparseable)
    }
}
