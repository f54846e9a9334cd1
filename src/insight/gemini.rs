//! HTTP client for the Generative Language `generateContent` endpoint.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::{AppError, Result};

use super::TextGenerator;

/// Longest slice of an error body echoed back in a service error.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Generator backed by Google's Generative Language API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
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
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Build a client from AI settings and an API key.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &AiConfig, api_key: impl Into<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|err| AppError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(AppError::Service(format!(
                "provider returned {status}: {}",
                detail.trim()
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        extract_text(parsed)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        Err(AppError::Service("provider returned no text".into()))
    } else {
        Ok(text)
    }
}

impl TextGenerator for GeminiClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.call(prompt))
    }
}
