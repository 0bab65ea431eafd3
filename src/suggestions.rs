// Service suggestions from an external text-completion service
//
// The completion service is untrusted: its reply is parsed best-effort as a
// JSON array of {key, name, category}; anything else is an upstream error.
// Calls are made once, with no retry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::{AppError, AppResult};

const NOT_CONFIGURED: &str =
    "Gemini AI not configured. Please set GEMINI_API_KEY environment variable.";

/// One service the completion service thinks the user should also notify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedService {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
}

/// The parts of a profile the prompt is built from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileSummary {
    pub name: Option<String>,
    pub current_address: Option<String>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}

// ============================================================================
// GEMINI CLIENT
// ============================================================================

/// `generateContent` client for the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
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
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &AiConfig, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "completion request failed");
                AppError::upstream(format!("AI suggestion failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%status, "completion service returned an error status");
            return Err(AppError::upstream(format!("AI suggestion failed: HTTP {status}")));
        }

        let reply: GenerateResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "completion response was not valid JSON");
            AppError::upstream(format!("AI suggestion failed: {e}"))
        })?;

        let text: String = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::upstream("AI suggestion failed: empty response"));
        }

        Ok(text)
    }
}

// ============================================================================
// SUGGESTER
// ============================================================================

pub struct ServiceSuggester {
    client: Option<Arc<dyn CompletionClient>>,
}

impl ServiceSuggester {
    /// Build from config; without an API key the suggester is unconfigured.
    pub fn from_config(config: &AiConfig) -> anyhow::Result<Self> {
        match config.api_key.as_deref().filter(|key| !key.is_empty()) {
            Some(key) => Ok(Self::with_client(Arc::new(GeminiClient::new(config, key)?))),
            None => Ok(Self::unconfigured()),
        }
    }

    pub fn with_client(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub fn unconfigured() -> Self {
        Self { client: None }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub async fn suggest(
        &self,
        profile: &ProfileSummary,
        current_services: &[String],
    ) -> AppResult<Vec<SuggestedService>> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable(NOT_CONFIGURED.to_string()))?;

        let reply = client.complete(&build_prompt(profile, current_services)).await?;
        parse_suggestions(&reply)
    }
}

pub fn build_prompt(profile: &ProfileSummary, current_services: &[String]) -> String {
    let or_na = |field: &Option<String>| -> String {
        field
            .as_deref()
            .filter(|value| !value.is_empty())
            .unwrap_or("N/A")
            .to_string()
    };
    let services = if current_services.is_empty() {
        "None".to_string()
    } else {
        current_services.join(", ")
    };

    format!(
        r#"Based on the following profile information, suggest additional services that might need address change notifications when moving:

Profile:
- Name: {name}
- Current Address: {address}
- Current Services: {services}

Please suggest 5-10 additional services that people typically need to notify when moving to a new address.
Format your response as a JSON array of objects with 'key', 'name', and 'category' fields.
Example format:
[
  {{"key": "gym", "name": "Gym Membership", "category": "health"}},
  {{"key": "subscription", "name": "Magazine Subscription", "category": "media"}}
]

Only return the JSON array, no additional text."#,
        name = or_na(&profile.name),
        address = or_na(&profile.current_address),
    )
}

/// Parse a completion reply into suggestions.
///
/// Markdown code fences (with or without a `json` tag) are removed first; if
/// that still does not parse, the outermost `[...]` span is tried.
pub fn parse_suggestions(reply: &str) -> AppResult<Vec<SuggestedService>> {
    let body = strip_code_fence(reply.trim());

    match serde_json::from_str(body) {
        Ok(suggestions) => Ok(suggestions),
        Err(first_err) => {
            let bracketed = body
                .find('[')
                .zip(body.rfind(']'))
                .filter(|(start, end)| start < end)
                .map(|(start, end)| &body[start..=end]);

            bracketed
                .and_then(|array| serde_json::from_str(array).ok())
                .ok_or_else(|| {
                    tracing::error!(error = %first_err, "unparsable suggestion reply");
                    AppError::upstream(format!("AI suggestion failed: {first_err}"))
                })
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let inner = rest.split("```").next().unwrap_or(rest);
    inner.strip_prefix("json").unwrap_or(inner).trim()
}
