//! The accessibility judge: a language model behind a narrow trait, plus the
//! OpenAI-compatible HTTP adapter used by the CLI.
//!
//! The adapter is sync HTTP via ureq. Its API key is handed in at construction;
//! nothing here reads the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::markdown;
use crate::prompt::{self, PromptLimits};
use crate::reconcile;
use crate::types::ReviewResult;

/// Default OpenAI chat completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// One prompt sent to the judge.
#[derive(Debug, Clone)]
pub struct JudgeRequest {
    /// Standing instructions.
    pub system: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Document, rules, structure, and schema.
    pub user: String,
}

/// Anything that can answer a judge prompt with raw text.
pub trait Judge {
    /// Send one prompt and return the raw reply.
    ///
    /// # Errors
    ///
    /// Returns an error when the service cannot be reached or refuses the request.
    fn complete(&self, request: &JudgeRequest) -> Result<String, Error>;
}

/// Knobs for a single document review.
#[derive(Debug, Clone, Copy)]
pub struct ReviewSettings {
    /// Prompt size limits.
    pub limits: PromptLimits,
    /// Temperature of the first attempt; the retry always uses 0.
    pub temperature: f32,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        return Self { limits: PromptLimits::default(), temperature: 0.2 };
    }
}

/// Review one markdown document.
///
/// A blank document gets a canned full-score result without calling the judge.
/// A reply that is not JSON is retried once at temperature 0.
///
/// # Errors
///
/// Returns judge transport errors, `Error::InvalidJudgeReply` when neither
/// reply parses, or schema errors from reconciliation.
pub fn review_document(
    judge: &dyn Judge,
    markdown_text: &str,
    rules_text: Option<&str>,
    settings: ReviewSettings,
) -> Result<ReviewResult, Error> {
    if markdown_text.trim().is_empty() {
        debug!("empty document, skipping judge");
        return Ok(reconcile::empty_document_result(rules_text));
    }

    let structure = markdown::extract(markdown_text);
    let user = prompt::build_user_prompt(markdown_text, rules_text, &structure, settings.limits)?;

    let mut request = JudgeRequest {
        system: prompt::SYSTEM_PROMPT.to_string(),
        temperature: settings.temperature,
        user,
    };

    let mut payload = reconcile::parse_payload(&judge.complete(&request)?);
    if payload.is_none() {
        warn!("judge reply was not JSON, retrying once");
        request.user.push_str(prompt::RETRY_SUFFIX);
        request.temperature = 0.0;
        payload = reconcile::parse_payload(&judge.complete(&request)?);
    }

    let Some(payload) = payload else {
        return Err(Error::InvalidJudgeReply { attempts: 2 });
    };
    return reconcile::reconcile(&payload);
}

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer token; `None` makes every call fail with `Error::MissingApiKey`.
    pub api_key: Option<String>,
    /// Chat completions URL.
    pub api_url: String,
    /// Reply token cap.
    pub max_tokens: u32,
    /// Model name.
    pub model: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        return Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            max_tokens: 4096,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        };
    }
}

/// Judge backed by an OpenAI-compatible chat completions API.
pub struct OpenAiJudge {
    /// Shared HTTP agent.
    agent: ureq::Agent,
    /// Endpoint, model, and credentials.
    config: OpenAiConfig,
}

impl OpenAiJudge {
    /// Create a judge with its own HTTP agent.
    pub fn new(config: OpenAiConfig) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        return Self { agent, config };
    }

    /// Model this judge asks.
    pub fn model(&self) -> &str {
        return &self.config.model;
    }
}

impl Judge for OpenAiJudge {
    fn complete(&self, request: &JudgeRequest) -> Result<String, Error> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Err(Error::MissingApiKey { service: self.config.api_url.clone() });
        };

        let body = ChatRequest {
            max_tokens: self.config.max_tokens,
            messages: vec![
                ChatMessage { content: request.system.clone(), role: "system".to_string() },
                ChatMessage { content: request.user.clone(), role: "user".to_string() },
            ],
            model: self.config.model.clone(),
            temperature: request.temperature,
        };

        info!(model = %self.config.model, "calling judge");
        let response = self
            .agent
            .post(self.config.api_url.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {api_key}"))
            .send_json(&body)
            .map_err(|e| Error::JudgeRequest { status: 0, message: e.to_string() })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(Error::JudgeRequest { status, message });
        }

        let reply: ChatResponse = response
            .into_body()
            .read_json()
            .map_err(|e| Error::JudgeResponse { reason: e.to_string() })?;

        return reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| Error::JudgeResponse { reason: "no choices in reply".to_string() });
    }
}

/// Chat completions request body.
#[derive(Serialize)]
struct ChatRequest {
    /// Reply token cap.
    max_tokens: u32,
    /// System then user message.
    messages: Vec<ChatMessage>,
    /// Model name.
    model: String,
    /// Sampling temperature.
    temperature: f32,
}

/// One chat message.
#[derive(Serialize)]
struct ChatMessage {
    /// Message text.
    content: String,
    /// `system` or `user`.
    role: String,
}

/// Chat completions response body, reduced to what is read.
#[derive(Deserialize)]
struct ChatResponse {
    /// Candidate replies.
    choices: Vec<ChatChoice>,
}

/// One candidate reply.
#[derive(Deserialize)]
struct ChatChoice {
    /// The reply message.
    message: ChatReply,
}

/// Reply message; content may be null.
#[derive(Deserialize)]
struct ChatReply {
    /// Reply text.
    content: Option<String>,
}
