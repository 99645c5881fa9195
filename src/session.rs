//! Per-session state and the single user-triggered action.

use crate::{
    bedrock::BedrockClient,
    error::{BedrockError, ErrorCategory},
    models::{GenerationRequest, GenerationResult},
};
use std::fmt;

/// Final prompts submitted during one session, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptHistory {
    entries: Vec<String>,
}

impl PromptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, prompt: impl Into<String>) {
        self.entries.push(prompt.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What the user sees when an action fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub category: ErrorCategory,
    pub message: String,
    pub hint: Option<&'static str>,
}

impl From<&BedrockError> for Feedback {
    fn from(err: &BedrockError) -> Self {
        Feedback {
            category: err.category(),
            message: err.user_message(),
            hint: err.hint(),
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    region: String,
    history: PromptHistory,
}

impl Session {
    /// A fresh session bound to the region `client` talks to.
    pub fn for_client(client: &BedrockClient) -> Self {
        Self {
            region: client.region().to_string(),
            history: PromptHistory::new(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn history(&self) -> &PromptHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Run one generation. Every failure becomes [`Feedback`]; nothing is
    /// retried. Prompts that pass validation are recorded even if the
    /// remote call then fails.
    pub async fn submit(
        &mut self,
        client: &BedrockClient,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, Feedback> {
        if client.region() != self.region {
            let err = BedrockError::ConfigError(format!(
                "session is bound to {} but the client targets {}",
                self.region,
                client.region()
            ));
            log::warn!("Rejected request before invocation: {}", err);
            return Err(Feedback::from(&err));
        }

        if let Err(err) = request.validate() {
            log::warn!("Rejected request before invocation: {}", err);
            return Err(Feedback::from(&err));
        }

        self.history.record(request.final_prompt());

        match client.image().generate(request).await {
            Ok(result) => {
                log::info!(
                    "✅ Image generation successful with {} (seed {})",
                    result.model_id,
                    result.seed
                );
                Ok(result)
            }
            Err(err) => {
                log::error!(
                    "❌ Image generation failed with {}: {}",
                    request.model_id,
                    err
                );
                Err(Feedback::from(&err))
            }
        }
    }
}
