//! Language model and pictogram plumbing shared by the planning services.

pub mod client;
pub mod pictograms;
pub mod usage;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use aet_core::prompt::SYSTEM_PROMPT;

use crate::error::AiError;

pub use client::{AiConfig, ChatCompletionsClient, Generation, TextGenerator, TokenUsage};
pub use pictograms::{ArasaacClient, PictogramConfig, PictogramSource};
pub use usage::{AiLimits, AiRequestKind, AiUsageHandle, AiUsageService, AiUsageSnapshot};

/// Usage report exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiUsageReport {
    pub enabled: bool,
    pub model: String,
    pub requests_today: u32,
    pub daily_cap: u32,
    pub remaining: u32,
    pub cooldown_secs: u32,
    pub last_request_at: Option<DateTime<Utc>>,
}

/// A text generator behind the usage gate.
#[derive(Clone)]
pub struct AiAssistant {
    generator: Arc<dyn TextGenerator>,
    usage: Arc<AiUsageService>,
}

impl AiAssistant {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, usage: Arc<AiUsageService>) -> Self {
        Self { generator, usage }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.generator.enabled()
    }

    /// Run one prompt through the generator with the shared system prompt.
    ///
    /// Every attempt that passes the usage gate is logged, successful or not.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Disabled` without touching the usage log when no
    /// generator is configured, `AiError::Usage` when a limit applies, and
    /// the generator's error otherwise.
    pub async fn complete(&self, kind: AiRequestKind, prompt: &str) -> Result<String, AiError> {
        if !self.generator.enabled() {
            return Err(AiError::Disabled);
        }

        let model = self.generator.model();
        let handle = self.usage.start_request(kind, model).await?;
        info!(kind = kind.as_str(), model, "AI request started");

        match self.generator.generate(SYSTEM_PROMPT, prompt).await {
            Ok(generation) => {
                self.usage
                    .finish_success(&handle, generation.usage)
                    .await?;
                info!(
                    kind = kind.as_str(),
                    total_tokens = generation.usage.map(|u| u.total_tokens),
                    "AI request finished"
                );
                Ok(generation.text)
            }
            Err(err) => {
                warn!(kind = kind.as_str(), error = %err, "AI request failed");
                if let Err(log_err) = self.usage.finish_failure(&handle).await {
                    warn!(error = %log_err, "could not record failed AI request");
                }
                Err(err)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `AiError::Usage` on persistence failures.
    pub async fn usage_report(&self) -> Result<AiUsageReport, AiError> {
        let snapshot = self.usage.snapshot().await?;
        Ok(AiUsageReport {
            enabled: self.generator.enabled(),
            model: self.generator.model().to_string(),
            requests_today: snapshot.requests_today,
            daily_cap: snapshot.daily_cap,
            remaining: snapshot.remaining,
            cooldown_secs: snapshot.cooldown_secs,
            last_request_at: snapshot.last_request_at,
        })
    }
}
