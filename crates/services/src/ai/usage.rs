use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use aet_core::time::start_of_day;
use storage::repository::{AiUsageCompletion, AiUsageRepository, AiUsageStatus, NewAiUsageRecord};

use crate::ai::client::TokenUsage;
use crate::error::AiUsageError;
use crate::Clock;

pub const DEFAULT_DAILY_CAP: u32 = 50;
pub const DEFAULT_COOLDOWN_SECS: u32 = 5;

/// What an AI request was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiRequestKind {
    GoalPlan,
    LessonPlan,
    VisualSchedule,
}

impl AiRequestKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GoalPlan => "goal_plan",
            Self::LessonPlan => "lesson_plan",
            Self::VisualSchedule => "visual_schedule",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiLimits {
    pub daily_cap: u32,
    pub cooldown_secs: u32,
}

impl Default for AiLimits {
    fn default() -> Self {
        Self {
            daily_cap: DEFAULT_DAILY_CAP,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AiUsageHandle {
    pub id: i64,
    pub kind: AiRequestKind,
    pub model: String,
    pub started_at: DateTime<Utc>,
}

/// Today's usage against the configured limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiUsageSnapshot {
    pub requests_today: u32,
    pub daily_cap: u32,
    pub remaining: u32,
    pub cooldown_secs: u32,
    pub last_request_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AiUsageService {
    clock: Clock,
    usage_repo: Arc<dyn AiUsageRepository>,
    limits: AiLimits,
}

impl AiUsageService {
    #[must_use]
    pub fn new(clock: Clock, usage_repo: Arc<dyn AiUsageRepository>, limits: AiLimits) -> Self {
        Self {
            clock,
            usage_repo,
            limits,
        }
    }

    #[must_use]
    pub fn limits(&self) -> AiLimits {
        self.limits
    }

    /// Start a request after enforcing the daily cap and cooldown.
    ///
    /// # Errors
    ///
    /// Returns `AiUsageError` if a limit is hit or persistence fails.
    pub async fn start_request(
        &self,
        kind: AiRequestKind,
        model: &str,
    ) -> Result<AiUsageHandle, AiUsageError> {
        let now = self.clock.now();

        let requests_today = self.usage_repo.count_since(start_of_day(now)).await?;
        if requests_today >= self.limits.daily_cap {
            return Err(AiUsageError::DailyCapReached {
                cap: self.limits.daily_cap,
            });
        }

        if let Some(last_request_at) = self.usage_repo.last_request_at().await? {
            let cooldown = Duration::seconds(i64::from(self.limits.cooldown_secs));
            if last_request_at + cooldown > now {
                let remaining_secs = (last_request_at + cooldown - now).num_seconds().max(1);
                let remaining = u32::try_from(remaining_secs).unwrap_or(u32::MAX);
                return Err(AiUsageError::CooldownActive {
                    remaining_secs: remaining,
                });
            }
        }

        let id = self
            .usage_repo
            .insert_started(NewAiUsageRecord {
                kind: kind.as_str().to_string(),
                model: model.to_string(),
                created_at: now,
            })
            .await?;

        Ok(AiUsageHandle {
            id,
            kind,
            model: model.to_string(),
            started_at: now,
        })
    }

    /// Record a successful request.
    ///
    /// # Errors
    ///
    /// Returns `AiUsageError` if persistence fails.
    pub async fn finish_success(
        &self,
        handle: &AiUsageHandle,
        usage: Option<TokenUsage>,
    ) -> Result<(), AiUsageError> {
        self.usage_repo
            .update_completion(
                handle.id,
                AiUsageCompletion {
                    status: AiUsageStatus::Succeeded,
                    prompt_tokens: usage.map(|u| u.prompt_tokens),
                    completion_tokens: usage.map(|u| u.completion_tokens),
                    total_tokens: usage.map(|u| u.total_tokens),
                },
            )
            .await?;
        Ok(())
    }

    /// Record a failed request.
    ///
    /// # Errors
    ///
    /// Returns `AiUsageError` if persistence fails.
    pub async fn finish_failure(&self, handle: &AiUsageHandle) -> Result<(), AiUsageError> {
        self.usage_repo
            .update_completion(handle.id, AiUsageCompletion::failed())
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AiUsageError` on persistence failures.
    pub async fn snapshot(&self) -> Result<AiUsageSnapshot, AiUsageError> {
        let now = self.clock.now();
        let requests_today = self.usage_repo.count_since(start_of_day(now)).await?;
        let last_request_at = self.usage_repo.last_request_at().await?;
        Ok(AiUsageSnapshot {
            requests_today,
            daily_cap: self.limits.daily_cap,
            remaining: self.limits.daily_cap.saturating_sub(requests_today),
            cooldown_secs: self.limits.cooldown_secs,
            last_request_at,
        })
    }
}
