use aet_core::FrameworkError;
use aet_core::links::rewrite_links;
use aet_core::model::{ProgressRecord, StudentId};
use aet_core::prompt::goal_plan_prompt;
use tracing::info;

use crate::Clock;
use crate::ai::{AiAssistant, AiRequestKind};
use crate::error::ProgressServiceError;
use crate::progress_service::ProgressService;

/// AI-written goal plans for one student and subcategory.
#[derive(Clone)]
pub struct PlanService {
    clock: Clock,
    progress: ProgressService,
    assistant: AiAssistant,
}

impl PlanService {
    #[must_use]
    pub fn new(clock: Clock, progress: ProgressService, assistant: AiAssistant) -> Self {
        Self {
            clock,
            progress,
            assistant,
        }
    }

    /// Generate a plan and store it on the progress record.
    ///
    /// An existing plan is sent along and revised rather than replaced from
    /// scratch. Resource tokens in the reply are rewritten into links.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` for unknown students or subcategories,
    /// or `ProgressServiceError::Ai` when generation fails. Nothing is stored
    /// on failure.
    pub async fn generate(
        &self,
        student_id: StudentId,
        subcategory: &str,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let mut record = self.progress.load(student_id, subcategory).await?;
        let student = self.progress.student(student_id).await?;
        let path = record
            .subcategory_id()
            .path()
            .ok_or_else(|| FrameworkError::UnknownSubcategory(subcategory.to_string()))?;

        let prompt = goal_plan_prompt(&student, path, Some(&record), self.clock.today());
        let reply = self
            .assistant
            .complete(AiRequestKind::GoalPlan, &prompt)
            .await?;

        record.set_plan(rewrite_links(&reply), self.clock.now());
        self.progress.store(&record).await?;
        info!(
            student = %student_id,
            subcategory = %record.subcategory_id(),
            "goal plan stored"
        );
        Ok(record)
    }
}
