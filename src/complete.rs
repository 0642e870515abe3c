//! User-driven completion and un-completion.
//!
//! These are the only transitions that override the time-based sweep.
//! Completing is allowed from any prior status and simply refreshes the
//! completion stamp on repeat; uncompleting is the one backward move in the
//! lifecycle and always comes from a user, never the sweep.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::instance::{DailyTaskInstance, TaskStatus};
use crate::store::TaskStore;

/// Applies explicit user actions to task instances
pub struct CompletionController<'a> {
    tasks: &'a dyn TaskStore,
}

impl<'a> CompletionController<'a> {
    pub fn new(tasks: &'a dyn TaskStore) -> Self {
        Self { tasks }
    }

    /// Mark a task Completed with the given completion instant.
    ///
    /// Returns `None` when the id is unknown; that is an absence signal,
    /// not a failure.
    pub fn complete_task(
        &self,
        task_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<DailyTaskInstance>> {
        let task_id = validate_task_id(task_id)?;

        let updated = self
            .tasks
            .update_status(task_id, TaskStatus::Completed, Some(completed_at))
            .map_err(|err| completion_failure(err, "completing"))?;

        match &updated {
            Some(instance) => tracing::info!(
                task_id = %instance.task_id,
                completed_at = %completed_at,
                "task completed"
            ),
            None => tracing::info!(task_id = %task_id, "complete requested for unknown task"),
        }
        Ok(updated)
    }

    /// Move a task back to Pending and clear its completion stamp.
    pub fn uncomplete_task(&self, task_id: &str) -> Result<Option<DailyTaskInstance>> {
        let task_id = validate_task_id(task_id)?;

        let updated = self
            .tasks
            .update_status(task_id, TaskStatus::Pending, None)
            .map_err(|err| completion_failure(err, "uncompleting"))?;

        match &updated {
            Some(instance) => tracing::info!(task_id = %instance.task_id, "task uncompleted"),
            None => tracing::info!(task_id = %task_id, "uncomplete requested for unknown task"),
        }
        Ok(updated)
    }
}

fn validate_task_id(task_id: &str) -> Result<&str> {
    let trimmed = task_id.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(
            "task id cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn completion_failure(err: Error, action: &str) -> Error {
    tracing::error!(error = %err, "failed while {} task", action);
    Error::OperationFailed(format!("an error occurred while {action} the task"))
}
