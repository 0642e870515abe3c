//! Daily task generation.
//!
//! Materializes a date's task instances from the active recurring templates,
//! exactly once per date: if any instance already exists for the date the
//! existing set is returned verbatim and nothing is written. The guard is
//! date-level, not per-template, so a template added after a date was first
//! generated never backfills that date.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::instance::{DailyTaskInstance, TaskStatus};
use crate::schedule::compute_schedule;
use crate::store::{TaskStore, TemplateStore};
use crate::template::{Frequency, RecurringTemplate};

/// Orchestrates the frequency matcher, the timestamp calculator, and the two
/// stores to materialize one date's instances.
pub struct GenerationService<'a> {
    templates: &'a dyn TemplateStore,
    tasks: &'a dyn TaskStore,
    tz: Tz,
}

impl<'a> GenerationService<'a> {
    pub fn new(templates: &'a dyn TemplateStore, tasks: &'a dyn TaskStore, tz: Tz) -> Self {
        Self {
            templates,
            tasks,
            tz,
        }
    }

    /// Generate daily tasks for a date (YYYY-MM-DD) from active templates.
    ///
    /// Validation failures propagate with their own messages; store failures
    /// abort the whole date and surface generically, with details logged.
    pub fn generate_daily_tasks_for_date(&self, date: &str) -> Result<Vec<DailyTaskInstance>> {
        let civil_date = parse_civil_date(date)?;
        let date = civil_date.format("%Y-%m-%d").to_string();

        tracing::info!(
            target_date = %date,
            day_of_week = %civil_date.format("%A"),
            "starting daily task generation"
        );

        let existing = self
            .tasks
            .list_by_date(&date)
            .map_err(generation_failure)?;
        if !existing.is_empty() {
            tracing::info!(
                target_date = %date,
                existing_count = existing.len(),
                "daily tasks already exist for date, returning existing"
            );
            return Ok(existing);
        }

        let active = self.templates.list_active().map_err(generation_failure)?;
        tracing::info!(active_templates = active.len(), "retrieved templates for generation");

        let mut generated = Vec::new();
        for template in &active {
            if !template.matches_date(civil_date) {
                continue;
            }

            let instance = self.materialize(template, civil_date, &date);
            let created = self.tasks.create(instance).map_err(generation_failure)?;
            tracing::info!(
                recurring_task_id = %template.task_id,
                daily_task_id = %created.task_id,
                task_name = %created.task_name,
                frequency = %template.frequency,
                "generated daily task from recurring template"
            );
            generated.push(created);
        }

        tracing::info!(
            target_date = %date,
            generated_count = generated.len(),
            "daily task generation completed"
        );

        Ok(generated)
    }

    fn materialize(
        &self,
        template: &RecurringTemplate,
        civil_date: NaiveDate,
        date: &str,
    ) -> DailyTaskInstance {
        // Daily templates already carry Morning/Evening; Weekly and Monthly
        // have no finer-grained time-of-day, so they default to Morning.
        let due_time = match template.frequency {
            Frequency::Daily => template.due.clone(),
            Frequency::Weekly | Frequency::Monthly => "Morning".to_string(),
        };

        let schedule = compute_schedule(civil_date, &due_time, template.overdue_when, self.tz);
        let now = Utc::now();

        DailyTaskInstance {
            task_id: Uuid::new_v4().to_string(),
            task_name: template.task_name.clone(),
            assigned_to: template.assigned_to.clone(),
            recurring_task_id: template.task_id.clone(),
            date: date.to_string(),
            due_time,
            status: TaskStatus::Pending,
            category: template.category,
            overdue_when: template.overdue_when,
            completed_at: None,
            generated_at: now,
            overdue_at: schedule.overdue_at,
            clear_at: schedule.clear_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validate a civil date string strictly as `YYYY-MM-DD`.
pub fn parse_civil_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("date cannot be empty".to_string()));
    }

    let shape_ok = trimmed.len() == 10
        && trimmed
            .char_indices()
            .all(|(i, ch)| match i {
                4 | 7 => ch == '-',
                _ => ch.is_ascii_digit(),
            });
    if !shape_ok {
        return Err(Error::InvalidDate(trimmed.to_string()));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| Error::InvalidDate(trimmed.to_string()))
}

fn generation_failure(err: Error) -> Error {
    tracing::error!(error = %err, "failed to generate daily tasks");
    Error::OperationFailed("an error occurred while generating daily tasks".to_string())
}
