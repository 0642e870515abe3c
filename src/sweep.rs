//! Periodic status sweep.
//!
//! Advances time-based transitions over a bounded window of recent dates:
//! Pending turns Overdue once `overdue_at` passes, Overdue turns Cleared once
//! `clear_at` passes. Completed, Cleared, and Skipped instances are never
//! touched. Transitions are monotonic and idempotent per instance, so the
//! sweep is safe to run repeatedly and concurrently with itself.
//!
//! The window scan exists because instances are partitioned by date and there
//! is no global index of "instances needing review"; a store with a real
//! secondary index could replace it with a range query.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::Result;
use crate::instance::TaskStatus;
use crate::store::TaskStore;

/// Counts from one sweep invocation
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepReport {
    pub pending_to_overdue: usize,
    pub overdue_to_cleared: usize,
    pub dates_scanned: usize,
    pub dates_failed: usize,
}

/// Scans recent date partitions and applies time-based transitions
pub struct StatusSweep<'a> {
    tasks: &'a dyn TaskStore,
    tz: Tz,
    window_days: u32,
}

impl<'a> StatusSweep<'a> {
    pub fn new(tasks: &'a dyn TaskStore, tz: Tz, window_days: u32) -> Self {
        Self {
            tasks,
            tz,
            window_days,
        }
    }

    /// Sweep all instances in the window against `now`.
    ///
    /// A failure on one date is logged and counted but does not abort the
    /// remaining dates.
    pub fn sweep_statuses(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let today = now.with_timezone(&self.tz).date_naive();
        let mut report = SweepReport::default();

        tracing::info!(
            current_time = %now,
            window_days = self.window_days,
            "status sweep started"
        );

        for days_back in 0..self.window_days {
            let date = (today - Duration::days(i64::from(days_back)))
                .format("%Y-%m-%d")
                .to_string();
            match self.sweep_date(&date, now) {
                Ok((to_overdue, to_cleared)) => {
                    report.pending_to_overdue += to_overdue;
                    report.overdue_to_cleared += to_cleared;
                    report.dates_scanned += 1;
                }
                Err(err) => {
                    tracing::error!(date = %date, error = %err, "sweep failed for date, continuing");
                    report.dates_failed += 1;
                }
            }
        }

        tracing::info!(
            pending_to_overdue = report.pending_to_overdue,
            overdue_to_cleared = report.overdue_to_cleared,
            dates_scanned = report.dates_scanned,
            dates_failed = report.dates_failed,
            "status sweep completed"
        );

        Ok(report)
    }

    fn sweep_date(&self, date: &str, now: DateTime<Utc>) -> Result<(usize, usize)> {
        let mut to_overdue = 0;
        let mut to_cleared = 0;

        for instance in self.tasks.list_by_date(date)? {
            // Non-strict comparisons: an instance exactly at its threshold
            // transitions on this sweep.
            match instance.status {
                TaskStatus::Pending if now >= instance.overdue_at => {
                    if self
                        .tasks
                        .update_status(&instance.task_id, TaskStatus::Overdue, None)?
                        .is_some()
                    {
                        to_overdue += 1;
                        tracing::info!(
                            task_id = %instance.task_id,
                            task_name = %instance.task_name,
                            overdue_at = %instance.overdue_at,
                            "task transitioned pending to overdue"
                        );
                    }
                }
                TaskStatus::Overdue if now >= instance.clear_at => {
                    if self
                        .tasks
                        .update_status(&instance.task_id, TaskStatus::Cleared, None)?
                        .is_some()
                    {
                        to_cleared += 1;
                        tracing::info!(
                            task_id = %instance.task_id,
                            task_name = %instance.task_name,
                            clear_at = %instance.clear_at,
                            "task transitioned overdue to cleared"
                        );
                    }
                }
                // Completed, Cleared, and Skipped are left alone, as are
                // instances whose thresholds have not passed.
                _ => {}
            }
        }

        Ok((to_overdue, to_cleared))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::DailyTaskInstance;
    use crate::store::MemoryTaskStore;
    use crate::template::{Category, OverdueWhen};
    use chrono_tz::America::New_York;

    fn instance(id: &str, date: &str, status: TaskStatus) -> DailyTaskInstance {
        let now = Utc::now();
        DailyTaskInstance {
            task_id: id.to_string(),
            task_name: "Feed cat".to_string(),
            assigned_to: "member-1".to_string(),
            recurring_task_id: "template-1".to_string(),
            date: date.to_string(),
            due_time: "Morning".to_string(),
            status,
            category: Category::Feeding,
            overdue_when: OverdueWhen::OneHour,
            completed_at: None,
            generated_at: now,
            overdue_at: now,
            clear_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn sweep(store: &MemoryTaskStore) -> StatusSweep<'_> {
        StatusSweep::new(store, New_York, 30)
    }

    fn date_in_window(now: DateTime<Utc>) -> String {
        now.with_timezone(&New_York)
            .date_naive()
            .format("%Y-%m-%d")
            .to_string()
    }

    #[test]
    fn pending_past_overdue_transitions_once() {
        let store = MemoryTaskStore::new();
        let now = Utc::now();
        let date = date_in_window(now);

        let mut task = instance("a", &date, TaskStatus::Pending);
        task.overdue_at = now - Duration::hours(2);
        task.clear_at = now + Duration::hours(10);
        crate::store::TaskStore::create(&store, task).unwrap();

        let sweeper = sweep(&store);
        let report = sweeper.sweep_statuses(now).unwrap();
        assert_eq!(report.pending_to_overdue, 1);
        assert_eq!(report.overdue_to_cleared, 0);

        // Second sweep is a no-op until clear_at also passes.
        let report = sweeper.sweep_statuses(now).unwrap();
        assert_eq!(report.pending_to_overdue, 0);
        assert_eq!(report.overdue_to_cleared, 0);

        let stored = crate::store::TaskStore::get_by_id(&store, "a").unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Overdue);
    }

    #[test]
    fn overdue_past_clear_transitions_to_cleared() {
        let store = MemoryTaskStore::new();
        let now = Utc::now();
        let date = date_in_window(now);

        let mut task = instance("a", &date, TaskStatus::Overdue);
        task.overdue_at = now - Duration::hours(26);
        task.clear_at = now - Duration::hours(1);
        crate::store::TaskStore::create(&store, task).unwrap();

        let report = sweep(&store).sweep_statuses(now).unwrap();
        assert_eq!(report.overdue_to_cleared, 1);

        let stored = crate::store::TaskStore::get_by_id(&store, "a").unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Cleared);
    }

    #[test]
    fn threshold_boundary_transitions_on_this_sweep() {
        let store = MemoryTaskStore::new();
        let now = Utc::now();
        let date = date_in_window(now);

        let mut task = instance("a", &date, TaskStatus::Pending);
        task.overdue_at = now;
        task.clear_at = now + Duration::hours(10);
        crate::store::TaskStore::create(&store, task).unwrap();

        let report = sweep(&store).sweep_statuses(now).unwrap();
        assert_eq!(report.pending_to_overdue, 1);
    }

    #[test]
    fn completed_and_skipped_are_never_touched() {
        let store = MemoryTaskStore::new();
        let now = Utc::now();
        let date = date_in_window(now);

        for (id, status) in [
            ("done", TaskStatus::Completed),
            ("skipped", TaskStatus::Skipped),
            ("cleared", TaskStatus::Cleared),
        ] {
            let mut task = instance(id, &date, status);
            task.overdue_at = now - Duration::hours(48);
            task.clear_at = now - Duration::hours(24);
            crate::store::TaskStore::create(&store, task).unwrap();
        }

        let report = sweep(&store).sweep_statuses(now).unwrap();
        assert_eq!(report.pending_to_overdue, 0);
        assert_eq!(report.overdue_to_cleared, 0);

        for (id, status) in [
            ("done", TaskStatus::Completed),
            ("skipped", TaskStatus::Skipped),
            ("cleared", TaskStatus::Cleared),
        ] {
            let stored = crate::store::TaskStore::get_by_id(&store, id).unwrap().unwrap();
            assert_eq!(stored.status, status);
        }
    }

    #[test]
    fn pending_not_yet_due_is_untouched() {
        let store = MemoryTaskStore::new();
        let now = Utc::now();
        let date = date_in_window(now);

        let mut task = instance("a", &date, TaskStatus::Pending);
        task.overdue_at = now + Duration::hours(1);
        task.clear_at = now + Duration::hours(10);
        crate::store::TaskStore::create(&store, task).unwrap();

        let report = sweep(&store).sweep_statuses(now).unwrap();
        assert_eq!(report.pending_to_overdue, 0);

        let stored = crate::store::TaskStore::get_by_id(&store, "a").unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
    }

    #[test]
    fn dates_outside_window_are_not_swept() {
        let store = MemoryTaskStore::new();
        let now = Utc::now();
        let old_date = (now.with_timezone(&New_York).date_naive() - Duration::days(40))
            .format("%Y-%m-%d")
            .to_string();

        let mut task = instance("old", &old_date, TaskStatus::Pending);
        task.overdue_at = now - Duration::days(39);
        crate::store::TaskStore::create(&store, task).unwrap();

        let report = sweep(&store).sweep_statuses(now).unwrap();
        assert_eq!(report.pending_to_overdue, 0);
        assert_eq!(report.dates_scanned, 30);

        let stored = crate::store::TaskStore::get_by_id(&store, "old").unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
    }
}
