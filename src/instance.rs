//! Daily task instances.
//!
//! An instance is a single day's materialized occurrence of a recurring
//! template. It carries its own identity, a non-owning back-reference to the
//! template it came from, and the UTC instants that drive its lifecycle.
//! Instances are never deleted by the engine; deleting the parent template
//! leaves them in place for audit history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::storage::{lock_path, Storage};
use crate::template::{Category, OverdueWhen};

/// Lifecycle status of a daily task instance.
///
/// Skipped is reserved for manual exclusion; the engine never produces it
/// and never transitions out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
    Overdue,
    Cleared,
    Skipped,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::Completed => write!(f, "Completed"),
            TaskStatus::Overdue => write!(f, "Overdue"),
            TaskStatus::Cleared => write!(f, "Cleared"),
            TaskStatus::Skipped => write!(f, "Skipped"),
        }
    }
}

/// A single day's materialized task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTaskInstance {
    pub task_id: String,
    pub task_name: String,
    pub assigned_to: String,
    /// Back-reference to the originating template; not an ownership edge
    pub recurring_task_id: String,
    /// Civil date this instance belongs to (YYYY-MM-DD)
    pub date: String,
    pub due_time: String,
    pub status: TaskStatus,
    pub category: Category,
    /// Copied from the template at generation time; later template edits do
    /// not retroactively change this
    pub overdue_when: OverdueWhen,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
    pub overdue_at: DateTime<Utc>,
    pub clear_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// File-backed task store
// =============================================================================

/// File-backed store for daily task instances, partitioned by date
#[derive(Debug, Clone)]
pub struct FileTaskStore {
    storage: Storage,
}

impl FileTaskStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    fn read_partition(&self, date: &str) -> Result<Vec<DailyTaskInstance>> {
        self.storage.read_jsonl(&self.storage.task_partition(date))
    }
}

impl crate::store::TaskStore for FileTaskStore {
    fn list_by_date(&self, date: &str) -> Result<Vec<DailyTaskInstance>> {
        self.read_partition(date)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<DailyTaskInstance>> {
        // The partition key is the date, which the caller does not know here;
        // scan partitions newest-first since lookups target recent tasks.
        let mut dates = self.storage.partition_dates()?;
        dates.reverse();
        for date in dates {
            let instances = self.read_partition(&date)?;
            if let Some(instance) = instances.into_iter().find(|i| i.task_id == id) {
                return Ok(Some(instance));
            }
        }
        Ok(None)
    }

    fn create(&self, instance: DailyTaskInstance) -> Result<DailyTaskInstance> {
        let path = self.storage.task_partition(&instance.date);
        let _lock = FileLock::acquire(lock_path(&path), DEFAULT_LOCK_TIMEOUT_MS)?;
        self.storage.append_jsonl(&path, &instance)?;
        Ok(instance)
    }

    fn update_status(
        &self,
        id: &str,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<DailyTaskInstance>> {
        let Some(current) = self.get_by_id(id)? else {
            return Ok(None);
        };

        // Update by the true (date, id) key, rewriting the partition under
        // its lock so the transition applies as one conditional update.
        let path = self.storage.task_partition(&current.date);
        let _lock = FileLock::acquire(lock_path(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut instances = self.read_partition(&current.date)?;
        let mut updated = None;
        for instance in instances.iter_mut() {
            if instance.task_id == id {
                instance.status = status;
                instance.completed_at = completed_at;
                instance.updated_at = Utc::now();
                updated = Some(instance.clone());
                break;
            }
        }

        if updated.is_some() {
            self.storage.write_jsonl(&path, &instances)?;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaskStore;
    use tempfile::tempdir;

    fn instance(id: &str, date: &str) -> DailyTaskInstance {
        let now = Utc::now();
        DailyTaskInstance {
            task_id: id.to_string(),
            task_name: "Feed cat".to_string(),
            assigned_to: "member-1".to_string(),
            recurring_task_id: "template-1".to_string(),
            date: date.to_string(),
            due_time: "Morning".to_string(),
            status: TaskStatus::Pending,
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

    fn store() -> (tempfile::TempDir, FileTaskStore) {
        let dir = tempdir().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init().unwrap();
        (dir, FileTaskStore::new(storage))
    }

    #[test]
    fn create_and_list_by_date() {
        let (_dir, store) = store();
        store.create(instance("a", "2024-08-04")).unwrap();
        store.create(instance("b", "2024-08-04")).unwrap();
        store.create(instance("c", "2024-08-05")).unwrap();

        let day = store.list_by_date("2024-08-04").unwrap();
        assert_eq!(day.len(), 2);
        assert!(store.list_by_date("2024-08-06").unwrap().is_empty());
    }

    #[test]
    fn get_by_id_scans_partitions() {
        let (_dir, store) = store();
        store.create(instance("a", "2024-08-04")).unwrap();
        store.create(instance("b", "2024-08-05")).unwrap();

        let found = store.get_by_id("a").unwrap().expect("instance");
        assert_eq!(found.date, "2024-08-04");
        assert!(store.get_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn update_status_rewrites_only_the_target() {
        let (_dir, store) = store();
        store.create(instance("a", "2024-08-04")).unwrap();
        store.create(instance("b", "2024-08-04")).unwrap();

        let completed_at = Utc::now();
        let updated = store
            .update_status("a", TaskStatus::Completed, Some(completed_at))
            .unwrap()
            .expect("instance");
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.completed_at, Some(completed_at));

        let day = store.list_by_date("2024-08-04").unwrap();
        let other = day.iter().find(|i| i.task_id == "b").unwrap();
        assert_eq!(other.status, TaskStatus::Pending);
    }

    #[test]
    fn update_status_with_none_clears_completion() {
        let (_dir, store) = store();
        store.create(instance("a", "2024-08-04")).unwrap();

        store
            .update_status("a", TaskStatus::Completed, Some(Utc::now()))
            .unwrap();
        let reverted = store
            .update_status("a", TaskStatus::Pending, None)
            .unwrap()
            .expect("instance");
        assert_eq!(reverted.status, TaskStatus::Pending);
        assert!(reverted.completed_at.is_none());
    }

    #[test]
    fn update_status_missing_id_is_absence_not_error() {
        let (_dir, store) = store();
        let result = store.update_status("ghost", TaskStatus::Completed, None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn completed_at_omitted_from_json_when_absent() {
        let pending = instance("a", "2024-08-04");
        let json = serde_json::to_string(&pending).unwrap();
        assert!(!json.contains("completed_at"));

        let mut done = instance("b", "2024-08-04");
        done.completed_at = Some(Utc::now());
        let json = serde_json::to_string(&done).unwrap();
        assert!(json.contains("completed_at"));
    }

    #[test]
    fn persisted_field_names_match_the_wire_format() {
        let json = serde_json::to_value(instance("a", "2024-08-04")).unwrap();
        for field in [
            "task_id",
            "task_name",
            "assigned_to",
            "recurring_task_id",
            "date",
            "due_time",
            "status",
            "category",
            "overdue_when",
            "generated_at",
            "overdue_at",
            "clear_at",
            "created_at",
            "updated_at",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["overdue_when"], "1 hour");
        assert_eq!(json["category"], "Feeding");
    }
}
