//! Store seams for the lifecycle engine.
//!
//! The engine only ever touches persistence through these two traits, so the
//! services stay unit-testable against in-memory stores and the file-backed
//! implementations stay swappable. The in-memory stores double as the
//! fallback mode for environments without a writable data directory.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::instance::{DailyTaskInstance, TaskStatus};
use crate::template::{RecurringTemplate, TemplateStatus};

/// Read-side interface over recurring templates.
///
/// The lifecycle engine never mutates templates; CRUD lives on the concrete
/// stores and is driven by user action.
pub trait TemplateStore {
    /// All templates with Active status
    fn list_active(&self) -> Result<Vec<RecurringTemplate>>;

    /// Look up one template by id
    fn get(&self, id: &str) -> Result<Option<RecurringTemplate>>;
}

/// Interface over daily task instances, keyed by (date, id) with a
/// secondary lookup by id alone.
pub trait TaskStore {
    /// All instances for a civil date (YYYY-MM-DD)
    fn list_by_date(&self, date: &str) -> Result<Vec<DailyTaskInstance>>;

    /// Cross-date lookup by instance id
    fn get_by_id(&self, id: &str) -> Result<Option<DailyTaskInstance>>;

    /// Persist a new instance
    fn create(&self, instance: DailyTaskInstance) -> Result<DailyTaskInstance>;

    /// Update an instance's status and completion stamp by id.
    ///
    /// `completed_at` is written as given: `Some` stamps a completion,
    /// `None` clears one. Returns `None` when the id is unknown.
    fn update_status(
        &self,
        id: &str,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<DailyTaskInstance>>;
}

// =============================================================================
// In-memory implementations
// =============================================================================

/// In-memory template store
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: Mutex<Vec<RecurringTemplate>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, template: RecurringTemplate) {
        self.templates
            .lock()
            .expect("template store lock poisoned")
            .push(template);
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn list_active(&self) -> Result<Vec<RecurringTemplate>> {
        let templates = self
            .templates
            .lock()
            .expect("template store lock poisoned");
        Ok(templates
            .iter()
            .filter(|t| t.status == TemplateStatus::Active)
            .cloned()
            .collect())
    }

    fn get(&self, id: &str) -> Result<Option<RecurringTemplate>> {
        let templates = self
            .templates
            .lock()
            .expect("template store lock poisoned");
        Ok(templates.iter().find(|t| t.task_id == id).cloned())
    }
}

/// In-memory task store
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    instances: Mutex<Vec<DailyTaskInstance>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryTaskStore {
    fn list_by_date(&self, date: &str) -> Result<Vec<DailyTaskInstance>> {
        let instances = self.instances.lock().expect("task store lock poisoned");
        Ok(instances.iter().filter(|i| i.date == date).cloned().collect())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<DailyTaskInstance>> {
        let instances = self.instances.lock().expect("task store lock poisoned");
        Ok(instances.iter().find(|i| i.task_id == id).cloned())
    }

    fn create(&self, instance: DailyTaskInstance) -> Result<DailyTaskInstance> {
        let mut instances = self.instances.lock().expect("task store lock poisoned");
        instances.push(instance.clone());
        Ok(instance)
    }

    fn update_status(
        &self,
        id: &str,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<DailyTaskInstance>> {
        let mut instances = self.instances.lock().expect("task store lock poisoned");
        for instance in instances.iter_mut() {
            if instance.task_id == id {
                instance.status = status;
                instance.completed_at = completed_at;
                instance.updated_at = Utc::now();
                return Ok(Some(instance.clone()));
            }
        }
        Ok(None)
    }
}
