//! Recurring task templates.
//!
//! A template is a reusable rule ("take pills every morning") that the
//! generation service materializes into dated task instances. Templates are
//! stored in `templates.json` as a single registry, mutated only through
//! user-driven CRUD; the lifecycle engine reads them and never writes them.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::storage::{lock_path, Storage};

/// Maximum length of a task name after sanitization
pub const NAME_MAX_LEN: usize = 30;

const SUSPICIOUS_PATTERNS: [&str; 4] = ["<script", "javascript:", "data:", "vbscript:"];

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// How often a template recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Daily => write!(f, "Daily"),
            Frequency::Weekly => write!(f, "Weekly"),
            Frequency::Monthly => write!(f, "Monthly"),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid frequency '{}'. Expected: daily, weekly, monthly",
                s
            ))),
        }
    }
}

/// How long after the due instant a pending task turns Overdue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverdueWhen {
    Immediate,
    #[serde(rename = "1 hour")]
    OneHour,
    #[serde(rename = "6 hours")]
    SixHours,
    #[serde(rename = "1 day")]
    OneDay,
    #[serde(rename = "3 days")]
    ThreeDays,
    #[serde(rename = "7 days")]
    SevenDays,
}

impl OverdueWhen {
    /// Offset from the due instant, in hours
    pub fn offset_hours(&self) -> i64 {
        match self {
            OverdueWhen::Immediate => 0,
            OverdueWhen::OneHour => 1,
            OverdueWhen::SixHours => 6,
            OverdueWhen::OneDay => 24,
            OverdueWhen::ThreeDays => 72,
            OverdueWhen::SevenDays => 168,
        }
    }

    /// Parse a stored label, defaulting to one hour for anything
    /// unrecognized so hand-edited data degrades instead of failing.
    pub fn parse_lenient(label: &str) -> Self {
        label.parse().unwrap_or(OverdueWhen::OneHour)
    }
}

impl std::fmt::Display for OverdueWhen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverdueWhen::Immediate => write!(f, "Immediate"),
            OverdueWhen::OneHour => write!(f, "1 hour"),
            OverdueWhen::SixHours => write!(f, "6 hours"),
            OverdueWhen::OneDay => write!(f, "1 day"),
            OverdueWhen::ThreeDays => write!(f, "3 days"),
            OverdueWhen::SevenDays => write!(f, "7 days"),
        }
    }
}

impl std::str::FromStr for OverdueWhen {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(OverdueWhen::Immediate),
            "1 hour" => Ok(OverdueWhen::OneHour),
            "6 hours" => Ok(OverdueWhen::SixHours),
            "1 day" => Ok(OverdueWhen::OneDay),
            "3 days" => Ok(OverdueWhen::ThreeDays),
            "7 days" => Ok(OverdueWhen::SevenDays),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid overdue-when '{}'. Expected: Immediate, 1 hour, 6 hours, 1 day, 3 days, 7 days",
                s
            ))),
        }
    }
}

/// Task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Medication,
    Feeding,
    Health,
    Cleaning,
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Medication => write!(f, "Medication"),
            Category::Feeding => write!(f, "Feeding"),
            Category::Health => write!(f, "Health"),
            Category::Cleaning => write!(f, "Cleaning"),
            Category::Other => write!(f, "Other"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "medication" => Ok(Category::Medication),
            "feeding" => Ok(Category::Feeding),
            "health" => Ok(Category::Health),
            "cleaning" => Ok(Category::Cleaning),
            "other" => Ok(Category::Other),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid category '{}'. Expected: medication, feeding, health, cleaning, other",
                s
            ))),
        }
    }
}

/// Whether a template currently produces instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateStatus::Active => write!(f, "Active"),
            TemplateStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

impl std::str::FromStr for TemplateStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(TemplateStatus::Active),
            "inactive" => Ok(TemplateStatus::Inactive),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid template status '{}'. Expected: active, inactive",
                s
            ))),
        }
    }
}

/// A recurring task template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub task_id: String,
    pub task_name: String,
    pub assigned_to: String,
    pub frequency: Frequency,
    /// Symbolic due value: Morning/Evening for Daily, a weekday name for
    /// Weekly, a day-of-month string for Monthly.
    pub due: String,
    pub overdue_when: OverdueWhen,
    pub category: Category,
    pub status: TemplateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringTemplate {
    /// Decide whether this template produces an instance on the target date.
    ///
    /// Pure with respect to storage: only the template fields and the date
    /// matter. Monthly values outside 1-28 (and unparseable ones) never
    /// match; they are logged as rejections, not errors, because templates
    /// are user-editable data the engine tolerates rather than crashes on.
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        if self.status != TemplateStatus::Active {
            return false;
        }

        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => {
                let weekday = date.format("%A").to_string();
                weekday.eq_ignore_ascii_case(self.due.trim())
            }
            Frequency::Monthly => match self.due.trim().parse::<u32>() {
                Ok(day) if (1..=28).contains(&day) => date.day() == day,
                Ok(day) => {
                    tracing::warn!(
                        template_id = %self.task_id,
                        due = day,
                        "monthly due day out of valid range (1-28), never matches"
                    );
                    false
                }
                Err(_) => {
                    tracing::warn!(
                        template_id = %self.task_id,
                        due = %self.due,
                        "invalid monthly due day format, never matches"
                    );
                    false
                }
            },
        }
    }
}

/// Fields supplied when creating a template
#[derive(Debug, Clone)]
pub struct TemplateDraft {
    pub task_name: String,
    pub assigned_to: String,
    pub frequency: Frequency,
    pub due: String,
    pub overdue_when: OverdueWhen,
    pub category: Category,
    pub status: TemplateStatus,
}

impl TemplateDraft {
    /// Validate and build a template with a fresh id and audit stamps
    pub fn into_template(self) -> Result<RecurringTemplate> {
        let task_name = sanitize_task_name(&self.task_name)?;
        let assigned_to = self.assigned_to.trim().to_string();
        if assigned_to.is_empty() {
            return Err(Error::InvalidArgument(
                "assignee cannot be empty".to_string(),
            ));
        }
        let due = validate_due(self.frequency, &self.due)?;

        let now = Utc::now();
        Ok(RecurringTemplate {
            task_id: Uuid::new_v4().to_string(),
            task_name,
            assigned_to,
            frequency: self.frequency,
            due,
            overdue_when: self.overdue_when,
            category: self.category,
            status: self.status,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update applied to an existing template
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub task_name: Option<String>,
    pub assigned_to: Option<String>,
    pub frequency: Option<Frequency>,
    pub due: Option<String>,
    pub overdue_when: Option<OverdueWhen>,
    pub category: Option<Category>,
    pub status: Option<TemplateStatus>,
}

/// Collapse whitespace, strip control characters, and enforce the length cap
pub fn sanitize_task_name(raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "task name cannot be empty".to_string(),
        ));
    }

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let sanitized: String = collapsed.chars().filter(|ch| !ch.is_control()).collect();

    if sanitized.is_empty() {
        return Err(Error::InvalidArgument(
            "task name cannot be empty after sanitization".to_string(),
        ));
    }
    if sanitized.chars().count() > NAME_MAX_LEN {
        return Err(Error::InvalidArgument(format!(
            "task name must be {NAME_MAX_LEN} characters or less"
        )));
    }

    let lowered = sanitized.to_lowercase();
    if SUSPICIOUS_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
    {
        return Err(Error::InvalidArgument(
            "task name contains invalid content".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Check that `due` is syntactically consistent with the frequency and
/// return its canonical form.
///
/// Monthly values outside 1-28 are accepted at write time (they simply never
/// match, which is warned about here) to mirror the engine's tolerance of
/// user-edited data.
pub fn validate_due(frequency: Frequency, due: &str) -> Result<String> {
    let trimmed = due.trim();
    match frequency {
        Frequency::Daily => match trimmed.to_lowercase().as_str() {
            "morning" => Ok("Morning".to_string()),
            "evening" => Ok("Evening".to_string()),
            _ => Err(Error::InvalidArgument(format!(
                "daily due must be Morning or Evening, got '{trimmed}'"
            ))),
        },
        Frequency::Weekly => WEEKDAY_NAMES
            .iter()
            .find(|name| name.eq_ignore_ascii_case(trimmed))
            .map(|name| name.to_string())
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "weekly due must be a weekday name, got '{trimmed}'"
                ))
            }),
        Frequency::Monthly => {
            let day: u32 = trimmed.parse().map_err(|_| {
                Error::InvalidArgument(format!(
                    "monthly due must be a day of month (1-28), got '{trimmed}'"
                ))
            })?;
            if !(1..=28).contains(&day) {
                tracing::warn!(
                    due = day,
                    "monthly due day outside 1-28 will never match any date"
                );
            }
            Ok(day.to_string())
        }
    }
}

// =============================================================================
// File-backed template registry
// =============================================================================

/// Registry of all templates, stored as one JSON document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateRegistry {
    pub templates: Vec<RecurringTemplate>,
}

impl TemplateRegistry {
    pub fn find(&self, id: &str) -> Option<&RecurringTemplate> {
        self.templates.iter().find(|t| t.task_id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut RecurringTemplate> {
        self.templates.iter_mut().find(|t| t.task_id == id)
    }
}

/// File-backed store for recurring templates
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    storage: Storage,
}

impl FileTemplateStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Validate a draft and persist the new template
    pub fn create(&self, draft: TemplateDraft) -> Result<RecurringTemplate> {
        let template = draft.into_template()?;
        let created = template.clone();
        self.update_registry(|registry| {
            registry.templates.push(template);
            Ok(())
        })?;
        tracing::info!(
            template_id = %created.task_id,
            task_name = %created.task_name,
            frequency = %created.frequency,
            "recurring template created"
        );
        Ok(created)
    }

    /// Apply a partial update to a template
    pub fn update(&self, id: &str, changes: TemplateUpdate) -> Result<RecurringTemplate> {
        self.update_registry(|registry| {
            let current = registry
                .find_mut(id)
                .ok_or_else(|| Error::TemplateNotFound(id.to_string()))?;

            if let Some(name) = &changes.task_name {
                current.task_name = sanitize_task_name(name)?;
            }
            if let Some(assignee) = &changes.assigned_to {
                let trimmed = assignee.trim();
                if trimmed.is_empty() {
                    return Err(Error::InvalidArgument(
                        "assignee cannot be empty".to_string(),
                    ));
                }
                current.assigned_to = trimmed.to_string();
            }

            // Frequency and due are validated as a pair since either may move.
            let frequency = changes.frequency.unwrap_or(current.frequency);
            let due = changes.due.clone().unwrap_or_else(|| current.due.clone());
            current.due = validate_due(frequency, &due)?;
            current.frequency = frequency;

            if let Some(overdue_when) = changes.overdue_when {
                current.overdue_when = overdue_when;
            }
            if let Some(category) = changes.category {
                current.category = category;
            }
            if let Some(status) = changes.status {
                current.status = status;
            }
            current.updated_at = Utc::now();
            Ok(current.clone())
        })
    }

    /// Remove a template.
    ///
    /// Instances generated from it are untouched; the back-reference on an
    /// instance is not an ownership edge.
    pub fn delete(&self, id: &str) -> Result<RecurringTemplate> {
        self.update_registry(|registry| {
            let idx = registry
                .templates
                .iter()
                .position(|t| t.task_id == id)
                .ok_or_else(|| Error::TemplateNotFound(id.to_string()))?;
            Ok(registry.templates.remove(idx))
        })
    }

    /// All templates, regardless of status
    pub fn list(&self) -> Result<Vec<RecurringTemplate>> {
        Ok(self.read_registry()?.templates)
    }

    fn read_registry(&self) -> Result<TemplateRegistry> {
        let path = self.storage.templates_file();
        if !path.exists() {
            return Ok(TemplateRegistry::default());
        }
        self.storage.read_json(&path)
    }

    fn update_registry<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TemplateRegistry) -> Result<T>,
    {
        let path = self.storage.templates_file();
        let _lock = FileLock::acquire(lock_path(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut registry = if path.exists() {
            self.storage.read_json(&path)?
        } else {
            TemplateRegistry::default()
        };

        let result = f(&mut registry)?;
        self.storage.write_json(&path, &registry)?;
        Ok(result)
    }
}

impl crate::store::TemplateStore for FileTemplateStore {
    fn list_active(&self) -> Result<Vec<RecurringTemplate>> {
        let mut templates = self.list()?;
        templates.retain(|t| t.status == TemplateStatus::Active);
        Ok(templates)
    }

    fn get(&self, id: &str) -> Result<Option<RecurringTemplate>> {
        Ok(self.read_registry()?.find(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TemplateStore;
    use tempfile::tempdir;

    fn draft(frequency: Frequency, due: &str) -> TemplateDraft {
        TemplateDraft {
            task_name: "Take pills".to_string(),
            assigned_to: "member-1".to_string(),
            frequency,
            due: due.to_string(),
            overdue_when: OverdueWhen::OneHour,
            category: Category::Medication,
            status: TemplateStatus::Active,
        }
    }

    #[test]
    fn daily_matches_every_date() {
        let template = draft(Frequency::Daily, "Morning").into_template().unwrap();
        for day in 1..=28 {
            let date = NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
            assert!(template.matches_date(date));
        }
    }

    #[test]
    fn inactive_never_matches() {
        let mut template = draft(Frequency::Daily, "Morning").into_template().unwrap();
        template.status = TemplateStatus::Inactive;
        let date = NaiveDate::from_ymd_opt(2024, 8, 4).unwrap();
        assert!(!template.matches_date(date));
    }

    #[test]
    fn weekly_matches_only_named_weekday() {
        let template = draft(Frequency::Weekly, "Sunday").into_template().unwrap();
        // 2024-08-04 is a Sunday
        assert!(template.matches_date(NaiveDate::from_ymd_opt(2024, 8, 4).unwrap()));
        for offset in 1..7 {
            let date = NaiveDate::from_ymd_opt(2024, 8, 4 + offset).unwrap();
            assert!(!template.matches_date(date));
        }
    }

    #[test]
    fn weekly_match_is_case_insensitive() {
        let mut template = draft(Frequency::Weekly, "Sunday").into_template().unwrap();
        template.due = "sUnDaY".to_string();
        assert!(template.matches_date(NaiveDate::from_ymd_opt(2024, 8, 4).unwrap()));
    }

    #[test]
    fn monthly_matches_day_of_month_across_months() {
        let template = draft(Frequency::Monthly, "15").into_template().unwrap();
        for month in 1..=12 {
            assert!(template.matches_date(NaiveDate::from_ymd_opt(2024, month, 15).unwrap()));
            assert!(!template.matches_date(NaiveDate::from_ymd_opt(2024, month, 14).unwrap()));
        }
        // February included
        assert!(template.matches_date(NaiveDate::from_ymd_opt(2023, 2, 15).unwrap()));
    }

    #[test]
    fn monthly_out_of_range_never_matches() {
        let mut template = draft(Frequency::Monthly, "15").into_template().unwrap();
        template.due = "30".to_string();
        assert!(!template.matches_date(NaiveDate::from_ymd_opt(2024, 8, 30).unwrap()));
        template.due = "0".to_string();
        assert!(!template.matches_date(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()));
    }

    #[test]
    fn monthly_non_numeric_never_matches() {
        let mut template = draft(Frequency::Monthly, "15").into_template().unwrap();
        template.due = "fifteenth".to_string();
        for day in 1..=28 {
            assert!(!template.matches_date(NaiveDate::from_ymd_opt(2024, 8, day).unwrap()));
        }
    }

    #[test]
    fn sanitize_collapses_whitespace_and_strips_controls() {
        assert_eq!(
            sanitize_task_name("  Feed \t the\ncat ").unwrap(),
            "Feed the cat"
        );
        assert_eq!(sanitize_task_name("Walk\u{0007} dog").unwrap(), "Walk dog");
    }

    #[test]
    fn sanitize_rejects_empty_and_long_names() {
        assert!(sanitize_task_name("   ").is_err());
        assert!(sanitize_task_name(&"x".repeat(31)).is_err());
        assert!(sanitize_task_name(&"x".repeat(30)).is_ok());
    }

    #[test]
    fn sanitize_rejects_markup() {
        assert!(sanitize_task_name("<script>alert(1)</script>").is_err());
        assert!(sanitize_task_name("JavaScript:void(0)").is_err());
    }

    #[test]
    fn due_validation_canonicalizes() {
        assert_eq!(validate_due(Frequency::Daily, "evening").unwrap(), "Evening");
        assert_eq!(validate_due(Frequency::Weekly, "sunday").unwrap(), "Sunday");
        assert_eq!(validate_due(Frequency::Monthly, " 15 ").unwrap(), "15");
        assert!(validate_due(Frequency::Daily, "Lunch").is_err());
        assert!(validate_due(Frequency::Weekly, "Someday").is_err());
        assert!(validate_due(Frequency::Monthly, "mid").is_err());
        // Out-of-range monthly days are accepted (and never match).
        assert_eq!(validate_due(Frequency::Monthly, "30").unwrap(), "30");
    }

    #[test]
    fn overdue_when_labels_round_trip() {
        for label in ["Immediate", "1 hour", "6 hours", "1 day", "3 days", "7 days"] {
            let parsed: OverdueWhen = label.parse().unwrap();
            assert_eq!(parsed.to_string(), label);
        }
        assert_eq!(OverdueWhen::parse_lenient("soonish"), OverdueWhen::OneHour);
    }

    #[test]
    fn file_store_crud_round_trip() {
        let dir = tempdir().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init().unwrap();
        let store = FileTemplateStore::new(storage);

        let created = store.create(draft(Frequency::Daily, "Morning")).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);

        let fetched = store.get(&created.task_id).unwrap().expect("template");
        assert_eq!(fetched.task_name, "Take pills");

        let updated = store
            .update(
                &created.task_id,
                TemplateUpdate {
                    status: Some(TemplateStatus::Inactive),
                    ..TemplateUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, TemplateStatus::Inactive);
        assert!(store.list_active().unwrap().is_empty());

        store.delete(&created.task_id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.delete(&created.task_id),
            Err(Error::TemplateNotFound(_))
        ));
    }

    #[test]
    fn update_validates_frequency_due_pair() {
        let dir = tempdir().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init().unwrap();
        let store = FileTemplateStore::new(storage);

        let created = store.create(draft(Frequency::Daily, "Morning")).unwrap();

        // Moving to Weekly without a weekday due is rejected.
        let err = store.update(
            &created.task_id,
            TemplateUpdate {
                frequency: Some(Frequency::Weekly),
                ..TemplateUpdate::default()
            },
        );
        assert!(err.is_err());

        let updated = store
            .update(
                &created.task_id,
                TemplateUpdate {
                    frequency: Some(Frequency::Weekly),
                    due: Some("sunday".to_string()),
                    ..TemplateUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.frequency, Frequency::Weekly);
        assert_eq!(updated.due, "Sunday");
    }
}
