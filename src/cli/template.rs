//! hearth template command implementations.

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::template::{
    FileTemplateStore, RecurringTemplate, TemplateDraft, TemplateStatus, TemplateUpdate,
};

pub struct AddOptions {
    pub name: String,
    pub assignee: String,
    pub frequency: String,
    pub due: String,
    pub overdue_when: String,
    pub category: String,
    pub inactive: bool,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub all: bool,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct UpdateOptions {
    pub id: String,
    pub name: Option<String>,
    pub assignee: Option<String>,
    pub frequency: Option<String>,
    pub due: Option<String>,
    pub overdue_when: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct RemoveOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_add(opts: AddOptions) -> Result<()> {
    let (storage, _config) = super::open_context(opts.data_dir);
    storage.init()?;
    let store = FileTemplateStore::new(storage);

    let draft = TemplateDraft {
        task_name: opts.name,
        assigned_to: opts.assignee,
        frequency: opts.frequency.parse()?,
        due: opts.due,
        overdue_when: opts.overdue_when.parse()?,
        category: opts.category.parse()?,
        status: if opts.inactive {
            TemplateStatus::Inactive
        } else {
            TemplateStatus::Active
        },
    };
    let template = store.create(draft)?;

    let mut human = HumanOutput::new(format!("Created template '{}'", template.task_name));
    push_template_summary(&mut human, &template);
    human.push_next_step("hearth generate");

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "template add",
        &template,
        Some(&human),
    )
}

pub fn run_list(opts: ListOptions) -> Result<()> {
    let (storage, _config) = super::open_context(opts.data_dir);
    let store = FileTemplateStore::new(storage);

    let mut templates = store.list()?;
    if !opts.all {
        templates.retain(|t| t.status == TemplateStatus::Active);
    }

    let mut human = HumanOutput::new(format!(
        "{} template{}",
        templates.len(),
        if templates.len() == 1 { "" } else { "s" }
    ));
    for template in &templates {
        human.push_detail(format!(
            "{} - {} ({}, due {}, {}) [{}]",
            template.task_id,
            template.task_name,
            template.frequency,
            template.due,
            template.status,
            template.category,
        ));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "template list",
        &templates,
        Some(&human),
    )
}

pub fn run_update(opts: UpdateOptions) -> Result<()> {
    let (storage, _config) = super::open_context(opts.data_dir);
    let store = FileTemplateStore::new(storage);

    let changes = TemplateUpdate {
        task_name: opts.name,
        assigned_to: opts.assignee,
        frequency: opts.frequency.as_deref().map(str::parse).transpose()?,
        due: opts.due,
        overdue_when: opts.overdue_when.as_deref().map(str::parse).transpose()?,
        category: opts.category.as_deref().map(str::parse).transpose()?,
        status: opts.status.as_deref().map(str::parse).transpose()?,
    };
    let template = store.update(&opts.id, changes)?;

    let mut human = HumanOutput::new(format!("Updated template '{}'", template.task_name));
    push_template_summary(&mut human, &template);

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "template update",
        &template,
        Some(&human),
    )
}

pub fn run_remove(opts: RemoveOptions) -> Result<()> {
    let (storage, _config) = super::open_context(opts.data_dir);
    let store = FileTemplateStore::new(storage);

    let removed = store.delete(&opts.id)?;

    let mut human = HumanOutput::new(format!("Removed template '{}'", removed.task_name));
    human.push_summary("id", removed.task_id.clone());
    human.push_detail("already-generated task instances are kept".to_string());

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "template remove",
        &removed,
        Some(&human),
    )
}

fn push_template_summary(human: &mut HumanOutput, template: &RecurringTemplate) {
    human.push_summary("id", template.task_id.clone());
    human.push_summary("assignee", template.assigned_to.clone());
    human.push_summary(
        "schedule",
        format!("{}, due {}", template.frequency, template.due),
    );
    human.push_summary("overdue after", template.overdue_when.to_string());
    human.push_summary("status", template.status.to_string());
}
