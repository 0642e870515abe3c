//! hearth task command implementations.

use std::path::PathBuf;

use chrono::Utc;

use crate::complete::CompletionController;
use crate::error::Result;
use crate::generate::parse_civil_date;
use crate::instance::{DailyTaskInstance, FileTaskStore};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskStore;

pub struct ListOptions {
    pub date: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct CompleteOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct UncompleteOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_list(opts: ListOptions) -> Result<()> {
    let (storage, _config) = super::open_context(opts.data_dir);
    let date = parse_civil_date(&opts.date)?.format("%Y-%m-%d").to_string();

    let tasks = FileTaskStore::new(storage);
    let instances = tasks.list_by_date(&date)?;

    let mut human = HumanOutput::new(format!(
        "{} task{} on {}",
        instances.len(),
        if instances.len() == 1 { "" } else { "s" },
        date
    ));
    for instance in &instances {
        human.push_detail(format!(
            "{} - {} ({}, {})",
            instance.task_id, instance.task_name, instance.due_time, instance.status
        ));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task list",
        &instances,
        Some(&human),
    )
}

pub fn run_complete(opts: CompleteOptions) -> Result<()> {
    let (storage, _config) = super::open_context(opts.data_dir);
    let tasks = FileTaskStore::new(storage);
    let controller = CompletionController::new(&tasks);

    let updated = controller.complete_task(&opts.id, Utc::now())?;
    emit_outcome(opts.json, opts.quiet, "task complete", &opts.id, updated)
}

pub fn run_uncomplete(opts: UncompleteOptions) -> Result<()> {
    let (storage, _config) = super::open_context(opts.data_dir);
    let tasks = FileTaskStore::new(storage);
    let controller = CompletionController::new(&tasks);

    let updated = controller.uncomplete_task(&opts.id)?;
    emit_outcome(opts.json, opts.quiet, "task uncomplete", &opts.id, updated)
}

fn emit_outcome(
    json: bool,
    quiet: bool,
    command: &str,
    id: &str,
    updated: Option<DailyTaskInstance>,
) -> Result<()> {
    let options = OutputOptions { json, quiet };

    match updated {
        Some(instance) => {
            let mut human = HumanOutput::new(format!(
                "{} is now {}",
                instance.task_name, instance.status
            ));
            human.push_summary("id", instance.task_id.clone());
            human.push_summary("date", instance.date.clone());
            if let Some(completed_at) = instance.completed_at {
                human.push_summary("completed at", completed_at.to_rfc3339());
            }
            emit_success(options, command, &instance, Some(&human))
        }
        None => {
            let mut human = HumanOutput::new(format!("No task found with id {id}"));
            human.push_next_step("hearth task list <date>");
            emit_success(options, command, &serde_json::json!(null), Some(&human))
        }
    }
}
