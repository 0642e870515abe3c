//! hearth generate command implementation.

use std::path::PathBuf;

use crate::error::Result;
use crate::generate::GenerationService;
use crate::instance::FileTaskStore;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::template::FileTemplateStore;

pub struct GenerateOptions {
    pub date: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run(opts: GenerateOptions) -> Result<()> {
    let (storage, config) = super::open_context(opts.data_dir);
    storage.init()?;
    let tz = config.household_tz();

    // When scheduled at night, "today" must be the household's today,
    // which can differ from the UTC date.
    let date = match opts.date {
        Some(date) => date,
        None => chrono::Utc::now()
            .with_timezone(&tz)
            .date_naive()
            .format("%Y-%m-%d")
            .to_string(),
    };

    let templates = FileTemplateStore::new(storage.clone());
    let tasks = FileTaskStore::new(storage);
    let service = GenerationService::new(&templates, &tasks, tz);
    let generated = service.generate_daily_tasks_for_date(&date)?;

    let mut human = HumanOutput::new(format!(
        "Generated {} task{} for {}",
        generated.len(),
        if generated.len() == 1 { "" } else { "s" },
        date
    ));
    human.push_summary("date", date.clone());
    human.push_summary("tasks", generated.len().to_string());
    for instance in &generated {
        human.push_detail(format!(
            "{} - {} ({}, overdue at {})",
            instance.task_id, instance.task_name, instance.due_time, instance.overdue_at
        ));
    }
    human.push_next_step(format!("hearth task list {date}"));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "generate",
        &generated,
        Some(&human),
    )
}
