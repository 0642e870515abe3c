//! hearth sweep command implementation.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::instance::FileTaskStore;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::sweep::StatusSweep;

pub struct SweepOptions {
    pub now: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run(opts: SweepOptions) -> Result<()> {
    let (storage, config) = super::open_context(opts.data_dir);
    storage.init()?;

    let now = match opts.now.as_deref() {
        Some(raw) => raw
            .parse::<DateTime<Utc>>()
            .map_err(|_| Error::InvalidArgument(format!("invalid --now instant '{raw}'")))?,
        None => Utc::now(),
    };

    let tasks = FileTaskStore::new(storage);
    let sweep = StatusSweep::new(&tasks, config.household_tz(), config.sweep.window_days);
    let report = sweep.sweep_statuses(now)?;

    let total = report.pending_to_overdue + report.overdue_to_cleared;
    let header = if total == 0 {
        "No tasks required status updates".to_string()
    } else {
        format!(
            "Updated {} task{}: {} pending to overdue, {} overdue to cleared",
            total,
            if total == 1 { "" } else { "s" },
            report.pending_to_overdue,
            report.overdue_to_cleared
        )
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("dates scanned", report.dates_scanned.to_string());
    if report.dates_failed > 0 {
        human.push_warning(format!("{} date(s) failed to scan", report.dates_failed));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "sweep",
        &report,
        Some(&human),
    )
}
