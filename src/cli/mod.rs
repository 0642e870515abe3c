//! Command-line interface for hearth
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use clap::{Parser, Subcommand};

use crate::error::Result;

mod generate;
mod init;
mod sweep;
mod task;
mod template;

/// hearth - Household task tracker
///
/// Recurring chore and medication templates materialize into daily task
/// instances that move through Pending, Overdue, and Cleared, with
/// user-driven completion on top.
#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "HEARTH_DATA")]
    pub data_dir: Option<std::path::PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the data directory and default configuration
    Init {
        /// Household timezone (IANA name, e.g. America/New_York)
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Recurring template management
    #[command(subcommand)]
    Template(TemplateCommands),

    /// Generate daily task instances from active templates
    Generate {
        /// Target date (YYYY-MM-DD); defaults to today in the household timezone
        date: Option<String>,
    },

    /// Advance time-based statuses (Pending to Overdue, Overdue to Cleared)
    Sweep {
        /// Reference instant (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,
    },

    /// Daily task instance operations
    #[command(subcommand)]
    Task(TaskCommands),
}

/// Recurring template subcommands
#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Add a recurring template
    Add {
        /// Task name (30 characters or less)
        #[arg(long)]
        name: String,

        /// Family member this task is assigned to
        #[arg(long)]
        assignee: String,

        /// Frequency: daily, weekly, monthly
        #[arg(long)]
        frequency: String,

        /// Due value: Morning/Evening for daily, a weekday for weekly,
        /// a day of month (1-28) for monthly
        #[arg(long)]
        due: String,

        /// When the task turns overdue: Immediate, 1 hour, 6 hours,
        /// 1 day, 3 days, 7 days
        #[arg(long, default_value = "1 hour")]
        overdue_when: String,

        /// Category: medication, feeding, health, cleaning, other
        #[arg(long, default_value = "other")]
        category: String,

        /// Create the template as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// List templates
    List {
        /// Include inactive templates
        #[arg(long)]
        all: bool,
    },

    /// Update fields of a template
    Update {
        /// Template id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        assignee: Option<String>,

        #[arg(long)]
        frequency: Option<String>,

        #[arg(long)]
        due: Option<String>,

        #[arg(long)]
        overdue_when: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Template status: active, inactive
        #[arg(long)]
        status: Option<String>,
    },

    /// Remove a template (generated instances are kept)
    Remove {
        /// Template id
        id: String,
    },
}

/// Daily task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List task instances for a date
    List {
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Mark a task instance completed
    Complete {
        /// Task instance id
        id: String,
    },

    /// Revert a task instance to pending
    Uncomplete {
        /// Task instance id
        id: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init { timezone } => init::run(init::InitOptions {
                timezone,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Template(cmd) => match cmd {
                TemplateCommands::Add {
                    name,
                    assignee,
                    frequency,
                    due,
                    overdue_when,
                    category,
                    inactive,
                } => template::run_add(template::AddOptions {
                    name,
                    assignee,
                    frequency,
                    due,
                    overdue_when,
                    category,
                    inactive,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TemplateCommands::List { all } => template::run_list(template::ListOptions {
                    all,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TemplateCommands::Update {
                    id,
                    name,
                    assignee,
                    frequency,
                    due,
                    overdue_when,
                    category,
                    status,
                } => template::run_update(template::UpdateOptions {
                    id,
                    name,
                    assignee,
                    frequency,
                    due,
                    overdue_when,
                    category,
                    status,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TemplateCommands::Remove { id } => {
                    template::run_remove(template::RemoveOptions {
                        id,
                        data_dir: self.data_dir,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
            },
            Commands::Generate { date } => generate::run(generate::GenerateOptions {
                date,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Sweep { now } => sweep::run(sweep::SweepOptions {
                now,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::List { date } => task::run_list(task::ListOptions {
                    date,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Complete { id } => task::run_complete(task::CompleteOptions {
                    id,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Uncomplete { id } => {
                    task::run_uncomplete(task::UncompleteOptions {
                        id,
                        data_dir: self.data_dir,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
            },
        }
    }
}

/// Resolve storage and configuration shared by every command
pub(crate) fn open_context(
    data_dir: Option<std::path::PathBuf>,
) -> (crate::storage::Storage, crate::config::Config) {
    let storage = crate::storage::Storage::resolve(data_dir);
    let config = crate::config::Config::load_from(&storage);
    (storage, config)
}
