//! hearth init command implementation
//!
//! Creates the data directory and default configuration.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct InitOptions {
    pub timezone: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitReport {
    data_dir: PathBuf,
    timezone: String,
    created_config: bool,
}

pub fn run(opts: InitOptions) -> Result<()> {
    let storage = crate::storage::Storage::resolve(opts.data_dir);
    storage.init()?;

    let config_path = storage.config_file();
    let created_config = if config_path.exists() {
        if opts.timezone.is_some() {
            return Err(Error::InvalidArgument(
                "config.toml already exists; edit its timezone directly".to_string(),
            ));
        }
        false
    } else {
        let mut config = Config::default();
        if let Some(timezone) = opts.timezone {
            let trimmed = timezone.trim();
            if trimmed.parse::<chrono_tz::Tz>().is_err() {
                return Err(Error::InvalidConfig(format!(
                    "timezone: unknown IANA timezone '{trimmed}'"
                )));
            }
            config.timezone = trimmed.to_string();
        }
        config.save(&config_path)?;
        true
    };

    let config = Config::load_from(&storage);
    let report = InitReport {
        data_dir: storage.data_dir().to_path_buf(),
        timezone: config.timezone.clone(),
        created_config,
    };

    let header = if created_config {
        "hearth init: initialized data directory"
    } else {
        "hearth init: nothing to do"
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("data dir", storage.data_dir().display().to_string());
    human.push_summary("timezone", config.timezone);
    human.push_next_step("hearth template add --name \"Take pills\" --assignee <member> --frequency daily --due Morning".to_string());
    human.push_next_step("hearth generate".to_string());

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "init",
        &report,
        Some(&human),
    )
}
