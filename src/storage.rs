//! Storage layer for hearth
//!
//! All state lives in a single data directory:
//!
//! ```text
//! <data>/
//!   config.toml                 # household configuration
//!   templates.json              # registry of recurring templates
//!   tasks/
//!     <YYYY-MM-DD>.jsonl        # daily task instances, one partition per date
//!     <YYYY-MM-DD>.jsonl.lock   # per-partition write lock
//! ```
//!
//! Task instances are partitioned by the civil date they were generated for;
//! all lookups are either "everything for this date" (one partition read) or
//! "find this id" (a scan across partitions).

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Name of the tasks partition directory
pub const TASKS_DIR: &str = "tasks";

/// Name of the template registry file
pub const TEMPLATES_FILE: &str = "templates.json";

/// Name of the configuration file
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "HEARTH_DATA";

/// Storage manager for hearth state
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    /// Create a storage manager rooted at the given data directory
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Resolve the data directory: explicit flag, then `HEARTH_DATA`,
    /// then the platform data dir.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        if let Some(dir) = explicit {
            return Self::new(dir);
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                return Self::new(PathBuf::from(trimmed));
            }
        }
        let fallback = directories::ProjectDirs::from("", "", "hearth")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".hearth"));
        Self::new(fallback)
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    /// Root data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the configuration file
    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Path to the recurring template registry
    pub fn templates_file(&self) -> PathBuf {
        self.data_dir.join(TEMPLATES_FILE)
    }

    /// Path to the tasks partition directory
    pub fn tasks_dir(&self) -> PathBuf {
        self.data_dir.join(TASKS_DIR)
    }

    /// Path to the task partition for a civil date (YYYY-MM-DD)
    pub fn task_partition(&self, date: &str) -> PathBuf {
        self.tasks_dir().join(format!("{date}.jsonl"))
    }

    /// Initialize the data directory structure
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(self.tasks_dir())?;
        Ok(())
    }

    /// Check if the data directory has been initialized
    pub fn is_initialized(&self) -> bool {
        self.tasks_dir().exists()
    }

    /// Civil dates that have a task partition on disk, ascending
    pub fn partition_dates(&self) -> Result<Vec<String>> {
        let dir = self.tasks_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut dates = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(date) = name.strip_suffix(".jsonl") {
                dates.push(date.to_string());
            }
        }
        dates.sort();
        Ok(dates)
    }

    // =========================================================================
    // File I/O helpers (atomic writes for safety)
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        crate::lock::write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Read all records from a JSONL file; missing file reads as empty
    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)?;
            records.push(record);
        }

        Ok(records)
    }

    /// Append a record to a JSONL file.
    ///
    /// Not atomic on its own; callers hold the partition's `FileLock`.
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", json)?;
        file.sync_all()?;

        Ok(())
    }

    /// Replace a JSONL file's contents atomically
    pub fn write_jsonl<T: Serialize>(&self, path: &Path, records: &[T]) -> Result<()> {
        let mut buffer = Vec::new();
        for record in records {
            let json = serde_json::to_string(record)?;
            buffer.extend_from_slice(json.as_bytes());
            buffer.push(b'\n');
        }
        crate::lock::write_atomic(path, &buffer)
    }
}

/// Lock path for a file mutated by multiple processes
pub fn lock_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.lock", path.display()))
}
