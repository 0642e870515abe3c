//! hearth - Household task lifecycle library
//!
//! This library provides the core functionality for the hearth CLI tool:
//! recurring chore and medication templates that materialize into dated task
//! instances with a time-bounded lifecycle.
//!
//! # Core Concepts
//!
//! - **Templates**: recurring rules (Daily/Weekly/Monthly) for when a task
//!   should recur
//! - **Instances**: a single day's materialized occurrence of a template
//! - **Generation**: idempotent once-per-date materialization
//! - **Sweep**: periodic batch advancing Pending → Overdue → Cleared
//! - **Completion**: user-driven transitions that the sweep never overrides
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `schedule`: Due/overdue/clear timestamp calculation
//! - `template`: Recurring templates, frequency matching, registry store
//! - `instance`: Daily task instances and the date-partitioned store
//! - `store`: Store traits and in-memory implementations
//! - `generate`: Daily task generation service
//! - `sweep`: Periodic status sweep
//! - `complete`: User-driven completion controller
//! - `storage`: Data directory layout and file I/O
//! - `lock`: File locking and atomic writes for concurrency safety

pub mod cli;
pub mod complete;
pub mod config;
pub mod error;
pub mod generate;
pub mod instance;
pub mod lock;
pub mod output;
pub mod schedule;
pub mod storage;
pub mod store;
pub mod sweep;
pub mod template;

pub use error::{Error, Result};
