//! # Projects Bot
//!
//! Community project registry. Members submit projects for moderator
//! approval; leaders manage who holds which capability on their projects; each
//! capability is mirrored onto a directory role in every realm it is used in.
//!
//! ## Modules
//!
//! - [`registry`]: Project records, search and capability management
//! - [`workflow`]: Registration and rename proposals and their decisions
//! - [`commands`]: Command handlers and replies
//! - [`directory`]: The platform directory seam and an in-memory implementation
//! - [`notifier`]: User notifications with channel fallback
//! - [`config`]: Settings, realm configuration and dependency wiring
//! - [`errors`]: Error types for registry operations

pub mod commands;
pub mod config;
pub mod directory;
pub mod errors;
pub mod notifier;
pub mod registry;
pub mod telemetry;
pub mod workflow;

pub use commands::{Commands, Reply};
pub use config::{ConfigError, Dependencies, RealmsConfig, Settings};
pub use errors::RegistryError;

use projects_repository::StoreError;
use thiserror::Error;

/// Errors that can occur while starting the registry.
#[derive(Error, Debug)]
pub enum StartupError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The record store could not be opened or read.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
