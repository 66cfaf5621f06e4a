// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::model::{ConfigurationId, IdRev, TaskId};

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Invalid build options: {0}")]
    InvalidBuildOptions(String),

    #[error("Invalid build request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Build configuration {0} is already building")]
    BuildConflict(ConfigurationId),

    #[error("Configuration {0} already has a successful build; rebuild not required")]
    NoRebuildRequired(IdRev),

    #[error("Cycle detected in build dependencies at configuration {0}")]
    DependencyCycle(String),

    #[error("Build configuration not found: {0}")]
    ConfigurationNotFound(ConfigurationId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CoordinatorError>;
