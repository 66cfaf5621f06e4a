// src/config/mod.rs

//! Service configuration, loaded from TOML.

pub mod loader;
pub mod model;

pub use loader::{load_config, parse_config};
pub use model::{CoordinatorSection, MonitorSection, SystemConfig};
