// src/model/options.rs

use serde::{Deserialize, Serialize};

use crate::errors::{CoordinatorError, Result};

/// Boolean per-trigger build options.
///
/// Defaults match the common case: a persistent build that also builds its
/// dependencies when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Build result is short-lived and garbage-collected later.
    pub temporary_build: bool,
    /// Rebuild even if a successful record for the id+revision already exists.
    pub force_rebuild: bool,
    /// Pull the transitive dependency configurations into the build set.
    pub build_dependencies: bool,
    /// Also rebuild everything that transitively depends on the target.
    pub build_dependents: bool,
    /// Align artifact timestamps; only meaningful for temporary builds.
    pub timestamp_alignment: bool,
    /// Keep the build environment around after a failure, for debugging.
    pub keep_pod_on_failure: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            temporary_build: false,
            force_rebuild: false,
            build_dependencies: true,
            build_dependents: false,
            timestamp_alignment: false,
            keep_pod_on_failure: false,
        }
    }
}

impl BuildOptions {
    /// Reject conflicting option combinations before any task is created.
    pub fn validate(&self) -> Result<()> {
        if self.timestamp_alignment && !self.temporary_build {
            return Err(CoordinatorError::InvalidBuildOptions(
                "timestamp alignment can only be used with temporary builds".to_string(),
            ));
        }
        Ok(())
    }
}
