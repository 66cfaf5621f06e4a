// src/model/overrides.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::configuration::BuildConfiguration;

/// Transient per-trigger replacements for stored configuration fields.
///
/// Overrides customise a single build without editing the stored
/// configuration; they are applied at trigger time and never persisted on
/// their own. Only fields that are actually set replace the stored value —
/// everything else is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOverrides {
    pub scm_revision: Option<String>,
    pub build_script: Option<String>,
    pub generic_parameters: Option<BTreeMap<String, String>>,
}

impl BuildOverrides {
    pub fn is_empty(&self) -> bool {
        self.scm_revision.is_none()
            && self.build_script.is_none()
            && self.generic_parameters.is_none()
    }

    /// Apply the overrides on top of a stored configuration.
    pub fn apply(&self, mut configuration: BuildConfiguration) -> BuildConfiguration {
        if let Some(ref scm_revision) = self.scm_revision {
            configuration.scm_revision = scm_revision.clone();
        }
        if let Some(ref build_script) = self.build_script {
            configuration.build_script = build_script.clone();
        }
        if let Some(ref generic_parameters) = self.generic_parameters {
            configuration.generic_parameters = generic_parameters.clone();
        }
        configuration
    }
}
