// src/model/configuration.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::{ConfigurationId, IdRev, RevisionId};

/// A stored build configuration: what to check out and how to build it.
///
/// `dependencies` lists the configurations whose builds must succeed before
/// this one may start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    pub id: ConfigurationId,
    pub name: String,
    pub scm_url: String,
    pub scm_revision: String,
    pub build_script: String,
    pub generic_parameters: BTreeMap<String, String>,
    pub dependencies: Vec<ConfigurationId>,
}

/// A revision-pinned snapshot of a [`BuildConfiguration`].
///
/// Builds always run against an audited revision so that the record of a
/// finished build points at the exact configuration content it used, even if
/// the stored configuration is edited later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfigurationAudited {
    pub configuration: BuildConfiguration,
    pub revision: RevisionId,
}

impl BuildConfigurationAudited {
    pub fn new(configuration: BuildConfiguration, revision: RevisionId) -> Self {
        Self {
            configuration,
            revision,
        }
    }

    pub fn id(&self) -> ConfigurationId {
        self.configuration.id
    }

    pub fn id_rev(&self) -> IdRev {
        IdRev {
            configuration_id: self.configuration.id,
            revision: self.revision,
        }
    }

    pub fn name(&self) -> &str {
        &self.configuration.name
    }
}
