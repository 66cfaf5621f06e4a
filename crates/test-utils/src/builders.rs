#![allow(dead_code)]

use std::collections::BTreeMap;

use buildcoord::model::{
    BuildConfiguration, BuildConfigurationAudited, ConfigurationId, RevisionId,
};

/// Builder for audited build configurations to simplify test setup.
pub struct ConfigurationBuilder {
    configuration: BuildConfiguration,
    revision: RevisionId,
}

impl ConfigurationBuilder {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            configuration: BuildConfiguration {
                id: ConfigurationId(id),
                name: name.to_string(),
                scm_url: format!("https://git.example.com/{name}.git"),
                scm_revision: "main".to_string(),
                build_script: "mvn clean deploy".to_string(),
                generic_parameters: BTreeMap::new(),
                dependencies: vec![],
            },
            revision: RevisionId(1),
        }
    }

    pub fn depends_on(mut self, id: u32) -> Self {
        self.configuration.dependencies.push(ConfigurationId(id));
        self
    }

    pub fn scm_revision(mut self, revision: &str) -> Self {
        self.configuration.scm_revision = revision.to_string();
        self
    }

    pub fn build_script(mut self, script: &str) -> Self {
        self.configuration.build_script = script.to_string();
        self
    }

    pub fn parameter(mut self, key: &str, value: &str) -> Self {
        self.configuration
            .generic_parameters
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn revision(mut self, revision: u32) -> Self {
        self.revision = RevisionId(revision);
        self
    }

    pub fn build(self) -> BuildConfigurationAudited {
        BuildConfigurationAudited::new(self.configuration, self.revision)
    }
}
