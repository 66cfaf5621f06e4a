// src/model/mod.rs

//! Domain value types shared across the coordinator.
//!
//! - [`ids`] holds the identifier newtypes.
//! - [`configuration`] describes build configurations and their audited
//!   (revision-pinned) form.
//! - [`options`] holds per-trigger boolean build options and their validation.
//! - [`overrides`] holds transient per-trigger configuration overrides.
//! - [`record`] is the persisted form of a finished build.

pub mod configuration;
pub mod ids;
pub mod options;
pub mod overrides;
pub mod record;

pub use configuration::{BuildConfiguration, BuildConfigurationAudited};
pub use ids::{BuildSetId, ConfigurationId, IdRev, RevisionId, TaskId};
pub use options::BuildOptions;
pub use overrides::BuildOverrides;
pub use record::BuildRecord;
