// src/datastore/mod.rs

//! Persistence collaborator interfaces.
//!
//! The coordinator never talks to a database directly; it is handed a
//! [`BuildRecordStore`] for finished builds and a [`ConfigurationSource`]
//! for dependency resolution. [`memory`] provides in-memory implementations
//! for tests and embedded use.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::BuildTask;
use crate::model::{BuildConfigurationAudited, BuildRecord, ConfigurationId, IdRev, TaskId};

pub mod memory;

pub use memory::{InMemoryConfigurationSource, InMemoryRecordStore};

/// Lookup of stored build configurations, used to resolve transitive
/// dependencies and dependents at trigger time.
pub trait ConfigurationSource: Send + Sync {
    fn configuration(&self, id: ConfigurationId) -> Option<BuildConfigurationAudited>;

    /// Ids of configurations that directly depend on `id`.
    fn dependents_of(&self, id: ConfigurationId) -> Vec<ConfigurationId>;
}

/// Window into a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub offset: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    SubmitTime,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Sort order for build listings; ties on submit time break by task id so
/// the order is total and pagination is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortInfo {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortInfo {
    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    /// Compare two entries by their sort keys.
    pub fn compare(
        &self,
        a: (DateTime<Utc>, TaskId),
        b: (DateTime<Utc>, TaskId),
    ) -> Ordering {
        let ord = match self.field {
            SortField::SubmitTime => a.0.cmp(&b.0).then(a.1.cmp(&b.1)),
            SortField::Id => a.1.cmp(&b.1),
        };
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// Predicate over build records and live tasks.
///
/// Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub configuration_id: Option<ConfigurationId>,
    pub user: Option<String>,
    pub temporary_build: Option<bool>,
}

impl RecordFilter {
    fn matches(&self, configuration_id: ConfigurationId, user: &str, temporary: bool) -> bool {
        if let Some(id) = self.configuration_id {
            if id != configuration_id {
                return false;
            }
        }
        if let Some(ref expected) = self.user {
            if expected != user {
                return false;
            }
        }
        if let Some(expected) = self.temporary_build {
            if expected != temporary {
                return false;
            }
        }
        true
    }

    pub fn matches_record(&self, record: &BuildRecord) -> bool {
        self.matches(
            record.id_rev.configuration_id,
            &record.user,
            record.temporary_build,
        )
    }

    pub fn matches_task(&self, task: &BuildTask) -> bool {
        self.matches(
            task.configuration.id(),
            &task.user,
            task.options.temporary_build,
        )
    }
}

/// Append-only store of finished builds.
pub trait BuildRecordStore: Send + Sync {
    fn query_by_id(&self, id: TaskId) -> Option<BuildRecord>;

    /// Whether a successful record exists for this configuration revision.
    /// Consulted at trigger time to skip builds that are already done.
    fn has_successful(&self, id_rev: IdRev) -> bool;

    /// Records matching `filter`, ordered by `sort`, windowed by `page`.
    fn query_with_predicates(
        &self,
        filter: &RecordFilter,
        sort: &SortInfo,
        page: PageInfo,
    ) -> Vec<BuildRecord>;

    fn count(&self, filter: &RecordFilter) -> usize;

    /// Append the record of a finished build.
    fn store_completed(&self, record: BuildRecord);
}
