// src/datastore/memory.rs

//! In-memory implementations of the persistence collaborators.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::graph::TaskStatus;
use crate::model::{BuildConfigurationAudited, BuildRecord, ConfigurationId, IdRev, TaskId};

use super::{BuildRecordStore, ConfigurationSource, PageInfo, RecordFilter, SortInfo};

/// Configuration lookup backed by a plain map.
#[derive(Debug, Default)]
pub struct InMemoryConfigurationSource {
    configurations: HashMap<ConfigurationId, BuildConfigurationAudited>,
}

impl InMemoryConfigurationSource {
    pub fn new(configurations: impl IntoIterator<Item = BuildConfigurationAudited>) -> Self {
        Self {
            configurations: configurations
                .into_iter()
                .map(|c| (c.id(), c))
                .collect(),
        }
    }
}

impl ConfigurationSource for InMemoryConfigurationSource {
    fn configuration(&self, id: ConfigurationId) -> Option<BuildConfigurationAudited> {
        self.configurations.get(&id).cloned()
    }

    fn dependents_of(&self, id: ConfigurationId) -> Vec<ConfigurationId> {
        self.configurations
            .values()
            .filter(|c| c.configuration.dependencies.contains(&id))
            .map(|c| c.id())
            .collect()
    }
}

/// Append-only record store backed by a mutex-guarded vector.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Vec<BuildRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<BuildRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<BuildRecord>> {
        self.records.lock().expect("record store lock poisoned")
    }
}

impl BuildRecordStore for InMemoryRecordStore {
    fn query_by_id(&self, id: TaskId) -> Option<BuildRecord> {
        self.lock().iter().find(|r| r.id == id).cloned()
    }

    fn has_successful(&self, id_rev: IdRev) -> bool {
        self.lock()
            .iter()
            .any(|r| r.id_rev == id_rev && r.status == TaskStatus::Success)
    }

    fn query_with_predicates(
        &self,
        filter: &RecordFilter,
        sort: &SortInfo,
        page: PageInfo,
    ) -> Vec<BuildRecord> {
        let mut matching: Vec<BuildRecord> = self
            .lock()
            .iter()
            .filter(|r| filter.matches_record(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| sort.compare((a.submit_time, a.id), (b.submit_time, b.id)));
        matching
            .into_iter()
            .skip(page.offset)
            .take(page.size)
            .collect()
    }

    fn count(&self, filter: &RecordFilter) -> usize {
        self.lock().iter().filter(|r| filter.matches_record(r)).count()
    }

    fn store_completed(&self, record: BuildRecord) {
        self.lock().push(record);
    }
}
