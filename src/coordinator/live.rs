// src/coordinator/live.rs

//! Live in-flight task set.
//!
//! An explicitly-owned concurrent store handed to the coordinator at
//! construction: created at service start, drained at shutdown. It is the
//! query surface behind `get_submitted_build_tasks` and one of the two
//! sources merged by interleaved paging, so it must stay safe to snapshot
//! while trigger requests insert and completion processing evicts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::graph::BuildTask;
use crate::model::{ConfigurationId, TaskId};

#[derive(Debug, Clone, Default)]
pub struct LiveBuildTasks {
    inner: Arc<Mutex<HashMap<TaskId, BuildTask>>>,
}

impl LiveBuildTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a whole set of new tasks, rejecting the set atomically when a
    /// member's configuration is already building. Returns the conflicting
    /// configuration id on rejection.
    pub fn insert_new_set(&self, tasks: &[BuildTask]) -> Result<(), ConfigurationId> {
        let mut guard = self.lock();
        for task in tasks {
            let id = task.configuration.id();
            if guard.values().any(|t| t.configuration.id() == id) {
                return Err(id);
            }
        }
        for task in tasks {
            guard.insert(task.id, task.clone());
        }
        Ok(())
    }

    /// Mirror a dispatch: mark the live view of a task as Building.
    pub fn mark_building(&self, id: TaskId, at: DateTime<Utc>) {
        if let Some(task) = self.lock().get_mut(&id) {
            // The scheduler already validated the transition on its copy.
            let _ = task.set_building(at);
        }
    }

    pub fn remove(&self, id: TaskId) -> Option<BuildTask> {
        self.lock().remove(&id)
    }

    /// Point-in-time copy of all live tasks, safe to iterate while the set
    /// keeps changing.
    pub fn snapshot(&self) -> Vec<BuildTask> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return everything; used at shutdown.
    pub fn drain(&self) -> Vec<BuildTask> {
        self.lock().drain().map(|(_, t)| t).collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, BuildTask>> {
        self.inner.lock().expect("live task set lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BuildConfiguration, BuildConfigurationAudited, BuildOptions, BuildSetId, RevisionId,
    };

    fn task(task_id: u64, configuration_id: u32) -> BuildTask {
        let configuration = BuildConfiguration {
            id: ConfigurationId(configuration_id),
            name: format!("cfg-{configuration_id}"),
            scm_url: "https://git.example.com/x.git".to_string(),
            scm_revision: "main".to_string(),
            build_script: "make".to_string(),
            generic_parameters: Default::default(),
            dependencies: Vec::new(),
        };
        BuildTask::new(
            TaskId(task_id),
            BuildSetId(1),
            BuildConfigurationAudited::new(configuration, RevisionId(1)),
            "alice",
            BuildOptions::default(),
            Utc::now(),
        )
    }

    #[test]
    fn insert_is_atomic_on_conflict() {
        let live = LiveBuildTasks::new();
        live.insert_new_set(&[task(1, 10)]).unwrap();

        // Second set shares configuration 10; nothing from it may land.
        let err = live.insert_new_set(&[task(2, 11), task(3, 10)]).unwrap_err();
        assert_eq!(err, ConfigurationId(10));
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let live = LiveBuildTasks::new();
        live.insert_new_set(&[task(1, 10)]).unwrap();

        let snapshot = live.snapshot();
        live.remove(TaskId(1));

        assert_eq!(snapshot.len(), 1);
        assert!(live.is_empty());
    }
}
