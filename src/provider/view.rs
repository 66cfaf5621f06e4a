// src/provider/view.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::{BuildTask, TaskStatus};
use crate::model::{BuildRecord, IdRev, TaskId};

/// Unified listing entry covering both in-flight tasks and persisted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecordView {
    pub id: TaskId,
    pub id_rev: IdRev,
    pub configuration_name: String,
    pub status: TaskStatus,
    pub submit_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub user: String,
    pub temporary_build: bool,
    /// True when sourced from the live task set rather than the store.
    pub in_progress: bool,
    pub failure_reason: Option<String>,
}

impl BuildRecordView {
    pub fn from_task(task: &BuildTask) -> Self {
        Self {
            id: task.id,
            id_rev: task.id_rev(),
            configuration_name: task.configuration_name().to_string(),
            status: task.status,
            submit_time: task.submit_time,
            start_time: task.start_time,
            end_time: task.end_time,
            user: task.user.clone(),
            temporary_build: task.options.temporary_build,
            in_progress: true,
            failure_reason: task.failure_reason.clone(),
        }
    }

    pub fn from_record(record: &BuildRecord) -> Self {
        Self {
            id: record.id,
            id_rev: record.id_rev,
            configuration_name: record.configuration_name.clone(),
            status: record.status,
            submit_time: record.submit_time,
            start_time: record.start_time,
            end_time: record.end_time,
            user: record.user.clone(),
            temporary_build: record.temporary_build,
            in_progress: false,
            failure_reason: record.failure_reason.clone(),
        }
    }

    fn sort_key(&self) -> (DateTime<Utc>, TaskId) {
        (self.submit_time, self.id)
    }
}

/// One page of a listing, with enough shape information for clients to walk
/// the whole result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub content: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
            total_pages: 0,
            content: Vec::new(),
        }
    }
}

pub(super) fn sort_views(views: &mut [BuildRecordView], sort: &crate::datastore::SortInfo) {
    views.sort_by(|a, b| sort.compare(a.sort_key(), b.sort_key()));
}
