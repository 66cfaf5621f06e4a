// src/provider/mod.rs

//! Read-side listing of builds.
//!
//! [`BuildRecordProvider`] merges the two sources of build state into one
//! paged listing:
//! - the live task set (tasks still `New` or `Building`)
//! - the record store (finished builds)
//!
//! The interleaved listing keeps one global sort order across both sources,
//! so a page can contain a mix of running and finished builds. Because
//! completion persists the record before evicting the live entry, a build
//! may momentarily exist in both sources; pages deduplicate by task id and
//! prefer the persisted record.

use std::collections::HashSet;
use std::sync::Arc;

use crate::coordinator::LiveBuildTasks;
use crate::datastore::{BuildRecordStore, PageInfo, RecordFilter, SortInfo};
use crate::model::TaskId;

pub mod view;

pub use view::{BuildRecordView, Page};

pub struct BuildRecordProvider {
    live: LiveBuildTasks,
    store: Arc<dyn BuildRecordStore>,
}

impl BuildRecordProvider {
    pub fn new(live: LiveBuildTasks, store: Arc<dyn BuildRecordStore>) -> Self {
        Self { live, store }
    }

    /// Single persisted record by id.
    pub fn completed(&self, id: TaskId) -> Option<BuildRecordView> {
        self.store.query_by_id(id).map(|r| BuildRecordView::from_record(&r))
    }

    /// Page over the in-flight tasks only.
    pub fn running(
        &self,
        filter: &RecordFilter,
        sort: &SortInfo,
        page_index: usize,
        page_size: usize,
    ) -> Page<BuildRecordView> {
        if page_size == 0 {
            return Page::empty(page_index, page_size);
        }

        let mut views = self.running_views(filter, sort);
        let total_pages = views.len().div_ceil(page_size);
        let content: Vec<BuildRecordView> = views
            .drain(..)
            .skip(page_index * page_size)
            .take(page_size)
            .collect();

        Page {
            page_index,
            page_size,
            total_pages,
            content,
        }
    }

    /// Page over running and finished builds merged into one sort order.
    ///
    /// Running tasks have no stable store offsets, so the page is computed
    /// by replaying every page up to the requested one: each replayed page
    /// consumes the running entries it displays, and the store is queried at
    /// an offset shifted down by the number of running entries consumed so
    /// far. The final replayed page is the answer.
    pub fn running_and_completed(
        &self,
        filter: &RecordFilter,
        sort: &SortInfo,
        page_index: usize,
        page_size: usize,
    ) -> Page<BuildRecordView> {
        if page_size == 0 {
            return Page::empty(page_index, page_size);
        }

        let mut running = self.running_views(filter, sort);
        let total_running = running.len();
        let total_completed = self.store.count(filter);

        let mut content: Vec<BuildRecordView> = Vec::new();
        for i in 0..=page_index {
            let consumed = total_running - running.len();
            let store_offset = (i * page_size).saturating_sub(consumed);
            let records = self.store.query_with_predicates(
                filter,
                sort,
                PageInfo {
                    offset: store_offset,
                    size: page_size,
                },
            );
            let record_ids: HashSet<TaskId> = records.iter().map(|r| r.id).collect();

            // A build being finalized can appear in both sources; the
            // persisted record wins.
            running.retain(|v| !record_ids.contains(&v.id));

            let mut candidates: Vec<BuildRecordView> = running
                .iter()
                .take(page_size)
                .cloned()
                .chain(records.iter().map(BuildRecordView::from_record))
                .collect();
            view::sort_views(&mut candidates, sort);
            candidates.truncate(page_size);

            let shown: HashSet<TaskId> = candidates
                .iter()
                .filter(|v| v.in_progress)
                .map(|v| v.id)
                .collect();
            running.retain(|v| !shown.contains(&v.id));

            content = candidates;
        }

        let total_pages = (total_running + total_completed).div_ceil(page_size);

        Page {
            page_index,
            page_size,
            total_pages,
            content,
        }
    }

    fn running_views(&self, filter: &RecordFilter, sort: &SortInfo) -> Vec<BuildRecordView> {
        let mut views: Vec<BuildRecordView> = self
            .live
            .snapshot()
            .iter()
            .filter(|t| filter.matches_task(t))
            .map(BuildRecordView::from_task)
            .collect();
        view::sort_views(&mut views, sort);
        views
    }
}
