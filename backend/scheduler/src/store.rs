//! In-memory task store.
//!
//! Bounded by entry count and expiring each task `ttl` after its last state
//! change. Every key is written by the submitting handler once and afterwards
//! only by the worker that owns the job.

use std::time::Duration;

use cardscan_config::TaskSettings;
use cardscan_core::{ClassifiedFields, TaskId, TaskRecord, TaskState};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tracing::debug;

#[derive(Clone)]
pub struct TaskStore {
    cache: Cache<TaskId, TaskRecord>,
}

impl TaskStore {
    /// LRU eviction: a new record is always admitted and the least recently
    /// touched one makes room for it.
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
        }
    }

    pub fn from_settings(settings: &TaskSettings) -> Self {
        Self::new(settings.max_entries, Duration::from_secs(settings.ttl_secs))
    }

    pub fn insert_queued(&self, id: TaskId) -> TaskRecord {
        let record = TaskRecord::queued(id.clone());
        self.cache.insert(id, record.clone());
        record
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskRecord> {
        self.cache.get(id)
    }

    pub fn mark_processing(&self, id: &TaskId) {
        self.transition(id, TaskState::Processing);
    }

    pub fn complete(&self, id: &TaskId, fields: ClassifiedFields) {
        self.transition(id, TaskState::Completed { fields });
    }

    pub fn fail(&self, id: &TaskId, error: impl Into<String>) {
        self.transition(id, TaskState::Failed { error: error.into() });
    }

    pub fn remove(&self, id: &TaskId) {
        self.cache.invalidate(id);
    }

    /// Number of live entries, after flushing pending evictions.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A record evicted while its job was still running is recreated so the
    // final result is not lost.
    fn transition(&self, id: &TaskId, state: TaskState) {
        let mut record = self.cache.get(id).unwrap_or_else(|| {
            debug!(task_id = %id, "Task record evicted before update; recreating");
            TaskRecord::queued(id.clone())
        });
        record.transition(state);
        self.cache.insert(id.clone(), record);
    }
}
