//! Process-wide OCR worker pool.
//!
//! A bounded queue feeds a fixed number of long-lived workers. Submission never
//! waits: when the queue is full the caller gets [`SubmitError::QueueFull`] and
//! can shed the request.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use cardscan_config::TaskSettings;
use cardscan_core::TaskId;
use cardscan_understanding::DocumentPipeline;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::store::TaskStore;

/// One uploaded document waiting for OCR.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: TaskId,
    pub path: PathBuf,
}

impl Job {
    pub fn new(id: TaskId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("OCR queue is full; try again later")]
    QueueFull,

    #[error("OCR worker pool is shut down")]
    Closed,
}

pub struct WorkerPool {
    sender: RwLock<Option<mpsc::Sender<Job>>>,
    store: TaskStore,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `settings.workers` workers on the current runtime.
    pub fn start(pipeline: Arc<DocumentPipeline>, store: TaskStore, settings: &TaskSettings) -> Self {
        let worker_count = settings.workers.max(1);
        let (sender, receiver) = mpsc::channel(settings.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&receiver),
                    Arc::clone(&pipeline),
                    store.clone(),
                ))
            })
            .collect();

        info!(
            workers = worker_count,
            queue_capacity = settings.queue_capacity.max(1),
            engine = pipeline.recognizer_name(),
            "OCR worker pool started"
        );

        Self {
            sender: RwLock::new(Some(sender)),
            store,
            workers: Mutex::new(workers),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Register `job` as queued and hand it to the workers.
    pub fn submit(&self, job: Job) -> Result<TaskId, SubmitError> {
        let sender = self
            .sender
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or(SubmitError::Closed)?;

        let id = job.id.clone();
        self.store.insert_queued(id.clone());

        match sender.try_send(job) {
            Ok(()) => Ok(id),
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(task_id = %job.id, "OCR queue full; rejecting task");
                self.store.remove(&job.id);
                Err(SubmitError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                self.store.remove(&job.id);
                Err(SubmitError::Closed)
            }
        }
    }

    /// Jobs waiting in the queue, not counting ones already being processed.
    pub fn pending(&self) -> usize {
        self.sender
            .read()
            .ok()
            .and_then(|guard| {
                guard
                    .as_ref()
                    .map(|s| s.max_capacity() - s.capacity())
            })
            .unwrap_or(0)
    }

    /// Stop accepting jobs, let the workers drain the queue, and wait for them.
    pub async fn shutdown(&self) {
        if let Ok(mut guard) = self.sender.write() {
            guard.take();
        }

        let handles: Vec<_> = self.workers.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "OCR worker exited abnormally");
            }
        }
        info!("OCR worker pool stopped");
    }
}

async fn run_worker(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    pipeline: Arc<DocumentPipeline>,
    store: TaskStore,
) {
    loop {
        // The lock is released before the job runs.
        let next = receiver.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        run_job(worker_id, job, Arc::clone(&pipeline), &store).await;
    }
}

async fn run_job(worker_id: usize, job: Job, pipeline: Arc<DocumentPipeline>, store: &TaskStore) {
    let Job { id, path } = job;
    store.mark_processing(&id);
    info!(task_id = %id, worker_id, path = %path.display(), "Processing task");
    let start = Instant::now();

    // Run on its own task so a panic in the pipeline fails this task only.
    let outcome = tokio::spawn(async move { pipeline.process(&path).await }).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(fields)) => {
            info!(task_id = %id, worker_id, elapsed_ms, "Task completed");
            store.complete(&id, fields);
        }
        Ok(Err(e)) => {
            warn!(task_id = %id, worker_id, elapsed_ms, error = %e, "Task failed");
            store.fail(&id, e.to_string());
        }
        Err(e) => {
            error!(task_id = %id, worker_id, error = %e, "OCR job panicked");
            store.fail(&id, "OCR processing failed: internal error");
        }
    }
}
