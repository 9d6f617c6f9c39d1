//! Background execution of OCR tasks.
//!
//! One [`WorkerPool`] per process pulls jobs from a bounded queue; results
//! land in a [`TaskStore`] that forgets them after a TTL.

pub mod store;
pub mod worker;

pub use store::TaskStore;
pub use worker::{Job, SubmitError, WorkerPool};
