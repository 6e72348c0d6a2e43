//! The worker loop: drains due jobs from the queue, runs each through the
//! processor, and applies the queue's retry policy on failure.
//!
//! One worker processes jobs strictly one at a time, so no two executions
//! of the same course (or of different courses, on a single worker) ever
//! overlap. Additional workers on separate queues scale by course, with
//! per-course exclusivity guaranteed by queue admission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::QueueConfig;
use crate::error::Result;
use crate::processor::Processor;
use crate::queue::{JobQueue, JobStatus};

pub struct Worker {
    queue: Arc<JobQueue>,
    processor: Arc<Processor>,
    poll_interval: Duration,
    recover_after: Duration,
}

impl Worker {
    pub fn new(queue: Arc<JobQueue>, processor: Arc<Processor>, config: &QueueConfig) -> Self {
        Self {
            queue,
            processor,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            recover_after: Duration::from_secs(config.recover_after_secs),
        }
    }

    /// Requeue jobs a lost worker left behind. Call once before looping.
    pub fn recover(&self) -> Result<u32> {
        let recovered = self.queue.recover_interrupted(self.recover_after)?;
        if recovered > 0 {
            info!(recovered, "requeued interrupted jobs");
        }
        Ok(recovered)
    }

    /// Drain everything due at `now`, one job at a time. Returns the
    /// number of jobs processed.
    pub fn run_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.queue.due(now)?;
        let count = due.len();

        for job in due {
            self.queue.mark_running(job.id)?;
            info!(job = %job.key, course = %job.course_id, tries = job.tries + 1, "processing job");

            match self.processor.run_execution(job.course_id) {
                Ok(()) => {
                    self.queue.complete(job.id)?;
                }
                Err(e) => {
                    let updated = self.queue.fail(job.id, &e.to_string(), Utc::now())?;
                    match updated.status {
                        JobStatus::Queued => {
                            warn!(
                                job = %job.key,
                                retry_at = %updated.run_at,
                                retries_left = updated.retries_left,
                                error = %e,
                                "execution failed, retry scheduled"
                            );
                        }
                        _ => {
                            error!(
                                job = %job.key,
                                error = %e,
                                "retry budget spent; course stays failed pending manual retry"
                            );
                        }
                    }
                }
            }
        }

        Ok(count)
    }

    /// Poll until `stop` is set. Tick errors are logged, not fatal: a
    /// broken store read on one tick should not kill the worker.
    pub fn run_loop(&self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            if let Err(e) = self.run_once(Utc::now()) {
                error!(error = %e, "worker tick failed");
            }
            std::thread::sleep(self.poll_interval);
        }
        info!("worker stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
