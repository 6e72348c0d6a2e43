//! Queue admission on behalf of the management API: start provisioning,
//! and retry a failed course.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{ProvostError, Result};
use crate::queue::{Job, JobQueue};
use crate::store::CourseStore;
use crate::types::CourseStatus;

pub struct Scheduler {
    store: Arc<CourseStore>,
    queue: Arc<JobQueue>,
}

impl Scheduler {
    pub fn new(store: Arc<CourseStore>, queue: Arc<JobQueue>) -> Self {
        Self { store, queue }
    }

    /// Enqueue the initial provisioning run for a pending course.
    pub fn start(&self, course_id: Uuid) -> Result<Job> {
        let course = self.store.course(course_id)?;
        if course.status != CourseStatus::Pending {
            return Err(ProvostError::WrongState {
                course: course_id.to_string(),
                expected: CourseStatus::Pending.to_string(),
                current: course.status.to_string(),
            });
        }

        let key = format!("provision-{course_id}");
        let job = self.queue.enqueue(&key, course_id, 1, Utc::now())?;
        self.store.record_execution(course_id, &key, 1)?;

        info!(course = %course_id, job = %key, "provisioning queued");
        Ok(job)
    }

    /// Re-enqueue a failed course. Only failed step records are reset to
    /// pending; completed ones are skipped by the resumed execution.
    pub fn retry(&self, course_id: Uuid) -> Result<Job> {
        let course = self.store.course(course_id)?;
        if course.status != CourseStatus::Failed {
            return Err(ProvostError::WrongState {
                course: course_id.to_string(),
                expected: CourseStatus::Failed.to_string(),
                current: course.status.to_string(),
            });
        }

        let reset = self.store.reset_failed_steps(course_id)?;
        self.store
            .set_course_status(course_id, CourseStatus::Retrying)?;

        let attempt = self.store.execution_count(course_id)? + 1;
        let key = format!("provision-{course_id}-retry-{attempt}");
        let job = match self.queue.enqueue(&key, course_id, attempt, Utc::now()) {
            Ok(job) => job,
            Err(e) => {
                // Admission refused (e.g. a job is still draining); put the
                // course back so the operator can retry later.
                self.store
                    .set_course_status(course_id, CourseStatus::Failed)?;
                return Err(e);
            }
        };
        self.store.record_execution(course_id, &key, attempt)?;

        info!(course = %course_id, job = %key, reset, "retry queued");
        Ok(job)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
