//! Durable scheduler queue backed by redb.
//!
//! # Table design
//!
//! A single `JOBS` table uses a 24-byte composite key:
//! ```text
//! [ run_at_ms: u64 big-endian (8 bytes) | uuid: 16 bytes ]
//! ```
//!
//! Because the timestamp occupies the high bytes in big-endian encoding,
//! byte ordering equals run-time ordering: one range scan
//! `..=due_upper_bound(now)` returns every job due by `now` in time order,
//! with only `Queued` status filtering left to application code.
//!
//! Admission control is the queue's contract with the rest of the engine:
//! a deterministic job key (course id + attempt discriminator) may be
//! admitted at most once, and a course may have at most one queued or
//! running job at a time. Rescheduling after a failure reinserts the job
//! under its new run time.

use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::error::{ProvostError, Result};

// ---------------------------------------------------------------------------
// Table definition
// ---------------------------------------------------------------------------

/// Key: 24-byte composite (run_at_ms big-endian ++ uuid bytes)
/// Value: JSON-encoded Job
const JOBS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("jobs");

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

fn job_key(run_at: DateTime<Utc>, id: Uuid) -> [u8; 24] {
    let mut key = [0u8; 24];
    let ms = run_at.timestamp_millis().max(0) as u64;
    key[..8].copy_from_slice(&ms.to_be_bytes());
    key[8..].copy_from_slice(id.as_bytes());
    key
}

/// Upper bound for a range scan returning all jobs due by `now`. The UUID
/// suffix is `0xff` x 16, greater than any valid UUID.
fn due_upper_bound(now: DateTime<Utc>) -> [u8; 24] {
    let mut key = [0u8; 24];
    let ms = now.timestamp_millis().max(0) as u64;
    key[..8].copy_from_slice(&ms.to_be_bytes());
    key[8..].fill(0xff);
    key
}

// ---------------------------------------------------------------------------
// Job / JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a provisioning job.
///
/// Transitions: `Queued → Running → Completed`, or `Running → Queued`
/// (rescheduled with backoff) while the retry budget lasts, then
/// `Running → Exhausted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Exhausted { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Deterministic scheduling key, e.g. `provision-<course-id>` or
    /// `provision-<course-id>-retry-<n>`. Collision-checked at admission.
    pub key: String,
    pub course_id: Uuid,
    /// Admission number for the course (1 for the initial start, then one
    /// per operator retry).
    pub attempt: u32,
    /// Times this job has been picked up by a worker.
    pub tries: u32,
    pub retries_left: u32,
    pub status: JobStatus,
    pub run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// JobQueue
// ---------------------------------------------------------------------------

pub struct JobQueue {
    db: Database,
    config: QueueConfig,
}

impl JobQueue {
    /// Open or create the queue database at `path`.
    pub fn open(path: &Path, config: QueueConfig) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(|e| ProvostError::Queue(e.to_string()))?;
        // Ensure the table exists before any reads
        let wt = db
            .begin_write()
            .map_err(|e| ProvostError::Queue(e.to_string()))?;
        wt.open_table(JOBS)
            .map_err(|e| ProvostError::Queue(e.to_string()))?;
        wt.commit().map_err(|e| ProvostError::Queue(e.to_string()))?;
        Ok(Self { db, config })
    }

    /// Admit a job. Rejects a reused scheduling key, and rejects admission
    /// while the course already has a queued or running job.
    pub fn enqueue(
        &self,
        key: &str,
        course_id: Uuid,
        attempt: u32,
        now: DateTime<Utc>,
    ) -> Result<Job> {
        let all = self.list_all()?;
        if all.iter().any(|j| j.key == key) {
            return Err(ProvostError::DuplicateJob(key.to_string()));
        }
        if all.iter().any(|j| {
            j.course_id == course_id
                && matches!(j.status, JobStatus::Queued | JobStatus::Running)
        }) {
            return Err(ProvostError::DuplicateJob(format!(
                "course {course_id} already has an active job"
            )));
        }

        let job = Job {
            id: Uuid::new_v4(),
            key: key.to_string(),
            course_id,
            attempt,
            tries: 0,
            retries_left: self.config.max_attempts.saturating_sub(1),
            status: JobStatus::Queued,
            run_at: now,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(&job)?;
        Ok(job)
    }

    /// All `Queued` jobs with `run_at <= now`, in run-time order.
    pub fn due(&self, now: DateTime<Utc>) -> Result<Vec<Job>> {
        let upper = due_upper_bound(now);
        let rt = self
            .db
            .begin_read()
            .map_err(|e| ProvostError::Queue(e.to_string()))?;
        let table = rt
            .open_table(JOBS)
            .map_err(|e| ProvostError::Queue(e.to_string()))?;

        let mut result = Vec::new();
        for entry in table
            .range(..=upper.as_slice())
            .map_err(|e| ProvostError::Queue(e.to_string()))?
        {
            let (_, v) = entry.map_err(|e| ProvostError::Queue(e.to_string()))?;
            let job: Job = serde_json::from_slice(v.value())?;
            if matches!(job.status, JobStatus::Queued) {
                result.push(job);
            }
        }
        Ok(result)
    }

    /// Worker pickup: increments `tries` and flips to `Running`.
    pub fn mark_running(&self, id: Uuid) -> Result<Job> {
        self.update(id, |job| {
            job.tries += 1;
            job.status = JobStatus::Running;
        })
    }

    pub fn complete(&self, id: Uuid) -> Result<Job> {
        self.update(id, |job| {
            job.status = JobStatus::Completed;
        })
    }

    /// Record a failed execution. While the retry budget lasts the job is
    /// requeued with exponential backoff (`backoff_secs * 2^(tries-1)`);
    /// afterwards it is exhausted and the course stays failed pending a
    /// manual retry.
    pub fn fail(&self, id: Uuid, reason: &str, now: DateTime<Utc>) -> Result<Job> {
        let backoff_secs = self.config.backoff_secs;
        self.update(id, |job| {
            job.last_error = Some(reason.to_string());
            if job.retries_left > 0 {
                job.retries_left -= 1;
                let exponent = job.tries.saturating_sub(1).min(16);
                let delay = backoff_secs.saturating_mul(1u64 << exponent);
                job.run_at = now + Duration::seconds(delay as i64);
                job.status = JobStatus::Queued;
            } else {
                job.status = JobStatus::Exhausted {
                    reason: reason.to_string(),
                };
            }
        })
    }

    /// On worker startup, requeue jobs stuck `Running` longer than
    /// `max_age` to run immediately. Safe because executions resume past
    /// completed steps and every external effect is ledger-guarded.
    /// Returns the number of jobs recovered.
    pub fn recover_interrupted(&self, max_age: std::time::Duration) -> Result<u32> {
        let now = Utc::now();
        let cutoff = now
            - Duration::from_std(max_age).map_err(|e| ProvostError::Queue(e.to_string()))?;

        let mut count = 0u32;
        for job in self.list_all()? {
            if matches!(job.status, JobStatus::Running) && job.updated_at < cutoff {
                self.update(job.id, |j| {
                    j.status = JobStatus::Queued;
                    j.run_at = now;
                })?;
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn job(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.list_all()?.into_iter().find(|j| j.id == id))
    }

    pub fn jobs_for_course(&self, course_id: Uuid) -> Result<Vec<Job>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|j| j.course_id == course_id)
            .collect())
    }

    /// List all jobs, newest first.
    pub fn list_all(&self) -> Result<Vec<Job>> {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| ProvostError::Queue(e.to_string()))?;
        let table = rt
            .open_table(JOBS)
            .map_err(|e| ProvostError::Queue(e.to_string()))?;

        let mut result = Vec::new();
        for entry in table.iter().map_err(|e| ProvostError::Queue(e.to_string()))? {
            let (_, v) = entry.map_err(|e| ProvostError::Queue(e.to_string()))?;
            let job: Job = serde_json::from_slice(v.value())?;
            result.push(job);
        }
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    fn insert(&self, job: &Job) -> Result<()> {
        let key = job_key(job.run_at, job.id);
        let value = serde_json::to_vec(job)?;
        let wt = self
            .db
            .begin_write()
            .map_err(|e| ProvostError::Queue(e.to_string()))?;
        {
            let mut table = wt
                .open_table(JOBS)
                .map_err(|e| ProvostError::Queue(e.to_string()))?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(|e| ProvostError::Queue(e.to_string()))?;
        }
        wt.commit().map_err(|e| ProvostError::Queue(e.to_string()))?;
        Ok(())
    }

    /// Apply `mutate` to the job with `id`, reinserting under the new key
    /// when `run_at` changed.
    fn update(&self, id: Uuid, mutate: impl FnOnce(&mut Job)) -> Result<Job> {
        let mut job = self
            .job(id)?
            .ok_or_else(|| ProvostError::JobNotFound(id.to_string()))?;

        let old_key = job_key(job.run_at, job.id);
        mutate(&mut job);
        job.updated_at = Utc::now();
        let new_key = job_key(job.run_at, job.id);
        let value = serde_json::to_vec(&job)?;

        let wt = self
            .db
            .begin_write()
            .map_err(|e| ProvostError::Queue(e.to_string()))?;
        {
            let mut table = wt
                .open_table(JOBS)
                .map_err(|e| ProvostError::Queue(e.to_string()))?;
            table
                .remove(old_key.as_slice())
                .map_err(|e| ProvostError::Queue(e.to_string()))?;
            table
                .insert(new_key.as_slice(), value.as_slice())
                .map_err(|e| ProvostError::Queue(e.to_string()))?;
        }
        wt.commit().map_err(|e| ProvostError::Queue(e.to_string()))?;
        Ok(job)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
