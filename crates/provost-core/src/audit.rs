//! Vendor-call audit trail.
//!
//! Every external call the engine makes goes through [`AuditLog::observe`],
//! which records the subject course, action name, request summary, outcome
//! and duration. A failure to persist the audit row never masks the vendor
//! call's own result.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::store::{AuditRecord, CourseStore};

#[derive(Clone)]
pub struct AuditLog {
    store: Arc<CourseStore>,
}

impl AuditLog {
    pub fn new(store: Arc<CourseStore>) -> Self {
        Self { store }
    }

    /// Run `f`, recording an audit row for it either way, and return its
    /// result unchanged.
    pub fn observe<T>(
        &self,
        course_id: Uuid,
        action: &str,
        detail: serde_json::Value,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = f();
        let record = AuditRecord {
            course_id,
            action: action.to_string(),
            success: result.is_ok(),
            detail: Some(detail),
            error: result.as_ref().err().map(|e| e.to_string()),
            duration_ms: start.elapsed().as_millis() as u64,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.append_audit(&record) {
            warn!(action, course = %course_id, error = %e, "failed to append audit record");
        }
        result
    }
}
