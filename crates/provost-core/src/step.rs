//! The unit of provisioning work.
//!
//! A step performs one slice of external provisioning idempotently: it
//! consults the resource ledger before every non-idempotent vendor effect,
//! performs the effect only on a ledger miss, and records the produced
//! external id immediately afterwards. Re-executing a step whose ledger
//! entries are all present makes no vendor calls.

use uuid::Uuid;

use crate::course::Course;
use crate::error::{ProvostError, Result};
use crate::store::CourseStore;
use crate::types::{ResourceKind, Service, StepName};
use crate::vendor::{ChatClient, RepoClient};

// ---------------------------------------------------------------------------
// StepContext
// ---------------------------------------------------------------------------

/// Everything a step needs, passed explicitly. Groups on `course` are
/// ordered ascending by ordinal number.
pub struct StepContext<'a> {
    pub course: &'a Course,
    pub store: &'a CourseStore,
    pub chat: &'a dyn ChatClient,
    pub repos: &'a dyn RepoClient,
}

impl StepContext<'_> {
    pub fn lookup(
        &self,
        service: Service,
        kind: ResourceKind,
        key: &str,
        group_id: Option<Uuid>,
    ) -> Result<Option<String>> {
        self.store
            .lookup_resource(self.course.id, service, kind, key, group_id)
    }

    pub fn record(
        &self,
        service: Service,
        kind: ResourceKind,
        key: &str,
        group_id: Option<Uuid>,
        external_id: &str,
    ) -> Result<()> {
        self.store
            .record_resource(self.course.id, service, kind, key, group_id, external_id)
    }

    /// Ledger entry a prerequisite step must have written. Its absence is a
    /// fatal step failure naming that step.
    pub fn require(
        &self,
        resource: &str,
        service: Service,
        kind: ResourceKind,
        key: &str,
        group_id: Option<Uuid>,
        producer: StepName,
    ) -> Result<String> {
        self.lookup(service, kind, key, group_id)?
            .ok_or_else(|| ProvostError::MissingPrerequisite {
                resource: resource.to_string(),
                step: producer,
            })
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

pub trait Step: Send + Sync {
    /// Stable identifier; the join key to this step's status record.
    fn name(&self) -> StepName;

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()>;
}
