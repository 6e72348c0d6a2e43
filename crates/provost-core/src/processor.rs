//! The orchestrator: runs a course's resolved workflow step by step,
//! persisting progress and driving the course's top-level status.
//!
//! Execution is strictly sequential. Later steps read ledger entries
//! written by earlier ones (channel creation needs the recorded space id),
//! so ordering is a correctness requirement. Completed step records are
//! skipped on resume without re-invoking the step; idempotency of anything
//! that does re-run is the ledger's job.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::catalog;
use crate::error::{ProvostError, Result};
use crate::step::StepContext;
use crate::steps;
use crate::store::{CourseStore, StepRecord};
use crate::types::{CourseStatus, StepStatus};
use crate::vendor::{ChatClient, RepoClient};

/// Per-course provisioning view for the management layer.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningStatus {
    pub course_id: Uuid,
    pub course_status: CourseStatus,
    pub steps: Vec<StepRecord>,
}

pub struct Processor {
    store: Arc<CourseStore>,
    chat: Arc<dyn ChatClient>,
    repos: Arc<dyn RepoClient>,
}

impl Processor {
    pub fn new(
        store: Arc<CourseStore>,
        chat: Arc<dyn ChatClient>,
        repos: Arc<dyn RepoClient>,
    ) -> Self {
        Self { store, chat, repos }
    }

    /// Run one provisioning execution for a course, resuming past steps
    /// that already completed. On the first step failure the course is
    /// marked failed, the remaining steps are abandoned, and the error
    /// propagates to the scheduler so its retry policy applies.
    pub fn run_execution(&self, course_id: Uuid) -> Result<()> {
        let course = self.store.course(course_id)?;
        let workflow = catalog::resolve_workflow(course.shape);

        info!(course = %course_id, shape = %course.shape, "starting provisioning execution");
        self.store
            .set_course_status(course_id, CourseStatus::InProgress)?;

        let ctx = StepContext {
            course: &course,
            store: &self.store,
            chat: self.chat.as_ref(),
            repos: self.repos.as_ref(),
        };

        for name in workflow {
            let record = self.store.step_record(course_id, name)?.ok_or(
                ProvostError::StepRecordMissing {
                    course: course_id.to_string(),
                    step: name,
                },
            )?;

            if record.status == StepStatus::Completed {
                debug!(step = %name, "skipping completed step");
                continue;
            }

            info!(step = %name, course = %course_id, "executing step");
            self.store.begin_step(course_id, name)?;

            match steps::build(name).execute(&ctx) {
                Ok(()) => {
                    self.store.complete_step(course_id, name)?;
                    info!(step = %name, course = %course_id, "step completed");
                }
                Err(e) => {
                    let message = e.to_string();
                    self.store.fail_step(course_id, name, &message)?;
                    self.store
                        .set_course_status(course_id, CourseStatus::Failed)?;
                    error!(step = %name, course = %course_id, error = %message, "step failed");
                    return Err(e);
                }
            }
        }

        self.store
            .set_course_status(course_id, CourseStatus::Completed)?;
        info!(course = %course_id, "provisioning completed");
        Ok(())
    }

    /// Course status plus the ordered per-step view.
    pub fn status(&self, course_id: Uuid) -> Result<ProvisioningStatus> {
        let course = self.store.course(course_id)?;
        let steps = self.store.step_records(course_id)?;
        Ok(ProvisioningStatus {
            course_id,
            course_status: course.status,
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;
    use crate::steps::track::DEFAULT_CHANNELS;
    use crate::testing::{course_input, store, FakeChat, FakeRepo};
    use crate::types::{CourseShape, ResourceKind, Service, StepName};

    struct Harness {
        store: Arc<CourseStore>,
        chat: Arc<FakeChat>,
        repos: Arc<FakeRepo>,
        processor: Processor,
    }

    fn harness() -> Harness {
        let store = store();
        let chat = Arc::new(FakeChat::new());
        let repos = Arc::new(FakeRepo::new());
        let processor = Processor::new(store.clone(), chat.clone(), repos.clone());
        Harness {
            store,
            chat,
            repos,
            processor,
        }
    }

    fn create(h: &Harness, shape: CourseShape, groups: u32) -> Uuid {
        h.store.create_course(course_input(shape, groups)).unwrap().id
    }

    #[test]
    fn single_track_happy_path() {
        let h = harness();
        let id = create(&h, CourseShape::SingleTrack, 0);

        h.processor.run_execution(id).unwrap();

        let status = h.processor.status(id).unwrap();
        assert_eq!(status.course_status, CourseStatus::Completed);
        assert_eq!(status.steps.len(), 5);
        assert!(status
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Completed && s.attempts == 1));

        // Default channels, one repo, one protection, one seed
        let chat_calls = h.chat.calls();
        assert_eq!(chat_calls.len(), DEFAULT_CHANNELS.len());
        let repo_calls = h.repos.calls();
        assert_eq!(repo_calls.len(), 3);
        assert!(repo_calls[0].starts_with("create_repo:distributed-systems-fall-2026"));
        assert!(repo_calls[1].starts_with("protect_branch:"));
        assert!(repo_calls[2].starts_with("seed_content:"));
    }

    #[test]
    fn combined_track_groups_run_after_shared_steps() {
        let h = harness();
        let id = create(&h, CourseShape::CombinedTrack, 3);

        h.processor.run_execution(id).unwrap();

        let status = h.processor.status(id).unwrap();
        assert_eq!(status.course_status, CourseStatus::Completed);
        assert_eq!(status.steps.len(), 10);
        assert!(status.steps.iter().all(|s| s.status == StepStatus::Completed));

        // Every shared-channel call precedes every group-role call
        let calls = h.chat.calls();
        let last_shared = calls
            .iter()
            .rposition(|c| c.starts_with("create_channel:general"))
            .unwrap();
        let first_role = calls
            .iter()
            .position(|c| c.starts_with("create_role:"))
            .unwrap();
        assert!(last_shared < first_role, "calls: {calls:?}");

        // Group iteration is ascending by ordinal
        let roles: Vec<&String> = calls
            .iter()
            .filter(|c| c.starts_with("create_role:"))
            .collect();
        assert_eq!(
            roles,
            vec![
                "create_role:Group 1 — Group 1",
                "create_role:Group 2 — Group 2",
                "create_role:Group 3 — Group 3",
            ]
        );
    }

    #[test]
    fn replay_of_completed_course_makes_no_vendor_calls() {
        let h = harness();
        let id = create(&h, CourseShape::CombinedTrack, 2);
        h.processor.run_execution(id).unwrap();

        let chat_before = h.chat.call_count();
        let repo_before = h.repos.call_count();

        // Queue re-delivery after completion: all steps skip on status.
        h.processor.run_execution(id).unwrap();

        assert_eq!(h.chat.call_count(), chat_before);
        assert_eq!(h.repos.call_count(), repo_before);
        assert_eq!(
            h.processor.status(id).unwrap().course_status,
            CourseStatus::Completed
        );
    }

    #[test]
    fn step_replay_with_full_ledger_is_idempotent() {
        let h = harness();
        let id = create(&h, CourseShape::SingleTrack, 0);
        h.processor.run_execution(id).unwrap();

        let before = h.chat.call_count();
        let course = h.store.course(id).unwrap();
        let ctx = StepContext {
            course: &course,
            store: &h.store,
            chat: h.chat.as_ref(),
            repos: h.repos.as_ref(),
        };

        // Direct re-invocation, as after a crash between the vendor effect
        // and the status write: the ledger alone must prevent new calls.
        crate::steps::build(StepName::CreateChannels)
            .execute(&ctx)
            .unwrap();
        assert_eq!(h.chat.call_count(), before);
    }

    #[test]
    fn failure_aborts_run_and_resume_skips_completed_steps() {
        let h = harness();
        let id = create(&h, CourseShape::SingleTrack, 0);

        h.repos.fail_on("create_repo");
        let err = h.processor.run_execution(id).unwrap_err();
        assert!(err.to_string().contains("injected repo failure"));

        let status = h.processor.status(id).unwrap();
        assert_eq!(status.course_status, CourseStatus::Failed);
        assert_eq!(status.steps[0].status, StepStatus::Completed); // create_space
        assert_eq!(status.steps[1].status, StepStatus::Completed); // create_channels
        assert_eq!(status.steps[2].status, StepStatus::Failed); // create_repo
        assert!(status.steps[2]
            .error
            .as_deref()
            .unwrap()
            .contains("injected repo failure"));
        assert_eq!(status.steps[3].status, StepStatus::Pending);
        assert_eq!(status.steps[4].status, StepStatus::Pending);

        // Fix the vendor and resume: steps 1 and 2 are not re-invoked.
        h.repos.clear_failure();
        h.store.reset_failed_steps(id).unwrap();
        let chat_before = h.chat.call_count();
        h.processor.run_execution(id).unwrap();

        assert_eq!(h.chat.call_count(), chat_before, "no new channel calls");
        let status = h.processor.status(id).unwrap();
        assert_eq!(status.course_status, CourseStatus::Completed);
        assert!(status.steps.iter().all(|s| s.status == StepStatus::Completed));
        // The failed step ran twice, the untouched ones once.
        assert_eq!(status.steps[2].attempts, 2);
        assert_eq!(status.steps[0].attempts, 1);
    }

    #[test]
    fn missing_role_prerequisite_names_step_and_resource() {
        let h = harness();
        let id = create(&h, CourseShape::CombinedTrack, 1);

        // Simulate a skipped create_group_roles: mark it completed without
        // running it, so no role ledger entry exists.
        for name in [
            StepName::CreateSpace,
            StepName::CreateChannels,
            StepName::CreateRepo,
            StepName::ProtectRepo,
            StepName::SeedRepo,
            StepName::CreateGroupRoles,
        ] {
            h.store.begin_step(id, name).unwrap();
            h.store.complete_step(id, name).unwrap();
        }
        // The shared steps above never ran either; give the channel step
        // its own prerequisite so it is the role that is missing.
        h.store
            .record_resource(id, Service::Chat, ResourceKind::Space, "main", None, "space-main")
            .unwrap();

        let err = h.processor.run_execution(id).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("role for group 1"), "{msg}");
        assert!(msg.contains("create_group_roles"), "{msg}");

        let status = h.processor.status(id).unwrap();
        assert_eq!(status.course_status, CourseStatus::Failed);
        let channels = status
            .steps
            .iter()
            .find(|s| s.step == StepName::CreateGroupChannels)
            .unwrap();
        assert_eq!(channels.status, StepStatus::Failed);
        assert!(channels.error.as_deref().unwrap().contains("create_group_roles"));
    }

    #[test]
    fn retry_after_repairing_prerequisite_completes() {
        let h = harness();
        let id = create(&h, CourseShape::CombinedTrack, 1);
        let group_id = h.store.course(id).unwrap().groups[0].id;

        for name in [
            StepName::CreateSpace,
            StepName::CreateChannels,
            StepName::CreateRepo,
            StepName::ProtectRepo,
            StepName::SeedRepo,
            StepName::CreateGroupRoles,
        ] {
            h.store.begin_step(id, name).unwrap();
            h.store.complete_step(id, name).unwrap();
        }
        h.store
            .record_resource(id, Service::Chat, ResourceKind::Space, "main", None, "space-main")
            .unwrap();
        h.store
            .record_resource(id, Service::Repos, ResourceKind::RepoName, "main", None, "shared")
            .unwrap();

        assert!(h.processor.run_execution(id).is_err());

        // Repair: write the role entry create_group_roles would have
        // produced, then retry. The channel step replays checking only its
        // own precondition and proceeds.
        h.store
            .record_resource(id, Service::Chat, ResourceKind::Role, "group-1", Some(group_id), "role-1")
            .unwrap();
        h.store.reset_failed_steps(id).unwrap();
        h.processor.run_execution(id).unwrap();

        let status = h.processor.status(id).unwrap();
        assert_eq!(status.course_status, CourseStatus::Completed);
    }

    #[test]
    fn tier_restriction_is_best_effort_success() {
        let h = harness();
        let id = create(&h, CourseShape::CombinedTrack, 2);
        h.repos.restricted.store(true, std::sync::atomic::Ordering::SeqCst);

        h.processor.run_execution(id).unwrap();

        let status = h.processor.status(id).unwrap();
        assert_eq!(status.course_status, CourseStatus::Completed);
        // No protection call was recorded, yet both protect steps completed.
        assert!(h.repos.calls().iter().all(|c| !c.starts_with("protect_branch")));
    }

    #[test]
    fn missing_space_id_is_a_fatal_configuration_error() {
        let h = harness();
        let mut input = course_input(CourseShape::SingleTrack, 0);
        input.space_id = None;
        let id = h.store.create_course(input).unwrap().id;

        let err = h.processor.run_execution(id).unwrap_err();
        assert!(matches!(err, ProvostError::MissingConfig(_)));

        let status = h.processor.status(id).unwrap();
        assert_eq!(status.course_status, CourseStatus::Failed);
        assert!(status.steps[0]
            .error
            .as_deref()
            .unwrap()
            .contains("communication-space id"));
    }

    #[test]
    fn custom_channel_list_overrides_defaults() {
        let h = harness();
        let mut input = course_input(CourseShape::SingleTrack, 0);
        input.channels = vec!["general".to_string(), "projects".to_string()];
        let id = h.store.create_course(input).unwrap().id;

        h.processor.run_execution(id).unwrap();

        let calls = h.chat.calls();
        assert_eq!(
            calls,
            vec!["create_channel:general", "create_channel:projects"]
        );
    }

    #[test]
    fn group_session_channels_are_private_and_counted() {
        let h = harness();
        let mut input = course_input(CourseShape::CombinedTrack, 1);
        input.group_session_count = Some(3);
        let id = h.store.create_course(input).unwrap().id;

        h.processor.run_execution(id).unwrap();

        let lab_channels: Vec<String> = h
            .chat
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("create_channel:lab-"))
            .collect();
        assert_eq!(
            lab_channels,
            vec![
                "create_channel:lab-01-group-group-1",
                "create_channel:lab-02-group-group-1",
                "create_channel:lab-03-group-group-1",
            ]
        );

        let group_id = h.store.course(id).unwrap().groups[0].id;
        for session in 1..=3 {
            assert!(h
                .store
                .lookup_resource(
                    id,
                    Service::Chat,
                    ResourceKind::Channel,
                    &format!("group-1-session-{session}"),
                    Some(group_id)
                )
                .unwrap()
                .is_some());
        }
    }

    #[test]
    fn status_is_ordered_by_workflow_position() {
        let h = harness();
        let id = create(&h, CourseShape::CombinedTrack, 1);
        let status = h.processor.status(id).unwrap();
        let orders: Vec<u32> = status.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, (1..=10).collect::<Vec<u32>>());
        assert_eq!(status.steps[0].step, StepName::CreateSpace);
        assert_eq!(status.steps[5].step, StepName::CreateGroupRoles);
    }
}
