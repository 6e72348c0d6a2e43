//! Workflow catalog: the ordered step sequences per course shape.
//!
//! Two base sequences exist. Combined-track courses run the single-track
//! sequence first (shared space, course channels, shared repository), then
//! the group sequence with its duplicate `create_space` head removed: the
//! single-track run already created and recorded the shared space, and
//! keeping one step name per course preserves a single idempotency key and
//! a single step-status record for it.

use crate::types::{CourseShape, StepName};

/// Steps provisioning the shared resource set, in execution order.
pub fn single_track_steps() -> Vec<StepName> {
    vec![
        StepName::CreateSpace,
        StepName::CreateChannels,
        StepName::CreateRepo,
        StepName::ProtectRepo,
        StepName::SeedRepo,
    ]
}

/// Steps provisioning per-group resources, in execution order.
///
/// Starts with `create_space` so the sequence is self-sufficient; workflow
/// resolution removes it when the single-track sequence already ran.
pub fn group_steps() -> Vec<StepName> {
    vec![
        StepName::CreateSpace,
        StepName::CreateGroupRoles,
        StepName::CreateGroupChannels,
        StepName::CreateGroupRepos,
        StepName::ProtectGroupRepos,
        StepName::SeedGroupRepos,
    ]
}

/// Resolve the effective workflow for a course shape. Pure function.
pub fn resolve_workflow(shape: CourseShape) -> Vec<StepName> {
    match shape {
        CourseShape::SingleTrack => single_track_steps(),
        CourseShape::CombinedTrack => {
            let mut steps = single_track_steps();
            steps.extend(
                group_steps()
                    .into_iter()
                    .filter(|s| *s != StepName::CreateSpace),
            );
            steps
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_track_order() {
        let steps = resolve_workflow(CourseShape::SingleTrack);
        assert_eq!(
            steps,
            vec![
                StepName::CreateSpace,
                StepName::CreateChannels,
                StepName::CreateRepo,
                StepName::ProtectRepo,
                StepName::SeedRepo,
            ]
        );
    }

    #[test]
    fn combined_track_runs_single_track_first() {
        let steps = resolve_workflow(CourseShape::CombinedTrack);
        let single = single_track_steps();
        assert_eq!(&steps[..single.len()], single.as_slice());
        assert_eq!(
            &steps[single.len()..],
            &[
                StepName::CreateGroupRoles,
                StepName::CreateGroupChannels,
                StepName::CreateGroupRepos,
                StepName::ProtectGroupRepos,
                StepName::SeedGroupRepos,
            ]
        );
    }

    #[test]
    fn combined_track_contains_create_space_exactly_once() {
        let steps = resolve_workflow(CourseShape::CombinedTrack);
        let count = steps.iter().filter(|s| **s == StepName::CreateSpace).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn no_duplicate_steps_in_any_workflow() {
        for shape in [CourseShape::SingleTrack, CourseShape::CombinedTrack] {
            let steps = resolve_workflow(shape);
            let unique: std::collections::HashSet<_> = steps.iter().collect();
            assert_eq!(unique.len(), steps.len(), "duplicates in {shape}");
        }
    }
}
