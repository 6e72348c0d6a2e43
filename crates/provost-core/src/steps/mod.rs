//! Concrete step implementations and the name-to-step factory.

pub mod group;
pub mod track;

use crate::step::Step;
use crate::types::StepName;

pub use group::{
    CreateGroupChannelsStep, CreateGroupReposStep, CreateGroupRolesStep, ProtectGroupReposStep,
    SeedGroupReposStep,
};
pub use track::{
    CreateChannelsStep, CreateRepoStep, CreateSpaceStep, ProtectRepoStep, SeedRepoStep,
};

/// Instantiate the implementation behind a step name.
pub fn build(name: StepName) -> Box<dyn Step> {
    match name {
        StepName::CreateSpace => Box::new(CreateSpaceStep),
        StepName::CreateChannels => Box::new(CreateChannelsStep),
        StepName::CreateRepo => Box::new(CreateRepoStep),
        StepName::ProtectRepo => Box::new(ProtectRepoStep),
        StepName::SeedRepo => Box::new(SeedRepoStep),
        StepName::CreateGroupRoles => Box::new(CreateGroupRolesStep),
        StepName::CreateGroupChannels => Box::new(CreateGroupChannelsStep),
        StepName::CreateGroupRepos => Box::new(CreateGroupReposStep),
        StepName::ProtectGroupRepos => Box::new(ProtectGroupReposStep),
        StepName::SeedGroupRepos => Box::new(SeedGroupReposStep),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::types::CourseShape;

    #[test]
    fn build_matches_name_for_every_workflow_step() {
        for shape in [CourseShape::SingleTrack, CourseShape::CombinedTrack] {
            for name in catalog::resolve_workflow(shape) {
                assert_eq!(build(name).name(), name);
            }
        }
    }
}
