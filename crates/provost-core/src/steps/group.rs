//! Steps provisioning per-group resources for combined-track courses.
//!
//! Every step loops over the course's groups ascending by ordinal. A
//! failure on one group aborts the remaining groups in that step; the
//! single best-effort exception is the tier-restriction case in
//! [`ProtectGroupReposStep`].

use tracing::warn;

use crate::course::Group;
use crate::error::{ProvostError, Result};
use crate::step::{Step, StepContext};
use crate::template;
use crate::types::{ResourceKind, Service, StepName};
use crate::vendor::ChannelRequest;

const MAIN: &str = "main";

/// Group-scoped ledger keys are `group-<n>`; session channels append a
/// `-session-<s>` suffix.
fn group_key(group: &Group) -> String {
    format!("group-{}", group.number)
}

fn session_key(group: &Group, session: u32) -> String {
    format!("group-{}-session-{}", group.number, session)
}

// ---------------------------------------------------------------------------
// CreateGroupRolesStep
// ---------------------------------------------------------------------------

pub struct CreateGroupRolesStep;

impl Step for CreateGroupRolesStep {
    fn name(&self) -> StepName {
        StepName::CreateGroupRoles
    }

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()> {
        let space_id = ctx.require(
            &format!("communication space for course {}", ctx.course.id),
            Service::Chat,
            ResourceKind::Space,
            MAIN,
            None,
            StepName::CreateSpace,
        )?;

        for group in &ctx.course.groups {
            let key = group_key(group);
            if ctx
                .lookup(Service::Chat, ResourceKind::Role, &key, Some(group.id))?
                .is_some()
            {
                continue;
            }

            let role_id =
                ctx.chat
                    .create_role(ctx.course.id, &space_id, &group.effective_role_name())?;

            ctx.record(
                Service::Chat,
                ResourceKind::Role,
                &key,
                Some(group.id),
                &role_id,
            )?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CreateGroupChannelsStep
// ---------------------------------------------------------------------------

/// One private channel per group per session, visible only to the group's
/// role. Needs the role ledger entries written by [`CreateGroupRolesStep`].
pub struct CreateGroupChannelsStep;

impl Step for CreateGroupChannelsStep {
    fn name(&self) -> StepName {
        StepName::CreateGroupChannels
    }

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()> {
        let space_id = ctx.require(
            &format!("communication space for course {}", ctx.course.id),
            Service::Chat,
            ResourceKind::Space,
            MAIN,
            None,
            StepName::CreateSpace,
        )?;

        let sessions = ctx.course.group_session_count.unwrap_or(1);

        for group in &ctx.course.groups {
            let role_id = ctx.require(
                &format!("role for group {}", group.number),
                Service::Chat,
                ResourceKind::Role,
                &group_key(group),
                Some(group.id),
                StepName::CreateGroupRoles,
            )?;

            let slug = group
                .channel_name
                .clone()
                .unwrap_or_else(|| group.channel_slug());

            for session in 1..=sessions {
                let key = session_key(group, session);
                if ctx
                    .lookup(Service::Chat, ResourceKind::Channel, &key, Some(group.id))?
                    .is_some()
                {
                    continue;
                }

                let channel_name = format!("lab-{session:02}-group-{slug}");
                let channel_id = ctx.chat.create_channel(
                    ctx.course.id,
                    &space_id,
                    &ChannelRequest::private_text(channel_name, &space_id, &role_id),
                )?;

                ctx.record(
                    Service::Chat,
                    ResourceKind::Channel,
                    &key,
                    Some(group.id),
                    &channel_id,
                )?;
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CreateGroupReposStep
// ---------------------------------------------------------------------------

pub struct CreateGroupReposStep;

impl Step for CreateGroupReposStep {
    fn name(&self) -> StepName {
        StepName::CreateGroupRepos
    }

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()> {
        for group in &ctx.course.groups {
            let key = group_key(group);
            if ctx
                .lookup(Service::Repos, ResourceKind::Repo, &key, Some(group.id))?
                .is_some()
            {
                continue;
            }

            let name = group.effective_repo_name(ctx.course);
            let repo = ctx.repos.create_repo(ctx.course.id, &name)?;

            ctx.record(
                Service::Repos,
                ResourceKind::Repo,
                &key,
                Some(group.id),
                &repo.id,
            )?;
            ctx.record(
                Service::Repos,
                ResourceKind::RepoName,
                &key,
                Some(group.id),
                &repo.name,
            )?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProtectGroupReposStep
// ---------------------------------------------------------------------------

pub struct ProtectGroupReposStep;

impl Step for ProtectGroupReposStep {
    fn name(&self) -> StepName {
        StepName::ProtectGroupRepos
    }

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()> {
        for group in &ctx.course.groups {
            let repo = ctx.require(
                &format!("repository name for group {}", group.number),
                Service::Repos,
                ResourceKind::RepoName,
                &group_key(group),
                Some(group.id),
                StepName::CreateGroupRepos,
            )?;

            match ctx.repos.protect_branch(ctx.course.id, &repo, "main") {
                Ok(()) => {}
                Err(ProvostError::VendorRestricted(msg)) => {
                    warn!(repo = %repo, "branch protection skipped: {msg}");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SeedGroupReposStep
// ---------------------------------------------------------------------------

/// Group repositories get the built-in seed set; the course's content
/// template applies only to the shared repository.
pub struct SeedGroupReposStep;

impl Step for SeedGroupReposStep {
    fn name(&self) -> StepName {
        StepName::SeedGroupRepos
    }

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()> {
        for group in &ctx.course.groups {
            let key = group_key(group);
            if ctx
                .lookup(Service::Repos, ResourceKind::Seeded, &key, Some(group.id))?
                .is_some()
            {
                continue;
            }

            let repo = ctx.require(
                &format!("repository name for group {}", group.number),
                Service::Repos,
                ResourceKind::RepoName,
                &key,
                Some(group.id),
                StepName::CreateGroupRepos,
            )?;

            let files = template::seed_files(None);
            ctx.repos.seed_content(ctx.course.id, &repo, &files)?;

            ctx.record(
                Service::Repos,
                ResourceKind::Seeded,
                &key,
                Some(group.id),
                "true",
            )?;
        }

        Ok(())
    }
}
