//! Steps provisioning the shared (single-track) resource set.

use tracing::warn;

use crate::error::{ProvostError, Result};
use crate::step::{Step, StepContext};
use crate::template;
use crate::types::{ResourceKind, Service, StepName};
use crate::vendor::ChannelRequest;

/// Channels every course gets when no explicit list is configured.
pub const DEFAULT_CHANNELS: [&str; 4] = ["announcements", "general", "lectures", "qa-help"];

/// Ledger key for course-scoped (non-group) resources.
const MAIN: &str = "main";

// ---------------------------------------------------------------------------
// CreateSpaceStep
// ---------------------------------------------------------------------------

/// Adopt the pre-provisioned communication space: validate that the course
/// carries a space id and record it as the ledger root every later chat
/// step hangs off. A missing id is a configuration error, not a vendor
/// failure.
pub struct CreateSpaceStep;

impl Step for CreateSpaceStep {
    fn name(&self) -> StepName {
        StepName::CreateSpace
    }

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()> {
        if ctx
            .lookup(Service::Chat, ResourceKind::Space, MAIN, None)?
            .is_some()
        {
            return Ok(());
        }

        let space_id = ctx.course.space_id.as_deref().ok_or_else(|| {
            ProvostError::MissingConfig(format!(
                "course {} has no communication-space id configured",
                ctx.course.id
            ))
        })?;

        ctx.record(Service::Chat, ResourceKind::Space, MAIN, None, space_id)
    }
}

// ---------------------------------------------------------------------------
// CreateChannelsStep
// ---------------------------------------------------------------------------

pub struct CreateChannelsStep;

impl Step for CreateChannelsStep {
    fn name(&self) -> StepName {
        StepName::CreateChannels
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

        let channels: Vec<String> = if ctx.course.channels.is_empty() {
            DEFAULT_CHANNELS.iter().map(|s| s.to_string()).collect()
        } else {
            ctx.course.channels.clone()
        };

        for name in &channels {
            if ctx
                .lookup(Service::Chat, ResourceKind::Channel, name, None)?
                .is_some()
            {
                continue;
            }

            let channel_id =
                ctx.chat
                    .create_channel(ctx.course.id, &space_id, &ChannelRequest::text(name))?;

            ctx.record(Service::Chat, ResourceKind::Channel, name, None, &channel_id)?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CreateRepoStep
// ---------------------------------------------------------------------------

pub struct CreateRepoStep;

impl Step for CreateRepoStep {
    fn name(&self) -> StepName {
        StepName::CreateRepo
    }

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()> {
        if ctx
            .lookup(Service::Repos, ResourceKind::Repo, MAIN, None)?
            .is_some()
        {
            return Ok(());
        }

        let name = ctx.course.effective_repo_name();
        let repo = ctx.repos.create_repo(ctx.course.id, &name)?;

        ctx.record(Service::Repos, ResourceKind::Repo, MAIN, None, &repo.id)?;
        // Later steps address the repository by name, so record the
        // vendor-canonical name as well.
        ctx.record(Service::Repos, ResourceKind::RepoName, MAIN, None, &repo.name)?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProtectRepoStep
// ---------------------------------------------------------------------------

/// Branch protection is an overwrite-style vendor call, idempotent on its
/// own, so no ledger entry guards it.
pub struct ProtectRepoStep;

impl Step for ProtectRepoStep {
    fn name(&self) -> StepName {
        StepName::ProtectRepo
    }

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()> {
        let repo = ctx.require(
            &format!("repository name for course {}", ctx.course.id),
            Service::Repos,
            ResourceKind::RepoName,
            MAIN,
            None,
            StepName::CreateRepo,
        )?;

        match ctx.repos.protect_branch(ctx.course.id, &repo, "main") {
            Ok(()) => Ok(()),
            Err(ProvostError::VendorRestricted(msg)) => {
                warn!(repo = %repo, "branch protection skipped: {msg}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// SeedRepoStep
// ---------------------------------------------------------------------------

pub struct SeedRepoStep;

impl Step for SeedRepoStep {
    fn name(&self) -> StepName {
        StepName::SeedRepo
    }

    fn execute(&self, ctx: &StepContext<'_>) -> Result<()> {
        let repo = ctx.require(
            &format!("repository name for course {}", ctx.course.id),
            Service::Repos,
            ResourceKind::RepoName,
            MAIN,
            None,
            StepName::CreateRepo,
        )?;

        if ctx
            .lookup(Service::Repos, ResourceKind::Seeded, MAIN, None)?
            .is_some()
        {
            return Ok(());
        }

        let readme = ctx
            .store
            .template_content(ctx.course.template_id.as_deref())?;
        let files = template::seed_files(readme);
        ctx.repos.seed_content(ctx.course.id, &repo, &files)?;

        ctx.record(Service::Repos, ResourceKind::Seeded, MAIN, None, "true")
    }
}
