use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// CourseShape
// ---------------------------------------------------------------------------

/// Single-track courses provision one shared resource set; combined-track
/// courses add per-group resources on top of the shared set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseShape {
    SingleTrack,
    CombinedTrack,
}

impl CourseShape {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseShape::SingleTrack => "single_track",
            CourseShape::CombinedTrack => "combined_track",
        }
    }
}

impl fmt::Display for CourseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CourseShape {
    type Err = crate::error::ProvostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_track" => Ok(CourseShape::SingleTrack),
            "combined_track" => Ok(CourseShape::CombinedTrack),
            _ => Err(crate::error::ProvostError::InvalidValue(format!(
                "unknown course shape '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// CourseStatus
// ---------------------------------------------------------------------------

/// Top-level course lifecycle.
///
/// `pending → in_progress → completed | failed`; a requested retry moves
/// `failed → retrying`, and the resumed execution flips back to
/// `in_progress`. The processor is the sole writer during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Retrying,
}

impl CourseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseStatus::Pending => "pending",
            CourseStatus::InProgress => "in_progress",
            CourseStatus::Completed => "completed",
            CourseStatus::Failed => "failed",
            CourseStatus::Retrying => "retrying",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CourseStatus {
    type Err = crate::error::ProvostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CourseStatus::Pending),
            "in_progress" => Ok(CourseStatus::InProgress),
            "completed" => Ok(CourseStatus::Completed),
            "failed" => Ok(CourseStatus::Failed),
            "retrying" => Ok(CourseStatus::Retrying),
            _ => Err(crate::error::ProvostError::InvalidValue(format!(
                "unknown course status '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// StepStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepStatus {
    type Err = crate::error::ProvostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StepStatus::Pending),
            "in_progress" => Ok(StepStatus::InProgress),
            "completed" => Ok(StepStatus::Completed),
            "failed" => Ok(StepStatus::Failed),
            _ => Err(crate::error::ProvostError::InvalidValue(format!(
                "unknown step status '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// StepName
// ---------------------------------------------------------------------------

/// Stable step identifiers, used as the join key between workflow
/// definitions and persisted step-status records. Renaming a variant's
/// string is a data migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    CreateSpace,
    CreateChannels,
    CreateRepo,
    ProtectRepo,
    SeedRepo,
    CreateGroupRoles,
    CreateGroupChannels,
    CreateGroupRepos,
    ProtectGroupRepos,
    SeedGroupRepos,
}

impl StepName {
    pub fn as_str(self) -> &'static str {
        match self {
            StepName::CreateSpace => "create_space",
            StepName::CreateChannels => "create_channels",
            StepName::CreateRepo => "create_repo",
            StepName::ProtectRepo => "protect_repo",
            StepName::SeedRepo => "seed_repo",
            StepName::CreateGroupRoles => "create_group_roles",
            StepName::CreateGroupChannels => "create_group_channels",
            StepName::CreateGroupRepos => "create_group_repos",
            StepName::ProtectGroupRepos => "protect_group_repos",
            StepName::SeedGroupRepos => "seed_group_repos",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepName {
    type Err = crate::error::ProvostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_space" => Ok(StepName::CreateSpace),
            "create_channels" => Ok(StepName::CreateChannels),
            "create_repo" => Ok(StepName::CreateRepo),
            "protect_repo" => Ok(StepName::ProtectRepo),
            "seed_repo" => Ok(StepName::SeedRepo),
            "create_group_roles" => Ok(StepName::CreateGroupRoles),
            "create_group_channels" => Ok(StepName::CreateGroupChannels),
            "create_group_repos" => Ok(StepName::CreateGroupRepos),
            "protect_group_repos" => Ok(StepName::ProtectGroupRepos),
            "seed_group_repos" => Ok(StepName::SeedGroupRepos),
            _ => Err(crate::error::ProvostError::InvalidValue(format!(
                "unknown step name '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Service / ResourceKind (resource ledger key components)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Chat,
    Repos,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Service::Chat => "chat",
            Service::Repos => "repos",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Service {
    type Err = crate::error::ProvostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Service::Chat),
            "repos" => Ok(Service::Repos),
            _ => Err(crate::error::ProvostError::InvalidValue(format!(
                "unknown service '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Space,
    Channel,
    Role,
    Invite,
    Repo,
    RepoName,
    Seeded,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Space => "space",
            ResourceKind::Channel => "channel",
            ResourceKind::Role => "role",
            ResourceKind::Invite => "invite",
            ResourceKind::Repo => "repo",
            ResourceKind::RepoName => "repo_name",
            ResourceKind::Seeded => "seeded",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = crate::error::ProvostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "space" => Ok(ResourceKind::Space),
            "channel" => Ok(ResourceKind::Channel),
            "role" => Ok(ResourceKind::Role),
            "invite" => Ok(ResourceKind::Invite),
            "repo" => Ok(ResourceKind::Repo),
            "repo_name" => Ok(ResourceKind::RepoName),
            "seeded" => Ok(ResourceKind::Seeded),
            _ => Err(crate::error::ProvostError::InvalidValue(format!(
                "unknown resource kind '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
