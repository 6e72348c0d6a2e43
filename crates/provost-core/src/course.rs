use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{CourseShape, CourseStatus};

// ---------------------------------------------------------------------------
// ScheduleSlot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl ScheduleSlot {
    pub fn is_empty(&self) -> bool {
        self.room.is_none() && self.day.is_none() && self.time.is_none()
    }
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A sub-unit of a combined-track course (e.g. a lab section). Created with
/// the course and never mutated by the provisioning engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub course_id: Uuid,
    /// Ordinal number; group iteration inside steps is ascending by this.
    pub number: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<ScheduleSlot>,
}

impl Group {
    /// Role name override, or the derived `"Group <n> — <name>"`.
    pub fn effective_role_name(&self) -> String {
        self.role_name
            .clone()
            .unwrap_or_else(|| format!("Group {} — {}", self.number, self.name))
    }

    /// Repository name override, or `<course-slug>-<term-slug>-group-<n>`.
    pub fn effective_repo_name(&self, course: &Course) -> String {
        self.repo_name.clone().unwrap_or_else(|| {
            format!(
                "{}-{}-group-{}",
                slugify(&course.name),
                slugify(&course.term),
                self.number
            )
        })
    }

    /// Channel-name fragment for this group's session channels: the time
    /// slot with `:` replaced by `_`, or `group-<n>`.
    pub fn channel_slug(&self) -> String {
        match self.slot.as_ref().and_then(|s| s.time.as_deref()) {
            Some(time) => time.replace(':', "_"),
            None => format!("group-{}", self.number),
        }
    }
}

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

/// The subject of provisioning. Owned by the management layer; the engine
/// reads it and writes only `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub term: String,
    pub shape: CourseShape,
    pub status: CourseStatus,
    /// Pre-provisioned communication-space identifier. Required before the
    /// first step runs; its absence is a configuration error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    /// Communication channel names; empty means the built-in default list.
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_session_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<ScheduleSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub groups: Vec<Group>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Repository name override, or `<course-slug>-<term-slug>`.
    pub fn effective_repo_name(&self) -> String {
        self.repo_name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", slugify(&self.name), slugify(&self.term)))
    }
}

// ---------------------------------------------------------------------------
// NewCourse / NewGroup (creation inputs from the management layer)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub term: String,
    pub shape: CourseShape,
    #[serde(default)]
    pub space_id: Option<String>,
    #[serde(default)]
    pub repo_name: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub session_count: Option<u32>,
    #[serde(default)]
    pub group_session_count: Option<u32>,
    #[serde(default)]
    pub slot: Option<ScheduleSlot>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub groups: Vec<NewGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub repo_name: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub slot: Option<ScheduleSlot>,
}

// ---------------------------------------------------------------------------
// Slug derivation
// ---------------------------------------------------------------------------

/// Lowercase, non-alphanumerics collapsed to single hyphens, trimmed.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_hyphen = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn course(name: &str, term: &str) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            name: name.to_string(),
            term: term.to_string(),
            shape: CourseShape::SingleTrack,
            status: CourseStatus::Pending,
            space_id: None,
            repo_name: None,
            channels: Vec::new(),
            session_count: None,
            group_session_count: None,
            slot: None,
            template_id: None,
            groups: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn slugify_collapses_and_lowercases() {
        assert_eq!(slugify("Event Driven Programming"), "event-driven-programming");
        assert_eq!(slugify("  OOP / 2026!  "), "oop-2026");
        assert_eq!(slugify("fall-2026"), "fall-2026");
    }

    #[test]
    fn derived_repo_name() {
        let c = course("Event Driven Programming", "Fall 2026");
        assert_eq!(c.effective_repo_name(), "event-driven-programming-fall-2026");
    }

    #[test]
    fn repo_name_override_wins() {
        let mut c = course("Whatever", "Fall 2026");
        c.repo_name = Some("edp-custom".to_string());
        assert_eq!(c.effective_repo_name(), "edp-custom");
    }

    #[test]
    fn group_names_derive_from_course() {
        let c = course("Operating Systems", "Spring 2026");
        let g = Group {
            id: Uuid::new_v4(),
            course_id: c.id,
            number: 2,
            name: "Tuesday lab".to_string(),
            repo_name: None,
            channel_name: None,
            role_name: None,
            slot: Some(ScheduleSlot {
                room: None,
                day: None,
                time: Some("14:30".to_string()),
            }),
        };
        assert_eq!(
            g.effective_repo_name(&c),
            "operating-systems-spring-2026-group-2"
        );
        assert_eq!(g.effective_role_name(), "Group 2 — Tuesday lab");
        assert_eq!(g.channel_slug(), "14_30");
    }

    #[test]
    fn group_channel_slug_without_time() {
        let g = Group {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            number: 3,
            name: "g3".to_string(),
            repo_name: None,
            channel_name: None,
            role_name: None,
            slot: None,
        };
        assert_eq!(g.channel_slug(), "group-3");
    }
}
