//! Shared test doubles: recording in-memory vendor clients and course
//! fixtures used by the processor, scheduler and worker tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::course::{NewCourse, NewGroup};
use crate::error::{ProvostError, Result};
use crate::store::CourseStore;
use crate::types::CourseShape;
use crate::vendor::{ChannelRequest, ChatClient, CreatedRepo, Invite, RepoClient, SeedFile};

// ---------------------------------------------------------------------------
// FakeChat
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeChat {
    pub calls: Mutex<Vec<String>>,
    pub fail_on: Mutex<Option<String>>,
    counter: AtomicU32,
}

impl FakeChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_on(&self, pattern: &str) {
        *self.fail_on.lock().unwrap() = Some(pattern.to_string());
    }

    pub fn clear_failure(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    fn invoke(&self, label: String) -> Result<()> {
        if let Some(pattern) = self.fail_on.lock().unwrap().as_deref() {
            if label.contains(pattern) {
                return Err(ProvostError::Vendor {
                    action: label,
                    message: "injected chat failure".to_string(),
                });
            }
        }
        self.calls.lock().unwrap().push(label);
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl ChatClient for FakeChat {
    fn create_space(&self, _course_id: Uuid, name: &str) -> Result<String> {
        self.invoke(format!("create_space:{name}"))?;
        Ok(self.next_id("space"))
    }

    fn create_channel(
        &self,
        _course_id: Uuid,
        _space_id: &str,
        req: &ChannelRequest,
    ) -> Result<String> {
        self.invoke(format!("create_channel:{}", req.name))?;
        Ok(self.next_id("chan"))
    }

    fn create_role(&self, _course_id: Uuid, _space_id: &str, name: &str) -> Result<String> {
        self.invoke(format!("create_role:{name}"))?;
        Ok(self.next_id("role"))
    }

    fn create_invite(&self, _course_id: Uuid, channel_id: &str) -> Result<Invite> {
        self.invoke(format!("create_invite:{channel_id}"))?;
        let code = self.next_id("inv");
        Ok(Invite {
            url: format!("https://chat.example.com/invite/{code}"),
            code,
        })
    }
}

// ---------------------------------------------------------------------------
// FakeRepo
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeRepo {
    pub calls: Mutex<Vec<String>>,
    pub fail_on: Mutex<Option<String>>,
    /// When set, protect_branch reports a plan-tier restriction.
    pub restricted: AtomicBool,
    counter: AtomicU32,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_on(&self, pattern: &str) {
        *self.fail_on.lock().unwrap() = Some(pattern.to_string());
    }

    pub fn clear_failure(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    fn invoke(&self, label: String) -> Result<()> {
        if let Some(pattern) = self.fail_on.lock().unwrap().as_deref() {
            if label.contains(pattern) {
                return Err(ProvostError::Vendor {
                    action: label,
                    message: "injected repo failure".to_string(),
                });
            }
        }
        self.calls.lock().unwrap().push(label);
        Ok(())
    }
}

impl RepoClient for FakeRepo {
    fn create_repo(&self, _course_id: Uuid, name: &str) -> Result<CreatedRepo> {
        self.invoke(format!("create_repo:{name}"))?;
        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CreatedRepo {
            id: id.to_string(),
            name: name.to_string(),
            url: format!("https://repos.example.com/acme/{name}"),
        })
    }

    fn protect_branch(&self, _course_id: Uuid, repo: &str, branch: &str) -> Result<()> {
        if self.restricted.load(Ordering::SeqCst) {
            return Err(ProvostError::VendorRestricted(format!(
                "branch protection unavailable for {repo}"
            )));
        }
        self.invoke(format!("protect_branch:{repo}:{branch}"))
    }

    fn seed_content(&self, _course_id: Uuid, repo: &str, files: &[SeedFile]) -> Result<()> {
        self.invoke(format!("seed_content:{repo}:{}", files.len()))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn course_input(shape: CourseShape, group_count: u32) -> NewCourse {
    NewCourse {
        name: "Distributed Systems".to_string(),
        term: "Fall 2026".to_string(),
        shape,
        space_id: Some("space-main".to_string()),
        repo_name: None,
        channels: Vec::new(),
        session_count: None,
        group_session_count: None,
        slot: None,
        template_id: None,
        groups: (1..=group_count)
            .map(|n| NewGroup {
                number: n,
                name: format!("Group {n}"),
                repo_name: None,
                channel_name: None,
                role_name: None,
                slot: None,
            })
            .collect(),
    }
}

pub fn store() -> Arc<CourseStore> {
    Arc::new(CourseStore::open_in_memory().unwrap())
}
