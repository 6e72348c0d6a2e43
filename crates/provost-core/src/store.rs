//! Durable store for courses, step-status records, the resource ledger,
//! the execution log, the vendor-call audit log, and seed templates.
//!
//! Everything lives in one SQLite database so that step-status and ledger
//! writes for a course happen-before the next step's reads without any
//! cross-store coordination. The ledger write is a single atomic upsert;
//! the course-scoped (group-less) key stores `group_id = ''` so the
//! composite primary key covers it.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog;
use crate::course::{Course, Group, NewCourse, ScheduleSlot};
use crate::error::{ProvostError, Result};
use crate::template;
use crate::types::{CourseShape, CourseStatus, ResourceKind, Service, StepName, StepStatus};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Per-course, per-step persisted progress. Mutated only by the processor
/// (and the retry reset).
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub course_id: Uuid,
    pub step: StepName,
    pub order: u32,
    pub status: StepStatus,
    pub attempts: u32,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// One resource-ledger row: proof that an external side effect happened.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceEntry {
    pub service: Service,
    pub kind: ResourceKind,
    pub key: String,
    pub group_id: Option<Uuid>,
    pub external_id: String,
}

/// Append-only record of a queue admission for a course.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    pub course_id: Uuid,
    pub job_key: String,
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
}

/// One audited vendor call.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub course_id: Uuid,
    pub action: String,
    pub success: bool,
    pub detail: Option<serde_json::Value>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Seed-content template for repository seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedTemplate {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Column helpers
// ---------------------------------------------------------------------------

fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn enum_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ProvostError>,
{
    let s: String = row.get(idx)?;
    T::from_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn slot_cols(
    row: &Row<'_>,
    room: usize,
    day: usize,
    time: usize,
) -> rusqlite::Result<Option<ScheduleSlot>> {
    let slot = ScheduleSlot {
        room: row.get(room)?,
        day: row.get(day)?,
        time: row.get(time)?,
    };
    Ok(if slot.is_empty() { None } else { Some(slot) })
}

// ---------------------------------------------------------------------------
// CourseStore
// ---------------------------------------------------------------------------

pub struct CourseStore {
    conn: Mutex<Connection>,
}

impl CourseStore {
    /// Open or create the SQLite database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.seed_builtin_templates()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-call;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -----------------------------------------------------------------------
    // Courses
    // -----------------------------------------------------------------------

    /// Create a course together with its groups and one pending step record
    /// per workflow step, in a single transaction.
    pub fn create_course(&self, new: NewCourse) -> Result<Course> {
        if new.shape == CourseShape::CombinedTrack && new.groups.is_empty() {
            return Err(ProvostError::GroupsRequired);
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut groups: Vec<Group> = new
            .groups
            .into_iter()
            .map(|g| Group {
                id: Uuid::new_v4(),
                course_id: id,
                number: g.number,
                name: g.name,
                repo_name: g.repo_name,
                channel_name: g.channel_name,
                role_name: g.role_name,
                slot: g.slot,
            })
            .collect();
        groups.sort_by_key(|g| g.number);

        let course = Course {
            id,
            name: new.name,
            term: new.term,
            shape: new.shape,
            status: CourseStatus::Pending,
            space_id: new.space_id,
            repo_name: new.repo_name,
            channels: new.channels,
            session_count: new.session_count,
            group_session_count: new.group_session_count,
            slot: new.slot,
            template_id: new.template_id,
            groups,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let slot = course.slot.clone().unwrap_or_default();
            tx.execute(
                "INSERT INTO courses (id, name, term, shape, status, space_id, repo_name,
                                      channels, session_count, group_session_count,
                                      room, day, time, template_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    course.id.to_string(),
                    course.name,
                    course.term,
                    course.shape.as_str(),
                    course.status.as_str(),
                    course.space_id,
                    course.repo_name,
                    serde_json::to_string(&course.channels)?,
                    course.session_count,
                    course.group_session_count,
                    slot.room,
                    slot.day,
                    slot.time,
                    course.template_id,
                    course.created_at,
                    course.updated_at,
                ],
            )?;

            for group in &course.groups {
                let slot = group.slot.clone().unwrap_or_default();
                tx.execute(
                    "INSERT INTO course_groups (id, course_id, number, name, repo_name,
                                                channel_name, role_name, room, day, time)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        group.id.to_string(),
                        group.course_id.to_string(),
                        group.number,
                        group.name,
                        group.repo_name,
                        group.channel_name,
                        group.role_name,
                        slot.room,
                        slot.day,
                        slot.time,
                    ],
                )?;
            }

            for (idx, step) in catalog::resolve_workflow(course.shape).iter().enumerate() {
                tx.execute(
                    "INSERT INTO step_records (course_id, step_name, step_order, status, attempts)
                     VALUES (?1, ?2, ?3, ?4, 0)",
                    params![
                        course.id.to_string(),
                        step.as_str(),
                        (idx + 1) as u32,
                        StepStatus::Pending.as_str(),
                    ],
                )?;
            }
        }
        tx.commit()?;

        Ok(course)
    }

    pub fn course(&self, id: Uuid) -> Result<Course> {
        let conn = self.conn();
        let course = conn
            .query_row(
                "SELECT id, name, term, shape, status, space_id, repo_name, channels,
                        session_count, group_session_count, room, day, time, template_id,
                        created_at, updated_at
                 FROM courses WHERE id = ?1",
                params![id.to_string()],
                Self::course_from_row,
            )
            .optional()?
            .ok_or_else(|| ProvostError::CourseNotFound(id.to_string()))?;

        let mut course = course;
        course.groups = self.groups_for(&conn, id)?;
        Ok(course)
    }

    pub fn courses(&self) -> Result<Vec<Course>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, term, shape, status, space_id, repo_name, channels,
                    session_count, group_session_count, room, day, time, template_id,
                    created_at, updated_at
             FROM courses ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], Self::course_from_row)?;
        let mut courses = Vec::new();
        for row in rows {
            let mut course = row?;
            course.groups = self.groups_for(&conn, course.id)?;
            courses.push(course);
        }
        Ok(courses)
    }

    fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
        let channels_json: String = row.get(7)?;
        let channels: Vec<String> = serde_json::from_str(&channels_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Course {
            id: uuid_col(row, 0)?,
            name: row.get(1)?,
            term: row.get(2)?,
            shape: enum_col(row, 3)?,
            status: enum_col(row, 4)?,
            space_id: row.get(5)?,
            repo_name: row.get(6)?,
            channels,
            session_count: row.get(8)?,
            group_session_count: row.get(9)?,
            slot: slot_cols(row, 10, 11, 12)?,
            template_id: row.get(13)?,
            groups: Vec::new(),
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    fn groups_for(&self, conn: &Connection, course_id: Uuid) -> Result<Vec<Group>> {
        let mut stmt = conn.prepare(
            "SELECT id, course_id, number, name, repo_name, channel_name, role_name,
                    room, day, time
             FROM course_groups WHERE course_id = ?1 ORDER BY number ASC",
        )?;
        let rows = stmt.query_map(params![course_id.to_string()], |row| {
            Ok(Group {
                id: uuid_col(row, 0)?,
                course_id: uuid_col(row, 1)?,
                number: row.get(2)?,
                name: row.get(3)?,
                repo_name: row.get(4)?,
                channel_name: row.get(5)?,
                role_name: row.get(6)?,
                slot: slot_cols(row, 7, 8, 9)?,
            })
        })?;
        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }

    pub fn set_course_status(&self, id: Uuid, status: CourseStatus) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE courses SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(ProvostError::CourseNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a course and everything hanging off it.
    pub fn delete_course(&self, id: Uuid) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let key = id.to_string();
        tx.execute("DELETE FROM resources WHERE course_id = ?1", params![key])?;
        tx.execute("DELETE FROM audit_log WHERE course_id = ?1", params![key])?;
        tx.execute("DELETE FROM executions WHERE course_id = ?1", params![key])?;
        tx.execute("DELETE FROM step_records WHERE course_id = ?1", params![key])?;
        tx.execute("DELETE FROM course_groups WHERE course_id = ?1", params![key])?;
        let deleted = tx.execute("DELETE FROM courses WHERE id = ?1", params![key])?;
        tx.commit()?;
        if deleted == 0 {
            return Err(ProvostError::CourseNotFound(key));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Step-status records
    // -----------------------------------------------------------------------

    pub fn step_records(&self, course_id: Uuid) -> Result<Vec<StepRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT course_id, step_name, step_order, status, attempts, error,
                    started_at, finished_at
             FROM step_records WHERE course_id = ?1 ORDER BY step_order ASC",
        )?;
        let rows = stmt.query_map(params![course_id.to_string()], Self::step_from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn step_record(&self, course_id: Uuid, step: StepName) -> Result<Option<StepRecord>> {
        let record = self
            .conn()
            .query_row(
                "SELECT course_id, step_name, step_order, status, attempts, error,
                        started_at, finished_at
                 FROM step_records WHERE course_id = ?1 AND step_name = ?2",
                params![course_id.to_string(), step.as_str()],
                Self::step_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn step_from_row(row: &Row<'_>) -> rusqlite::Result<StepRecord> {
        Ok(StepRecord {
            course_id: uuid_col(row, 0)?,
            step: enum_col(row, 1)?,
            order: row.get(2)?,
            status: enum_col(row, 3)?,
            attempts: row.get(4)?,
            error: row.get(5)?,
            started_at: row.get(6)?,
            finished_at: row.get(7)?,
        })
    }

    /// Mark a step in progress: increments attempts and stamps `started_at`.
    pub fn begin_step(&self, course_id: Uuid, step: StepName) -> Result<()> {
        self.update_step(
            course_id,
            step,
            "UPDATE step_records
             SET status = 'in_progress', attempts = attempts + 1, started_at = ?3
             WHERE course_id = ?1 AND step_name = ?2",
        )
    }

    pub fn complete_step(&self, course_id: Uuid, step: StepName) -> Result<()> {
        self.update_step(
            course_id,
            step,
            "UPDATE step_records
             SET status = 'completed', finished_at = ?3, error = NULL
             WHERE course_id = ?1 AND step_name = ?2",
        )
    }

    pub fn fail_step(&self, course_id: Uuid, step: StepName, error: &str) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE step_records
             SET status = 'failed', finished_at = ?3, error = ?4
             WHERE course_id = ?1 AND step_name = ?2",
            params![course_id.to_string(), step.as_str(), Utc::now(), error],
        )?;
        if changed == 0 {
            return Err(ProvostError::StepRecordMissing {
                course: course_id.to_string(),
                step,
            });
        }
        Ok(())
    }

    fn update_step(&self, course_id: Uuid, step: StepName, sql: &str) -> Result<()> {
        let changed = self.conn().execute(
            sql,
            params![course_id.to_string(), step.as_str(), Utc::now()],
        )?;
        if changed == 0 {
            return Err(ProvostError::StepRecordMissing {
                course: course_id.to_string(),
                step,
            });
        }
        Ok(())
    }

    /// Reset failed step records to pending for a retry. Completed records
    /// are left alone so the resumed run skips them. Returns the number of
    /// records reset.
    pub fn reset_failed_steps(&self, course_id: Uuid) -> Result<usize> {
        let changed = self.conn().execute(
            "UPDATE step_records SET status = 'pending', error = NULL
             WHERE course_id = ?1 AND status = 'failed'",
            params![course_id.to_string()],
        )?;
        Ok(changed)
    }

    // -----------------------------------------------------------------------
    // Resource ledger
    // -----------------------------------------------------------------------

    /// Is the external side effect behind this key already done? Returns the
    /// recorded external id if so.
    pub fn lookup_resource(
        &self,
        course_id: Uuid,
        service: Service,
        kind: ResourceKind,
        key: &str,
        group_id: Option<Uuid>,
    ) -> Result<Option<String>> {
        let external = self
            .conn()
            .query_row(
                "SELECT external_id FROM resources
                 WHERE course_id = ?1 AND service = ?2 AND kind = ?3
                   AND resource_key = ?4 AND group_id = ?5",
                params![
                    course_id.to_string(),
                    service.as_str(),
                    kind.as_str(),
                    key,
                    group_id.map(|g| g.to_string()).unwrap_or_default(),
                ],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(external)
    }

    /// Record an external side effect. Atomic upsert; last write wins.
    pub fn record_resource(
        &self,
        course_id: Uuid,
        service: Service,
        kind: ResourceKind,
        key: &str,
        group_id: Option<Uuid>,
        external_id: &str,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO resources (course_id, service, kind, resource_key, group_id, external_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(course_id, service, kind, resource_key, group_id)
             DO UPDATE SET external_id = excluded.external_id",
            params![
                course_id.to_string(),
                service.as_str(),
                kind.as_str(),
                key,
                group_id.map(|g| g.to_string()).unwrap_or_default(),
                external_id,
            ],
        )?;
        Ok(())
    }

    pub fn resources(&self, course_id: Uuid) -> Result<Vec<ResourceEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT service, kind, resource_key, group_id, external_id
             FROM resources WHERE course_id = ?1
             ORDER BY service, kind, resource_key",
        )?;
        let rows = stmt.query_map(params![course_id.to_string()], |row| {
            let group_raw: String = row.get(3)?;
            let group_id = if group_raw.is_empty() {
                None
            } else {
                Some(Uuid::parse_str(&group_raw).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?)
            };
            Ok(ResourceEntry {
                service: enum_col(row, 0)?,
                kind: enum_col(row, 1)?,
                key: row.get(2)?,
                group_id,
                external_id: row.get(4)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    // -----------------------------------------------------------------------
    // Execution log
    // -----------------------------------------------------------------------

    pub fn record_execution(&self, course_id: Uuid, job_key: &str, attempt: u32) -> Result<()> {
        self.conn().execute(
            "INSERT INTO executions (course_id, job_key, attempt, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![course_id.to_string(), job_key, attempt, Utc::now()],
        )?;
        Ok(())
    }

    pub fn execution_count(&self, course_id: Uuid) -> Result<u32> {
        let count: u32 = self.conn().query_row(
            "SELECT COUNT(*) FROM executions WHERE course_id = ?1",
            params![course_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn executions(&self, course_id: Uuid) -> Result<Vec<ExecutionRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT course_id, job_key, attempt, created_at
             FROM executions WHERE course_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![course_id.to_string()], |row| {
            Ok(ExecutionRecord {
                course_id: uuid_col(row, 0)?,
                job_key: row.get(1)?,
                attempt: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    // -----------------------------------------------------------------------
    // Audit log
    // -----------------------------------------------------------------------

    pub fn append_audit(&self, rec: &AuditRecord) -> Result<()> {
        let detail = match &rec.detail {
            Some(v) => Some(serde_json::to_string(v)?),
            None => None,
        };
        self.conn().execute(
            "INSERT INTO audit_log (course_id, action, result, detail, error, duration_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                rec.course_id.to_string(),
                rec.action,
                if rec.success { "success" } else { "failure" },
                detail,
                rec.error,
                rec.duration_ms,
                rec.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn audit_entries(&self, course_id: Uuid) -> Result<Vec<AuditRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT course_id, action, result, detail, error, duration_ms, created_at
             FROM audit_log WHERE course_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![course_id.to_string()], |row| {
            let result: String = row.get(2)?;
            let detail_raw: Option<String> = row.get(3)?;
            let detail = match detail_raw {
                Some(s) => Some(serde_json::from_str(&s).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?),
                None => None,
            };
            Ok(AuditRecord {
                course_id: uuid_col(row, 0)?,
                action: row.get(1)?,
                success: result == "success",
                detail,
                error: row.get(4)?,
                duration_ms: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    // -----------------------------------------------------------------------
    // Seed templates
    // -----------------------------------------------------------------------

    fn seed_builtin_templates(&self) -> Result<()> {
        let conn = self.conn();
        for t in template::builtin_templates() {
            conn.execute(
                "INSERT OR IGNORE INTO templates (id, label, description, content)
                 VALUES (?1, ?2, ?3, ?4)",
                params![t.id, t.label, t.description, t.content],
            )?;
        }
        Ok(())
    }

    pub fn upsert_template(&self, t: &SeedTemplate) -> Result<()> {
        self.conn().execute(
            "INSERT INTO templates (id, label, description, content)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 label = excluded.label,
                 description = excluded.description,
                 content = excluded.content",
            params![t.id, t.label, t.description, t.content],
        )?;
        Ok(())
    }

    pub fn template(&self, id: &str) -> Result<Option<SeedTemplate>> {
        let t = self
            .conn()
            .query_row(
                "SELECT id, label, description, content FROM templates WHERE id = ?1",
                params![id],
                |row| {
                    Ok(SeedTemplate {
                        id: row.get(0)?,
                        label: row.get(1)?,
                        description: row.get(2)?,
                        content: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(t)
    }

    pub fn templates(&self) -> Result<Vec<SeedTemplate>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, label, description, content FROM templates ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(SeedTemplate {
                id: row.get(0)?,
                label: row.get(1)?,
                description: row.get(2)?,
                content: row.get(3)?,
            })
        })?;
        let mut templates = Vec::new();
        for row in rows {
            templates.push(row?);
        }
        Ok(templates)
    }

    /// Content for the course's chosen template, if any is set and stored.
    pub fn template_content(&self, id: Option<&str>) -> Result<Option<String>> {
        match id {
            Some(id) => Ok(self.template(id)?.map(|t| t.content)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS courses (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    term                TEXT NOT NULL,
    shape               TEXT NOT NULL,
    status              TEXT NOT NULL,
    space_id            TEXT,
    repo_name           TEXT,
    channels            TEXT NOT NULL DEFAULT '[]',
    session_count       INTEGER,
    group_session_count INTEGER,
    room                TEXT,
    day                 TEXT,
    time                TEXT,
    template_id         TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS course_groups (
    id           TEXT PRIMARY KEY,
    course_id    TEXT NOT NULL REFERENCES courses(id),
    number       INTEGER NOT NULL,
    name         TEXT NOT NULL,
    repo_name    TEXT,
    channel_name TEXT,
    role_name    TEXT,
    room         TEXT,
    day          TEXT,
    time         TEXT
);

CREATE TABLE IF NOT EXISTS step_records (
    course_id   TEXT NOT NULL REFERENCES courses(id),
    step_name   TEXT NOT NULL,
    step_order  INTEGER NOT NULL,
    status      TEXT NOT NULL,
    attempts    INTEGER NOT NULL DEFAULT 0,
    error       TEXT,
    started_at  TEXT,
    finished_at TEXT,
    PRIMARY KEY (course_id, step_name)
);

CREATE TABLE IF NOT EXISTS resources (
    course_id    TEXT NOT NULL,
    service      TEXT NOT NULL,
    kind         TEXT NOT NULL,
    resource_key TEXT NOT NULL,
    group_id     TEXT NOT NULL DEFAULT '',
    external_id  TEXT NOT NULL,
    PRIMARY KEY (course_id, service, kind, resource_key, group_id)
);

CREATE TABLE IF NOT EXISTS executions (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id  TEXT NOT NULL,
    job_key    TEXT NOT NULL,
    attempt    INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS audit_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id   TEXT NOT NULL,
    action      TEXT NOT NULL,
    result      TEXT NOT NULL,
    detail      TEXT,
    error       TEXT,
    duration_ms INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS templates (
    id          TEXT PRIMARY KEY,
    label       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    content     TEXT NOT NULL
);
";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
