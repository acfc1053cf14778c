//! Role to permission resolution.
//!
//! A principal's permissions are the union of the permissions of every role
//! it holds. Role names compare case-insensitively.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use scolaguard_core::permissions;

#[async_trait]
pub trait RoleCatalog: Send + Sync {
    async fn permissions_for(&self, roles: &[String]) -> anyhow::Result<BTreeSet<String>>;
}

/// In-memory catalogue.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleCatalog {
    roles: HashMap<String, BTreeSet<String>>,
}

impl StaticRoleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role<I, S>(mut self, name: &str, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.insert(
            name.to_lowercase(),
            permissions.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// The roles every school starts with.
    pub fn school_defaults() -> Self {
        use permissions::*;

        Self::new()
            .role("super_admin", ALL.iter().copied())
            .role("admin", ALL.iter().copied())
            .role(
                "director",
                [
                    MODULES_READ,
                    STUDENTS_READ,
                    STUDENTS_MANAGE,
                    FINANCES_READ,
                    EXAMS_READ,
                    ATTENDANCE_READ,
                    TIMETABLE_READ,
                    TIMETABLE_MANAGE,
                    STAFF_MANAGE,
                    REPORTS_READ,
                    COMMUNICATION_SEND,
                    AUDIT_READ,
                ],
            )
            .role(
                "accountant",
                [FINANCES_READ, FINANCES_MANAGE, STUDENTS_READ, REPORTS_READ],
            )
            .role(
                "teacher",
                [
                    STUDENTS_READ,
                    EXAMS_READ,
                    EXAMS_MANAGE,
                    ATTENDANCE_READ,
                    ATTENDANCE_MANAGE,
                    TIMETABLE_READ,
                    COMMUNICATION_SEND,
                ],
            )
            .role(
                "secretary",
                [
                    STUDENTS_READ,
                    STUDENTS_MANAGE,
                    ADMISSIONS_MANAGE,
                    TIMETABLE_READ,
                    COMMUNICATION_SEND,
                ],
            )
            .role(
                "parent",
                [STUDENTS_READ, EXAMS_READ, ATTENDANCE_READ, FINANCES_READ],
            )
            .role("student", [EXAMS_READ, TIMETABLE_READ, ATTENDANCE_READ])
    }
}

#[async_trait]
impl RoleCatalog for StaticRoleCatalog {
    async fn permissions_for(&self, roles: &[String]) -> anyhow::Result<BTreeSet<String>> {
        Ok(roles
            .iter()
            .filter_map(|role| self.roles.get(&role.to_lowercase()))
            .flatten()
            .cloned()
            .collect())
    }
}

/// Reads `roles` and `role_permissions`.
#[derive(Debug, Clone)]
pub struct PgRoleCatalog {
    pool: PgPool,
}

impl PgRoleCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleCatalog for PgRoleCatalog {
    #[instrument(skip(self))]
    async fn permissions_for(&self, roles: &[String]) -> anyhow::Result<BTreeSet<String>> {
        if roles.is_empty() {
            return Ok(BTreeSet::new());
        }

        let names: Vec<String> = roles.iter().map(|r| r.to_lowercase()).collect();
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT rp.permission FROM role_permissions rp \
             JOIN roles r ON r.id = rp.role_id \
             WHERE LOWER(r.name) = ANY($1)",
        )
        .bind(&names)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(permission,)| permission).collect())
    }
}
