//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService`, `TemplateStore`, and `InstanceStore` ports from the
//! `core` crate. It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use choreboard_core::domain::{
    FrequencyRule, InstanceStatus, Member, MemberCredentials, MemberRef, MemberRole, Project,
    TaskInstance, TaskTemplate, WeekInstance, WorkLog,
};
use choreboard_core::ports::{
    DatabaseService, InstanceDefaults, InstanceStore, NewTemplate, PortError, PortResult,
    TemplateStore,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the store ports over PostgreSQL.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct MemberRecord {
    id: Uuid,
    display_name: String,
    role: String,
    email: Option<String>,
}
impl MemberRecord {
    fn to_domain(self) -> Member {
        Member {
            id: self.id,
            display_name: self.display_name,
            // An unrecognized stored role gets the least-privileged one.
            role: MemberRole::parse(&self.role).unwrap_or(MemberRole::Child),
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> MemberCredentials {
        MemberCredentials {
            member_id: self.id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct TemplateRecord {
    id: Uuid,
    title: String,
    frequency_type: String,
    day_of_week: Option<i32>,
    week_of_month: Option<i32>,
    day_of_month: Option<i32>,
    semiannual_months: Option<String>,
    conditional_after_time: Option<String>,
    assigned_to: Uuid,
    points_base: i32,
    active: bool,
}
impl TemplateRecord {
    fn to_domain(self) -> TaskTemplate {
        // Rows that decay into something unparseable keep their template
        // visible but never generate.
        let rule = FrequencyRule::from_parts(
            &self.frequency_type,
            self.day_of_week,
            self.week_of_month,
            self.day_of_month,
            self.semiannual_months.as_deref(),
            self.conditional_after_time.as_deref(),
        );
        TaskTemplate {
            id: self.id,
            title: self.title,
            rule,
            assigned_to: self.assigned_to,
            points_base: self.points_base,
            active: self.active,
        }
    }
}

#[derive(FromRow)]
struct InstanceRecord {
    id: Uuid,
    template_id: Uuid,
    task_date: NaiveDate,
    assigned_to: Uuid,
    status: String,
    done_without_reminder: bool,
    complaint_logged: bool,
    is_extra: bool,
    available_after: Option<String>,
}
impl InstanceRecord {
    fn to_domain(self) -> TaskInstance {
        TaskInstance {
            id: self.id,
            template_id: self.template_id,
            task_date: self.task_date,
            assigned_to: self.assigned_to,
            status: InstanceStatus::parse(&self.status).unwrap_or(InstanceStatus::Pending),
            done_without_reminder: self.done_without_reminder,
            complaint_logged: self.complaint_logged,
            is_extra: self.is_extra,
            available_after: self.available_after,
        }
    }
}

#[derive(FromRow)]
struct WeekInstanceRecord {
    id: Uuid,
    template_id: Uuid,
    task_date: NaiveDate,
    assigned_to: Uuid,
    status: String,
    done_without_reminder: bool,
    complaint_logged: bool,
    is_extra: bool,
    available_after: Option<String>,
    template_points_base: Option<i32>,
    member_name: Option<String>,
}
impl WeekInstanceRecord {
    fn to_domain(self) -> WeekInstance {
        let member = MemberRef {
            id: self.assigned_to,
            display_name: self.member_name.unwrap_or_else(|| "unknown".to_string()),
        };
        let instance = InstanceRecord {
            id: self.id,
            template_id: self.template_id,
            task_date: self.task_date,
            assigned_to: self.assigned_to,
            status: self.status,
            done_without_reminder: self.done_without_reminder,
            complaint_logged: self.complaint_logged,
            is_extra: self.is_extra,
            available_after: self.available_after,
        }
        .to_domain();
        WeekInstance {
            instance,
            points_base: self.template_points_base,
            member,
        }
    }
}

#[derive(FromRow)]
struct ProjectRecord {
    id: Uuid,
    name: String,
    hourly_rate: f64,
    created_by: Uuid,
}
impl ProjectRecord {
    fn to_domain(self) -> Project {
        Project {
            id: self.id,
            name: self.name,
            hourly_rate: self.hourly_rate,
            created_by: self.created_by,
        }
    }
}

#[derive(FromRow)]
struct WorkLogRecord {
    id: Uuid,
    project_id: Uuid,
    member_id: Uuid,
    hours: f64,
    note: Option<String>,
    approved: bool,
    logged_at: DateTime<Utc>,
}
impl WorkLogRecord {
    fn to_domain(self) -> WorkLog {
        WorkLog {
            id: self.id,
            project_id: self.project_id,
            member_id: self.member_id,
            hours: self.hours,
            note: self.note,
            approved: self.approved,
            logged_at: self.logged_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_member(&self, member_id: Uuid) -> PortResult<Member> {
        let record = sqlx::query_as::<_, MemberRecord>(
            "SELECT id, display_name, role, email FROM family_members WHERE id = $1",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Member {} not found", member_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn list_members(&self) -> PortResult<Vec<Member>> {
        let records = sqlx::query_as::<_, MemberRecord>(
            "SELECT id, display_name, role, email FROM family_members ORDER BY display_name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_parent(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: &str,
    ) -> PortResult<Member> {
        let record = sqlx::query_as::<_, MemberRecord>(
            "INSERT INTO family_members (id, display_name, role, email, hashed_password) \
             VALUES ($1, $2, 'parent', $3, $4) \
             RETURNING id, display_name, role, email",
        )
        .bind(Uuid::new_v4())
        .bind(display_name)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("A member with email {} already exists", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn create_child(&self, display_name: &str) -> PortResult<Member> {
        let record = sqlx::query_as::<_, MemberRecord>(
            "INSERT INTO family_members (id, display_name, role) \
             VALUES ($1, $2, 'child') \
             RETURNING id, display_name, role, email",
        )
        .bind(Uuid::new_v4())
        .bind(display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<MemberCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, hashed_password FROM family_members \
             WHERE email = $1 AND hashed_password IS NOT NULL",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("No account for {}", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        member_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (id, member_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(session_id)
        .bind(member_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let member_id: Uuid = sqlx::query_scalar(
            "SELECT member_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(member_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn create_project(
        &self,
        name: &str,
        hourly_rate: f64,
        created_by: Uuid,
    ) -> PortResult<Project> {
        let record = sqlx::query_as::<_, ProjectRecord>(
            "INSERT INTO projects (id, name, hourly_rate, created_by) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, hourly_rate, created_by",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(hourly_rate)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn list_projects(&self) -> PortResult<Vec<Project>> {
        let records = sqlx::query_as::<_, ProjectRecord>(
            "SELECT id, name, hourly_rate, created_by FROM projects ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_work_log(
        &self,
        project_id: Uuid,
        member_id: Uuid,
        hours: f64,
        note: Option<&str>,
    ) -> PortResult<WorkLog> {
        let record = sqlx::query_as::<_, WorkLogRecord>(
            "INSERT INTO work_logs (id, project_id, member_id, hours, note) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, project_id, member_id, hours, note, approved, logged_at",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(member_id)
        .bind(hours)
        .bind(note)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("Project {} not found", project_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn approve_work_log(&self, work_log_id: Uuid, approved_by: Uuid) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE work_logs SET approved = TRUE, approved_by = $2 WHERE id = $1",
        )
        .bind(work_log_id)
        .bind(approved_by)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Work log {} not found",
                work_log_id
            )));
        }
        Ok(())
    }

    async fn list_work_logs_for_member(&self, member_id: Uuid) -> PortResult<Vec<WorkLog>> {
        let records = sqlx::query_as::<_, WorkLogRecord>(
            "SELECT id, project_id, member_id, hours, note, approved, logged_at \
             FROM work_logs WHERE member_id = $1 ORDER BY logged_at ASC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn approved_earnings(&self, member_id: Uuid) -> PortResult<f64> {
        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(w.hours * p.hourly_rate), 0.0) \
             FROM work_logs w JOIN projects p ON p.id = w.project_id \
             WHERE w.member_id = $1 AND w.approved",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(total)
    }
}

//=========================================================================================
// `TemplateStore` Trait Implementation
//=========================================================================================

const TEMPLATE_COLUMNS: &str = "id, title, frequency_type, day_of_week, week_of_month, \
     day_of_month, semiannual_months, conditional_after_time, assigned_to, points_base, active";

#[async_trait]
impl TemplateStore for DbAdapter {
    async fn list_active(&self) -> PortResult<Vec<TaskTemplate>> {
        let records = sqlx::query_as::<_, TemplateRecord>(&format!(
            "SELECT {} FROM chore_templates WHERE active ORDER BY title ASC",
            TEMPLATE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_all(&self) -> PortResult<Vec<TaskTemplate>> {
        let records = sqlx::query_as::<_, TemplateRecord>(&format!(
            "SELECT {} FROM chore_templates ORDER BY title ASC",
            TEMPLATE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create(&self, new: NewTemplate) -> PortResult<TaskTemplate> {
        let record = sqlx::query_as::<_, TemplateRecord>(&format!(
            "INSERT INTO chore_templates \
             (id, title, frequency_type, day_of_week, week_of_month, day_of_month, \
              semiannual_months, conditional_after_time, assigned_to, points_base) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            TEMPLATE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.frequency_type)
        .bind(new.day_of_week)
        .bind(new.week_of_month)
        .bind(new.day_of_month)
        .bind(&new.semiannual_months)
        .bind(&new.conditional_after_time)
        .bind(new.assigned_to)
        .bind(new.points_base)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("Member {} not found", new.assigned_to))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn set_active(&self, template_id: Uuid, active: bool) -> PortResult<()> {
        let result = sqlx::query("UPDATE chore_templates SET active = $2 WHERE id = $1")
            .bind(template_id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Template {} not found",
                template_id
            )));
        }
        Ok(())
    }
}

//=========================================================================================
// `InstanceStore` Trait Implementation
//=========================================================================================

const INSTANCE_COLUMNS: &str = "id, template_id, task_date, assigned_to, status, \
     done_without_reminder, complaint_logged, is_extra, available_after";

#[async_trait]
impl InstanceStore for DbAdapter {
    async fn upsert_if_absent(
        &self,
        template_id: Uuid,
        task_date: NaiveDate,
        defaults: &InstanceDefaults,
    ) -> PortResult<()> {
        // The unique index on (template_id, task_date) makes the no-op branch
        // safe under concurrent materialization of the same date.
        sqlx::query(
            "INSERT INTO chore_instances (id, template_id, task_date, assigned_to, available_after) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (template_id, task_date) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(template_id)
        .bind(task_date)
        .bind(defaults.assigned_to)
        .bind(&defaults.available_after)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn list_range(&self, from: NaiveDate, to: NaiveDate) -> PortResult<Vec<WeekInstance>> {
        let records = sqlx::query_as::<_, WeekInstanceRecord>(
            "SELECT i.id, i.template_id, i.task_date, i.assigned_to, i.status, \
                    i.done_without_reminder, i.complaint_logged, i.is_extra, i.available_after, \
                    t.points_base AS template_points_base, m.display_name AS member_name \
             FROM chore_instances i \
             LEFT JOIN chore_templates t ON t.id = i.template_id \
             LEFT JOIN family_members m ON m.id = i.assigned_to \
             WHERE i.task_date BETWEEN $1 AND $2 \
             ORDER BY i.task_date ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn set_status(
        &self,
        instance_id: Uuid,
        status: InstanceStatus,
        done_without_reminder: bool,
        complaint_logged: bool,
    ) -> PortResult<TaskInstance> {
        let record = sqlx::query_as::<_, InstanceRecord>(&format!(
            "UPDATE chore_instances \
             SET status = $2, done_without_reminder = $3, complaint_logged = $4 \
             WHERE id = $1 \
             RETURNING {}",
            INSTANCE_COLUMNS
        ))
        .bind(instance_id)
        .bind(status.as_str())
        .bind(done_without_reminder)
        .bind(complaint_logged)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Instance {} not found", instance_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn insert_extra(
        &self,
        template_id: Uuid,
        task_date: NaiveDate,
    ) -> PortResult<TaskInstance> {
        let record = sqlx::query_as::<_, InstanceRecord>(&format!(
            "INSERT INTO chore_instances (id, template_id, task_date, assigned_to, is_extra) \
             SELECT $1, t.id, $2, t.assigned_to, TRUE FROM chore_templates t WHERE t.id = $3 \
             RETURNING {}",
            INSTANCE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(task_date)
        .bind(template_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Template {} not found", template_id))
            }
            sqlx::Error::Database(db) if db.is_unique_violation() => PortError::Conflict(
                format!("An instance already exists for {} on {}", template_id, task_date),
            ),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }
}
