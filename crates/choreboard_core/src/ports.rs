//! crates/choreboard_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    InstanceStatus, Member, MemberCredentials, Project, TaskInstance, TaskTemplate, WeekInstance,
    WorkLog,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Port Payload Structs
//=========================================================================================

/// Raw column values for a new template row. Deliberately storage-shaped:
/// validation happens through `FrequencyRule::from_parts` before a row is
/// accepted, and again every time a row is read back.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub title: String,
    pub frequency_type: String,
    pub day_of_week: Option<i32>,
    pub week_of_month: Option<i32>,
    pub day_of_month: Option<i32>,
    pub semiannual_months: Option<String>,
    pub conditional_after_time: Option<String>,
    pub assigned_to: Uuid,
    pub points_base: i32,
}

/// Values copied from a template onto a freshly materialized instance.
#[derive(Debug, Clone)]
pub struct InstanceDefaults {
    pub assigned_to: Uuid,
    pub available_after: Option<String>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Member Management ---
    async fn get_member(&self, member_id: Uuid) -> PortResult<Member>;

    async fn list_members(&self) -> PortResult<Vec<Member>>;

    async fn create_parent(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: &str,
    ) -> PortResult<Member>;

    async fn create_child(&self, display_name: &str) -> PortResult<Member>;

    // --- Auth Methods ---
    async fn get_credentials_by_email(&self, email: &str) -> PortResult<MemberCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        member_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Projects & Work Logs ---
    async fn create_project(
        &self,
        name: &str,
        hourly_rate: f64,
        created_by: Uuid,
    ) -> PortResult<Project>;

    async fn list_projects(&self) -> PortResult<Vec<Project>>;

    async fn create_work_log(
        &self,
        project_id: Uuid,
        member_id: Uuid,
        hours: f64,
        note: Option<&str>,
    ) -> PortResult<WorkLog>;

    async fn approve_work_log(&self, work_log_id: Uuid, approved_by: Uuid) -> PortResult<()>;

    async fn list_work_logs_for_member(&self, member_id: Uuid) -> PortResult<Vec<WorkLog>>;

    /// Sum of `hours * hourly_rate` over the member's approved logs.
    async fn approved_earnings(&self, member_id: Uuid) -> PortResult<f64>;
}

/// Read side of the recurring-chore definitions, as the materializer sees it.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Only templates with `active = true`.
    async fn list_active(&self) -> PortResult<Vec<TaskTemplate>>;

    async fn list_all(&self) -> PortResult<Vec<TaskTemplate>>;

    async fn create(&self, new: NewTemplate) -> PortResult<TaskTemplate>;

    async fn set_active(&self, template_id: Uuid, active: bool) -> PortResult<()>;
}

/// Store for dated chore occurrences.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Insert-if-absent, no-op-if-present, keyed on `(template_id, task_date)`.
    /// An existing row is never modified, whatever its current status. The
    /// at-most-one-row-per-key invariant is the store's to enforce (unique
    /// index), including under concurrent materialization of the same date.
    async fn upsert_if_absent(
        &self,
        template_id: Uuid,
        task_date: NaiveDate,
        defaults: &InstanceDefaults,
    ) -> PortResult<()>;

    /// Instances in the inclusive date range, joined with the template's
    /// base points and the assignee identity for the summary path.
    async fn list_range(&self, from: NaiveDate, to: NaiveDate) -> PortResult<Vec<WeekInstance>>;

    async fn set_status(
        &self,
        instance_id: Uuid,
        status: InstanceStatus,
        done_without_reminder: bool,
        complaint_logged: bool,
    ) -> PortResult<TaskInstance>;

    /// Records a voluntary occurrence outside the normal schedule
    /// (`is_extra = true`). Colliding with an existing `(template, date)`
    /// row is a `Conflict`.
    async fn insert_extra(
        &self,
        template_id: Uuid,
        task_date: NaiveDate,
    ) -> PortResult<TaskInstance>;
}

#[async_trait]
pub trait PriceService: Send + Sync {
    /// Current price of one Bitcoin in the configured fiat currency.
    async fn btc_price(&self) -> PortResult<f64>;
}
