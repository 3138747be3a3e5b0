//! services/api/src/web/chores.rs
//!
//! Handlers for the chore lifecycle: materializing a date's instances,
//! recording outcomes, logging extra chores, and the weekly summary.

use crate::web::middleware::require_parent;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::NaiveDate;
use choreboard_core::domain::{InstanceStatus, TaskInstance, WeeklySummaryRow};
use choreboard_core::ports::PortError;
use choreboard_core::scoring::{summarize_week, week_range};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct MaterializeRequest {
    /// The calendar date to materialize, `YYYY-MM-DD`.
    pub date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct SetStatusRequest {
    /// `PENDING`, `DONE`, or `MISSED`.
    pub status: String,
    #[serde(default)]
    pub done_without_reminder: bool,
    #[serde(default)]
    pub complaint_logged: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct LogExtraRequest {
    pub template_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Start of the week to summarize, `YYYY-MM-DD`. Treated as that week's
    /// Monday by convention; the span is always the 7 days from this date.
    pub week_start: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct InstanceResponse {
    pub id: Uuid,
    pub template_id: Uuid,
    pub task_date: NaiveDate,
    pub assigned_to: Uuid,
    pub status: String,
    pub done_without_reminder: bool,
    pub complaint_logged: bool,
    pub is_extra: bool,
    pub available_after: Option<String>,
}

impl InstanceResponse {
    fn from_domain(instance: TaskInstance) -> Self {
        Self {
            id: instance.id,
            template_id: instance.template_id,
            task_date: instance.task_date,
            assigned_to: instance.assigned_to,
            status: instance.status.as_str().to_string(),
            done_without_reminder: instance.done_without_reminder,
            complaint_logged: instance.complaint_logged,
            is_extra: instance.is_extra,
            available_after: instance.available_after,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SummaryRowResponse {
    pub member_id: Uuid,
    pub member_name: String,
    pub total_points: i32,
    pub classification: String,
    pub instances: Vec<InstanceResponse>,
    pub missed: Vec<InstanceResponse>,
}

impl SummaryRowResponse {
    fn from_domain(row: WeeklySummaryRow) -> Self {
        Self {
            member_id: row.member.id,
            member_name: row.member.display_name,
            total_points: row.total_points,
            classification: row.classification.as_str().to_string(),
            instances: row
                .instances
                .into_iter()
                .map(|i| InstanceResponse::from_domain(i.instance))
                .collect(),
            missed: row
                .missed
                .into_iter()
                .map(|i| InstanceResponse::from_domain(i.instance))
                .collect(),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Ensure chore instances exist for a date.
///
/// Safe to call repeatedly: instances that already exist are left untouched,
/// so a retry after a partial failure just completes the date.
#[utoipa::path(
    post,
    path = "/chores/materialize",
    request_body = MaterializeRequest,
    responses(
        (status = 204, description = "Instances ensured for the date"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "A store call failed; retry the request")
    )
)]
pub async fn materialize_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MaterializeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .materializer()
        .ensure_instances_for_date(req.date)
        .await
        .map_err(|e| {
            error!("Materialization for {} failed: {:?}", req.date, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Materialization failed; the request is safe to retry".to_string(),
            )
        })?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a chore's outcome. Parents only.
#[utoipa::path(
    post,
    path = "/chores/instances/{id}/status",
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Updated instance", body = InstanceResponse),
        (status = 400, description = "Unknown status value"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not a parent"),
        (status = 404, description = "No such instance"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The instance to update")
    )
)]
pub async fn set_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(member_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_parent(&state, member_id).await?;

    let status = InstanceStatus::parse(&req.status).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("'{}' is not a valid status", req.status),
        )
    })?;

    let instance = state
        .instances
        .set_status(id, status, req.done_without_reminder, req.complaint_logged)
        .await
        .map_err(|e| match e {
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            _ => {
                error!("Failed to update instance: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to update instance".to_string(),
                )
            }
        })?;
    Ok(Json(InstanceResponse::from_domain(instance)))
}

/// Log a voluntary extra chore outside the normal schedule. Parents only.
#[utoipa::path(
    post,
    path = "/chores/instances/extra",
    request_body = LogExtraRequest,
    responses(
        (status = 201, description = "Extra chore logged", body = InstanceResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not a parent"),
        (status = 404, description = "No such template"),
        (status = 409, description = "An instance already exists for that template and date"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn log_extra_handler(
    State(state): State<Arc<AppState>>,
    Extension(member_id): Extension<Uuid>,
    Json(req): Json<LogExtraRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_parent(&state, member_id).await?;

    let instance = state
        .instances
        .insert_extra(req.template_id, req.date)
        .await
        .map_err(|e| match e {
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            _ => {
                error!("Failed to log extra chore: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to log extra chore".to_string(),
                )
            }
        })?;
    Ok((
        StatusCode::CREATED,
        Json(InstanceResponse::from_domain(instance)),
    ))
}

/// The per-member weekly breakdown: total points, classification band, and
/// every instance in the 7-day span starting at `week_start`.
#[utoipa::path(
    get,
    path = "/chores/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Per-member weekly breakdown", body = [SummaryRowResponse]),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn weekly_summary_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (from, to) = week_range(query.week_start);
    let instances = state.instances.list_range(from, to).await.map_err(|e| {
        error!("Failed to load week instances: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load summary".to_string(),
        )
    })?;

    let rows: Vec<SummaryRowResponse> = summarize_week(instances)
        .into_iter()
        .map(SummaryRowResponse::from_domain)
        .collect();
    Ok(Json(rows))
}
