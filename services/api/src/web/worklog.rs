//! services/api/src/web/worklog.rs
//!
//! Handlers for paid projects, work-log hours and approval, and the
//! Bitcoin-denominated savings balance.

use crate::web::middleware::require_parent;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use choreboard_core::domain::{Project, WorkLog};
use choreboard_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    pub hourly_rate: f64,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub hourly_rate: f64,
    pub created_by: Uuid,
}

impl ProjectResponse {
    fn from_domain(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            hourly_rate: project.hourly_rate,
            created_by: project.created_by,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateWorkLogRequest {
    /// Defaults to the logged-in member. Logging hours for someone else
    /// requires a parent.
    pub member_id: Option<Uuid>,
    pub hours: f64,
    pub note: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct WorkLogResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub member_id: Uuid,
    pub hours: f64,
    pub note: Option<String>,
    pub approved: bool,
}

impl WorkLogResponse {
    fn from_domain(log: WorkLog) -> Self {
        Self {
            id: log.id,
            project_id: log.project_id,
            member_id: log.member_id,
            hours: log.hours,
            note: log.note,
            approved: log.approved,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SavingsResponse {
    pub member_id: Uuid,
    /// Approved earnings in the configured fiat currency.
    pub total_earned: f64,
    pub currency: String,
    pub btc_price: f64,
    pub btc_balance: f64,
}

//=========================================================================================
// Project Handlers
//=========================================================================================

/// Create a paid project. Parents only.
#[utoipa::path(
    post,
    path = "/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid hourly rate"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not a parent"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(member_id): Extension<Uuid>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let parent = require_parent(&state, member_id).await?;

    if !req.hourly_rate.is_finite() || req.hourly_rate < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "hourly_rate must be a non-negative number".to_string(),
        ));
    }

    let project = state
        .db
        .create_project(&req.name, req.hourly_rate, parent.id)
        .await
        .map_err(|e| {
            error!("Failed to create project: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create project".to_string(),
            )
        })?;
    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::from_domain(project)),
    ))
}

/// List all projects.
#[utoipa::path(
    get,
    path = "/projects",
    responses(
        (status = 200, description = "All projects", body = [ProjectResponse]),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_projects_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let projects = state.db.list_projects().await.map_err(|e| {
        error!("Failed to list projects: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list projects".to_string(),
        )
    })?;
    let response: Vec<ProjectResponse> = projects
        .into_iter()
        .map(ProjectResponse::from_domain)
        .collect();
    Ok(Json(response))
}

//=========================================================================================
// Work Log Handlers
//=========================================================================================

/// Log hours worked on a project.
#[utoipa::path(
    post,
    path = "/projects/{id}/worklog",
    request_body = CreateWorkLogRequest,
    responses(
        (status = 201, description = "Hours logged, pending approval", body = WorkLogResponse),
        (status = 400, description = "Invalid hours"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Logging for someone else without being a parent"),
        (status = 404, description = "No such project"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The project worked on")
    )
)]
pub async fn create_work_log_handler(
    State(state): State<Arc<AppState>>,
    Extension(member_id): Extension<Uuid>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateWorkLogRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !req.hours.is_finite() || req.hours <= 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "hours must be a positive number".to_string(),
        ));
    }

    // Children log their own hours; a parent may log on behalf of anyone.
    let target = req.member_id.unwrap_or(member_id);
    if target != member_id {
        require_parent(&state, member_id).await?;
    }

    let log = state
        .db
        .create_work_log(project_id, target, req.hours, req.note.as_deref())
        .await
        .map_err(|e| match e {
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            _ => {
                error!("Failed to log hours: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to log hours".to_string(),
                )
            }
        })?;
    Ok((StatusCode::CREATED, Json(WorkLogResponse::from_domain(log))))
}

/// Approve a work log so it counts toward earnings. Parents only.
#[utoipa::path(
    post,
    path = "/worklog/{id}/approve",
    responses(
        (status = 204, description = "Work log approved"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not a parent"),
        (status = 404, description = "No such work log"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The work log to approve")
    )
)]
pub async fn approve_work_log_handler(
    State(state): State<Arc<AppState>>,
    Extension(member_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let parent = require_parent(&state, member_id).await?;

    state
        .db
        .approve_work_log(id, parent.id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            _ => {
                error!("Failed to approve work log: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to approve work log".to_string(),
                )
            }
        })?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a member's work logs, approved or not.
#[utoipa::path(
    get,
    path = "/members/{id}/worklog",
    responses(
        (status = 200, description = "The member's work logs", body = [WorkLogResponse]),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The member whose logs to list")
    )
)]
pub async fn list_member_work_logs_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let logs = state.db.list_work_logs_for_member(id).await.map_err(|e| {
        error!("Failed to list work logs: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list work logs".to_string(),
        )
    })?;
    let response: Vec<WorkLogResponse> = logs
        .into_iter()
        .map(WorkLogResponse::from_domain)
        .collect();
    Ok(Json(response))
}

/// A member's savings: approved earnings converted to Bitcoin at the
/// current cached price.
#[utoipa::path(
    get,
    path = "/members/{id}/savings",
    responses(
        (status = 200, description = "The member's savings balance", body = SavingsResponse),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "Price feed unavailable"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The member whose savings to convert")
    )
)]
pub async fn savings_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let total_earned = state.db.approved_earnings(id).await.map_err(|e| {
        error!("Failed to sum earnings: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to sum earnings".to_string(),
        )
    })?;

    let btc_price = state.price.btc_price().await.map_err(|e| {
        error!("Price feed failed: {:?}", e);
        (
            StatusCode::BAD_GATEWAY,
            "Price feed unavailable".to_string(),
        )
    })?;
    if btc_price <= 0.0 {
        error!("Price feed returned a non-positive price: {}", btc_price);
        return Err((
            StatusCode::BAD_GATEWAY,
            "Price feed unavailable".to_string(),
        ));
    }

    Ok(Json(SavingsResponse {
        member_id: id,
        total_earned,
        currency: state.config.price_currency.clone(),
        btc_price,
        btc_balance: total_earned / btc_price,
    }))
}
