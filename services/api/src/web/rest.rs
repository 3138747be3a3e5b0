//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for member and chore-template management, and
//! the master definition for the OpenAPI specification.

use crate::web::middleware::require_parent;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use choreboard_core::domain::{FrequencyRule, Member, TaskTemplate};
use choreboard_core::ports::NewTemplate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        list_members_handler,
        create_child_handler,
        list_templates_handler,
        create_template_handler,
        update_template_handler,
        crate::web::chores::materialize_handler,
        crate::web::chores::set_status_handler,
        crate::web::chores::log_extra_handler,
        crate::web::chores::weekly_summary_handler,
        crate::web::worklog::create_project_handler,
        crate::web::worklog::list_projects_handler,
        crate::web::worklog::create_work_log_handler,
        crate::web::worklog::approve_work_log_handler,
        crate::web::worklog::list_member_work_logs_handler,
        crate::web::worklog::savings_handler,
    ),
    components(schemas(
        crate::web::auth::SignupRequest,
        crate::web::auth::LoginRequest,
        crate::web::auth::AuthResponse,
        MemberResponse,
        CreateChildRequest,
        TemplateResponse,
        CreateTemplateRequest,
        UpdateTemplateRequest,
        crate::web::chores::MaterializeRequest,
        crate::web::chores::SetStatusRequest,
        crate::web::chores::LogExtraRequest,
        crate::web::chores::InstanceResponse,
        crate::web::chores::SummaryRowResponse,
        crate::web::worklog::CreateProjectRequest,
        crate::web::worklog::ProjectResponse,
        crate::web::worklog::CreateWorkLogRequest,
        crate::web::worklog::WorkLogResponse,
        crate::web::worklog::SavingsResponse,
    )),
    tags(
        (name = "ChoreBoard API", description = "API endpoints for household chores, points, and savings.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct MemberResponse {
    pub id: Uuid,
    pub display_name: String,
    pub role: String,
    pub email: Option<String>,
}

impl MemberResponse {
    pub fn from_domain(member: Member) -> Self {
        Self {
            id: member.id,
            display_name: member.display_name,
            role: member.role.as_str().to_string(),
            email: member.email,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateChildRequest {
    pub display_name: String,
}

/// A template echoed back in the storage shape clients edit: the frequency
/// type plus whichever rule field applies. `schedulable` is false when the
/// stored rule columns do not parse and the template will never generate.
#[derive(Serialize, ToSchema)]
pub struct TemplateResponse {
    pub id: Uuid,
    pub title: String,
    pub frequency_type: Option<String>,
    pub day_of_week: Option<i32>,
    pub week_of_month: Option<i32>,
    pub day_of_month: Option<i32>,
    pub semiannual_months: Option<Vec<u32>>,
    pub conditional_after_time: Option<String>,
    pub assigned_to: Uuid,
    pub points_base: i32,
    pub active: bool,
    pub schedulable: bool,
}

impl TemplateResponse {
    pub fn from_domain(template: TaskTemplate) -> Self {
        let mut response = Self {
            id: template.id,
            title: template.title,
            frequency_type: None,
            day_of_week: None,
            week_of_month: None,
            day_of_month: None,
            semiannual_months: None,
            conditional_after_time: None,
            assigned_to: template.assigned_to,
            points_base: template.points_base,
            active: template.active,
            schedulable: template.rule.is_some(),
        };
        match template.rule {
            Some(FrequencyRule::Daily) => {
                response.frequency_type = Some("DAILY".to_string());
            }
            Some(FrequencyRule::EveryOtherDay) => {
                response.frequency_type = Some("EVERY_OTHER_DAY".to_string());
            }
            Some(FrequencyRule::Weekly { weekday }) => {
                response.frequency_type = Some("WEEKLY".to_string());
                response.day_of_week = Some(weekday.num_days_from_sunday() as i32);
            }
            Some(FrequencyRule::MonthlyByWeek { week_of_month }) => {
                response.frequency_type = Some("MONTHLY".to_string());
                response.week_of_month = Some(week_of_month as i32);
            }
            Some(FrequencyRule::MonthlyByDay { day_of_month }) => {
                response.frequency_type = Some("MONTHLY".to_string());
                response.day_of_month = Some(day_of_month as i32);
            }
            Some(FrequencyRule::Semiannual { months }) => {
                response.frequency_type = Some("SEMIANNUAL".to_string());
                response.semiannual_months = Some(months.to_vec());
            }
            Some(FrequencyRule::Conditional {
                weekday,
                available_after,
            }) => {
                response.frequency_type = Some("CONDITIONAL_SCHEDULE".to_string());
                response.day_of_week = Some(weekday.num_days_from_sunday() as i32);
                response.conditional_after_time = available_after;
            }
            None => {}
        }
        response
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub title: String,
    pub frequency_type: String,
    pub day_of_week: Option<i32>,
    pub week_of_month: Option<i32>,
    pub day_of_month: Option<i32>,
    pub semiannual_months: Option<String>,
    pub conditional_after_time: Option<String>,
    pub assigned_to: Uuid,
    pub points_base: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    pub active: bool,
}

//=========================================================================================
// Member Handlers
//=========================================================================================

/// List every household member.
#[utoipa::path(
    get,
    path = "/members",
    responses(
        (status = 200, description = "All household members", body = [MemberResponse]),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_members_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let members = state.db.list_members().await.map_err(|e| {
        error!("Failed to list members: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list members".to_string(),
        )
    })?;
    let response: Vec<MemberResponse> = members
        .into_iter()
        .map(MemberResponse::from_domain)
        .collect();
    Ok(Json(response))
}

/// Add a child to the household. Parents only.
#[utoipa::path(
    post,
    path = "/members",
    request_body = CreateChildRequest,
    responses(
        (status = 201, description = "Child created", body = MemberResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not a parent"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_child_handler(
    State(state): State<Arc<AppState>>,
    Extension(member_id): Extension<Uuid>,
    Json(req): Json<CreateChildRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_parent(&state, member_id).await?;

    let child = state.db.create_child(&req.display_name).await.map_err(|e| {
        error!("Failed to create child: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create child".to_string(),
        )
    })?;
    Ok((StatusCode::CREATED, Json(MemberResponse::from_domain(child))))
}

//=========================================================================================
// Template Handlers
//=========================================================================================

/// List all chore templates, active or not.
#[utoipa::path(
    get,
    path = "/chores/templates",
    responses(
        (status = 200, description = "All chore templates", body = [TemplateResponse]),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_templates_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let templates = state.templates.list_all().await.map_err(|e| {
        error!("Failed to list templates: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list templates".to_string(),
        )
    })?;
    let response: Vec<TemplateResponse> = templates
        .into_iter()
        .map(TemplateResponse::from_domain)
        .collect();
    Ok(Json(response))
}

/// Create a recurring chore template. Parents only.
///
/// The rule columns are validated up front: a combination that would never
/// generate (unknown frequency type, missing day, bad month list) is a 400
/// rather than a template that silently does nothing.
#[utoipa::path(
    post,
    path = "/chores/templates",
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Rule columns do not form a valid schedule"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not a parent"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_template_handler(
    State(state): State<Arc<AppState>>,
    Extension(member_id): Extension<Uuid>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_parent(&state, member_id).await?;

    let rule = FrequencyRule::from_parts(
        &req.frequency_type,
        req.day_of_week,
        req.week_of_month,
        req.day_of_month,
        req.semiannual_months.as_deref(),
        req.conditional_after_time.as_deref(),
    );
    if rule.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "'{}' with the given fields is not a schedulable rule",
                req.frequency_type
            ),
        ));
    }

    let template = state
        .templates
        .create(NewTemplate {
            title: req.title,
            frequency_type: req.frequency_type,
            day_of_week: req.day_of_week,
            week_of_month: req.week_of_month,
            day_of_month: req.day_of_month,
            semiannual_months: req.semiannual_months,
            conditional_after_time: req.conditional_after_time,
            assigned_to: req.assigned_to,
            points_base: req.points_base.unwrap_or(1),
        })
        .await
        .map_err(|e| {
            error!("Failed to create template: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create template".to_string(),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(TemplateResponse::from_domain(template)),
    ))
}

/// Activate or deactivate a template. Parents only.
#[utoipa::path(
    patch,
    path = "/chores/templates/{id}",
    request_body = UpdateTemplateRequest,
    responses(
        (status = 204, description = "Template updated"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not a parent"),
        (status = 404, description = "No such template"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The template to update")
    )
)]
pub async fn update_template_handler(
    State(state): State<Arc<AppState>>,
    Extension(member_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_parent(&state, member_id).await?;

    state
        .templates
        .set_active(id, req.active)
        .await
        .map_err(|e| match e {
            choreboard_core::ports::PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            _ => {
                error!("Failed to update template: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to update template".to_string(),
                )
            }
        })?;
    Ok(StatusCode::NO_CONTENT)
}
