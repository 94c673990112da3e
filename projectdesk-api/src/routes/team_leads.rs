/// Team lead directory (Admin)
///
/// # Endpoints
///
/// - `POST /v1/team-leads` - Add a team lead
/// - `GET /v1/team-leads` - List team leads by last, then first name
/// - `PUT /v1/team-leads/{id}` - Partial update; absent fields keep their value

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{check_person, optional_text, ApiJson, ApiPath},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use projectdesk_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    models::team_lead::{CreateTeamLead, TeamLead, UpdateTeamLead},
    validation::{check_name, normalize_email},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamLeadRequest {
    pub first_name: String,
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTeamLeadRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamLeadResponse {
    pub team_lead: TeamLead,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamLeadList {
    pub team_leads: Vec<TeamLead>,
}

/// # Errors
///
/// - `403 Forbidden`: Caller is not an Admin
/// - `409 Conflict`: Email already used by another team lead
/// - `422 Unprocessable Entity`: Names not camelCase or malformed email
pub async fn create_team_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTeamLeadRequest>,
) -> ApiResult<(StatusCode, Json<TeamLeadResponse>)> {
    require_permission(&auth, Permission::ManageStaff)?;
    check_person(&req.first_name, &req.last_name, req.validate())?;

    let team_lead = TeamLead::create(
        &state.db,
        CreateTeamLead {
            first_name: req.first_name,
            last_name: req.last_name,
            email: normalize_email(&req.email),
        },
    )
    .await?;

    info!(team_lead_id = team_lead.team_lead_id, user_id = auth.user_id, "Team lead added");

    Ok((StatusCode::CREATED, Json(TeamLeadResponse { team_lead })))
}

pub async fn list_team_leads(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TeamLeadList>> {
    require_permission(&auth, Permission::ManageStaff)?;

    let team_leads = TeamLead::list(&state.db).await?;

    Ok(Json(TeamLeadList { team_leads }))
}

/// # Errors
///
/// - `404 Not Found`: Unknown team lead
/// - `409 Conflict`: Email already used by another team lead
pub async fn update_team_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateTeamLeadRequest>,
) -> ApiResult<Json<TeamLeadResponse>> {
    require_permission(&auth, Permission::ManageStaff)?;
    req.validate()?;

    let update = UpdateTeamLead {
        first_name: optional_text(req.first_name),
        last_name: optional_text(req.last_name),
        email: optional_text(req.email).map(|email| normalize_email(&email)),
    };

    if let Some(first_name) = &update.first_name {
        check_name("first_name", first_name)?;
    }
    if let Some(last_name) = &update.last_name {
        check_name("last_name", last_name)?;
    }

    let team_lead = TeamLead::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team Lead not found.".to_string()))?;

    info!(team_lead_id = id, user_id = auth.user_id, "Team lead updated");

    Ok(Json(TeamLeadResponse { team_lead }))
}
