/// Developer directory and workspace
///
/// # Endpoints
///
/// - `POST /v1/developers` - Add a developer under a team lead (Admin)
/// - `GET /v1/developers` - List developers (Admin)
/// - `PUT /v1/developers/{id}` - Partial update (Admin)
/// - `GET /v1/developers/me/projects` - Caller's assigned project and its modules (Developer)
///
/// A developer's login is linked to the directory entry by email.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{check_person, optional_text, required_text, ApiJson, ApiPath},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use projectdesk_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    models::{
        developer::{CreateDeveloper, Developer, UpdateDeveloper},
        module::Module,
        project::{Project, ProjectWithCreator},
        team_lead::TeamLead,
    },
    validation::{check_name, normalize_email},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

const UNKNOWN_TEAM_LEAD: &str = "Invalid Team Lead ID. The specified Team Lead does not exist.";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeveloperRequest {
    pub first_name: String,
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub expertise: String,
    pub department: String,
    pub team_lead_id: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDeveloperRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub expertise: Option<String>,
    pub department: Option<String>,
    pub team_lead_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeveloperResponse {
    pub developer: Developer,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeveloperList {
    pub developers: Vec<Developer>,
}

/// A project as seen from the developer workspace
#[derive(Debug, Serialize, Deserialize)]
pub struct AssignedProject {
    #[serde(flatten)]
    pub project: ProjectWithCreator,

    /// Every module delivered against the project, by start date
    pub modules: Vec<Module>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignedProjects {
    pub projects: Vec<AssignedProject>,
}

/// # Errors
///
/// - `400 Bad Request`: Unknown team lead or blank expertise/department
/// - `409 Conflict`: Email already used by another developer
/// - `422 Unprocessable Entity`: Names not camelCase or malformed email
pub async fn create_developer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateDeveloperRequest>,
) -> ApiResult<(StatusCode, Json<DeveloperResponse>)> {
    require_permission(&auth, Permission::ManageStaff)?;
    check_person(&req.first_name, &req.last_name, req.validate())?;

    let expertise = required_text("expertise", &req.expertise)?;
    let department = required_text("department", &req.department)?;
    ensure_team_lead(&state.db, req.team_lead_id).await?;

    let developer = Developer::create(
        &state.db,
        CreateDeveloper {
            first_name: req.first_name,
            last_name: req.last_name,
            email: normalize_email(&req.email),
            expertise,
            department,
            team_lead_id: req.team_lead_id,
        },
    )
    .await?;

    info!(
        developer_id = developer.developer_id,
        team_lead_id = req.team_lead_id,
        user_id = auth.user_id,
        "Developer added"
    );

    Ok((StatusCode::CREATED, Json(DeveloperResponse { developer })))
}

pub async fn list_developers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DeveloperList>> {
    require_permission(&auth, Permission::ManageStaff)?;

    let developers = Developer::list(&state.db).await?;

    Ok(Json(DeveloperList { developers }))
}

/// # Errors
///
/// - `400 Bad Request`: Unknown team lead
/// - `404 Not Found`: Unknown developer
/// - `409 Conflict`: Email already used by another developer
pub async fn update_developer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateDeveloperRequest>,
) -> ApiResult<Json<DeveloperResponse>> {
    require_permission(&auth, Permission::ManageStaff)?;
    req.validate()?;

    let update = UpdateDeveloper {
        first_name: optional_text(req.first_name),
        last_name: optional_text(req.last_name),
        email: optional_text(req.email).map(|email| normalize_email(&email)),
        expertise: optional_text(req.expertise),
        department: optional_text(req.department),
        team_lead_id: req.team_lead_id,
    };

    if let Some(first_name) = &update.first_name {
        check_name("first_name", first_name)?;
    }
    if let Some(last_name) = &update.last_name {
        check_name("last_name", last_name)?;
    }
    if let Some(team_lead_id) = update.team_lead_id {
        ensure_team_lead(&state.db, team_lead_id).await?;
    }

    let developer = Developer::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Developer not found.".to_string()))?;

    info!(developer_id = id, user_id = auth.user_id, "Developer updated");

    Ok(Json(DeveloperResponse { developer }))
}

/// Lists the caller's assigned project with its modules
///
/// A developer without a current assignment gets an empty list.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a Developer
/// - `404 Not Found`: No developer profile for the caller's email
pub async fn my_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<AssignedProjects>> {
    require_permission(&auth, Permission::ManageModules)?;

    let developer = current_developer(&state.db, &auth).await?;

    let mut projects = Vec::new();
    if let Some(project_id) = developer.project_id {
        if let Some(project) = Project::find_with_creator(&state.db, project_id).await? {
            let modules = Module::list_by_project(&state.db, project_id).await?;
            projects.push(AssignedProject { project, modules });
        }
    }

    Ok(Json(AssignedProjects { projects }))
}

/// Resolves the directory entry behind a Developer login
pub(crate) async fn current_developer(pool: &PgPool, auth: &AuthContext) -> ApiResult<Developer> {
    Developer::find_by_email(pool, &auth.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Developer profile not found.".to_string()))
}

async fn ensure_team_lead(pool: &PgPool, team_lead_id: i32) -> ApiResult<()> {
    match TeamLead::find_by_id(pool, team_lead_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::BadRequest(UNKNOWN_TEAM_LEAD.to_string())),
    }
}
