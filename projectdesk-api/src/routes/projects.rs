/// Project endpoints
///
/// Proposals move through `Pending → Approved | Rejected`, rejected ones can
/// be appealed back to `Pending` by the team lead who proposed them, and
/// approved ones are eventually completed.
///
/// # Endpoints
///
/// | Method | Path                          | Who                      |
/// |--------|-------------------------------|--------------------------|
/// | POST   | `/v1/projects`                | CEO, Team Lead           |
/// | GET    | `/v1/projects?status=`        | any session              |
/// | GET    | `/v1/projects/stats`          | any session              |
/// | GET    | `/v1/projects/pending`        | CEO                      |
/// | GET    | `/v1/projects/approved`       | any session              |
/// | GET    | `/v1/projects/mine`           | Team Lead                |
/// | GET    | `/v1/projects/{id}`           | any session              |
/// | PUT    | `/v1/projects/{id}`           | CEO, creating Team Lead  |
/// | DELETE | `/v1/projects/{id}`           | CEO, creating Team Lead  |
/// | PUT    | `/v1/projects/{id}/review`    | CEO                      |
/// | GET    | `/v1/projects/{id}/appeal`    | creating Team Lead       |
/// | POST   | `/v1/projects/{id}/appeal`    | creating Team Lead       |
/// | PATCH  | `/v1/projects/{id}/progress`  | CEO, creating Team Lead  |
/// | POST   | `/v1/projects/{id}/complete`  | CEO, creating Team Lead  |

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{optional_text, required_text, ApiJson, ApiPath, ApiQuery},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use projectdesk_shared::{
    auth::{
        authorization::{require_permission, require_project_steward, Permission},
        middleware::AuthContext,
    },
    models::{
        project::{
            AppealProject, ApprovedProject, CreateProject, Project, ProjectStatus,
            ProjectStatusCounts, ProjectWithCreator, UpdateProject,
        },
        user::Role,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Number of projects on the progress leaderboard
const TOP_PROGRESS_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct CreateProjectsRequest {
    pub name: String,
    pub description: String,
    pub duration: String,

    /// One project is created for each developer
    pub developer_ids: Vec<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,

    /// Replaces the assigned developers when present
    pub developer_ids: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// `Approved` or `Rejected`
    pub status: ProjectStatus,

    /// Required when rejecting
    pub review: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppealRequest {
    pub name: String,
    pub description: String,
    pub duration: Option<String>,

    /// Answer to the CEO's rejection reason
    pub appeal_response: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProgressRequest {
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectResponse<P> {
    pub project: P,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectList<P> {
    pub projects: Vec<P>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectStats {
    pub status_counts: ProjectStatusCounts,

    /// Approved projects furthest along
    pub top_progress: Vec<Project>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse<P> {
    pub message: String,
    pub project: P,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub message: String,
    pub project_id: i32,
}

/// Proposes a project for each listed developer
///
/// All projects are created in one transaction; if any developer is missing
/// nothing is created.
///
/// # Errors
///
/// - `400 Bad Request`: Blank field, no developers, or unknown developer
/// - `403 Forbidden`: Caller is neither CEO nor Team Lead
pub async fn create_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateProjectsRequest>,
) -> ApiResult<(StatusCode, Json<ProjectList<Project>>)> {
    require_permission(&auth, Permission::ManageProjects)?;

    let name = required_text("name", &req.name)?;
    let description = required_text("description", &req.description)?;
    let duration = required_text("duration", &req.duration)?;
    if req.developer_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one developer is required".to_string(),
        ));
    }

    let projects = Project::create_for_developers(
        &state.db,
        CreateProject {
            name,
            description,
            duration,
            developer_ids: req.developer_ids,
            created_by: auth.user_id,
        },
    )
    .await?;

    info!(
        user_id = auth.user_id,
        role = %auth.role,
        count = projects.len(),
        "Projects proposed"
    );

    Ok((StatusCode::CREATED, Json(ProjectList { projects })))
}

/// Lists projects with their creators, optionally filtered by status
pub async fn list_projects(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListProjectsQuery>,
) -> ApiResult<Json<ProjectList<ProjectWithCreator>>> {
    let status = optional_text(query.status)
        .map(|s| s.parse::<ProjectStatus>())
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let projects = Project::list_with_creator(&state.db, status).await?;

    Ok(Json(ProjectList { projects }))
}

pub async fn project_stats(State(state): State<AppState>) -> ApiResult<Json<ProjectStats>> {
    let status_counts = Project::status_counts(&state.db).await?;
    let top_progress = Project::top_by_progress(&state.db, TOP_PROGRESS_LIMIT).await?;

    Ok(Json(ProjectStats {
        status_counts,
        top_progress,
    }))
}

/// The CEO's review queue
pub async fn pending_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProjectList<ProjectWithCreator>>> {
    require_permission(&auth, Permission::ReviewProjects)?;

    let projects = Project::list_with_creator(&state.db, Some(ProjectStatus::Pending)).await?;

    Ok(Json(ProjectList { projects }))
}

pub async fn approved_projects(
    State(state): State<AppState>,
) -> ApiResult<Json<ProjectList<ApprovedProject>>> {
    let projects = Project::list_approved_with_team_leads(&state.db).await?;

    Ok(Json(ProjectList { projects }))
}

/// Projects the calling team lead proposed
pub async fn my_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProjectList<Project>>> {
    require_permission(&auth, Permission::ViewTeamReports)?;

    let projects = Project::list_by_creator(&state.db, auth.user_id).await?;

    Ok(Json(ProjectList { projects }))
}

pub async fn get_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<ProjectResponse<ProjectWithCreator>>> {
    let project = Project::find_with_creator(&state.db, id)
        .await?
        .ok_or_else(project_not_found)?;

    Ok(Json(ProjectResponse { project }))
}

/// Edits a proposal that has not been approved yet
///
/// # Errors
///
/// - `403 Forbidden`: Project is Approved or Completed, or the caller is a
///   team lead who did not propose it
/// - `404 Not Found`: Unknown project
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectResponse<Project>>> {
    require_permission(&auth, Permission::ManageProjects)?;

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(project_not_found)?;
    require_project_steward(&auth, &project)?;

    if !project.status.is_editable() {
        return Err(cannot_edit());
    }

    let update = UpdateProject {
        name: optional_text(req.name),
        description: optional_text(req.description),
        duration: optional_text(req.duration),
        developer_ids: req.developer_ids,
    };

    // The status may have moved on since the read above
    let project = Project::update_details(&state.db, id, update)
        .await?
        .ok_or_else(cannot_edit)?;

    info!(project_id = id, user_id = auth.user_id, "Project updated");

    Ok(Json(ProjectResponse { project }))
}

/// Deletes a project together with its modules and their payments
///
/// The CEO may delete any project; a team lead only their own. A team
/// lead's request for someone else's project reads as not found.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<DeletedResponse>> {
    require_permission(&auth, Permission::ManageProjects)?;

    let deleted = match auth.role {
        Role::Ceo => Project::delete(&state.db, id).await?,
        _ => Project::delete_owned(&state.db, id, auth.user_id).await?,
    };

    if !deleted {
        return Err(ApiError::NotFound(
            "Project not found or you do not have permission to delete it.".to_string(),
        ));
    }

    info!(project_id = id, user_id = auth.user_id, role = %auth.role, "Project deleted");

    Ok(Json(DeletedResponse {
        message: "Project deleted successfully.".to_string(),
        project_id: id,
    }))
}

/// Approves or rejects a pending proposal
///
/// # Errors
///
/// - `400 Bad Request`: Status is not a decision, or a rejection without a reason
/// - `403 Forbidden`: Caller is not the CEO
/// - `404 Not Found`: Project missing or no longer pending
pub async fn review_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> ApiResult<Json<ProjectResponse<Project>>> {
    require_permission(&auth, Permission::ReviewProjects)?;

    if !req.status.is_review_decision() {
        return Err(ApiError::BadRequest(
            "Invalid status. Must be \"Approved\" or \"Rejected\".".to_string(),
        ));
    }

    let review = req.review.as_deref().map(str::trim).unwrap_or_default();
    if req.status == ProjectStatus::Rejected && review.is_empty() {
        return Err(ApiError::BadRequest(
            "A review reason is required for rejection.".to_string(),
        ));
    }

    let project = Project::review(&state.db, id, req.status, review)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Project not found or already actioned.".to_string())
        })?;

    info!(project_id = id, user_id = auth.user_id, status = %project.status, "Project reviewed");

    Ok(Json(ProjectResponse { project }))
}

/// Shows a rejected proposal, with its review, to the team lead who made it
pub async fn get_appeal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<ProjectResponse<Project>>> {
    require_permission(&auth, Permission::AppealProjects)?;

    let project = Project::find_rejected_for_creator(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| not_appealable("view"))?;

    Ok(Json(ProjectResponse { project }))
}

/// Resubmits a rejected proposal for review
///
/// The stored review keeps the original rejection reason followed by the
/// appeal response.
///
/// # Errors
///
/// - `400 Bad Request`: Blank name or description
/// - `404 Not Found`: Project missing, not rejected, or proposed by someone else
pub async fn appeal_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<AppealRequest>,
) -> ApiResult<Json<MessageResponse<Project>>> {
    require_permission(&auth, Permission::AppealProjects)?;

    let appeal = AppealProject {
        name: required_text("name", &req.name)?,
        description: required_text("description", &req.description)?,
        duration: optional_text(req.duration),
        response: optional_text(req.appeal_response),
    };

    let project = Project::appeal(&state.db, id, auth.user_id, appeal)
        .await?
        .ok_or_else(|| not_appealable("appeal"))?;

    info!(project_id = id, user_id = auth.user_id, "Project appealed");

    Ok(Json(MessageResponse {
        message: "Project appeal submitted successfully. The project has been resubmitted for review."
            .to_string(),
        project,
    }))
}

/// Sets the completion percentage of an approved project
///
/// # Errors
///
/// - `409 Conflict`: Project is not Approved
/// - `422 Unprocessable Entity`: Progress outside 0-100
pub async fn update_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<ProgressRequest>,
) -> ApiResult<Json<ProjectResponse<Project>>> {
    require_permission(&auth, Permission::ManageProjects)?;
    req.validate()?;

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(project_not_found)?;
    require_project_steward(&auth, &project)?;

    let project = Project::set_progress(&state.db, id, req.progress)
        .await?
        .ok_or_else(|| not_approved("updated"))?;

    info!(project_id = id, user_id = auth.user_id, progress = req.progress, "Project progress updated");

    Ok(Json(ProjectResponse { project }))
}

/// Marks an approved project as completed
pub async fn complete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<ProjectResponse<Project>>> {
    require_permission(&auth, Permission::ManageProjects)?;

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(project_not_found)?;
    require_project_steward(&auth, &project)?;
    if !project.status.can_transition_to(ProjectStatus::Completed) {
        return Err(not_approved("completed"));
    }

    let project = Project::complete(&state.db, id)
        .await?
        .ok_or_else(|| not_approved("completed"))?;

    info!(project_id = id, user_id = auth.user_id, "Project completed");

    Ok(Json(ProjectResponse { project }))
}

fn project_not_found() -> ApiError {
    ApiError::NotFound("Project not found".to_string())
}

fn cannot_edit() -> ApiError {
    ApiError::Forbidden("Cannot update approved projects".to_string())
}

fn not_appealable(action: &str) -> ApiError {
    ApiError::NotFound(format!(
        "Project not found, not rejected, or you do not have permission to {} it.",
        action
    ))
}

fn not_approved(action: &str) -> ApiError {
    ApiError::Conflict(format!("Only approved projects can be {}", action))
}
