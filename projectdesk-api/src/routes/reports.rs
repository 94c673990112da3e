/// Team lead progress reports
///
/// # Endpoint
///
/// ```text
/// GET /v1/team-lead/reports?developer_id=7&project_id=3
/// ```
///
/// Both filters are optional. The response has one row per (project,
/// developer) pair for projects the caller proposed, plus the developers
/// currently assigned to those projects for the filter picker.

use crate::{
    app::AppState,
    error::ApiResult,
    routes::ApiQuery,
};
use axum::{extract::State, Extension, Json};
use projectdesk_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    models::{
        developer::Developer,
        report::{ProjectProgressRow, ReportFilter},
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamLeadReport {
    pub projects: Vec<ProjectProgressRow>,
    pub developers: Vec<Developer>,
}

pub async fn team_lead_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(filter): ApiQuery<ReportFilter>,
) -> ApiResult<Json<TeamLeadReport>> {
    require_permission(&auth, Permission::ViewTeamReports)?;

    let projects = ProjectProgressRow::for_creator(&state.db, auth.user_id, filter).await?;
    let developers = Developer::list_on_projects_created_by(&state.db, auth.user_id).await?;

    Ok(Json(TeamLeadReport {
        projects,
        developers,
    }))
}
