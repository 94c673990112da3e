/// Module endpoints (Developer)
///
/// A module is a unit of work a developer delivers against an approved
/// project. It moves `Pending → Started → Complete`; completing it records
/// the commit link and creates the module's pending payment.
///
/// # Endpoints
///
/// - `POST /v1/modules` - Create a module on an approved project
/// - `GET /v1/modules` - Caller's modules
/// - `PUT /v1/modules/{id}` - Edit an unfinished module
/// - `DELETE /v1/modules/{id}` - Delete an unfinished module
/// - `POST /v1/modules/{id}/start` - Pending to Started
/// - `POST /v1/modules/{id}/complete` - Started to Complete
///
/// Developers only see their own modules. Anyone else's module id reads as
/// not found.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{
        check_money, developers::current_developer, optional_text, required_text, ApiJson, ApiPath,
    },
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::NaiveDate;
use projectdesk_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    models::{
        module::{CreateModule, Module, ModuleStatus, UpdateModule},
        project::{Project, ProjectStatus},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Currency used when a module does not name one
pub const DEFAULT_CURRENCY: &str = "UGX";

#[derive(Debug, Deserialize)]
pub struct CreateModuleRequest {
    pub project_id: i32,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cost: Decimal,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateModuleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteModuleRequest {
    /// Link to the commit that delivers the module
    pub commit_link: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModuleResponse {
    pub module: Module,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModuleList {
    pub modules: Vec<Module>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedModule {
    pub message: String,
    pub module_id: i32,
}

/// # Errors
///
/// - `400 Bad Request`: Blank field, negative cost, reversed dates or bad currency
/// - `404 Not Found`: Unknown project
/// - `409 Conflict`: Project is not Approved
pub async fn create_module(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateModuleRequest>,
) -> ApiResult<(StatusCode, Json<ModuleResponse>)> {
    require_permission(&auth, Permission::ManageModules)?;
    let developer = current_developer(&state.db, &auth).await?;

    let name = required_text("name", &req.name)?;
    let description = required_text("description", &req.description)?;
    check_cost(req.cost)?;
    check_dates(req.start_date, req.end_date)?;
    let currency = match optional_text(req.currency) {
        Some(code) => normalize_currency(&code)?,
        None => DEFAULT_CURRENCY.to_string(),
    };

    let project = Project::find_by_id(&state.db, req.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    if project.status != ProjectStatus::Approved {
        return Err(ApiError::Conflict(
            "Modules can only be added to approved projects".to_string(),
        ));
    }

    let module = Module::create(
        &state.db,
        CreateModule {
            project_id: project.project_id,
            developer_id: developer.developer_id,
            name,
            description,
            start_date: req.start_date,
            end_date: req.end_date,
            cost: req.cost,
            currency,
            notes: optional_text(req.notes),
        },
    )
    .await?;

    info!(
        module_id = module.module_id,
        project_id = module.project_id,
        developer_id = developer.developer_id,
        "Module created"
    );

    Ok((StatusCode::CREATED, Json(ModuleResponse { module })))
}

pub async fn list_my_modules(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ModuleList>> {
    require_permission(&auth, Permission::ManageModules)?;
    let developer = current_developer(&state.db, &auth).await?;

    let modules = Module::list_by_developer(&state.db, developer.developer_id).await?;

    Ok(Json(ModuleList { modules }))
}

/// Edits an owned module that is not complete
///
/// Date order is checked against the stored value for whichever side of the
/// range is not being changed.
pub async fn update_module(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateModuleRequest>,
) -> ApiResult<Json<ModuleResponse>> {
    require_permission(&auth, Permission::ManageModules)?;
    let developer = current_developer(&state.db, &auth).await?;

    let current = owned_module(&state, id, developer.developer_id).await?;
    if current.status.is_terminal() {
        return Err(module_locked());
    }

    if let Some(cost) = req.cost {
        check_cost(cost)?;
    }
    check_dates(
        req.start_date.unwrap_or(current.start_date),
        req.end_date.unwrap_or(current.end_date),
    )?;

    let update = UpdateModule {
        name: optional_text(req.name),
        description: optional_text(req.description),
        start_date: req.start_date,
        end_date: req.end_date,
        cost: req.cost,
        currency: optional_text(req.currency)
            .map(|code| normalize_currency(&code))
            .transpose()?,
        notes: optional_text(req.notes),
    };

    let module = Module::update_details(&state.db, id, developer.developer_id, update)
        .await?
        .ok_or_else(module_locked)?;

    info!(module_id = id, developer_id = developer.developer_id, "Module updated");

    Ok(Json(ModuleResponse { module }))
}

/// # Errors
///
/// - `404 Not Found`: Unknown module or owned by someone else
/// - `409 Conflict`: Module is not Pending
pub async fn start_module(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<ModuleResponse>> {
    require_permission(&auth, Permission::ManageModules)?;
    let developer = current_developer(&state.db, &auth).await?;

    let current = owned_module(&state, id, developer.developer_id).await?;
    let wrong_state = || {
        ApiError::Conflict(format!(
            "Only pending modules can be started (module is {})",
            current.status
        ))
    };
    if !current.status.can_transition_to(ModuleStatus::Started) {
        return Err(wrong_state());
    }

    // A concurrent request may have moved it since the read
    let module = Module::start(&state.db, id, developer.developer_id)
        .await?
        .ok_or_else(wrong_state)?;

    info!(module_id = id, developer_id = developer.developer_id, "Module started");

    Ok(Json(ModuleResponse { module }))
}

/// Completes a started module
///
/// The database creates the module's Pending finance record in the same
/// statement.
///
/// # Errors
///
/// - `400 Bad Request`: Blank commit link
/// - `404 Not Found`: Unknown module or owned by someone else
/// - `409 Conflict`: Module is not Started
pub async fn complete_module(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<CompleteModuleRequest>,
) -> ApiResult<Json<ModuleResponse>> {
    require_permission(&auth, Permission::ManageModules)?;
    let developer = current_developer(&state.db, &auth).await?;

    let commit_link = required_text("commit_link", &req.commit_link)?;
    let current = owned_module(&state, id, developer.developer_id).await?;
    let wrong_state = || {
        ApiError::Conflict(format!(
            "Only started modules can be completed (module is {})",
            current.status
        ))
    };
    if !current.status.can_transition_to(ModuleStatus::Complete) {
        return Err(wrong_state());
    }

    let module = Module::complete(&state.db, id, developer.developer_id, &commit_link)
        .await?
        .ok_or_else(wrong_state)?;

    info!(
        module_id = id,
        project_id = module.project_id,
        developer_id = developer.developer_id,
        "Module completed"
    );

    Ok(Json(ModuleResponse { module }))
}

pub async fn delete_module(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<DeletedModule>> {
    require_permission(&auth, Permission::ManageModules)?;
    let developer = current_developer(&state.db, &auth).await?;

    let current = owned_module(&state, id, developer.developer_id).await?;
    if current.status.is_terminal() {
        return Err(module_locked());
    }

    if !Module::delete_owned(&state.db, id, developer.developer_id).await? {
        return Err(module_locked());
    }

    info!(module_id = id, developer_id = developer.developer_id, "Module deleted");

    Ok(Json(DeletedModule {
        message: "Module deleted successfully.".to_string(),
        module_id: id,
    }))
}

async fn owned_module(state: &AppState, id: i32, developer_id: i32) -> ApiResult<Module> {
    Module::find_owned(&state.db, id, developer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))
}

fn module_locked() -> ApiError {
    ApiError::Conflict("Completed modules cannot be changed".to_string())
}

fn check_cost(cost: Decimal) -> ApiResult<()> {
    check_money("Cost", cost)
}

fn check_dates(start: NaiveDate, end: NaiveDate) -> ApiResult<()> {
    if end < start {
        return Err(ApiError::BadRequest(
            "End date cannot be before start date".to_string(),
        ));
    }
    Ok(())
}

/// Upper-cases a three letter currency code
fn normalize_currency(code: &str) -> ApiResult<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::BadRequest(
            "Currency must be a three letter code".to_string(),
        ));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_check_cost() {
        assert!(check_cost(Decimal::ZERO).is_ok());
        assert!(check_cost(Decimal::new(150_000, 2)).is_ok());
        assert!(matches!(
            check_cost(Decimal::new(-1, 0)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(check_cost(Decimal::new(10_000_000_000_000, 0)).is_err());
        assert!(check_cost(Decimal::new(1_005, 3)).is_err());
    }

    #[test]
    fn test_check_dates() {
        assert!(check_dates(date(2024, 1, 1), date(2024, 1, 1)).is_ok());
        assert!(check_dates(date(2024, 1, 1), date(2024, 2, 1)).is_ok());
        assert!(check_dates(date(2024, 2, 1), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_normalize_currency() {
        assert_eq!(normalize_currency(" usd ").unwrap(), "USD");
        assert!(normalize_currency("US").is_err());
        assert!(normalize_currency("U5D").is_err());
    }
}
