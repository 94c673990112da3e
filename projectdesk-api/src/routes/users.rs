/// Registered user endpoints
///
/// Accounts are created in two steps. An Admin registers the person with a
/// role but no password; the person then completes sign-up by choosing one.
///
/// # Endpoints
///
/// - `POST /v1/users` - Register a user (Admin)
/// - `GET /v1/users` - List registered users (Admin)
/// - `GET /v1/users/lookup?email=` - Sign-up status for an email (public)
/// - `PUT /v1/users/signup` - Complete sign-up (public)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{check_person, ApiJson, ApiQuery},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use projectdesk_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
        password::{hash_password, validate_password_strength},
    },
    models::user::{CreateRegisteredUser, RegisteredUser, Role},
    validation::normalize_email,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Registration request
///
/// Names must be camelCase (`^[a-z][a-zA-Z]*$`).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    pub first_name: String,
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Public view of a registered user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub reg_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,

    /// Whether the user has chosen a password
    pub signed_up: bool,
}

impl From<RegisteredUser> for UserSummary {
    fn from(user: RegisteredUser) -> Self {
        Self {
            signed_up: user.is_signed_up(),
            reg_id: user.reg_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub email: Option<String>,
}

/// Sign-up completion request
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Registers a user without a password
///
/// # Endpoint
///
/// ```text
/// POST /v1/users
///
/// { "first_name": "grace", "last_name": "hopper", "email": "grace@example.com", "role": "CEO" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an Admin
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Names not camelCase or malformed email
pub async fn register(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<RegisterUserResponse>)> {
    require_permission(&auth, Permission::ManageStaff)?;
    check_person(&req.first_name, &req.last_name, req.validate())?;

    let user = RegisteredUser::create(
        &state.db,
        CreateRegisteredUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: normalize_email(&req.email),
            role: req.role,
        },
    )
    .await?;

    info!(reg_id = user.reg_id, role = %user.role, registered_by = auth.user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterUserResponse {
            message: "User created successfully. Please complete sign-up.".to_string(),
            user: user.into(),
        }),
    ))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserList>> {
    require_permission(&auth, Permission::ManageStaff)?;

    let users = RegisteredUser::list(&state.db).await?;

    Ok(Json(UserList {
        users: users.into_iter().map(UserSummary::from).collect(),
    }))
}

/// Reports whether an email is registered and has completed sign-up
///
/// # Errors
///
/// - `400 Bad Request`: `email` query parameter missing
/// - `404 Not Found`: Email not registered
pub async fn lookup(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LookupQuery>,
) -> ApiResult<Json<UserSummary>> {
    let email = query
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email query parameter is required".to_string()))?;

    let user = RegisteredUser::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Completes sign-up by setting the password
///
/// The password must match its confirmation, satisfy the strength rules and
/// must not contain the user's registered first or last name.
///
/// # Errors
///
/// - `404 Not Found`: Email not registered
/// - `409 Conflict`: Sign-up already completed
/// - `422 Unprocessable Entity`: Mismatch or weak password
pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignUpRequest>,
) -> ApiResult<Json<SignUpResponse>> {
    req.validate()?;

    if req.password != req.confirm_password {
        return Err(ApiError::invalid_field(
            "confirm_password",
            "Passwords do not match",
        ));
    }

    let email = normalize_email(&req.email);
    let user = RegisteredUser::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found. Cannot complete sign-up.".to_string()))?;

    if user.is_signed_up() {
        return Err(ApiError::Conflict("You are already set up.".to_string()));
    }

    validate_password_strength(&req.password, &user.first_name, &user.last_name)
        .map_err(|message| ApiError::invalid_field("password", message))?;

    let password_hash = hash_password(&req.password)?;

    // A concurrent sign-up may have won the race since the check above
    let user = RegisteredUser::complete_sign_up(&state.db, &email, &password_hash)
        .await?
        .ok_or_else(|| ApiError::Conflict("You are already set up.".to_string()))?;

    info!(reg_id = user.reg_id, "Sign-up completed");

    Ok(Json(SignUpResponse {
        message: "Sign-up completed successfully.".to_string(),
        user: user.into(),
    }))
}
