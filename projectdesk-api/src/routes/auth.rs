/// Session endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Verify credentials and set the session cookie
/// - `POST /v1/auth/logout` - Clear the session cookie
/// - `GET /v1/auth/me` - Identity of the current session
///
/// Sessions are HS256 tokens carried in the `authToken` cookie (`HttpOnly`,
/// `SameSite=Strict`) and valid for two hours. Repeated failed logins lock
/// the email address for a while; see
/// [`AttemptStore`](projectdesk_shared::auth::throttle::AttemptStore).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::ApiJson,
};
use axum::{extract::State, http::header, response::IntoResponse, Extension, Json};
use projectdesk_shared::{
    auth::{
        jwt::{self, Claims, SessionUser},
        middleware::{clear_session_cookie, session_cookie, AuthContext},
        password,
        throttle::ThrottleDecision,
    },
    models::user::RegisteredUser,
    validation::normalize_email,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response; the token itself travels in the cookie
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: AuthContext,
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// { "email": "ceo@example.com", "password": "Str0ng!Pass" }
/// ```
///
/// # Response
///
/// `200 OK` with `Set-Cookie: authToken=...` and
///
/// ```json
/// { "success": true, "user": { "id": 1, "email": "ceo@example.com", "role": "CEO", ... } }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, wrong password or sign-up not completed
/// - `422 Unprocessable Entity`: Malformed email
/// - `429 Too Many Requests`: Email locked after repeated failures
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let email = normalize_email(&req.email);

    if let ThrottleDecision::Locked { retry_after } = state.attempts.check(&email).await? {
        return Err(locked(retry_after));
    }

    let user = RegisteredUser::find_by_email(&state.db, &email).await?;

    let verified = match &user {
        Some(user) => match &user.password_hash {
            Some(hash) => password::verify_password(&req.password, hash)?,
            None => {
                return Err(ApiError::Unauthorized(
                    "Account not fully set up. Please complete sign-up.".to_string(),
                ))
            }
        },
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            let decision = state.attempts.record_failure(&email).await?;
            warn!(email = %email, locked = decision.is_locked(), "Failed login attempt");

            return Err(match decision {
                ThrottleDecision::Locked { retry_after } => locked(retry_after),
                ThrottleDecision::Allowed => ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()),
            });
        }
    };

    state.attempts.reset(&email).await?;

    let session = SessionUser::from(&user);
    let ttl = state.config.session_ttl();
    let token = jwt::create_token(&Claims::with_expiration(session.clone(), ttl), state.jwt_secret())?;
    let cookie = session_cookie(&token, ttl.num_seconds(), state.secure_cookies());

    info!(user_id = user.reg_id, role = %user.role, "User logged in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            user: session,
        }),
    ))
}

/// Clears the session cookie
///
/// Tokens are stateless, so logout only removes the cookie from the browser.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.secure_cookies()))],
        Json(LogoutResponse {
            success: true,
            message: "Logged out".to_string(),
        }),
    )
}

/// Returns the identity stored in the session token
pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<MeResponse> {
    Json(MeResponse { user: auth })
}

fn locked(retry_after: Duration) -> ApiError {
    let seconds = retry_after.as_secs_f64().ceil().max(1.0) as u64;
    let minutes = seconds.div_ceil(60);

    ApiError::RateLimitExceeded {
        retry_after: seconds,
        message: format!(
            "Too many failed login attempts. Try again in {} minute{}.",
            minutes,
            if minutes == 1 { "" } else { "s" }
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_rounds_up_to_whole_minutes() {
        match locked(Duration::from_secs(61)) {
            ApiError::RateLimitExceeded { retry_after, message } => {
                assert_eq!(retry_after, 61);
                assert!(message.contains("2 minutes"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_locked_never_reports_zero_seconds() {
        match locked(Duration::from_millis(200)) {
            ApiError::RateLimitExceeded { retry_after, message } => {
                assert_eq!(retry_after, 1);
                assert!(message.contains("1 minute."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
