/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`; failures render as
/// `{ "error": <code>, "message": <text>, "details"?: [...] }` with a status
/// chosen by the variant.
///
/// # Status Mapping
///
/// | Variant             | Status | Typical source                              |
/// |---------------------|--------|---------------------------------------------|
/// | `BadRequest`        | 400    | malformed body, FK or CHECK violation        |
/// | `Unauthorized`      | 401    | missing, expired or invalid session          |
/// | `Forbidden`         | 403    | role lacks the permission                    |
/// | `NotFound`          | 404    | unknown id, or a guarded update that missed  |
/// | `Conflict`          | 409    | unique violation, wrong workflow state       |
/// | `ValidationError`   | 422    | field rules (names, passwords)               |
/// | `RateLimitExceeded` | 429    | login lockout, with `Retry-After`            |
/// | `InternalError`     | 500    | logged, never shown to clients               |
///
/// # Example
///
/// ```
/// use projectdesk_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(progress: i32) -> ApiResult<Json<serde_json::Value>> {
///     if !(0..=100).contains(&progress) {
///         return Err(ApiError::BadRequest("Progress must be between 0 and 100".to_string()));
///     }
///     Ok(Json(json!({ "progress": progress })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use projectdesk_shared::{
    auth::{
        authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError,
        throttle::ThrottleError,
    },
    models::project::ProjectError,
    validation::FieldError,
};
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Unprocessable entity (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Too many requests (429)
    RateLimitExceeded { retry_after: u64, message: String },

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::RateLimitExceeded { message, .. } => {
                write!(f, "Rate limit exceeded: {}", message)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            ApiError::RateLimitExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        };

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::RateLimitExceeded { message, .. } => ("rate_limit_exceeded", message, None),
            ApiError::InternalError(msg) => {
                // Logged here, masked in the response
                tracing::error!(error = %msg, "Internal error");
                ("internal_error", "An internal error occurred".to_string(), None)
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg, None),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        let mut response = (status, body).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

/// SQLSTATE 22003
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";
/// SQLSTATE 22001
const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";

/// Convert sqlx errors to API errors
///
/// Constraint violations become client errors; anything else is internal.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation if constraint.contains("email") => {
                        ApiError::Conflict("Email already exists".to_string())
                    }
                    ErrorKind::UniqueViolation => {
                        ApiError::Conflict(format!("Duplicate value violates {}", constraint))
                    }
                    ErrorKind::ForeignKeyViolation => {
                        ApiError::BadRequest(format!("Referenced record does not exist ({})", constraint))
                    }
                    ErrorKind::CheckViolation => {
                        ApiError::BadRequest(format!("Value rejected by {}", constraint))
                    }
                    ErrorKind::NotNullViolation => {
                        ApiError::BadRequest("A required field is missing".to_string())
                    }
                    _ => match db_err.code().as_deref() {
                        Some(NUMERIC_VALUE_OUT_OF_RANGE) => {
                            ApiError::BadRequest("Numeric value out of range".to_string())
                        }
                        Some(STRING_DATA_RIGHT_TRUNCATION) => {
                            ApiError::BadRequest("Value too long".to_string())
                        }
                        _ => ApiError::InternalError(format!("Database error: {}", db_err)),
                    },
                }
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::DeveloperNotFound(id) => {
                ApiError::BadRequest(format!("Developer {} not found", id))
            }
            ProjectError::Database(err) => err.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized("Not authenticated".to_string()),
            AuthError::InvalidFormat => ApiError::BadRequest("Expected Bearer token".to_string()),
            AuthError::InvalidToken(err) => err.into(),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized("Session expired or invalid".to_string()),
        }
    }
}

impl From<ThrottleError> for ApiError {
    fn from(err: ThrottleError) -> Self {
        tracing::error!(error = %err, "Login attempt store failed");
        ApiError::ServiceUnavailable("Login is temporarily unavailable".to_string())
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::invalid_field(err.field, err.message)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projectdesk_shared::auth::authorization::Permission;
    use projectdesk_shared::models::user::Role;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Project not found".to_string());
        assert_eq!(err.to_string(), "Not found: Project not found");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::Conflict("Module is not in Started state".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["error"], "conflict");
        assert_eq!(body["message"], "Module is not in Started state");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_validation_error_details() {
        let response = ApiError::ValidationError(vec![
            ValidationErrorDetail::new("first_name", "Must be camelCase"),
            ValidationErrorDetail::new("password", "Password too short"),
        ])
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
        assert_eq!(body["details"][0]["field"], "first_name");
    }

    #[tokio::test]
    async fn test_rate_limit_sets_retry_after() {
        let response = ApiError::RateLimitExceeded {
            retry_after: 900,
            message: "Too many failed attempts".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "900");
    }

    #[tokio::test]
    async fn test_internal_error_is_masked() {
        let response = ApiError::InternalError("connection reset by peer".to_string()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[test]
    fn test_auth_errors_map_to_401() {
        assert_eq!(ApiError::from(AuthError::MissingCredentials).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(JwtError::Expired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(JwtError::CreateError("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_authz_error_keeps_denial_message() {
        let err = ApiError::from(AuthzError::MissingPermission {
            permission: Permission::ProcessPayments,
            role: Role::Developer,
        });
        assert!(matches!(
            err,
            ApiError::Forbidden(ref message) if message == "Forbidden: Access is restricted to Finance."
        ));
    }

    #[test]
    fn test_row_not_found_is_404() {
        assert_eq!(ApiError::from(sqlx::Error::RowNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(ProjectError::DeveloperNotFound(9)).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
