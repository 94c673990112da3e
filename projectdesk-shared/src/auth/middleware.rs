/// Session authentication for Axum
///
/// Sessions travel in the httpOnly `authToken` cookie set at login. API
/// clients that cannot hold cookies may send the same token as
/// `Authorization: Bearer <token>`; the header wins when both are present.
///
/// # Request Extensions
///
/// After successful authentication the API inserts an [`AuthContext`] into the
/// request extensions. Handlers extract it with `Extension<AuthContext>`.
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use projectdesk_shared::auth::middleware::authenticate;
///
/// fn example(headers: &HeaderMap) {
///     match authenticate(headers, "your-jwt-secret-at-least-32-bytes") {
///         Ok(auth) => println!("{} is a {}", auth.email, auth.role),
///         Err(e) => println!("rejected: {}", e),
///     }
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::user::Role;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "authToken";

/// Authenticated caller, added to request extensions
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use projectdesk_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("{} ({})", auth.email, auth.role)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Registered user id
    pub user_id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl AuthContext {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            role: claims.role,
        }
    }
}

/// Error type for session authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Neither a bearer token nor a session cookie was sent
    #[error("Not authenticated")]
    MissingCredentials,

    /// Authorization header present but not a Bearer token
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token rejected by validation
    #[error("Session expired or invalid")]
    InvalidToken(#[from] JwtError),
}

/// Finds the session token on a request
///
/// Looks at `Authorization: Bearer` first, then the `authToken` cookie.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidFormat)?;
        return value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidFormat);
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
        .ok_or(AuthError::MissingCredentials)
}

/// Validates the request's session and builds its [`AuthContext`]
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = extract_token(headers)?;
    let claims = validate_token(token, secret)?;

    Ok(AuthContext::from_claims(claims))
}

/// `Set-Cookie` value carrying a fresh session
///
/// `Secure` is added in production where the API is served over TLS.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Strict; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, SessionUser};
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn token_for(role: Role) -> String {
        let claims = Claims::new(SessionUser {
            id: 3,
            email: "dev@example.com".to_string(),
            first_name: "linus".to_string(),
            last_name: "torvalds".to_string(),
            role,
        });
        create_token(&claims, SECRET).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));

        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_cookie_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; authToken=abc.def.ghi; lang=en"),
        );

        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_header_takes_precedence_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("authToken=from-cookie"));

        assert_eq!(extract_token(&headers).unwrap(), "from-header");
    }

    #[test]
    fn test_missing_and_malformed_credentials() {
        let headers = HeaderMap::new();
        assert!(matches!(extract_token(&headers), Err(AuthError::MissingCredentials)));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("authToken="));
        assert!(matches!(extract_token(&headers), Err(AuthError::MissingCredentials)));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(extract_token(&headers), Err(AuthError::InvalidFormat)));
    }

    #[test]
    fn test_authenticate_builds_context() {
        let mut headers = HeaderMap::new();
        let cookie = format!("{}={}", SESSION_COOKIE, token_for(Role::Developer));
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

        let auth = authenticate(&headers, SECRET).unwrap();
        assert_eq!(auth.user_id, 3);
        assert_eq!(auth.role, Role::Developer);
        assert_eq!(auth.email, "dev@example.com");
    }

    #[test]
    fn test_authenticate_rejects_bad_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer garbage"));

        assert!(matches!(
            authenticate(&headers, SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", 7200, false);
        assert_eq!(
            cookie,
            "authToken=tok; HttpOnly; Path=/; SameSite=Strict; Max-Age=7200"
        );

        assert!(session_cookie("tok", 7200, true).ends_with("; Secure"));
        assert!(clear_session_cookie(false).starts_with("authToken=;"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
