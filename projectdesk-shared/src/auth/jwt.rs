/// JWT session token generation and validation
///
/// Sessions are HS256-signed JWTs carrying the user's identity and role.
/// They are issued at login, delivered in an httpOnly `authToken` cookie and
/// expire after two hours. There is no refresh flow: an expired session
/// requires logging in again.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 2 hours by default
/// - **Validation**: Signature, expiration, not-before and issuer checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use projectdesk_shared::auth::jwt::{create_token, validate_token, Claims, SessionUser};
/// use projectdesk_shared::models::user::Role;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user = SessionUser {
///     id: 7,
///     email: "lead@example.com".to_string(),
///     first_name: "alan".to_string(),
///     last_name: "turing".to_string(),
///     role: Role::TeamLead,
/// };
///
/// let token = create_token(&Claims::new(user), "your-secret-key-at-least-32-bytes")?;
/// let claims = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(claims.sub, 7);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::{RegisteredUser, Role};

/// Issuer claim on every session token
pub const ISSUER: &str = "projectdesk";

/// Default session lifetime
pub const SESSION_TTL_MINUTES: i64 = 120;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// Identity carried inside a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Registered user id
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&RegisteredUser> for SessionUser {
    fn from(user: &RegisteredUser) -> Self {
        Self {
            id: user.reg_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (registered user id)
/// - `iss`: Issuer (always "projectdesk")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `email`, `first_name`, `last_name`: display identity
/// - `role`: the role every route authorizes against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - registered user id
    pub sub: i32,

    /// Issuer - always "projectdesk"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl Claims {
    /// Creates claims with the default two hour lifetime
    pub fn new(user: SessionUser) -> Self {
        Self::with_expiration(user, Duration::minutes(SESSION_TTL_MINUTES))
    }

    /// Creates claims with custom expiration
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::Duration;
    /// use projectdesk_shared::auth::jwt::{Claims, SessionUser};
    /// use projectdesk_shared::models::user::Role;
    ///
    /// let claims = Claims::with_expiration(
    ///     SessionUser {
    ///         id: 1,
    ///         email: "ceo@example.com".to_string(),
    ///         first_name: "ada".to_string(),
    ///         last_name: "byron".to_string(),
    ///         role: Role::Ceo,
    ///     },
    ///     Duration::minutes(30),
    /// );
    /// assert!(!claims.is_expired());
    /// ```
    pub fn with_expiration(user: SessionUser, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user.id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
        }
    }

    /// Identity carried by these claims
    pub fn user(&self) -> SessionUser {
        SessionUser {
            id: self.sub,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Creates a signed session token from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token creation fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a session token and extracts its claims
///
/// Verifies the signature, expiration, not-before time and issuer.
///
/// # Errors
///
/// - `JwtError::Expired` once the session has lapsed
/// - `JwtError::InvalidIssuer` for tokens minted by another service
/// - `JwtError::ValidationError` for anything else (bad signature, garbage)
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
