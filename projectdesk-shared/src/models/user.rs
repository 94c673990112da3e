/// Registered user model and the role set
///
/// Every person who can sign in has a row in `reg_users`. An Admin registers
/// the account (name, email, role); the user later completes sign-up by
/// choosing a password, which is stored as an Argon2id hash.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE reg_users (
///     reg_id SERIAL PRIMARY KEY,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     role VARCHAR(20) NOT NULL,
///     password_hash VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::models::user::{CreateRegisteredUser, RegisteredUser, Role};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = RegisteredUser::create(&pool, CreateRegisteredUser {
///     first_name: "grace".to_string(),
///     last_name: "hopper".to_string(),
///     email: "grace@example.com".to_string(),
///     role: Role::Ceo,
/// }).await?;
///
/// assert!(!user.is_signed_up());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

/// Error returned when a stored or submitted value is not a known enum variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed
    pub kind: &'static str,

    /// The rejected input
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Organisational role of a registered user
///
/// The set is closed: every authorization decision matches on it
/// exhaustively, so adding a role forces every capability to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Registers users, team leads and developers
    Admin,

    /// Reviews project proposals
    #[serde(rename = "CEO")]
    Ceo,

    /// Proposes projects and follows their progress
    #[serde(rename = "Team Lead")]
    TeamLead,

    /// Delivers modules
    Developer,

    /// Settles payments for completed modules
    Finance,
}

impl Role {
    /// All roles, in display order
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Ceo,
        Role::TeamLead,
        Role::Developer,
        Role::Finance,
    ];

    /// Stored and serialized representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Ceo => "CEO",
            Role::TeamLead => "Team Lead",
            Role::Developer => "Developer",
            Role::Finance => "Finance",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("role", s))
    }
}

impl TryFrom<String> for Role {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A registered user account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RegisteredUser {
    pub reg_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    #[sqlx(try_from = "String")]
    pub role: Role,

    /// Argon2id hash, absent until sign-up is completed
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Input for registering a user
#[derive(Debug, Clone)]
pub struct CreateRegisteredUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

impl RegisteredUser {
    /// Whether the user has chosen a password
    pub fn is_signed_up(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Registers a user without a password
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the email is already registered.
    pub async fn create(pool: &PgPool, data: CreateRegisteredUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RegisteredUser>(
            r#"
            INSERT INTO reg_users (first_name, last_name, email, role)
            VALUES ($1, $2, $3, $4)
            RETURNING reg_id, first_name, last_name, email, role, password_hash, created_at
            "#,
        )
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.role.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, reg_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RegisteredUser>(
            r#"
            SELECT reg_id, first_name, last_name, email, role, password_hash, created_at
            FROM reg_users
            WHERE reg_id = $1
            "#,
        )
        .bind(reg_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RegisteredUser>(
            r#"
            SELECT reg_id, first_name, last_name, email, role, password_hash, created_at
            FROM reg_users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Lists every registered user ordered by name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RegisteredUser>(
            r#"
            SELECT reg_id, first_name, last_name, email, role, password_hash, created_at
            FROM reg_users
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Stores the password hash for a user who has not signed up yet
    ///
    /// Returns `None` when the user does not exist or already has a password,
    /// so a completed sign-up can never be overwritten through this path.
    pub async fn complete_sign_up(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RegisteredUser>(
            r#"
            UPDATE reg_users
            SET password_hash = $2
            WHERE LOWER(email) = LOWER($1) AND password_hash IS NULL
            RETURNING reg_id, first_name, last_name, email, role, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_optional(pool)
        .await
    }

    /// Counts users holding a role
    pub async fn count_by_role(pool: &PgPool, role: Role) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reg_users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_storage_string() {
        for role in Role::ALL {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_role_rejects_unknown_value() {
        let err = Role::try_from("Intern".to_string()).unwrap_err();
        assert_eq!(err.kind, "role");
        assert_eq!(err.value, "Intern");
    }

    #[test]
    fn test_role_serde_uses_display_names() {
        assert_eq!(serde_json::to_string(&Role::TeamLead).unwrap(), "\"Team Lead\"");
        assert_eq!(serde_json::to_string(&Role::Ceo).unwrap(), "\"CEO\"");

        let role: Role = serde_json::from_str("\"Finance\"").unwrap();
        assert_eq!(role, Role::Finance);
        assert!(serde_json::from_str::<Role>("\"team lead\"").is_err());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = RegisteredUser {
            reg_id: 1,
            first_name: "ada".to_string(),
            last_name: "lovelace".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Developer,
            password_hash: Some("$argon2id$secret".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "Developer");
        assert!(user.is_signed_up());
    }
}
