/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: Session token generation and validation
/// - [`middleware`]: Session extraction from cookies or bearer headers
/// - [`authorization`]: Role capabilities and project stewardship checks
/// - [`throttle`]: Failed login counting and lockout
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Sessions**: HS256 JWTs valid for 2 hours in an httpOnly cookie
/// - **Lockout**: 3 failed logins lock an email for 15 minutes
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::auth::password::{hash_password, verify_password};
/// use projectdesk_shared::auth::jwt::{create_token, validate_token, Claims, SessionUser};
/// use projectdesk_shared::models::user::Role;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("MyP@ssw0rd!")?;
/// assert!(verify_password("MyP@ssw0rd!", &hash)?);
///
/// let claims = Claims::new(SessionUser {
///     id: 1,
///     email: "ceo@example.com".to_string(),
///     first_name: "ada".to_string(),
///     last_name: "byron".to_string(),
///     role: Role::Ceo,
/// });
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod throttle;
