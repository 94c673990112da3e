//! # ProjectDesk Shared Library
//!
//! Domain types, persistence and authentication used by the ProjectDesk API.
//!
//! ## Module Organization
//!
//! - `models`: Database models, status workflows and their queries
//! - `auth`: Sessions, passwords, role capabilities and login throttling
//! - `db`: Connection pool and embedded migrations
//! - `redis`: Optional Redis client for shared login throttling
//! - `validation`: Name and email rules for registration forms

pub mod auth;
pub mod db;
pub mod models;
pub mod redis;
pub mod validation;

/// Current version of the ProjectDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
