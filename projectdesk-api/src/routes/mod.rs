/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, logout and the current session
/// - `users`: Registration and sign-up
/// - `team_leads`, `developers`: Staff directory (Admin)
/// - `projects`: Proposals, review, appeal and completion
/// - `modules`: Developer deliverables
/// - `finance`: Payments for completed modules
/// - `reports`: Team lead progress reports
///
/// Handlers take their inputs through [`ApiJson`], [`ApiPath`] and
/// [`ApiQuery`] so malformed requests get the same JSON error body as every
/// other failure.

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use axum::extract::{FromRequest, FromRequestParts};
use projectdesk_shared::validation::check_person_names;
use rust_decimal::Decimal;

pub mod auth;
pub mod developers;
pub mod finance;
pub mod health;
pub mod modules;
pub mod projects;
pub mod reports;
pub mod team_leads;
pub mod users;

/// `axum::Json` with rejections rendered as [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with rejections rendered as [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` with rejections rendered as [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Collects camelCase name failures and `validator` failures into one 422
pub(crate) fn check_person(
    first_name: &str,
    last_name: &str,
    rules: Result<(), validator::ValidationErrors>,
) -> ApiResult<()> {
    let mut details: Vec<ValidationErrorDetail> = check_person_names(first_name, last_name)
        .into_iter()
        .map(|err| ValidationErrorDetail::new(err.field, err.message))
        .collect();

    if let Err(errors) = rules {
        if let ApiError::ValidationError(more) = ApiError::from(errors) {
            details.extend(more);
        }
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(details))
    }
}

/// Trims a required text field, rejecting blank values
pub(crate) fn required_text(field: &'static str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank counts as absent
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Largest amount a `NUMERIC(12,2)` column holds
pub(crate) const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Rejects money values the schema cannot store exactly
pub(crate) fn check_money(field: &'static str, value: Decimal) -> ApiResult<()> {
    if value < Decimal::ZERO {
        return Err(ApiError::BadRequest(format!("{} cannot be negative", field)));
    }
    if value.normalize().scale() > 2 {
        return Err(ApiError::BadRequest(format!(
            "{} cannot have more than two decimal places",
            field
        )));
    }
    if value > MAX_MONEY {
        return Err(ApiError::BadRequest(format!(
            "{} cannot exceed {}",
            field, MAX_MONEY
        )));
    }
    Ok(())
}
