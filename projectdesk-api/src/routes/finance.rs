/// Finance endpoints (Finance)
///
/// Every completed module has exactly one finance record, created Pending by
/// the database when the module completes. Finance staff settle it as Paid
/// or Rejected; processing a record again overwrites the earlier decision.
///
/// # Endpoints
///
/// - `GET /v1/finance?status=` - Payment records, Pending by default
/// - `GET /v1/finance/report` - Every record plus totals
/// - `PATCH /v1/finance/{id}` - Record a payment decision

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{check_money, optional_text, ApiJson, ApiPath, ApiQuery},
};
use axum::{extract::State, Extension, Json};
use projectdesk_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    models::finance::{Finance, FinanceSummary, PaymentRecord, PaymentStatus, ProcessPayment},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    /// `Paid` or `Rejected`
    pub payment_status: String,

    /// Defaults to zero
    pub amount: Option<Decimal>,

    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentList {
    pub payments: Vec<PaymentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinanceReport {
    pub payments: Vec<PaymentRecord>,
    pub summary: FinanceSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessedPayment {
    pub message: String,
    pub finance: Finance,
}

/// # Errors
///
/// - `400 Bad Request`: Unknown status filter
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<PaymentQuery>,
) -> ApiResult<Json<PaymentList>> {
    require_permission(&auth, Permission::ProcessPayments)?;

    let status = match optional_text(query.status) {
        Some(raw) => raw
            .parse::<PaymentStatus>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => PaymentStatus::Pending,
    };

    let payments = Finance::list_records(&state.db, Some(status)).await?;

    Ok(Json(PaymentList { payments }))
}

pub async fn finance_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<FinanceReport>> {
    require_permission(&auth, Permission::ProcessPayments)?;

    let payments = Finance::list_records(&state.db, None).await?;
    let summary = Finance::summary(&state.db).await?;

    Ok(Json(FinanceReport { payments, summary }))
}

/// Settles a finance record
///
/// The caller's email and today's date are stamped on the record.
///
/// # Errors
///
/// - `400 Bad Request`: Status is not Paid or Rejected, or an amount that is
///   negative, finer than cents or too large to store
/// - `404 Not Found`: Unknown finance record
pub async fn process_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<ProcessPaymentRequest>,
) -> ApiResult<Json<ProcessedPayment>> {
    require_permission(&auth, Permission::ProcessPayments)?;

    let payment_status = parse_decision(&req.payment_status)?;
    let amount = req.amount.unwrap_or(Decimal::ZERO);
    check_money("Amount", amount)?;

    let finance = Finance::process(
        &state.db,
        id,
        ProcessPayment {
            payment_status,
            amount,
            notes: optional_text(req.notes).unwrap_or_default(),
            processed_by: auth.email.clone(),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Payment record not found".to_string()))?;

    info!(
        finance_id = id,
        module_id = finance.module_id,
        status = %payment_status,
        processed_by = %auth.email,
        "Payment processed"
    );

    Ok(Json(ProcessedPayment {
        message: format!("Payment marked as {}", payment_status),
        finance,
    }))
}

fn parse_decision(raw: &str) -> ApiResult<PaymentStatus> {
    raw.trim()
        .parse::<PaymentStatus>()
        .ok()
        .filter(PaymentStatus::is_decision)
        .ok_or_else(|| {
            ApiError::BadRequest(
                "Invalid payment status. Must be \"Paid\" or \"Rejected\".".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision() {
        assert_eq!(parse_decision("Paid").unwrap(), PaymentStatus::Paid);
        assert_eq!(parse_decision(" Rejected ").unwrap(), PaymentStatus::Rejected);
        assert!(parse_decision("Pending").is_err());
        assert!(parse_decision("paid").is_err());
    }
}
