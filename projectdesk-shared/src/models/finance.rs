/// Finance ledger for completed modules
///
/// Rows are never inserted by the application: the
/// `module_completion_finance` trigger opens one pending record when a module
/// first reaches `Complete`, snapshotting its cost and currency. Finance staff
/// then mark the record Paid or Rejected.
///
/// Processing is not guarded on the current payment status: a second
/// decision on the same record overwrites the first.
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::models::finance::{Finance, PaymentStatus, ProcessPayment};
/// use rust_decimal::Decimal;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, finance_id: i32) -> Result<(), sqlx::Error> {
/// Finance::process(&pool, finance_id, ProcessPayment {
///     payment_status: PaymentStatus::Paid,
///     amount: Decimal::new(150_000, 2),
///     notes: "Paid by transfer".to_string(),
///     processed_by: "finance@example.com".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

use super::user::ParseEnumError;

/// Payment decision on a finance record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Rejected,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Rejected => "Rejected",
        }
    }

    /// Whether finance staff may set this status
    ///
    /// `Pending` is only ever set by the completion trigger.
    pub fn is_decision(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Rejected)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("payment status", s))
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Finance {
    pub finance_id: i32,
    pub module_id: i32,

    /// Email of the finance user who last processed the record
    pub processed_by: Option<String>,

    pub processed_date: Option<NaiveDate>,

    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,

    /// Amount actually paid
    pub amount: Decimal,

    /// Module cost at completion time
    pub module_cost: Decimal,

    pub currency: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Finance record joined with its module, project and developer
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentRecord {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub finance: Finance,

    pub module_name: String,
    pub project_id: i32,
    pub project_name: String,
    pub marked_complete_date: Option<NaiveDate>,
    pub commit_link: Option<String>,
    pub developer_first_name: Option<String>,
    pub developer_last_name: Option<String>,
    pub developer_email: Option<String>,
}

/// Totals across every finance record
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct FinanceSummary {
    pub total_payments: i64,
    pub paid_count: i64,
    pub pending_count: i64,
    pub rejected_count: i64,

    /// Sum of amounts on Paid records
    pub total_paid_amount: Decimal,

    /// Sum of module costs still awaiting payment
    pub total_pending_amount: Decimal,

    pub total_module_costs: Decimal,
}

/// A finance decision
#[derive(Debug, Clone)]
pub struct ProcessPayment {
    pub payment_status: PaymentStatus,
    pub amount: Decimal,
    pub notes: String,
    pub processed_by: String,
}

const PAYMENT_RECORD_SELECT: &str = r#"
    SELECT f.finance_id, f.module_id, f.processed_by, f.processed_date, f.payment_status,
           f.amount, f.module_cost, f.currency, f.notes, f.created_at,
           m.name AS module_name, m.marked_complete_date, m.commit_link,
           p.project_id, p.name AS project_name,
           d.first_name AS developer_first_name, d.last_name AS developer_last_name,
           d.email AS developer_email
    FROM finance f
    JOIN module m ON m.module_id = f.module_id
    JOIN project p ON p.project_id = m.project_id
    LEFT JOIN developer d ON d.developer_id = m.developer_id
"#;

impl Finance {
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Finance>(
            r#"
            SELECT finance_id, module_id, processed_by, processed_date, payment_status,
                   amount, module_cost, currency, notes, created_at
            FROM finance
            WHERE finance_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_module(pool: &PgPool, module_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Finance>(
            r#"
            SELECT finance_id, module_id, processed_by, processed_date, payment_status,
                   amount, module_cost, currency, notes, created_at
            FROM finance
            WHERE module_id = $1
            "#,
        )
        .bind(module_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists payment records, optionally filtered by status, newest first
    pub async fn list_records(
        pool: &PgPool,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRecord>(&format!(
            "{PAYMENT_RECORD_SELECT}
             WHERE ($1::VARCHAR IS NULL OR f.payment_status = $1)
             ORDER BY f.created_at DESC, f.finance_id DESC"
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await
    }

    pub async fn summary(pool: &PgPool) -> Result<FinanceSummary, sqlx::Error> {
        sqlx::query_as::<_, FinanceSummary>(
            r#"
            SELECT COUNT(*) AS total_payments,
                   COUNT(*) FILTER (WHERE payment_status = 'Paid') AS paid_count,
                   COUNT(*) FILTER (WHERE payment_status = 'Pending') AS pending_count,
                   COUNT(*) FILTER (WHERE payment_status = 'Rejected') AS rejected_count,
                   COALESCE(SUM(amount) FILTER (WHERE payment_status = 'Paid'), 0) AS total_paid_amount,
                   COALESCE(SUM(module_cost) FILTER (WHERE payment_status = 'Pending'), 0) AS total_pending_amount,
                   COALESCE(SUM(module_cost), 0) AS total_module_costs
            FROM finance
            "#,
        )
        .fetch_one(pool)
        .await
    }

    /// Records a payment decision
    ///
    /// Stamps the processor and today's date. Returns `None` if the record
    /// does not exist.
    pub async fn process(
        pool: &PgPool,
        id: i32,
        data: ProcessPayment,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Finance>(
            r#"
            UPDATE finance
            SET payment_status = $2,
                amount = $3,
                notes = $4,
                processed_by = $5,
                processed_date = CURRENT_DATE
            WHERE finance_id = $1
            RETURNING finance_id, module_id, processed_by, processed_date, payment_status,
                      amount, module_cost, currency, notes, created_at
            "#,
        )
        .bind(id)
        .bind(data.payment_status.as_str())
        .bind(data.amount)
        .bind(data.notes)
        .bind(data.processed_by)
        .fetch_optional(pool)
        .await
    }
}
