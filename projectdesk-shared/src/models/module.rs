/// Module model and the delivery workflow
///
/// A module is a billable unit of work a developer delivers against an
/// approved project.
///
/// # Status Workflow
///
/// ```text
/// Pending ──start──► Started ──complete (commit link)──► Complete
/// ```
///
/// Completing a module stamps `marked_complete_date`. The
/// `module_completion_finance` trigger then opens exactly one pending
/// finance record carrying a snapshot of the module cost.
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::models::module::Module;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, module_id: i32, developer_id: i32) -> Result<(), sqlx::Error> {
/// Module::start(&pool, module_id, developer_id).await?;
/// Module::complete(&pool, module_id, developer_id, "https://git.example.com/c/abc123").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

use super::user::ParseEnumError;

/// Delivery state of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleStatus {
    Pending,
    Started,
    Complete,
}

impl ModuleStatus {
    pub const ALL: [ModuleStatus; 3] = [
        ModuleStatus::Pending,
        ModuleStatus::Started,
        ModuleStatus::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Pending => "Pending",
            ModuleStatus::Started => "Started",
            ModuleStatus::Complete => "Complete",
        }
    }

    pub fn can_transition_to(&self, target: ModuleStatus) -> bool {
        matches!(
            (self, target),
            (ModuleStatus::Pending, ModuleStatus::Started)
                | (ModuleStatus::Started, ModuleStatus::Complete)
        )
    }

    /// Completed modules are frozen: their cost has been handed to finance
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModuleStatus::Complete)
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModuleStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("module status", s))
    }
}

impl TryFrom<String> for ModuleStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Module {
    pub module_id: i32,
    pub project_id: i32,

    /// Developer who owns the module
    pub developer_id: Option<i32>,

    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cost: Decimal,

    /// ISO 4217 code
    pub currency: String,

    #[sqlx(try_from = "String")]
    pub status: ModuleStatus,

    pub marked_complete_date: Option<NaiveDate>,
    pub commit_link: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a module
#[derive(Debug, Clone)]
pub struct CreateModule {
    pub project_id: i32,
    pub developer_id: i32,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cost: Decimal,
    pub currency: String,
    pub notes: Option<String>,
}

/// Editable module fields; absent fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct UpdateModule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

const MODULE_COLUMNS: &str = "module_id, project_id, developer_id, name, description, start_date, \
                              end_date, cost, currency, status, marked_complete_date, commit_link, \
                              notes, created_at";

impl Module {
    /// Creates a pending module
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the project does not exist and a
    /// check violation if the cost is negative or the dates are reversed.
    pub async fn create(pool: &PgPool, data: CreateModule) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Module>(&format!(
            r#"
            INSERT INTO module (project_id, developer_id, name, description, start_date, end_date,
                                cost, currency, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'Pending', $9)
            RETURNING {MODULE_COLUMNS}
            "#
        ))
        .bind(data.project_id)
        .bind(data.developer_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.cost)
        .bind(data.currency)
        .bind(data.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Module>(&format!(
            "SELECT {MODULE_COLUMNS} FROM module WHERE module_id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a module owned by a developer
    pub async fn find_owned(
        pool: &PgPool,
        id: i32,
        developer_id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Module>(&format!(
            "SELECT {MODULE_COLUMNS} FROM module WHERE module_id = $1 AND developer_id = $2"
        ))
        .bind(id)
        .bind(developer_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_developer(
        pool: &PgPool,
        developer_id: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Module>(&format!(
            "SELECT {MODULE_COLUMNS} FROM module
             WHERE developer_id = $1
             ORDER BY start_date, module_id"
        ))
        .bind(developer_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_project(pool: &PgPool, project_id: i32) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Module>(&format!(
            "SELECT {MODULE_COLUMNS} FROM module
             WHERE project_id = $1
             ORDER BY start_date, module_id"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Edits an owned module that is not complete
    pub async fn update_details(
        pool: &PgPool,
        id: i32,
        developer_id: i32,
        data: UpdateModule,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Module>(&format!(
            r#"
            UPDATE module
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                cost = COALESCE($7, cost),
                currency = COALESCE($8, currency),
                notes = COALESCE($9, notes)
            WHERE module_id = $1 AND developer_id = $2 AND status <> 'Complete'
            RETURNING {MODULE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(developer_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.cost)
        .bind(data.currency)
        .bind(data.notes)
        .fetch_optional(pool)
        .await
    }

    /// Transitions an owned module from Pending to Started
    pub async fn start(
        pool: &PgPool,
        id: i32,
        developer_id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Module>(&format!(
            r#"
            UPDATE module
            SET status = 'Started'
            WHERE module_id = $1 AND developer_id = $2 AND status = 'Pending'
            RETURNING {MODULE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(developer_id)
        .fetch_optional(pool)
        .await
    }

    /// Transitions an owned module from Started to Complete
    ///
    /// Stamps `marked_complete_date` with the current date and records the
    /// commit link. The finance trigger fires on this update.
    pub async fn complete(
        pool: &PgPool,
        id: i32,
        developer_id: i32,
        commit_link: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Module>(&format!(
            r#"
            UPDATE module
            SET status = 'Complete',
                commit_link = $3,
                marked_complete_date = CURRENT_DATE
            WHERE module_id = $1 AND developer_id = $2 AND status = 'Started'
            RETURNING {MODULE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(developer_id)
        .bind(commit_link)
        .fetch_optional(pool)
        .await
    }

    /// Deletes an owned module that is not complete
    pub async fn delete_owned(pool: &PgPool, id: i32, developer_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM module WHERE module_id = $1 AND developer_id = $2 AND status <> 'Complete'",
        )
        .bind(id)
        .bind(developer_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_transitions() {
        use ModuleStatus::*;

        assert!(Pending.can_transition_to(Started));
        assert!(Started.can_transition_to(Complete));

        assert!(!Pending.can_transition_to(Complete));
        assert!(!Started.can_transition_to(Pending));
        assert!(!Complete.can_transition_to(Started));
        assert!(!Complete.can_transition_to(Complete));
    }

    #[test]
    fn test_only_complete_is_terminal() {
        assert!(ModuleStatus::Complete.is_terminal());
        assert!(!ModuleStatus::Started.is_terminal());
        assert!(!ModuleStatus::Pending.is_terminal());
    }

    #[test]
    fn test_module_status_parse() {
        for status in ModuleStatus::ALL {
            assert_eq!(status.as_str().parse::<ModuleStatus>().unwrap(), status);
        }
        assert!(ModuleStatus::try_from("Completed".to_string()).is_err());
    }
}
