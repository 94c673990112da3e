/// Team lead progress reports
///
/// One row per (project, developer) pair for projects the team lead
/// proposed, with module counts by status and the module list as JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use super::project::ProjectStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectProgressRow {
    pub project_id: i32,
    pub project_name: String,

    #[sqlx(try_from = "String")]
    pub project_status: ProjectStatus,

    pub progress: i32,
    pub developer_id: i32,
    pub developer_first_name: String,
    pub developer_last_name: String,
    pub total_modules: i64,
    pub completed_modules: i64,
    pub started_modules: i64,
    pub pending_modules: i64,

    /// Completed share of the developer's modules, 0 when there are none
    #[sqlx(default)]
    pub completion_percentage: i32,

    /// `[{module_id, name, status, cost, currency, end_date, marked_complete_date}]`
    pub module_details: JsonValue,
}

/// Optional report filters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ReportFilter {
    pub developer_id: Option<i32>,
    pub project_id: Option<i32>,
}

/// Rounded percentage of `completed` out of `total`
pub fn completion_percentage(completed: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }

    ((completed as f64 / total as f64) * 100.0).round() as i32
}

impl ProjectProgressRow {
    /// Builds the report for projects created by `creator_id`
    pub async fn for_creator(
        pool: &PgPool,
        creator_id: i32,
        filter: ReportFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut rows = sqlx::query_as::<_, ProjectProgressRow>(
            r#"
            SELECT p.project_id, p.name AS project_name, p.status AS project_status, p.progress,
                   d.developer_id, d.first_name AS developer_first_name,
                   d.last_name AS developer_last_name,
                   COUNT(m.module_id) AS total_modules,
                   COUNT(m.module_id) FILTER (WHERE m.status = 'Complete') AS completed_modules,
                   COUNT(m.module_id) FILTER (WHERE m.status = 'Started') AS started_modules,
                   COUNT(m.module_id) FILTER (WHERE m.status = 'Pending') AS pending_modules,
                   COALESCE(
                       JSON_AGG(
                           JSON_BUILD_OBJECT(
                               'module_id', m.module_id,
                               'name', m.name,
                               'status', m.status,
                               'cost', m.cost,
                               'currency', m.currency,
                               'end_date', m.end_date,
                               'marked_complete_date', m.marked_complete_date
                           ) ORDER BY m.start_date, m.module_id
                       ) FILTER (WHERE m.module_id IS NOT NULL),
                       '[]'::json
                   ) AS module_details
            FROM project p
            JOIN developer d ON d.project_id = p.project_id
            LEFT JOIN module m ON m.project_id = p.project_id AND m.developer_id = d.developer_id
            WHERE p.created_by = $1
              AND ($2::INTEGER IS NULL OR d.developer_id = $2)
              AND ($3::INTEGER IS NULL OR p.project_id = $3)
            GROUP BY p.project_id, d.developer_id
            ORDER BY p.created_at DESC, d.last_name, d.first_name
            "#,
        )
        .bind(creator_id)
        .bind(filter.developer_id)
        .bind(filter.project_id)
        .fetch_all(pool)
        .await?;

        for row in &mut rows {
            row.completion_percentage = completion_percentage(row.completed_modules, row.total_modules);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(4, 4), 100);
    }
}
