/// Developer directory and project assignment
///
/// A developer belongs to one team lead and works on at most one project at a
/// time (`developer.project_id`). Assignment is rewritten whenever a project's
/// developer list changes; deleting a project clears it through the foreign
/// key (`ON DELETE SET NULL`).
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::models::developer::Developer;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let me = Developer::find_by_email(&pool, "dev@example.com").await?;
/// if let Some(dev) = me {
///     println!("{} works on {:?}", dev.email, dev.project_id);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Developer {
    pub developer_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub expertise: String,
    pub department: String,

    /// Team lead the developer reports to
    pub assigned_team_lead: Option<i32>,

    /// Project the developer currently works on
    pub project_id: Option<i32>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a developer
#[derive(Debug, Clone)]
pub struct CreateDeveloper {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub expertise: String,
    pub department: String,
    pub team_lead_id: i32,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct UpdateDeveloper {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub expertise: Option<String>,
    pub department: Option<String>,
    pub team_lead_id: Option<i32>,
}

impl Developer {
    /// Creates a developer under a team lead
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation when the team lead does not exist
    /// and a unique violation when the email is taken.
    pub async fn create(pool: &PgPool, data: CreateDeveloper) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Developer>(
            r#"
            INSERT INTO developer (first_name, last_name, email, expertise, department, assigned_team_lead)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING developer_id, first_name, last_name, email, expertise, department,
                      assigned_team_lead, project_id, created_at
            "#,
        )
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.expertise)
        .bind(data.department)
        .bind(data.team_lead_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Developer>(
            r#"
            SELECT developer_id, first_name, last_name, email, expertise, department,
                   assigned_team_lead, project_id, created_at
            FROM developer
            WHERE developer_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the developer profile linked to a login email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Developer>(
            r#"
            SELECT developer_id, first_name, last_name, email, expertise, department,
                   assigned_team_lead, project_id, created_at
            FROM developer
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: UpdateDeveloper,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Developer>(
            r#"
            UPDATE developer
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                expertise = COALESCE($5, expertise),
                department = COALESCE($6, department),
                assigned_team_lead = COALESCE($7, assigned_team_lead)
            WHERE developer_id = $1
            RETURNING developer_id, first_name, last_name, email, expertise, department,
                      assigned_team_lead, project_id, created_at
            "#,
        )
        .bind(id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.expertise)
        .bind(data.department)
        .bind(data.team_lead_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists developers ordered by last then first name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Developer>(
            r#"
            SELECT developer_id, first_name, last_name, email, expertise, department,
                   assigned_team_lead, project_id, created_at
            FROM developer
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Developers currently assigned to projects created by a user
    pub async fn list_on_projects_created_by(
        pool: &PgPool,
        creator_id: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Developer>(
            r#"
            SELECT d.developer_id, d.first_name, d.last_name, d.email, d.expertise, d.department,
                   d.assigned_team_lead, d.project_id, d.created_at
            FROM developer d
            JOIN project p ON p.project_id = d.project_id
            WHERE p.created_by = $1
            ORDER BY d.last_name, d.first_name
            "#,
        )
        .bind(creator_id)
        .fetch_all(pool)
        .await
    }

    /// Locks a developer row inside a transaction
    pub async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Developer>(
            r#"
            SELECT developer_id, first_name, last_name, email, expertise, department,
                   assigned_team_lead, project_id, created_at
            FROM developer
            WHERE developer_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Points developers at a project
    pub async fn assign_to_project(
        tx: &mut Transaction<'_, Postgres>,
        developer_ids: &[i32],
        project_id: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE developer SET project_id = $2 WHERE developer_id = ANY($1)",
        )
        .bind(developer_ids)
        .bind(project_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// Clears every assignment to a project
    pub async fn release_from_project(
        tx: &mut Transaction<'_, Postgres>,
        project_id: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE developer SET project_id = NULL WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }
}
