/// Team lead directory
///
/// Team leads are maintained by Admins and referenced by developers through
/// `developer.assigned_team_lead`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamLead {
    pub team_lead_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a team lead
#[derive(Debug, Clone)]
pub struct CreateTeamLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct UpdateTeamLead {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl TeamLead {
    pub async fn create(pool: &PgPool, data: CreateTeamLead) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TeamLead>(
            r#"
            INSERT INTO team_lead (first_name, last_name, email)
            VALUES ($1, $2, $3)
            RETURNING team_lead_id, first_name, last_name, email, created_at
            "#,
        )
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamLead>(
            r#"
            SELECT team_lead_id, first_name, last_name, email, created_at
            FROM team_lead
            WHERE team_lead_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update
    ///
    /// Returns `None` if the team lead does not exist.
    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: UpdateTeamLead,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamLead>(
            r#"
            UPDATE team_lead
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email)
            WHERE team_lead_id = $1
            RETURNING team_lead_id, first_name, last_name, email, created_at
            "#,
        )
        .bind(id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .fetch_optional(pool)
        .await
    }

    /// Lists team leads ordered by last then first name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamLead>(
            r#"
            SELECT team_lead_id, first_name, last_name, email, created_at
            FROM team_lead
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
