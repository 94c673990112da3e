/// Project model and its status workflow
///
/// Projects are proposed by a CEO or Team Lead, one project per assigned
/// developer. The CEO then approves or rejects each proposal; a rejected
/// proposal can be appealed by the Team Lead who created it, which puts it
/// back into the review queue with the appeal appended to the review text.
///
/// # Status Workflow
///
/// ```text
///             review (CEO)
///   Pending ───────────────► Approved ──complete──► Completed
///      ▲    \
///      │     \ review (CEO, reason required)
///      │      ▼
///      └──── Rejected
///    appeal (creator)
/// ```
///
/// Every transition is a single guarded `UPDATE ... WHERE status = <expected>`
/// so two concurrent reviewers cannot both act on the same proposal.
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::models::project::{CreateProject, Project, ProjectStatus};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let created = Project::create_for_developers(&pool, CreateProject {
///     name: "Billing revamp".to_string(),
///     description: "Replace the invoicing flow".to_string(),
///     duration: "3 months".to_string(),
///     developer_ids: vec![4, 7],
///     created_by: 2,
/// }).await?;
///
/// let first = &created[0];
/// Project::review(&pool, first.project_id, ProjectStatus::Approved, "").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use std::fmt;

use super::developer::Developer;
use super::user::ParseEnumError;

/// Review state of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    /// Awaiting CEO review
    Pending,

    /// Accepted; modules can be delivered against it
    Approved,

    /// Turned down with a reason; the creator may appeal
    Rejected,

    /// Delivered
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Pending,
        ProjectStatus::Approved,
        ProjectStatus::Rejected,
        ProjectStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "Pending",
            ProjectStatus::Approved => "Approved",
            ProjectStatus::Rejected => "Rejected",
            ProjectStatus::Completed => "Completed",
        }
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: ProjectStatus) -> bool {
        matches!(
            (self, target),
            (ProjectStatus::Pending, ProjectStatus::Approved)
                | (ProjectStatus::Pending, ProjectStatus::Rejected)
                | (ProjectStatus::Rejected, ProjectStatus::Pending)
                | (ProjectStatus::Approved, ProjectStatus::Completed)
        )
    }

    /// Whether the proposal details may still be edited
    pub fn is_editable(&self) -> bool {
        matches!(self, ProjectStatus::Pending | ProjectStatus::Rejected)
    }

    /// Whether the status is a valid outcome of a CEO review
    pub fn is_review_decision(&self) -> bool {
        matches!(self, ProjectStatus::Approved | ProjectStatus::Rejected)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("project status", s))
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Errors from multi-step project operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// A developer named in the request does not exist
    #[error("Developer {0} not found")]
    DeveloperNotFound(i32),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub project_id: i32,
    pub name: String,
    pub description: String,
    pub duration: String,

    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,

    /// Rejection reason and appeal history
    pub review: String,

    /// Completion percentage (0-100)
    pub progress: i32,

    /// Registered user who proposed the project
    pub created_by: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project joined with the name of the user who proposed it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectWithCreator {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,

    pub creator_first_name: Option<String>,
    pub creator_last_name: Option<String>,
}

/// Approved project with the people delivering it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApprovedProject {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,

    /// Assigned developers, `"first last"` joined with `", "`
    pub developer_names: Option<String>,

    /// Their team leads, same format
    pub team_lead_names: Option<String>,
}

/// Counts by status for dashboards
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectStatusCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub completed: i64,
}

/// Input for proposing a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub duration: String,

    /// One project is created per developer
    pub developer_ids: Vec<i32>,

    pub created_by: i32,
}

/// Editable proposal fields; absent fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,

    /// Replaces the set of developers assigned to the project
    pub developer_ids: Option<Vec<i32>>,
}

/// Resubmission of a rejected proposal
#[derive(Debug, Clone)]
pub struct AppealProject {
    pub name: String,
    pub description: String,
    pub duration: Option<String>,
    pub response: Option<String>,
}

const PROJECT_COLUMNS: &str = "project_id, name, description, duration, status, review, progress, \
                               created_by, created_at, updated_at";

const PROJECT_WITH_CREATOR_SELECT: &str = r#"
    SELECT p.project_id, p.name, p.description, p.duration, p.status, p.review, p.progress,
           p.created_by, p.created_at, p.updated_at,
           u.first_name AS creator_first_name, u.last_name AS creator_last_name
    FROM project p
    LEFT JOIN reg_users u ON u.reg_id = p.created_by
"#;

/// Builds the review text stored after an appeal
///
/// The original review is kept so the CEO sees the full exchange.
pub fn appeal_review(original: &str, response: Option<&str>) -> String {
    let response = response
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("No additional response provided.");

    format!("ORIGINAL REVIEW: {original}\n\nAPPEAL RESPONSE: {response}")
}

impl Project {
    /// Creates one pending project per developer in a single transaction
    ///
    /// Each developer is locked, a project row is inserted and the developer
    /// is pointed at it. If any developer is missing the whole batch is rolled
    /// back.
    ///
    /// # Errors
    ///
    /// - `ProjectError::DeveloperNotFound` if a developer id does not exist
    /// - `ProjectError::Database` on any database failure
    pub async fn create_for_developers(
        pool: &PgPool,
        data: CreateProject,
    ) -> Result<Vec<Self>, ProjectError> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(data.developer_ids.len());

        for developer_id in &data.developer_ids {
            if Developer::find_for_update(&mut tx, *developer_id).await?.is_none() {
                // Dropping the transaction rolls back earlier inserts
                return Err(ProjectError::DeveloperNotFound(*developer_id));
            }

            let project = sqlx::query_as::<_, Project>(&format!(
                r#"
                INSERT INTO project (name, description, duration, status, review, progress, created_by)
                VALUES ($1, $2, $3, 'Pending', '', 0, $4)
                RETURNING {PROJECT_COLUMNS}
                "#
            ))
            .bind(&data.name)
            .bind(&data.description)
            .bind(&data.duration)
            .bind(data.created_by)
            .fetch_one(&mut *tx)
            .await?;

            Developer::assign_to_project(&mut tx, &[*developer_id], project.project_id).await?;
            created.push(project);
        }

        tx.commit().await?;

        Ok(created)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project WHERE project_id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_with_creator(
        pool: &PgPool,
        id: i32,
    ) -> Result<Option<ProjectWithCreator>, sqlx::Error> {
        sqlx::query_as::<_, ProjectWithCreator>(&format!(
            "{PROJECT_WITH_CREATOR_SELECT} WHERE p.project_id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists projects with creator names, newest first
    ///
    /// When `status` is given only projects in that status are returned.
    pub async fn list_with_creator(
        pool: &PgPool,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<ProjectWithCreator>, sqlx::Error> {
        sqlx::query_as::<_, ProjectWithCreator>(&format!(
            "{PROJECT_WITH_CREATOR_SELECT}
             WHERE ($1::VARCHAR IS NULL OR p.status = $1)
             ORDER BY p.created_at DESC, p.project_id DESC"
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await
    }

    /// Lists projects proposed by a user, newest first
    pub async fn list_by_creator(pool: &PgPool, creator_id: i32) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project
             WHERE created_by = $1
             ORDER BY created_at DESC, project_id DESC"
        ))
        .bind(creator_id)
        .fetch_all(pool)
        .await
    }

    /// Lists approved projects with assigned developers and their team leads
    pub async fn list_approved_with_team_leads(
        pool: &PgPool,
    ) -> Result<Vec<ApprovedProject>, sqlx::Error> {
        sqlx::query_as::<_, ApprovedProject>(
            r#"
            SELECT p.project_id, p.name, p.description, p.duration, p.status, p.review, p.progress,
                   p.created_by, p.created_at, p.updated_at,
                   STRING_AGG(DISTINCT d.first_name || ' ' || d.last_name, ', ') AS developer_names,
                   STRING_AGG(DISTINCT tl.first_name || ' ' || tl.last_name, ', ') AS team_lead_names
            FROM project p
            LEFT JOIN developer d ON d.project_id = p.project_id
            LEFT JOIN team_lead tl ON tl.team_lead_id = d.assigned_team_lead
            WHERE p.status = 'Approved'
            GROUP BY p.project_id
            ORDER BY p.project_id DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn status_counts(pool: &PgPool) -> Result<ProjectStatusCounts, sqlx::Error> {
        sqlx::query_as::<_, ProjectStatusCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'Pending') AS pending,
                   COUNT(*) FILTER (WHERE status = 'Approved') AS approved,
                   COUNT(*) FILTER (WHERE status = 'Rejected') AS rejected,
                   COUNT(*) FILTER (WHERE status = 'Completed') AS completed
            FROM project
            "#,
        )
        .fetch_one(pool)
        .await
    }

    /// Approved projects furthest along
    pub async fn top_by_progress(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project
             WHERE status = 'Approved'
             ORDER BY progress DESC, updated_at DESC
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Edits a proposal that has not been approved
    ///
    /// Returns `Ok(None)` when the project does not exist or is no longer
    /// editable. When `developer_ids` is present the assignment is replaced
    /// in the same transaction.
    pub async fn update_details(
        pool: &PgPool,
        id: i32,
        data: UpdateProject,
    ) -> Result<Option<Self>, ProjectError> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE project
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                duration = COALESCE($4, duration),
                updated_at = NOW()
            WHERE project_id = $1 AND status IN ('Pending', 'Rejected')
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.duration)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(project) = updated else {
            return Ok(None);
        };

        if let Some(developer_ids) = data.developer_ids {
            reassign_developers(&mut tx, project.project_id, &developer_ids).await?;
        }

        tx.commit().await?;

        Ok(Some(project))
    }

    /// Records a CEO decision on a pending proposal
    ///
    /// Returns `None` if the project is missing or was already reviewed.
    pub async fn review(
        pool: &PgPool,
        id: i32,
        decision: ProjectStatus,
        review: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE project
            SET status = $2, review = $3, updated_at = NOW()
            WHERE project_id = $1 AND status = 'Pending'
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(decision.as_str())
        .bind(review)
        .fetch_optional(pool)
        .await
    }

    /// Finds a rejected project proposed by the given user
    pub async fn find_rejected_for_creator(
        pool: &PgPool,
        id: i32,
        creator_id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project
             WHERE project_id = $1 AND created_by = $2 AND status = 'Rejected'"
        ))
        .bind(id)
        .bind(creator_id)
        .fetch_optional(pool)
        .await
    }

    /// Resubmits a rejected proposal for review
    ///
    /// Only the creator can appeal. The stored review becomes the original
    /// review followed by the appeal response (see [`appeal_review`]).
    /// Returns `None` if no rejected project by this creator matches.
    pub async fn appeal(
        pool: &PgPool,
        id: i32,
        creator_id: i32,
        data: AppealProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let original: Option<String> = sqlx::query_scalar(
            r#"
            SELECT review FROM project
            WHERE project_id = $1 AND created_by = $2 AND status = 'Rejected'
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(creator_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(original) = original else {
            return Ok(None);
        };

        let review = appeal_review(&original, data.response.as_deref());

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE project
            SET name = $2,
                description = $3,
                duration = COALESCE($4, duration),
                status = 'Pending',
                review = $5,
                updated_at = NOW()
            WHERE project_id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.duration)
        .bind(review)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(project))
    }

    /// Updates the progress of an approved project
    pub async fn set_progress(
        pool: &PgPool,
        id: i32,
        progress: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE project
            SET progress = $2, updated_at = NOW()
            WHERE project_id = $1 AND status = 'Approved'
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(progress)
        .fetch_optional(pool)
        .await
    }

    /// Marks an approved project as completed
    pub async fn complete(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE project
            SET status = 'Completed', progress = 100, updated_at = NOW()
            WHERE project_id = $1 AND status = 'Approved'
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a project; modules and their payments cascade
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project WHERE project_id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a project only if it was proposed by the given user
    pub async fn delete_owned(pool: &PgPool, id: i32, creator_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project WHERE project_id = $1 AND created_by = $2")
            .bind(id)
            .bind(creator_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn reassign_developers(
    tx: &mut Transaction<'_, Postgres>,
    project_id: i32,
    developer_ids: &[i32],
) -> Result<(), ProjectError> {
    for developer_id in developer_ids {
        if Developer::find_for_update(tx, *developer_id).await?.is_none() {
            return Err(ProjectError::DeveloperNotFound(*developer_id));
        }
    }

    Developer::release_from_project(tx, project_id).await?;
    Developer::assign_to_project(tx, developer_ids, project_id).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use ProjectStatus::*;

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Pending));
        assert!(Approved.can_transition_to(Completed));
    }

    #[test]
    fn test_transitions_are_one_directional_except_appeal() {
        use ProjectStatus::*;

        assert!(!Approved.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Completed.can_transition_to(Approved));
        assert!(!Pending.can_transition_to(Completed));
        for status in ProjectStatus::ALL {
            assert!(!Completed.can_transition_to(status));
        }
    }

    #[test]
    fn test_editable_statuses() {
        assert!(ProjectStatus::Pending.is_editable());
        assert!(ProjectStatus::Rejected.is_editable());
        assert!(!ProjectStatus::Approved.is_editable());
        assert!(!ProjectStatus::Completed.is_editable());
    }

    #[test]
    fn test_review_decisions() {
        assert!(ProjectStatus::Approved.is_review_decision());
        assert!(ProjectStatus::Rejected.is_review_decision());
        assert!(!ProjectStatus::Pending.is_review_decision());
        assert!(!ProjectStatus::Completed.is_review_decision());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Completed".parse::<ProjectStatus>().unwrap(), ProjectStatus::Completed);
        assert!("approved".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn test_appeal_review_keeps_original_and_response() {
        let review = appeal_review("Budget too high", Some("Cut scope to phase one"));
        assert_eq!(
            review,
            "ORIGINAL REVIEW: Budget too high\n\nAPPEAL RESPONSE: Cut scope to phase one"
        );
    }

    #[test]
    fn test_appeal_review_without_response() {
        let review = appeal_review("Unclear goals", None);
        assert!(review.starts_with("ORIGINAL REVIEW: Unclear goals"));
        assert!(review.ends_with("APPEAL RESPONSE: No additional response provided."));

        let blank = appeal_review("Unclear goals", Some("   "));
        assert_eq!(review, blank);
    }
}
