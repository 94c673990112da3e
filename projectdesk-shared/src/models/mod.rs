/// Database models for ProjectDesk
///
/// This module contains all database models and their queries.
///
/// # Models
///
/// - `user`: Registered users and the closed [`user::Role`] set
/// - `team_lead`: Team lead directory
/// - `developer`: Developer directory and project assignment
/// - `project`: Project proposals and the review workflow
/// - `module`: Deliverable modules and their lifecycle
/// - `finance`: Payment records opened when modules complete
/// - `report`: Aggregated progress reports for team leads
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use projectdesk_shared::models::project::{Project, ProjectStatus};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let pending = Project::list_with_creator(&pool, Some(ProjectStatus::Pending)).await?;
/// println!("{} proposals awaiting review", pending.len());
/// # Ok(())
/// # }
/// ```

pub mod developer;
pub mod finance;
pub mod module;
pub mod project;
pub mod report;
pub mod team_lead;
pub mod user;
