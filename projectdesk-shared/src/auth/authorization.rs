/// Role-based authorization
///
/// Every protected operation names a [`Permission`]; whether a [`Role`] holds
/// it is decided by one exhaustive match in [`Role::has_permission`]. Checks
/// that also depend on the resource (a team lead acting on a project they
/// proposed) layer [`require_project_steward`] on top.
///
/// # Capability Matrix
///
/// | Permission        | Admin | CEO | Team Lead | Developer | Finance |
/// |-------------------|:-----:|:---:|:---------:|:---------:|:-------:|
/// | ManageStaff       |   x   |     |           |           |         |
/// | ManageProjects    |       |  x  |     x     |           |         |
/// | ReviewProjects    |       |  x  |           |           |         |
/// | AppealProjects    |       |     |     x     |           |         |
/// | ViewTeamReports   |       |     |     x     |           |         |
/// | ManageModules     |       |     |           |     x     |         |
/// | ProcessPayments   |       |     |           |           |    x    |
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::auth::authorization::{require_permission, Permission};
/// use projectdesk_shared::auth::middleware::AuthContext;
///
/// fn review(auth: &AuthContext) -> Result<(), Box<dyn std::error::Error>> {
///     require_permission(auth, Permission::ReviewProjects)?;
///     Ok(())
/// }
/// ```

use super::middleware::AuthContext;
use crate::models::{project::Project, user::Role};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller's role lacks the permission
    #[error("{}", .permission.denial_message())]
    MissingPermission { permission: Permission, role: Role },

    /// Team lead acting on a project proposed by someone else
    #[error("Forbidden: Only the team lead who created this project can do that.")]
    NotProjectCreator,
}

/// Operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Register users, team leads and developers
    ManageStaff,

    /// Propose, edit, delete and steer projects
    ManageProjects,

    /// Approve or reject pending proposals
    ReviewProjects,

    /// Resubmit rejected proposals
    AppealProjects,

    /// Progress reports for proposed projects
    ViewTeamReports,

    /// Create and progress modules
    ManageModules,

    /// Settle finance records
    ProcessPayments,
}

impl Permission {
    /// Message returned to callers without the permission
    pub fn denial_message(&self) -> &'static str {
        match self {
            Permission::ManageStaff => "Forbidden: Access is restricted to Admins.",
            Permission::ManageProjects => "Forbidden: Only CEOs and Team Leads can manage projects.",
            Permission::ReviewProjects => "Forbidden: Only the CEO can review projects.",
            Permission::AppealProjects => "Forbidden: Only Team Leads can appeal projects.",
            Permission::ViewTeamReports => "Forbidden: Reports are restricted to Team Leads.",
            Permission::ManageModules => "Forbidden: Only Developers can manage modules.",
            Permission::ProcessPayments => "Forbidden: Access is restricted to Finance.",
        }
    }
}

impl Role {
    /// Whether this role holds a permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        use Permission::*;

        match self {
            Role::Admin => matches!(permission, ManageStaff),
            Role::Ceo => matches!(permission, ManageProjects | ReviewProjects),
            Role::TeamLead => matches!(permission, ManageProjects | AppealProjects | ViewTeamReports),
            Role::Developer => matches!(permission, ManageModules),
            Role::Finance => matches!(permission, ProcessPayments),
        }
    }
}

/// Checks that the caller's role holds a permission
///
/// # Errors
///
/// Returns `AuthzError::MissingPermission` otherwise
pub fn require_permission(auth: &AuthContext, permission: Permission) -> Result<(), AuthzError> {
    if !auth.role.has_permission(permission) {
        return Err(AuthzError::MissingPermission {
            permission,
            role: auth.role,
        });
    }

    Ok(())
}

/// Checks that the caller may steer a specific project
///
/// The CEO may act on any project; a team lead only on projects they
/// proposed. Every other role lacks `ManageProjects` outright.
pub fn require_project_steward(auth: &AuthContext, project: &Project) -> Result<(), AuthzError> {
    require_permission(auth, Permission::ManageProjects)?;

    match auth.role {
        Role::Ceo => Ok(()),
        Role::TeamLead if project.created_by == Some(auth.user_id) => Ok(()),
        _ => Err(AuthzError::NotProjectCreator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectStatus;
    use chrono::Utc;

    fn auth(user_id: i32, role: Role) -> AuthContext {
        AuthContext {
            user_id,
            email: format!("user{}@example.com", user_id),
            first_name: "first".to_string(),
            last_name: "last".to_string(),
            role,
        }
    }

    fn project_created_by(created_by: Option<i32>) -> Project {
        Project {
            project_id: 1,
            name: "Portal".to_string(),
            description: "Customer portal".to_string(),
            duration: "3 months".to_string(),
            status: ProjectStatus::Approved,
            review: String::new(),
            progress: 40,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_each_permission_has_exactly_the_expected_roles() {
        let expected = [
            (Permission::ManageStaff, vec![Role::Admin]),
            (Permission::ManageProjects, vec![Role::Ceo, Role::TeamLead]),
            (Permission::ReviewProjects, vec![Role::Ceo]),
            (Permission::AppealProjects, vec![Role::TeamLead]),
            (Permission::ViewTeamReports, vec![Role::TeamLead]),
            (Permission::ManageModules, vec![Role::Developer]),
            (Permission::ProcessPayments, vec![Role::Finance]),
        ];

        for (permission, holders) in expected {
            for role in Role::ALL {
                assert_eq!(
                    role.has_permission(permission),
                    holders.contains(&role),
                    "{:?} / {}",
                    permission,
                    role
                );
            }
        }
    }

    #[test]
    fn test_require_permission_denial_message() {
        let err = require_permission(&auth(1, Role::TeamLead), Permission::ReviewProjects).unwrap_err();
        assert_eq!(err.to_string(), "Forbidden: Only the CEO can review projects.");

        assert!(require_permission(&auth(1, Role::Ceo), Permission::ReviewProjects).is_ok());
    }

    #[test]
    fn test_require_project_steward() {
        let project = project_created_by(Some(7));

        assert!(require_project_steward(&auth(1, Role::Ceo), &project).is_ok());
        assert!(require_project_steward(&auth(7, Role::TeamLead), &project).is_ok());
        assert!(matches!(
            require_project_steward(&auth(8, Role::TeamLead), &project),
            Err(AuthzError::NotProjectCreator)
        ));
        assert!(matches!(
            require_project_steward(&auth(7, Role::Developer), &project),
            Err(AuthzError::MissingPermission { .. })
        ));
    }

    #[test]
    fn test_orphaned_project_is_ceo_only() {
        let project = project_created_by(None);

        assert!(require_project_steward(&auth(1, Role::Ceo), &project).is_ok());
        assert!(require_project_steward(&auth(1, Role::TeamLead), &project).is_err());
    }
}
