/// Role-based authorization checks
///
/// Roles form no hierarchy; routes name the exact roles they accept, the way
/// the route table declares `authorize('admin', 'manager')`.

use crate::auth::middleware::CurrentUser;
use crate::models::user::Role;

/// Error type for authorization failures
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The caller's role is not in the allowed set
    #[error("User role '{role}' is not authorized to access this route")]
    InsufficientRole {
        /// The caller's role
        role: String,
    },

    /// The caller may only operate on their own resource
    #[error("Not authorized to access this resource")]
    NotOwner,
}

/// Ensures the caller holds one of the allowed roles
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::auth::{authorization::require_role, middleware::CurrentUser};
/// use taskhive_shared::models::user::Role;
///
/// # fn example(user: &CurrentUser) -> Result<(), Box<dyn std::error::Error>> {
/// require_role(user, &[Role::Admin, Role::Manager])?;
/// # Ok(())
/// # }
/// ```
pub fn require_role(user: &CurrentUser, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            role: user.role.as_str().to_string(),
        })
    }
}

/// Ensures the caller is the named user or holds the admin role
pub fn require_self_or_admin(user: &CurrentUser, target: uuid::Uuid) -> Result<(), AuthzError> {
    if user.id == target || user.role == Role::Admin {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user_with_role(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "test".to_string(),
            email: "test@example.com".to_string(),
            full_name: "Test User".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_role_allows_listed_roles() {
        let manager = user_with_role(Role::Manager);
        assert!(require_role(&manager, &[Role::Admin, Role::Manager]).is_ok());
    }

    #[test]
    fn test_require_role_rejects_unlisted_roles() {
        let user = user_with_role(Role::User);
        let err = require_role(&user, &[Role::Admin, Role::Manager]).unwrap_err();
        assert!(err.to_string().contains("'user'"));
    }

    #[test]
    fn test_require_self_or_admin() {
        let user = user_with_role(Role::User);
        assert!(require_self_or_admin(&user, user.id).is_ok());
        assert!(require_self_or_admin(&user, Uuid::new_v4()).is_err());

        let admin = user_with_role(Role::Admin);
        assert!(require_self_or_admin(&admin, Uuid::new_v4()).is_ok());
    }
}
