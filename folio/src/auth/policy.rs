//! Role and ownership policy checks.
//!
//! Pure predicates over the authenticated caller so they can be unit tested
//! without any HTTP machinery. Handlers call these and propagate the error.

use crate::{
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::UserId,
};

/// Require that the caller's role is in the allow-list
pub fn require_role(user: &CurrentUser, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(Error::Forbidden {
            message: "Insufficient permissions".to_string(),
        })
    }
}

/// Require admin or editor, the roles allowed to manage content
pub fn require_staff(user: &CurrentUser) -> Result<()> {
    require_role(user, &[Role::Admin, Role::Editor])
}

/// Whether the caller may modify or delete a content row authored by
/// `author_id`.
///
/// Admin and editor may modify anything; a viewer only rows they authored.
pub fn can_modify_content(user: &CurrentUser, author_id: UserId) -> bool {
    matches!(user.role, Role::Admin | Role::Editor) || user.id == author_id
}

/// Whether the caller sees unpublished rows and may filter on publication
pub fn can_view_unpublished(user: Option<&CurrentUser>) -> bool {
    matches!(user, Some(u) if matches!(u.role, Role::Admin | Role::Editor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            username: "user".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&user(Role::Admin), &[Role::Admin]).is_ok());
        assert!(require_role(&user(Role::Editor), &[Role::Admin, Role::Editor]).is_ok());

        let err = require_role(&user(Role::Viewer), &[Role::Admin]).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_require_staff() {
        assert!(require_staff(&user(Role::Admin)).is_ok());
        assert!(require_staff(&user(Role::Editor)).is_ok());
        assert!(require_staff(&user(Role::Viewer)).is_err());
    }

    #[test]
    fn test_can_modify_content_matrix() {
        let author_id = Uuid::new_v4();

        // Staff modify and delete regardless of authorship
        assert!(can_modify_content(&user(Role::Admin), author_id));
        assert!(can_modify_content(&user(Role::Editor), author_id));

        // Viewers only touch their own rows
        let viewer = user(Role::Viewer);
        assert!(!can_modify_content(&viewer, author_id));
        assert!(can_modify_content(&viewer, viewer.id));
    }

    #[test]
    fn test_can_view_unpublished() {
        assert!(can_view_unpublished(Some(&user(Role::Admin))));
        assert!(can_view_unpublished(Some(&user(Role::Editor))));
        assert!(!can_view_unpublished(Some(&user(Role::Viewer))));
        assert!(!can_view_unpublished(None));
    }
}
