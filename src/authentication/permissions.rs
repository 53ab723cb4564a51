use crate::{
    error::ApiError,
    jwt::SessionData,
    schema::{UserRole, Uuid},
};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
            ActionType::ManageIngredients,
            ActionType::ManageTags,
        ],
    ),
];

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,

    ManageAllRecipes,
    ManageIngredients,
    ManageTags,
}

impl ActionType {
    pub fn authenticate(&self, session: &SessionData) -> bool {
        let role = &session.role;

        ACTION_TABLE
            .iter()
            .find_map(|(r, actions)| {
                if role != r {
                    return None;
                }

                Some(actions.contains(self))
            })
            .unwrap_or(false)
    }
}

/// Read vs write, replacing method-name dispatch at the web layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Write,
}

/// Reads always pass; writes require an admin session.
pub fn admin_or_read_only(
    kind: RequestKind,
    session: Option<&SessionData>,
) -> Result<(), ApiError> {
    if kind == RequestKind::Read {
        return Ok(());
    }

    match session {
        Some(session) if session.is_admin => Ok(()),
        Some(_) => Err(ApiError::Unauthorized(String::from(
            "You don't have permission to perform this action",
        ))),
        None => Err(ApiError::InvalidSession(String::from("Not authenticated"))),
    }
}

/// Reads always pass; writes require an authenticated session belonging to
/// the entity's author, or an admin.
pub fn author_or_read_only(
    kind: RequestKind,
    session: Option<&SessionData>,
    author_id: Uuid,
) -> Result<(), ApiError> {
    if kind == RequestKind::Read {
        return Ok(());
    }

    match session {
        Some(session) => {
            if session.is_admin || session.user_id == author_id {
                Ok(())
            } else {
                Err(ApiError::Unauthorized(String::from(
                    "You don't have permission to perform this action",
                )))
            }
        }
        None => Err(ApiError::InvalidSession(String::from("Not authenticated"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user_id: i32, role: UserRole) -> SessionData {
        SessionData {
            user_id,
            email: String::from("jane@example.com"),
            username: String::from("jdoe"),
            is_admin: role == UserRole::Admin,
            role,
        }
    }

    #[test]
    fn reads_are_always_permitted() {
        assert!(admin_or_read_only(RequestKind::Read, None).is_ok());
        assert!(author_or_read_only(RequestKind::Read, None, 1).is_ok());
    }

    #[test]
    fn writes_require_admin() {
        let user = session(1, UserRole::User);
        let admin = session(2, UserRole::Admin);

        assert!(admin_or_read_only(RequestKind::Write, Some(&admin)).is_ok());
        assert!(admin_or_read_only(RequestKind::Write, Some(&user)).is_err());
        assert!(admin_or_read_only(RequestKind::Write, None).is_err());
    }

    #[test]
    fn writes_require_authorship() {
        let author = session(1, UserRole::User);
        let other = session(2, UserRole::User);
        let admin = session(3, UserRole::Admin);

        assert!(author_or_read_only(RequestKind::Write, Some(&author), 1).is_ok());
        assert!(author_or_read_only(RequestKind::Write, Some(&admin), 1).is_ok());
        assert!(author_or_read_only(RequestKind::Write, Some(&other), 1).is_err());
        assert!(author_or_read_only(RequestKind::Write, None, 1).is_err());
    }

    #[test]
    fn action_table_covers_roles() {
        let user = session(1, UserRole::User);
        let admin = session(2, UserRole::Admin);

        assert!(ActionType::ManageOwnRecipes.authenticate(&user));
        assert!(ActionType::ManageOwnCart.authenticate(&user));
        assert!(!ActionType::ManageAllRecipes.authenticate(&user));
        assert!(!ActionType::ManageTags.authenticate(&user));

        assert!(ActionType::ManageAllRecipes.authenticate(&admin));
        assert!(ActionType::ManageIngredients.authenticate(&admin));
        assert!(ActionType::ManageTags.authenticate(&admin));
    }
}
