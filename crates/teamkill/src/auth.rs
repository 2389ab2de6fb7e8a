//! Authorization for privileged commands.

use std::collections::HashSet;

use crate::event::Actor;

/// Role names granted moderator powers when no explicit list is configured.
pub const DEFAULT_ADMIN_ROLES: &[&str] = &[
    "Admin",
    "Moderator",
    "admin",
    "moderator",
    "mod",
    "Mod",
    "TK Manager",
];

/// Decides whether an actor may run privileged commands.
///
/// An actor is authorized when they hold the platform administrator
/// permission, or when any of their role names is in the allow-list. Role
/// matching is exact and case-sensitive. The policy holds no per-actor state,
/// so every check reflects the roles carried by the current event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    admin_roles: HashSet<String>,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_ROLES.iter().copied())
    }
}

impl AuthorizationPolicy {
    pub fn new<I, S>(admin_roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admin_roles: admin_roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_authorized(&self, actor: &Actor) -> bool {
        actor.has_admin_permission
            || actor
                .roles
                .iter()
                .any(|role| self.admin_roles.contains(role.as_str()))
    }

    pub fn admin_roles(&self) -> impl Iterator<Item = &str> {
        self.admin_roles.iter().map(String::as_str)
    }
}
