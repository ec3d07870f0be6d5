//! Role-based access gate.
//!
//! Every protected route declares the roles it accepts. An empty declaration
//! means "any authenticated caller". The gate itself knows nothing about
//! tokens: callers pass `None` when nobody is authenticated, and rejecting
//! that case as 401 is the job of the authentication layer in front of it.

use crate::types::Role;

/// Role sets declared by routes.
pub mod policy {
    use crate::types::Role;

    /// Any authenticated caller.
    pub const AUTHENTICATED: &[Role] = &[];
    /// Distributors and admins.
    pub const MANAGERS: &[Role] = &[Role::Distributor, Role::Admin];
    /// Admins only.
    pub const ADMINS: &[Role] = &[Role::Admin];
    /// Team members only.
    pub const TEAM_MEMBERS: &[Role] = &[Role::TeamMember];
    /// Every role, listed explicitly.
    pub const EVERY_ROLE: &[Role] = &[Role::TeamMember, Role::Distributor, Role::Admin];
}

/// The fixed denial signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Forbidden: You do not have the required role to access this resource.")]
pub struct AccessDenied;

/// Whether a caller with role `caller` may use a route declaring `allowed`.
#[must_use]
pub fn is_allowed(allowed: &[Role], caller: Option<Role>) -> bool {
    caller.is_some_and(|role| allowed.is_empty() || allowed.contains(&role))
}

/// [`is_allowed`] as a `Result`, for use with `?`.
///
/// # Errors
///
/// Returns [`AccessDenied`] when the caller is absent or its role is not
/// among `allowed`.
pub fn authorize(allowed: &[Role], caller: Option<Role>) -> Result<(), AccessDenied> {
    if is_allowed(allowed, caller) {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// All 8 subsets of the three roles.
    fn role_sets() -> Vec<Vec<Role>> {
        (0_u8..8)
            .map(|mask| {
                Role::ALL
                    .into_iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .map(|(_, role)| role)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_gate_matches_definition_for_every_role_set() {
        for allowed in role_sets() {
            assert!(!is_allowed(&allowed, None), "anonymous allowed by {allowed:?}");

            for role in Role::ALL {
                let expected = allowed.is_empty() || allowed.contains(&role);
                assert_eq!(
                    is_allowed(&allowed, Some(role)),
                    expected,
                    "role {role:?} against {allowed:?}"
                );
                assert_eq!(authorize(&allowed, Some(role)).is_ok(), expected);
            }
        }
    }

    #[test]
    fn test_policies() {
        assert!(is_allowed(policy::AUTHENTICATED, Some(Role::TeamMember)));
        assert!(is_allowed(policy::MANAGERS, Some(Role::Distributor)));
        assert!(!is_allowed(policy::MANAGERS, Some(Role::TeamMember)));
        assert!(!is_allowed(policy::ADMINS, Some(Role::Distributor)));
        assert!(!is_allowed(policy::TEAM_MEMBERS, Some(Role::Admin)));
        for role in Role::ALL {
            assert!(is_allowed(policy::EVERY_ROLE, Some(role)));
        }
    }

    #[test]
    fn test_denial_message() {
        assert_eq!(
            authorize(policy::ADMINS, Some(Role::TeamMember))
                .unwrap_err()
                .to_string(),
            "Forbidden: You do not have the required role to access this resource."
        );
    }
}
