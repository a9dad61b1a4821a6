//! Route guards consuming session snapshots. Pure decision functions: the
//! embedding shell performs the actual navigation.

use super::identity::Role;
use super::manager::SessionSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session still being determined; render a neutral placeholder.
    Loading,
    Allow,
    /// Carries the originally requested location for a post-login bounce-back.
    RedirectToLogin { from: String },
    RedirectToHome,
}

/// Authenticated-only guard. Token presence gates access; a pending identity
/// fetch is not waited on.
pub fn guard_route(snapshot: &SessionSnapshot, requested: &str) -> GuardOutcome {
    if snapshot.loading {
        return GuardOutcome::Loading;
    }
    if snapshot.is_authenticated() {
        GuardOutcome::Allow
    } else {
        GuardOutcome::RedirectToLogin { from: requested.to_string() }
    }
}

/// Elevated-role guard: only the highest tier passes. Absent identity is a
/// denial, never a pending-allow.
pub fn guard_admin_route(snapshot: &SessionSnapshot) -> GuardOutcome {
    if snapshot.loading {
        return GuardOutcome::Loading;
    }
    match &snapshot.identity {
        Some(id) if snapshot.is_authenticated() && id.role == Role::SuperAdmin => {
            GuardOutcome::Allow
        }
        _ => GuardOutcome::RedirectToHome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::identity::Identity;
    use crate::session::manager::SessionStatus;

    fn snap(status: SessionStatus, identity: Option<Identity>, loading: bool) -> SessionSnapshot {
        SessionSnapshot { status, identity, loading }
    }

    fn admin() -> Identity {
        Identity {
            id: 1,
            name: "Ana".into(),
            email: "ana@firm.example".into(),
            role: Role::SuperAdmin,
        }
    }

    fn member() -> Identity {
        Identity {
            id: 2,
            name: "Bruno".into(),
            email: "bruno@firm.example".into(),
            role: Role::Member,
        }
    }

    #[test]
    fn loading_renders_placeholder() {
        let s = snap(SessionStatus::Pending, None, true);
        assert_eq!(guard_route(&s, "/processos"), GuardOutcome::Loading);
        assert_eq!(guard_admin_route(&s), GuardOutcome::Loading);
    }

    #[test]
    fn unauthenticated_redirects_with_requested_location() {
        let s = snap(SessionStatus::Unauthenticated, None, false);
        assert_eq!(
            guard_route(&s, "/processos/42"),
            GuardOutcome::RedirectToLogin { from: "/processos/42".into() }
        );
    }

    #[test]
    fn pending_identity_does_not_block_plain_guard() {
        let s = snap(SessionStatus::Pending, None, false);
        assert_eq!(guard_route(&s, "/clientes"), GuardOutcome::Allow);
    }

    #[test]
    fn expired_session_is_denied() {
        let s = snap(SessionStatus::Expired, Some(admin()), false);
        assert_eq!(
            guard_route(&s, "/painel"),
            GuardOutcome::RedirectToLogin { from: "/painel".into() }
        );
        assert_eq!(guard_admin_route(&s), GuardOutcome::RedirectToHome);
    }

    #[test]
    fn admin_guard_denies_absent_identity_even_with_valid_token() {
        let s = snap(SessionStatus::Pending, None, false);
        assert_eq!(guard_admin_route(&s), GuardOutcome::RedirectToHome);
    }

    #[test]
    fn admin_guard_denies_lower_tiers() {
        let s = snap(SessionStatus::Authenticated, Some(member()), false);
        assert_eq!(guard_admin_route(&s), GuardOutcome::RedirectToHome);
        let tenant = Identity { role: Role::TenantAdmin, ..member() };
        let s = snap(SessionStatus::Authenticated, Some(tenant), false);
        assert_eq!(guard_admin_route(&s), GuardOutcome::RedirectToHome);
    }

    #[test]
    fn admin_guard_allows_super_admin() {
        let s = snap(SessionStatus::Authenticated, Some(admin()), false);
        assert_eq!(guard_admin_route(&s), GuardOutcome::Allow);
    }
}
