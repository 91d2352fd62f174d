use thiserror::Error;

use crate::auth::identity::AuthenticationResult;

/// Authorization policy applied to every inbound message.
///
/// Extensible to role/scope-based policies without changing the pipeline:
/// the gate consumes the attached AuthenticationResult either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    RequireAuthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("message is not authenticated")]
    NotAuthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Decides whether an authenticated (or not) message may proceed.
pub struct AuthorizationGate {
    policy: Policy,
}

impl AuthorizationGate {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn authorize(&self, result: &AuthenticationResult) -> Decision {
        match self.policy {
            Policy::RequireAuthenticated => match result {
                AuthenticationResult::Authenticated(_) => Decision::Allow,
                _ => Decision::Deny(DenyReason::NotAuthenticated),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::Principal;

    fn gate() -> AuthorizationGate {
        AuthorizationGate::new(Policy::RequireAuthenticated)
    }

    #[test]
    fn authenticated_is_allowed() {
        let result = AuthenticationResult::Authenticated(Principal {
            username: "alice".into(),
            authorities: Vec::new(),
        });
        assert_eq!(gate().authorize(&result), Decision::Allow);
    }

    #[test]
    fn unauthenticated_is_denied() {
        assert_eq!(
            gate().authorize(&AuthenticationResult::Unauthenticated),
            Decision::Deny(DenyReason::NotAuthenticated)
        );
    }

    #[test]
    fn rejected_is_denied() {
        assert_eq!(
            gate().authorize(&AuthenticationResult::Rejected("expired".into())),
            Decision::Deny(DenyReason::NotAuthenticated)
        );
    }
}
