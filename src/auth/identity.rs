use crate::auth::claims::ClaimSet;

/// An internal identity: who the validated caller is inside this system.
///
/// Constructed fresh per validated message; never cached or persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    /// Authority/role set; empty until a lookup-backed translator exists
    pub authorities: Vec<String>,
}

/// Outcome of authenticating one message's credential.
///
/// Attached to the envelope's credential header slot after the
/// authentication stage, replacing the raw token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationResult {
    Authenticated(Principal),
    Unauthenticated,
    Rejected(String),
}

impl AuthenticationResult {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            _ => None,
        }
    }
}

/// Maps a validated claim set to an internal principal.
///
/// Deliberately a trait: the current implementation only carries the
/// subject over, but a future translator may resolve the subject against a
/// user directory without touching the pipeline's state machine.
pub trait IdentityTranslator: Send + Sync {
    fn translate(&self, claims: &ClaimSet) -> Principal;
}

/// Subject-only translation with an empty authority set.
pub struct SubjectTranslator;

impl IdentityTranslator for SubjectTranslator {
    fn translate(&self, claims: &ClaimSet) -> Principal {
        Principal {
            username: claims.subject.clone(),
            authorities: Vec::new(),
        }
    }
}
