// Authentication and authorization for the relay pipeline.
//
// Leaf-first: claims (verified token contents), keys (issuer key material),
// validator (signature + claims checks), identity (claims -> principal),
// gate (principal -> allow/deny), token_client (producer-side fetch).

pub mod claims;
pub mod gate;
pub mod identity;
pub mod keys;
pub mod token_client;
pub mod validator;

pub use claims::ClaimSet;
pub use gate::{AuthorizationGate, Decision, DenyReason, Policy};
pub use identity::{AuthenticationResult, IdentityTranslator, Principal, SubjectTranslator};
pub use keys::{KeySource, RemoteKeySet, StaticKeySource};
pub use token_client::{AuthServerError, TokenClient};
pub use validator::{TokenValidator, ValidationError};
