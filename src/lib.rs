// ============================================================================
// Relay Gateway - Secured Message Relay
// ============================================================================
//
// A producer obtains a short-lived access token via client-credentials
// exchange, stamps it on an outbound message and publishes it onto a durable
// queue. The gateway consumes those messages and runs each one through a
// secure inbound pipeline:
//
//   validate token -> translate identity -> authorize -> dispatch
//
// No message reaches business logic without a successful Authenticated +
// Allow outcome. Rejected and denied messages are dropped and audited; one
// bad message never halts processing of the next.
//
// ============================================================================

pub mod audit;
pub mod auth;
pub mod broker;
pub mod config;
pub mod error;
pub mod relay;
pub mod utils;

pub use config::Config;
pub use error::{AppError, AppResult};
