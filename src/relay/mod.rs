// The relay itself: envelopes, the secure inbound pipeline, the terminal
// dispatcher and the outbound publisher.

pub mod dispatch;
pub mod pipeline;
pub mod publisher;
pub mod types;

pub use dispatch::{DispatchError, LoggingDispatcher, MessageDispatcher};
pub use pipeline::{PipelineOutcome, RejectReason, SecureInboundPipeline};
pub use publisher::OutboundPublisher;
pub use types::{HeaderValue, MessageEnvelope, WireEnvelope};
