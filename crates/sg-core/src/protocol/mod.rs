//! Wire envelopes for the greeting command channel.

mod envelope;

pub use envelope::{CommandEnvelope, ResponseEnvelope, WireCommand, WireError};
