//! Command stream transport.
//!
//! Serves greeter command envelopes over any duplex byte stream using
//! length-prefixed JSON frames, and provides the invitee-side client.

pub mod client;
pub mod framing;
pub mod service;

pub use client::StreamGreetingTransport;
pub use service::{ChannelError, ChannelPeer, CommandChannelService};
