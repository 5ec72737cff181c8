//! # sg-platform
//!
//! Stream transport for greeter command envelopes.

pub mod adapters;

pub use adapters::command_stream::{
    ChannelError, ChannelPeer, CommandChannelService, StreamGreetingTransport,
};
