//! # sg-app
//!
//! Greeter sessions, the invitation registry and the invitee driver.
//! Transport adapters live in `sg-platform`.

pub mod greeter;
pub mod invitee;

pub use greeter::{
    serve_envelope, ChannelObserver, EnvelopeNotarizer, GreeterNotification, GreeterSession,
    InMemoryControlLog, Invitation, InvitationDescriptor, InvitationRegistry, NewInvitation,
    NoopObserver, PinSecretProvider,
};
pub use invitee::{Admission, GreetingTransport, InviteeDriver, InviteeError, RegistryTransport};
