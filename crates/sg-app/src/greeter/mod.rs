//! Inviter side: invitations, sessions and the registry that routes
//! commands to them.

mod invitation;
mod notarizer;
mod observer;
mod registry;
mod serve;
mod session;

pub use invitation::{Invitation, InvitationDescriptor, NewInvitation, PinSecretProvider};
pub use notarizer::{EnvelopeNotarizer, InMemoryControlLog};
pub use observer::{ChannelObserver, GreeterNotification, NoopObserver};
pub use registry::InvitationRegistry;
pub use serve::serve_envelope;
pub use session::GreeterSession;
