//! spacegreet
//!
//! Greeter side of the space admission protocol: an invitee proves it
//! knows an invitation secret, submits self-signed admission credentials
//! bound to a greeter nonce, and receives bootstrap hints once the
//! credentials are durably notarized.

pub mod bootstrap;

pub use bootstrap::{init_tracing_subscriber, load_config, GreeterNode};
pub use sg_app::{
    Admission, InvitationDescriptor, InvitationRegistry, InviteeDriver, InviteeError,
    NewInvitation,
};
pub use sg_core::{
    AdmissionCredential, Command, GreeterConfig, GreetingError, HintSet, InvitationId, KeyPair,
    Response, Secret, SpaceId,
};
pub use sg_platform::{ChannelPeer, CommandChannelService, StreamGreetingTransport};
