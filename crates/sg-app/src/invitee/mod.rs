//! Invitee side of the greeting.

mod driver;
mod registry_transport;

pub use driver::{Admission, GreetingTransport, InviteeDriver, InviteeError};
pub use registry_transport::RegistryTransport;
