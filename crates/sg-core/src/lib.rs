//! # sg-core
//!
//! Core domain models and the greeter state machine for space admission.
//!
//! This crate contains pure protocol logic without any runtime or transport
//! dependencies.

pub mod config;
pub mod credential;
pub mod crypto;
pub mod envelope;
pub mod greeting;
pub mod hints;
pub mod ids;
pub mod keys;
pub mod ports;
pub mod protocol;

// Re-export commonly used types at the crate root
pub use config::{ChannelConfig, GreeterConfig};
pub use credential::{AdmissionCredential, CredentialError};
pub use crypto::{HashedSecret, Nonce, Secret, SecretHashParams};
pub use envelope::{EnvelopeError, GreeterEnvelope};
pub use greeting::{
    CancelReason, Command, CommandKind, GreeterState, GreetingError, Response,
};
pub use hints::{HintSet, KeyHint};
pub use ids::{InvitationId, SpaceId};
pub use keys::{AdmittedKey, KeyKind, KeyPair, PublicKey, Signer};
