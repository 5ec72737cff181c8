//! Invitee driver: walks BEGIN, HANDSHAKE, NOTARIZE and FINISH against a
//! greeter over any [`GreetingTransport`].

use async_trait::async_trait;
use tracing::{debug, info_span, warn, Instrument};

use sg_core::credential::{AdmissionCredential, CredentialError};
use sg_core::crypto::{Nonce, Secret};
use sg_core::greeting::{Command, CommandKind, GreetingError, Response};
use sg_core::hints::HintSet;
use sg_core::ids::{InvitationId, SpaceId};
use sg_core::keys::{AdmittedKey, Signer};
use sg_core::protocol::{CommandEnvelope, ResponseEnvelope};

use crate::greeter::InvitationDescriptor;

/// One request/response exchange with a greeter.
#[async_trait]
pub trait GreetingTransport: Send {
    async fn exchange(&mut self, envelope: CommandEnvelope) -> anyhow::Result<ResponseEnvelope>;
}

#[derive(Debug, thiserror::Error)]
pub enum InviteeError {
    #[error("greeter rejected {command}: {error}")]
    Rejected {
        command: CommandKind,
        error: GreetingError,
    },
    #[error("greeter answered {command} with an unexpected response")]
    UnexpectedResponse { command: CommandKind },
    #[error("greeter handshake named space {actual}, expected {expected}")]
    SpaceMismatch { expected: SpaceId, actual: SpaceId },
    #[error("failed to build admission credential: {0}")]
    Credential(#[from] CredentialError),
    #[error("greeting transport failed: {0}")]
    Transport(#[from] anyhow::Error),
}

impl InviteeError {
    /// The greeter's error code, when the failure came from the greeter.
    pub fn greeting_error(&self) -> Option<GreetingError> {
        match self {
            InviteeError::Rejected { error, .. } => Some(*error),
            _ => None,
        }
    }
}

/// Result of a completed greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub space_id: SpaceId,
    pub nonce: Nonce,
    pub hints: HintSet,
    pub credentials: Vec<AdmissionCredential>,
}

pub struct InviteeDriver<T> {
    transport: T,
    invitation_id: Option<InvitationId>,
    expected_space: Option<SpaceId>,
}

impl<T: GreetingTransport> InviteeDriver<T> {
    /// `invitation_id` may be `None` on a connection already bound to an
    /// invitation.
    pub fn new(transport: T, invitation_id: Option<InvitationId>) -> Self {
        Self {
            transport,
            invitation_id,
            expected_space: None,
        }
    }

    /// Driver that also insists the handshake names the descriptor's space.
    pub fn for_descriptor(transport: T, descriptor: &InvitationDescriptor) -> Self {
        Self {
            transport,
            invitation_id: Some(descriptor.invitation_id.clone()),
            expected_space: Some(descriptor.space_id),
        }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send one command and decode the reply.
    pub async fn send(&mut self, command: Command) -> Result<Response, InviteeError> {
        let kind = command.kind();
        let envelope = CommandEnvelope::new(self.invitation_id.clone(), &command);
        let reply = self.transport.exchange(envelope).await?;
        reply
            .into_response(kind)
            .map_err(|error| InviteeError::Rejected {
                command: kind,
                error,
            })
    }

    /// Run a full greeting: admit `admitted_keys` under `identity`.
    ///
    /// After a failure past BEGIN a FINISH is still attempted so the
    /// greeter releases the invitation, failed or not; its outcome is
    /// ignored.
    pub async fn greet(
        &mut self,
        secret: &Secret,
        identity: &dyn Signer,
        admitted_keys: Vec<AdmittedKey>,
    ) -> Result<Admission, InviteeError> {
        let span = info_span!(
            "usecase.invitee_driver.greet",
            invitation_id = ?self.invitation_id,
            identity = %identity.public_key(),
        );
        async {
            match self.send(Command::Begin).await? {
                Response::Begun => {}
                _ => {
                    return Err(InviteeError::UnexpectedResponse {
                        command: CommandKind::Begin,
                    })
                }
            }

            let result = self.admit(secret, identity, admitted_keys).await;
            if let Err(err) = &result {
                warn!(error = %err, "greeting failed, sending best-effort FINISH");
                let finish = Command::Finish {
                    secret: Some(copy_secret(secret)),
                };
                if let Err(finish_err) = self.send(finish).await {
                    debug!(error = %finish_err, "best-effort FINISH failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn admit(
        &mut self,
        secret: &Secret,
        identity: &dyn Signer,
        admitted_keys: Vec<AdmittedKey>,
    ) -> Result<Admission, InviteeError> {
        let handshake = Command::Handshake {
            secret: copy_secret(secret),
        };
        let (nonce, space_id) = match self.send(handshake).await? {
            Response::Handshake { nonce, space_id } => (nonce, space_id),
            _ => {
                return Err(InviteeError::UnexpectedResponse {
                    command: CommandKind::Handshake,
                })
            }
        };
        if let Some(expected) = self.expected_space {
            if expected != space_id {
                return Err(InviteeError::SpaceMismatch {
                    expected,
                    actual: space_id,
                });
            }
        }

        let credential = AdmissionCredential::build(space_id, admitted_keys, nonce, identity)?;
        let credentials = vec![credential];
        let notarize = Command::Notarize {
            secret: copy_secret(secret),
            credentials: credentials.clone(),
        };
        let hints = match self.send(notarize).await? {
            Response::Notarized { hints } => hints,
            _ => {
                return Err(InviteeError::UnexpectedResponse {
                    command: CommandKind::Notarize,
                })
            }
        };

        let finish = Command::Finish {
            secret: Some(copy_secret(secret)),
        };
        match self.send(finish).await? {
            Response::Finished => {}
            _ => {
                return Err(InviteeError::UnexpectedResponse {
                    command: CommandKind::Finish,
                })
            }
        }

        Ok(Admission {
            space_id,
            nonce,
            hints,
            credentials,
        })
    }
}

fn copy_secret(secret: &Secret) -> Secret {
    Secret::new(secret.expose().to_vec())
}
