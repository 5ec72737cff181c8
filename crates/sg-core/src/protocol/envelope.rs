use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::credential::AdmissionCredential;
use crate::crypto::{Nonce, Secret};
use crate::greeting::error::{error_kind_from_code, error_kind_to_code};
use crate::greeting::{Command, CommandKind, GreetingError, Response};
use crate::hints::HintSet;
use crate::ids::{InvitationId, SpaceId};

/// Inbound frame. `invitation_id` may be omitted when the connection is
/// already bound to a rendezvous invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<InvitationId>,
    pub command: WireCommand,
}

impl CommandEnvelope {
    pub fn new(invitation_id: Option<InvitationId>, command: &Command) -> Self {
        Self {
            invitation_id,
            command: WireCommand::from_command(command),
        }
    }
}

#[serde_as]
#[derive(Clone, Serialize, Deserialize)]
pub struct WireCommand {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Vec<AdmissionCredential>>,
}

impl std::fmt::Debug for WireCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireCommand")
            .field("kind", &self.kind)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("credentials", &self.credentials.as_ref().map(Vec::len))
            .finish()
    }
}

impl WireCommand {
    pub fn from_command(command: &Command) -> Self {
        match command {
            Command::Begin => Self {
                kind: CommandKind::Begin,
                secret: None,
                credentials: None,
            },
            Command::Handshake { secret } => Self {
                kind: CommandKind::Handshake,
                secret: Some(secret.to_wire()),
                credentials: None,
            },
            Command::Notarize {
                secret,
                credentials,
            } => Self {
                kind: CommandKind::Notarize,
                secret: Some(secret.to_wire()),
                credentials: Some(credentials.clone()),
            },
            Command::Finish { secret } => Self {
                kind: CommandKind::Finish,
                secret: secret.as_ref().map(Secret::to_wire),
                credentials: None,
            },
        }
    }

    /// Validate field presence and move the secret into a [`Secret`].
    pub fn into_command(self) -> Result<Command, GreetingError> {
        let secret = self.secret.map(Secret::new);
        match self.kind {
            CommandKind::Begin => Ok(Command::Begin),
            CommandKind::Handshake => Ok(Command::Handshake {
                secret: secret.ok_or(GreetingError::Malformed)?,
            }),
            CommandKind::Notarize => {
                let secret = secret.ok_or(GreetingError::Malformed)?;
                match self.credentials {
                    Some(credentials) if !credentials.is_empty() => Ok(Command::Notarize {
                        secret,
                        credentials,
                    }),
                    _ => Err(GreetingError::Malformed),
                }
            }
            CommandKind::Finish => Ok(Command::Finish { secret }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub kind: String,
    pub message: String,
}

/// Outbound frame. Field presence depends on the command answered; an
/// acknowledgement (BEGIN / FINISH) carries no fields at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Nonce>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<SpaceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<HintSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl ResponseEnvelope {
    pub fn from_result(result: &Result<Response, GreetingError>) -> Self {
        match result {
            Ok(Response::Begun) | Ok(Response::Finished) => Self::default(),
            Ok(Response::Handshake { nonce, space_id }) => Self {
                nonce: Some(*nonce),
                space_id: Some(*space_id),
                ..Self::default()
            },
            Ok(Response::Notarized { hints }) => Self {
                hints: Some(hints.clone()),
                ..Self::default()
            },
            Err(error) => Self::error(*error),
        }
    }

    pub fn error(error: GreetingError) -> Self {
        Self {
            error: Some(WireError {
                kind: error_kind_to_code(&error).to_string(),
                message: error.to_string(),
            }),
            ..Self::default()
        }
    }

    /// Interpret the envelope as the reply to a command of `kind`.
    ///
    /// Unknown error codes and missing fields decode as
    /// [`GreetingError::Malformed`].
    pub fn into_response(self, kind: CommandKind) -> Result<Response, GreetingError> {
        if let Some(error) = self.error {
            return Err(error_kind_from_code(&error.kind).unwrap_or(GreetingError::Malformed));
        }
        match kind {
            CommandKind::Begin => Ok(Response::Begun),
            CommandKind::Handshake => match (self.nonce, self.space_id) {
                (Some(nonce), Some(space_id)) => Ok(Response::Handshake { nonce, space_id }),
                _ => Err(GreetingError::Malformed),
            },
            CommandKind::Notarize => self
                .hints
                .map(|hints| Response::Notarized { hints })
                .ok_or(GreetingError::Malformed),
            CommandKind::Finish => Ok(Response::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyKind, KeyPair};
    use crate::hints::KeyHint;

    #[test]
    fn handshake_command_wire_shape() {
        let envelope = CommandEnvelope::new(
            Some(InvitationId::from("inv-1")),
            &Command::Handshake {
                secret: Secret::from("0000"),
            },
        );
        let json = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(json["invitation_id"], "inv-1");
        assert_eq!(json["command"]["type"], "HANDSHAKE");
        assert_eq!(json["command"]["secret"], "30303030");
        assert!(json["command"].get("credentials").is_none());
    }

    #[test]
    fn begin_without_invitation_id_decodes() {
        let envelope: CommandEnvelope =
            serde_json::from_str(r#"{"command":{"type":"BEGIN"}}"#).expect("decode");
        assert!(envelope.invitation_id.is_none());
        assert!(matches!(
            envelope.command.into_command(),
            Ok(Command::Begin)
        ));
    }

    #[test]
    fn handshake_without_secret_is_malformed() {
        let envelope: CommandEnvelope =
            serde_json::from_str(r#"{"command":{"type":"HANDSHAKE"}}"#).expect("decode");
        assert_eq!(
            envelope.command.into_command().map(|c| c.kind()),
            Err(GreetingError::Malformed)
        );
    }

    #[test]
    fn notarize_with_empty_credentials_is_malformed() {
        let envelope: CommandEnvelope = serde_json::from_str(
            r#"{"command":{"type":"NOTARIZE","secret":"30","credentials":[]}}"#,
        )
        .expect("decode");
        assert_eq!(
            envelope.command.into_command().map(|c| c.kind()),
            Err(GreetingError::Malformed)
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let wire = WireCommand::from_command(&Command::Handshake {
            secret: Secret::from("0000"),
        });
        assert!(!format!("{wire:?}").contains("30303030"));
    }

    #[test]
    fn error_response_carries_coarse_kind() {
        let envelope = ResponseEnvelope::from_result(&Err(GreetingError::InvalidCredential));
        let error = envelope.error.clone().expect("error");
        assert_eq!(error.kind, "invalid_credential");
        assert_eq!(error.message, "invalid admission credential");
        assert_eq!(
            envelope.into_response(CommandKind::Notarize),
            Err(GreetingError::InvalidCredential)
        );
    }

    #[test]
    fn notarized_response_returns_hints() {
        let hints = HintSet::new(vec![KeyHint::new(
            KeyPair::generate().public_key(),
            KeyKind::Identity,
        )]);
        let envelope = ResponseEnvelope::from_result(&Ok(Response::Notarized {
            hints: hints.clone(),
        }));
        let json = serde_json::to_string(&envelope).expect("serialize");
        let decoded: ResponseEnvelope = serde_json::from_str(&json).expect("decode");
        assert_eq!(
            decoded.into_response(CommandKind::Notarize),
            Ok(Response::Notarized { hints })
        );
    }

    #[test]
    fn unknown_error_code_is_malformed() {
        let envelope: ResponseEnvelope =
            serde_json::from_str(r#"{"error":{"kind":"teapot","message":"x"}}"#).expect("decode");
        assert_eq!(
            envelope.into_response(CommandKind::Begin),
            Err(GreetingError::Malformed)
        );
    }
}
