use serde::{Deserialize, Serialize};

use crate::credential::AdmissionCredential;
use crate::crypto::{Nonce, Secret};
use crate::hints::HintSet;
use crate::ids::SpaceId;

/// Command issued by the invitee, in protocol order.
///
/// Every command after `Begin` carries the invitation secret, and the
/// greeter re-validates it each time.
#[derive(Debug)]
pub enum Command {
    Begin,
    Handshake {
        secret: Secret,
    },
    Notarize {
        secret: Secret,
        credentials: Vec<AdmissionCredential>,
    },
    Finish {
        secret: Option<Secret>,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Begin => CommandKind::Begin,
            Command::Handshake { .. } => CommandKind::Handshake,
            Command::Notarize { .. } => CommandKind::Notarize,
            Command::Finish { .. } => CommandKind::Finish,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    Begin,
    Handshake,
    Notarize,
    Finish,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CommandKind::Begin => "BEGIN",
            CommandKind::Handshake => "HANDSHAKE",
            CommandKind::Notarize => "NOTARIZE",
            CommandKind::Finish => "FINISH",
        };
        f.write_str(name)
    }
}

/// Successful reply to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Begun,
    Handshake { nonce: Nonce, space_id: SpaceId },
    Notarized { hints: HintSet },
    Finished,
}
