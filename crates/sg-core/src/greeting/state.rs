use serde::{Deserialize, Serialize};

use crate::credential::AdmissionCredential;
use crate::crypto::Nonce;
use crate::hints::HintSet;

use super::error::GreetingError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GreeterState {
    // Invitation created, invitee not yet seen
    Created,

    // BEGIN received
    Begun,

    // Secret checked, nonce issued
    Handshaken {
        nonce: Nonce,
    },

    // Credentials verified, waiting on the notarization write
    Notarizing {
        nonce: Nonce,
        credentials: Vec<AdmissionCredential>,
    },

    // Write committed, hints released
    Notarized {
        nonce: Nonce,
        credentials: Vec<AdmissionCredential>,
        hints: HintSet,
    },

    Finished,

    Failed {
        reason: GreetingError,
    },

    Cancelled {
        reason: CancelReason,
    },
}

impl GreeterState {
    pub fn nonce(&self) -> Option<&Nonce> {
        match self {
            GreeterState::Handshaken { nonce }
            | GreeterState::Notarizing { nonce, .. }
            | GreeterState::Notarized { nonce, .. } => Some(nonce),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GreeterState::Finished | GreeterState::Failed { .. } | GreeterState::Cancelled { .. }
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    ByInviter,
    Expired,
    ConnectionClosed,
}
