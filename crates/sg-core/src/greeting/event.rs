use serde::{Deserialize, Serialize};

use super::state::CancelReason;
use crate::credential::AdmissionCredential;
use crate::crypto::Nonce;
use crate::hints::HintSet;

/// Facts fed into the greeter state machine. Secrets and credentials have
/// already been checked by the session by the time an event exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GreeterEvent {
    BeginReceived,

    // Secret accepted. The candidate is only used if no nonce exists yet.
    HandshakeAuthorized { candidate_nonce: Nonce },

    // Secret accepted and every credential verified
    NotarizeAuthorized { credentials: Vec<AdmissionCredential> },

    FinishAuthorized,

    AuthRejected,
    CredentialsRejected,

    // Notarization callback outcomes
    WriteCommitted { hints: HintSet },
    WriteFailed,
    WriteTimedOut,

    Cancelled { reason: CancelReason },
}
