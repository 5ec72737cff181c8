use super::error::GreetingError;
use super::state::CancelReason;
use crate::credential::AdmissionCredential;
use crate::crypto::Nonce;
use crate::hints::HintSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GreeterAction {
    // Replies
    Acknowledge,
    IssueHandshake { nonce: Nonce },
    ReleaseHints { hints: HintSet },
    Reject { error: GreetingError },

    // Durable write (executed by the session, which feeds the outcome back)
    Notarize { credentials: Vec<AdmissionCredential> },

    // Observer hooks
    NotifyBegun,
    NotifyNotarized { credentials: Vec<AdmissionCredential> },
    NotifyFailed { reason: GreetingError },
    NotifyCancelled { reason: CancelReason },
    NotifyFinished,

    // housekeeping
    Release,
}
