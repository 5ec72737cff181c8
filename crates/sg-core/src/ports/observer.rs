use crate::credential::AdmissionCredential;
use crate::greeting::{CancelReason, GreetingError};
use crate::ids::InvitationId;

/// Narrow notification interface for UIs and storage layers.
///
/// Called inline from the session; implementations must not block.
/// Presence and failure notifications are advisory and may be dropped under
/// load; `on_notarized` is the only record of an admission outside the
/// control log and must not be.
pub trait GreeterObserverPort: Send + Sync {
    /// Invitee showed up (BEGIN).
    fn on_begun(&self, invitation_id: &InvitationId);

    /// Credentials were written; carries the admitted set. Delivery must
    /// survive a lagging consumer.
    fn on_notarized(&self, invitation_id: &InvitationId, credentials: &[AdmissionCredential]);

    fn on_failed(&self, invitation_id: &InvitationId, reason: GreetingError);

    fn on_cancelled(&self, _invitation_id: &InvitationId, _reason: CancelReason) {}

    fn on_finished(&self, _invitation_id: &InvitationId) {}
}
