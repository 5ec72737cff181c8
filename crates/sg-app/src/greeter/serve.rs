use sg_core::greeting::GreetingError;
use sg_core::ids::InvitationId;
use sg_core::protocol::{CommandEnvelope, ResponseEnvelope};

use super::registry::InvitationRegistry;

/// Answer one wire envelope. The envelope's own invitation id wins over
/// `bound`, the id a rendezvous connection was opened for.
pub async fn serve_envelope(
    registry: &InvitationRegistry,
    envelope: CommandEnvelope,
    bound: Option<&InvitationId>,
) -> (Option<InvitationId>, ResponseEnvelope) {
    let invitation_id = envelope.invitation_id.or_else(|| bound.cloned());
    let result = match (&invitation_id, envelope.command.into_command()) {
        (_, Err(err)) => Err(err),
        (None, Ok(_)) => Err(GreetingError::NotFound),
        (Some(id), Ok(command)) => registry.dispatch(id, command).await,
    };
    (invitation_id, ResponseEnvelope::from_result(&result))
}
