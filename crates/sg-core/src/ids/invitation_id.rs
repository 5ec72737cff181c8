use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Opaque invitation identifier.
///
/// Doubles as the invitee's rendezvous address, so it is handed out in the
/// invitation descriptor. Ids are random and never reused once an
/// invitation completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvitationId(String);

impl_id!(InvitationId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = InvitationId::new();
        let b = InvitationId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = InvitationId::from("invite-1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"invite-1\"");
    }
}
