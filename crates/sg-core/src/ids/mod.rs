//! ID type wrappers for type safety.

mod id_macro;
pub mod invitation_id;
pub mod space_id;

pub use invitation_id::InvitationId;
pub use space_id::SpaceId;
