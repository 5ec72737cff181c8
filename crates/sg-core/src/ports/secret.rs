use crate::crypto::{HashedSecret, Secret};
use crate::ids::InvitationId;

/// Checks an invitee-supplied secret. Called on every privileged command;
/// results are never cached.
pub trait SecretValidatorPort: Send + Sync {
    fn validate(&self, invitation_id: &InvitationId, secret: &Secret) -> bool;
}

impl<F> SecretValidatorPort for F
where
    F: Fn(&InvitationId, &Secret) -> bool + Send + Sync,
{
    fn validate(&self, invitation_id: &InvitationId, secret: &Secret) -> bool {
        self(invitation_id, secret)
    }
}

impl SecretValidatorPort for HashedSecret {
    fn validate(&self, _invitation_id: &InvitationId, secret: &Secret) -> bool {
        match self.matches(secret) {
            Ok(matched) => matched,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %_err, "secret hash verification failed");
                false
            }
        }
    }
}

/// Inviter-side access to the secret, for displaying it in a local UI.
pub trait SecretProviderPort: Send + Sync {
    fn secret(&self) -> Option<Secret>;
}
