//! Invitations: the per-attempt bundle of space, secret strategy, hints
//! provider and notarization callback.

use std::sync::Arc;
use std::time::Duration;

use anyhow::ensure;
use chrono::{DateTime, Utc};

use sg_core::config::MAX_PIN_DIGITS;
use sg_core::crypto::{HashedSecret, Secret, SecretHashParams};
use sg_core::ids::{InvitationId, SpaceId};
use sg_core::ports::{
    HintsProviderPort, NotarizationPort, SecretProviderPort, SecretValidatorPort,
};

/// Inputs for [`InvitationRegistry::create_invitation`](super::InvitationRegistry::create_invitation).
pub struct NewInvitation {
    pub space_id: SpaceId,
    pub secret_validator: Arc<dyn SecretValidatorPort>,
    pub secret_provider: Option<Arc<dyn SecretProviderPort>>,
    pub hints_provider: Arc<dyn HintsProviderPort>,
    pub notarizer: Arc<dyn NotarizationPort>,
}

impl NewInvitation {
    /// Invitation gated by a freshly generated numeric PIN. The PIN is only
    /// kept for [`SecretProviderPort`]; validation uses its argon2id hash.
    pub fn with_pin(
        space_id: SpaceId,
        hints_provider: Arc<dyn HintsProviderPort>,
        notarizer: Arc<dyn NotarizationPort>,
        digits: usize,
        params: SecretHashParams,
    ) -> anyhow::Result<Self> {
        let pin = PinSecretProvider::generate(digits, params)?;
        Ok(Self {
            space_id,
            secret_validator: Arc::new(pin.validator()),
            secret_provider: Some(Arc::new(pin)),
            hints_provider,
            notarizer,
        })
    }
}

/// Shareable, non-secret rendezvous data for the invitee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationDescriptor {
    pub invitation_id: InvitationId,
    pub space_id: SpaceId,
    pub expires_at: DateTime<Utc>,
}

pub struct Invitation {
    pub id: InvitationId,
    pub space_id: SpaceId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    secret_validator: Arc<dyn SecretValidatorPort>,
    secret_provider: Option<Arc<dyn SecretProviderPort>>,
    pub(crate) hints_provider: Arc<dyn HintsProviderPort>,
    pub(crate) notarizer: Arc<dyn NotarizationPort>,
}

impl Invitation {
    pub(crate) fn new(new: NewInvitation, now: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            id: InvitationId::new(),
            space_id: new.space_id,
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            secret_validator: new.secret_validator,
            secret_provider: new.secret_provider,
            hints_provider: new.hints_provider,
            notarizer: new.notarizer,
        }
    }

    pub fn descriptor(&self) -> InvitationDescriptor {
        InvitationDescriptor {
            invitation_id: self.id.clone(),
            space_id: self.space_id,
            expires_at: self.expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn validate_secret(&self, secret: &Secret) -> bool {
        self.secret_validator.validate(&self.id, secret)
    }

    pub fn secret(&self) -> Option<Secret> {
        self.secret_provider.as_ref().and_then(|provider| provider.secret())
    }
}

/// Holds a generated PIN for local display.
pub struct PinSecretProvider {
    pin: Secret,
    hashed: HashedSecret,
}

impl PinSecretProvider {
    pub fn generate(digits: usize, params: SecretHashParams) -> anyhow::Result<Self> {
        ensure!(
            (1..=MAX_PIN_DIGITS).contains(&digits),
            "PIN length must be between 1 and {MAX_PIN_DIGITS}, got {digits}"
        );
        let pin = Secret::generate_pin(digits);
        let hashed = HashedSecret::hash(&pin, params)?;
        Ok(Self { pin, hashed })
    }

    pub fn validator(&self) -> HashedSecret {
        self.hashed.clone()
    }
}

impl SecretProviderPort for PinSecretProvider {
    fn secret(&self) -> Option<Secret> {
        Some(Secret::new(self.pin.expose().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> SecretHashParams {
        SecretHashParams {
            memory_kib: 64,
            iterations: 1,
            lanes: 1,
        }
    }

    #[test]
    fn pin_provider_validates_its_own_pin() {
        let provider = PinSecretProvider::generate(4, cheap()).expect("pin");
        let validator = provider.validator();
        let id = InvitationId::new();
        let pin = provider.secret().expect("secret");
        assert_eq!(pin.expose().len(), 4);
        assert!(validator.validate(&id, &pin));
        assert!(!validator.validate(&id, &Secret::from("not-a-pin")));
    }

    #[test]
    fn pin_provider_refuses_empty_or_oversized_pins() {
        assert!(PinSecretProvider::generate(0, cheap()).is_err());
        assert!(PinSecretProvider::generate(MAX_PIN_DIGITS + 1, cheap()).is_err());
    }
}
