//! Self-signed admission credentials.
//!
//! The invitee asserts "admit these keys into this space", binds the
//! statement to the greeter's handshake nonce and signs it with the issuer
//! identity key. The greeter only ever verifies credentials; it never
//! mutates them.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use thiserror::Error;

use crate::crypto::Nonce;
use crate::ids::SpaceId;
use crate::keys::{verify_signature, AdmittedKey, PublicKey, Signer};

/// Domain separation tag prepended to every canonical encoding.
pub const ADMIT_DOMAIN_TAG: &[u8] = b"spacegreet/admit/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("admission credential admits no keys")]
    EmptyAdmittedKeys,
    #[error("admission credential signature mismatch")]
    SignatureMismatch,
    #[error("admission credential nonce mismatch")]
    NonceMismatch,
    #[error("admission credential targets a different space")]
    SpaceMismatch,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionCredential {
    pub target_space_id: SpaceId,
    pub issuer_identity_key: PublicKey,
    pub admitted_keys: Vec<AdmittedKey>,
    pub nonce: Nonce,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
}

impl AdmissionCredential {
    /// Build and sign a credential. The signer's public key becomes the issuer.
    pub fn build(
        target_space_id: SpaceId,
        admitted_keys: Vec<AdmittedKey>,
        nonce: Nonce,
        signer: &dyn Signer,
    ) -> Result<Self, CredentialError> {
        if admitted_keys.is_empty() {
            return Err(CredentialError::EmptyAdmittedKeys);
        }
        let issuer_identity_key = signer.public_key();
        let payload = canonical_encoding(
            &target_space_id,
            &issuer_identity_key,
            &admitted_keys,
            &nonce,
        );
        let signature = signer.sign(&payload);
        Ok(Self {
            target_space_id,
            issuer_identity_key,
            admitted_keys,
            nonce,
            signature,
        })
    }

    /// Canonical bytes covered by the signature.
    pub fn signed_payload(&self) -> Vec<u8> {
        canonical_encoding(
            &self.target_space_id,
            &self.issuer_identity_key,
            &self.admitted_keys,
            &self.nonce,
        )
    }

    /// Check the signature, then space and nonce binding.
    ///
    /// The signature is checked first so a tampered field always surfaces
    /// as [`CredentialError::SignatureMismatch`].
    pub fn verify(
        &self,
        expected_space_id: &SpaceId,
        expected_nonce: &Nonce,
    ) -> Result<(), CredentialError> {
        if self.admitted_keys.is_empty() {
            return Err(CredentialError::EmptyAdmittedKeys);
        }
        if !verify_signature(
            &self.issuer_identity_key,
            &self.signed_payload(),
            &self.signature,
        ) {
            return Err(CredentialError::SignatureMismatch);
        }
        if &self.target_space_id != expected_space_id {
            return Err(CredentialError::SpaceMismatch);
        }
        if &self.nonce != expected_nonce {
            return Err(CredentialError::NonceMismatch);
        }
        Ok(())
    }
}

fn canonical_encoding(
    space_id: &SpaceId,
    issuer: &PublicKey,
    admitted_keys: &[AdmittedKey],
    nonce: &Nonce,
) -> Vec<u8> {
    let mut payload = Vec::with_capacity(
        ADMIT_DOMAIN_TAG.len() + 4 * 4 + 32 * 3 + admitted_keys.len() * 33,
    );
    payload.extend_from_slice(ADMIT_DOMAIN_TAG);
    push_field(&mut payload, space_id.as_bytes());
    push_field(&mut payload, issuer.as_bytes());
    payload.extend_from_slice(&(admitted_keys.len() as u32).to_be_bytes());
    for key in admitted_keys {
        payload.push(key.kind.tag());
        payload.extend_from_slice(key.public_key.as_bytes());
    }
    push_field(&mut payload, nonce.as_bytes());
    payload
}

fn push_field(payload: &mut Vec<u8>, field: &[u8]) {
    payload.extend_from_slice(&(field.len() as u32).to_be_bytes());
    payload.extend_from_slice(field);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyKind, KeyPair};

    fn space() -> SpaceId {
        SpaceId::new(KeyPair::generate().public_key())
    }

    fn self_admit(space_id: SpaceId, nonce: Nonce) -> (KeyPair, AdmissionCredential) {
        let identity = KeyPair::generate();
        let credential = AdmissionCredential::build(
            space_id,
            vec![AdmittedKey::new(identity.public_key(), KeyKind::Identity)],
            nonce,
            &identity,
        )
        .expect("build credential");
        (identity, credential)
    }

    #[test]
    fn build_rejects_empty_key_list() {
        let identity = KeyPair::generate();
        let err = AdmissionCredential::build(space(), vec![], Nonce::generate(), &identity)
            .expect_err("empty keys");
        assert_eq!(err, CredentialError::EmptyAdmittedKeys);
    }

    #[test]
    fn verify_accepts_untouched_credential() {
        let space_id = space();
        let nonce = Nonce::generate();
        let (identity, credential) = self_admit(space_id, nonce);
        assert_eq!(credential.issuer_identity_key, identity.public_key());
        credential.verify(&space_id, &nonce).expect("valid");
    }

    #[test]
    fn verify_reports_nonce_mismatch() {
        let space_id = space();
        let (_, credential) = self_admit(space_id, Nonce::generate());
        assert_eq!(
            credential.verify(&space_id, &Nonce::generate()),
            Err(CredentialError::NonceMismatch)
        );
    }

    #[test]
    fn verify_reports_space_mismatch() {
        let nonce = Nonce::generate();
        let (_, credential) = self_admit(space(), nonce);
        assert_eq!(
            credential.verify(&space(), &nonce),
            Err(CredentialError::SpaceMismatch)
        );
    }

    #[test]
    fn tampered_admitted_key_breaks_signature() {
        let space_id = space();
        let nonce = Nonce::generate();
        let (_, mut credential) = self_admit(space_id, nonce);
        credential.admitted_keys[0].public_key = KeyPair::generate().public_key();
        assert_eq!(
            credential.verify(&space_id, &nonce),
            Err(CredentialError::SignatureMismatch)
        );
    }

    #[test]
    fn tampered_key_kind_breaks_signature() {
        let space_id = space();
        let nonce = Nonce::generate();
        let (_, mut credential) = self_admit(space_id, nonce);
        credential.admitted_keys[0].kind = KeyKind::Feed;
        assert_eq!(
            credential.verify(&space_id, &nonce),
            Err(CredentialError::SignatureMismatch)
        );
    }

    #[test]
    fn rebinding_nonce_is_a_signature_failure() {
        let space_id = space();
        let (_, mut credential) = self_admit(space_id, Nonce::generate());
        let replay_nonce = Nonce::generate();
        credential.nonce = replay_nonce;
        assert_eq!(
            credential.verify(&space_id, &replay_nonce),
            Err(CredentialError::SignatureMismatch)
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let space_id = space();
        let nonce = Nonce::generate();
        let (_, credential) = self_admit(space_id, nonce);
        assert_eq!(credential.signed_payload(), credential.clone().signed_payload());
        assert!(credential.signed_payload().starts_with(ADMIT_DOMAIN_TAG));
    }
}
