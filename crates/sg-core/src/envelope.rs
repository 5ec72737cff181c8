//! Greeter envelope: the inviter's countersignature over a set of
//! self-signed admission credentials, as written to the space control log.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use thiserror::Error;

use crate::credential::{AdmissionCredential, CredentialError};
use crate::ids::SpaceId;
use crate::keys::{verify_signature, PublicKey, Signer};

pub const ENVELOPE_DOMAIN_TAG: &[u8] = b"spacegreet/envelope/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("envelope carries no credentials")]
    Empty,
    #[error("greeter signature mismatch")]
    GreeterSignature,
    #[error("credential {index} invalid: {source}")]
    Credential {
        index: usize,
        #[source]
        source: CredentialError,
    },
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreeterEnvelope {
    pub space_id: SpaceId,
    pub greeter_key: PublicKey,
    pub credentials: Vec<AdmissionCredential>,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
}

impl GreeterEnvelope {
    /// Countersign already verified credentials with the greeter's key.
    pub fn seal(
        space_id: SpaceId,
        credentials: Vec<AdmissionCredential>,
        signer: &dyn Signer,
    ) -> Result<Self, EnvelopeError> {
        if credentials.is_empty() {
            return Err(EnvelopeError::Empty);
        }
        let greeter_key = signer.public_key();
        let signature = signer.sign(&envelope_payload(&space_id, &greeter_key, &credentials));
        Ok(Self {
            space_id,
            greeter_key,
            credentials,
            signature,
        })
    }

    /// Verify the greeter signature and every inner credential's own
    /// signature and space binding. Nonces are not checked here: once
    /// notarized, the handshake nonce is history.
    pub fn verify(&self) -> Result<(), EnvelopeError> {
        if self.credentials.is_empty() {
            return Err(EnvelopeError::Empty);
        }
        let payload = envelope_payload(&self.space_id, &self.greeter_key, &self.credentials);
        if !verify_signature(&self.greeter_key, &payload, &self.signature) {
            return Err(EnvelopeError::GreeterSignature);
        }
        for (index, credential) in self.credentials.iter().enumerate() {
            credential
                .verify(&self.space_id, &credential.nonce)
                .map_err(|source| EnvelopeError::Credential { index, source })?;
        }
        Ok(())
    }
}

fn envelope_payload(
    space_id: &SpaceId,
    greeter_key: &PublicKey,
    credentials: &[AdmissionCredential],
) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(ENVELOPE_DOMAIN_TAG);
    payload.extend_from_slice(space_id.as_bytes());
    payload.extend_from_slice(greeter_key.as_bytes());
    payload.extend_from_slice(&(credentials.len() as u32).to_be_bytes());
    for credential in credentials {
        let signed = credential.signed_payload();
        payload.extend_from_slice(&(signed.len() as u32).to_be_bytes());
        payload.extend_from_slice(&signed);
        payload.extend_from_slice(&(credential.signature.len() as u32).to_be_bytes());
        payload.extend_from_slice(&credential.signature);
    }
    payload
}
