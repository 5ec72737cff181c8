//! Notarization adapters.
//!
//! [`EnvelopeNotarizer`] countersigns verified credentials with the
//! greeter's key and appends the envelope to a control log.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use sg_core::credential::AdmissionCredential;
use sg_core::envelope::GreeterEnvelope;
use sg_core::ids::SpaceId;
use sg_core::keys::Signer;
use sg_core::ports::{ControlLogPort, NotarizationPort};

pub struct EnvelopeNotarizer {
    greeter: Arc<dyn Signer>,
    log: Arc<dyn ControlLogPort>,
}

impl EnvelopeNotarizer {
    pub fn new(greeter: Arc<dyn Signer>, log: Arc<dyn ControlLogPort>) -> Self {
        Self { greeter, log }
    }
}

#[async_trait]
impl NotarizationPort for EnvelopeNotarizer {
    async fn write(
        &self,
        space_id: &SpaceId,
        credentials: &[AdmissionCredential],
    ) -> anyhow::Result<()> {
        let envelope = GreeterEnvelope::seal(*space_id, credentials.to_vec(), self.greeter.as_ref())
            .context("failed to seal greeter envelope")?;
        debug!(
            space_id = %space_id,
            greeter_key = %envelope.greeter_key,
            credentials = envelope.credentials.len(),
            "appending greeter envelope"
        );
        self.log
            .append(envelope)
            .await
            .context("failed to append greeter envelope")
    }
}

/// Control log kept in memory. Rejects envelopes that do not verify.
#[derive(Default)]
pub struct InMemoryControlLog {
    entries: Mutex<Vec<GreeterEnvelope>>,
}

impl InMemoryControlLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<GreeterEnvelope> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl ControlLogPort for InMemoryControlLog {
    async fn append(&self, envelope: GreeterEnvelope) -> anyhow::Result<()> {
        envelope.verify().context("control log rejected envelope")?;
        self.entries.lock().await.push(envelope);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::crypto::Nonce;
    use sg_core::keys::{AdmittedKey, KeyKind, KeyPair};

    #[tokio::test]
    async fn write_appends_verified_envelope() {
        let greeter = Arc::new(KeyPair::generate());
        let greeter_key = greeter.public_key();
        let log = Arc::new(InMemoryControlLog::new());
        let notarizer = EnvelopeNotarizer::new(greeter, log.clone());

        let space_id = SpaceId::new(KeyPair::generate().public_key());
        let identity = KeyPair::generate();
        let credential = AdmissionCredential::build(
            space_id,
            vec![AdmittedKey::new(identity.public_key(), KeyKind::Identity)],
            Nonce::generate(),
            &identity,
        )
        .expect("credential");

        notarizer
            .write(&space_id, &[credential.clone()])
            .await
            .expect("write");

        let entries = log.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].greeter_key, greeter_key);
        assert_eq!(entries[0].credentials, vec![credential]);
    }

    #[tokio::test]
    async fn write_without_credentials_fails() {
        let log = Arc::new(InMemoryControlLog::new());
        let notarizer = EnvelopeNotarizer::new(Arc::new(KeyPair::generate()), log.clone());
        let space_id = SpaceId::new(KeyPair::generate().public_key());

        assert!(notarizer.write(&space_id, &[]).await.is_err());
        assert!(log.entries().await.is_empty());
    }
}
