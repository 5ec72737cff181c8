use crate::credential::AdmissionCredential;
use crate::envelope::GreeterEnvelope;
use crate::ids::SpaceId;

/// Durable-write boundary. Appends verified credentials to the space's
/// authoritative control log; may be slow and may be remote.
#[async_trait::async_trait]
pub trait NotarizationPort: Send + Sync {
    async fn write(
        &self,
        space_id: &SpaceId,
        credentials: &[AdmissionCredential],
    ) -> anyhow::Result<()>;
}

/// The space's append-only control log.
#[async_trait::async_trait]
pub trait ControlLogPort: Send + Sync {
    async fn append(&self, envelope: GreeterEnvelope) -> anyhow::Result<()>;
}
