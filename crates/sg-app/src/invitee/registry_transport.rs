use std::sync::Arc;

use async_trait::async_trait;

use sg_core::protocol::{CommandEnvelope, ResponseEnvelope};

use super::driver::GreetingTransport;
use crate::greeter::{serve_envelope, InvitationRegistry};

/// In-process transport straight into a registry. Envelopes still go
/// through wire validation.
pub struct RegistryTransport {
    registry: Arc<InvitationRegistry>,
}

impl RegistryTransport {
    pub fn new(registry: Arc<InvitationRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl GreetingTransport for RegistryTransport {
    async fn exchange(&mut self, envelope: CommandEnvelope) -> anyhow::Result<ResponseEnvelope> {
        let (_, response) = serve_envelope(&self.registry, envelope, None).await;
        Ok(response)
    }
}
