use anyhow::{anyhow, Context};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use sg_app::GreetingTransport;
use sg_core::protocol::{CommandEnvelope, ResponseEnvelope};

use super::framing::{read_frame, write_frame, MAX_COMMAND_FRAME_BYTES};

/// Invitee-side transport: one frame out, one frame back.
pub struct StreamGreetingTransport<S> {
    stream: S,
    max_frame_bytes: usize,
}

impl<S> StreamGreetingTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self::with_max_frame_bytes(stream, MAX_COMMAND_FRAME_BYTES)
    }

    pub fn with_max_frame_bytes(stream: S, max_frame_bytes: usize) -> Self {
        Self {
            stream,
            max_frame_bytes,
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> GreetingTransport for StreamGreetingTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn exchange(&mut self, envelope: CommandEnvelope) -> anyhow::Result<ResponseEnvelope> {
        let payload = serde_json::to_vec(&envelope).context("failed to encode command envelope")?;
        write_frame(&mut self.stream, &payload, self.max_frame_bytes)
            .await
            .context("failed to send command frame")?;
        let reply = read_frame(&mut self.stream, self.max_frame_bytes)
            .await
            .context("failed to read response frame")?
            .ok_or_else(|| anyhow!("greeter closed the stream"))?;
        serde_json::from_slice(&reply).context("failed to decode response envelope")
    }
}
