//! Greeter node wiring.
//!
//! Owns the invitation registry, the expiry sweeper and the command
//! channel, and notarizes admissions into a control log with the greeter's
//! own key.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::info;

use sg_app::{EnvelopeNotarizer, InvitationDescriptor, InvitationRegistry, NewInvitation};
use sg_core::config::GreeterConfig;
use sg_core::crypto::Secret;
use sg_core::greeting::CancelReason;
use sg_core::ids::{InvitationId, SpaceId};
use sg_core::keys::Signer;
use sg_core::ports::{ControlLogPort, GreeterObserverPort, HintsProviderPort, NotarizationPort};
use sg_platform::{ChannelError, ChannelPeer, CommandChannelService};

pub struct GreeterNode {
    config: GreeterConfig,
    registry: Arc<InvitationRegistry>,
    channel: CommandChannelService,
    notarizer: Arc<dyn NotarizationPort>,
    sweeper: JoinHandle<()>,
}

impl GreeterNode {
    /// Wire a node and start its expiry sweeper. Must be called inside a
    /// tokio runtime.
    pub fn start(
        config: GreeterConfig,
        greeter: Arc<dyn Signer>,
        control_log: Arc<dyn ControlLogPort>,
        observer: Arc<dyn GreeterObserverPort>,
    ) -> Self {
        let registry = Arc::new(InvitationRegistry::new(&config, observer));
        let sweeper = registry.spawn_expiry_sweeper();
        let channel = CommandChannelService::new(registry.clone(), config.channel.clone());
        info!(greeter_key = %greeter.public_key(), "greeter node started");
        Self {
            config,
            registry,
            channel,
            notarizer: Arc::new(EnvelopeNotarizer::new(greeter, control_log)),
            sweeper,
        }
    }

    pub fn config(&self) -> &GreeterConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<InvitationRegistry> {
        &self.registry
    }

    pub fn channel(&self) -> &CommandChannelService {
        &self.channel
    }

    /// The node's notarizer, for invitations built by hand.
    pub fn notarizer(&self) -> Arc<dyn NotarizationPort> {
        self.notarizer.clone()
    }

    /// Invite into `space_id` behind a fresh PIN. Returns the shareable
    /// descriptor and the PIN to show the inviter.
    pub async fn invite(
        &self,
        space_id: SpaceId,
        hints: Arc<dyn HintsProviderPort>,
    ) -> anyhow::Result<(InvitationDescriptor, Secret)> {
        let notarizer = self.notarizer.clone();
        let digits = self.config.pin_digits;
        let params = self.config.secret_hash;
        let new = tokio::task::spawn_blocking(move || {
            NewInvitation::with_pin(space_id, hints, notarizer, digits, params)
        })
        .await
        .context("PIN hashing task failed")??;

        let descriptor = self.registry.create_invitation(new).await;
        let pin = self
            .registry
            .secret(&descriptor.invitation_id)
            .await
            .context("invitation vanished before its PIN was read")?;
        Ok((descriptor, pin))
    }

    pub async fn create_invitation(&self, new: NewInvitation) -> InvitationDescriptor {
        self.registry.create_invitation(new).await
    }

    pub async fn cancel(&self, invitation_id: &InvitationId) -> bool {
        self.registry
            .cancel(invitation_id, CancelReason::ByInviter)
            .await
    }

    /// Serve an invitee stream.
    pub fn serve<S>(&self, peer: ChannelPeer, stream: S) -> JoinHandle<Result<(), ChannelError>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        self.channel.handle_incoming_stream(peer, stream)
    }
}

impl Drop for GreeterNode {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}
