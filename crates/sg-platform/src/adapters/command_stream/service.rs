use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{timeout, Duration};
use tracing::{debug, info_span, Instrument};

use sg_app::{serve_envelope, InvitationRegistry};
use sg_core::config::ChannelConfig;
use sg_core::greeting::{CancelReason, CommandKind, GreetingError};
use sg_core::ids::InvitationId;
use sg_core::protocol::{CommandEnvelope, ResponseEnvelope};

use super::framing::{read_frame, write_frame, FrameError};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("command connection already open: {connection_id}")]
    ConnectionExists { connection_id: String },
    #[error("command channel is shut down")]
    Closed,
    #[error("command connection idle for {0:?}")]
    IdleTimeout(Duration),
    #[error("command frame failed: {0}")]
    Frame(#[from] FrameError),
    #[error("response encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug)]
enum CloseReason {
    ExplicitClose,
    ClosedByPeer,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::ExplicitClose => write!(f, "explicit_close"),
            CloseReason::ClosedByPeer => write!(f, "closed_by_peer"),
        }
    }
}

/// Who is on the other end of a stream, as far as the channel cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPeer {
    pub connection_id: String,
    /// Invitation the connection was opened for. Envelopes without an
    /// `invitation_id` are routed here.
    pub rendezvous: Option<InvitationId>,
}

impl ChannelPeer {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            rendezvous: None,
        }
    }

    /// Peer with a random connection id.
    pub fn anonymous() -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn bound_to(mut self, invitation_id: InvitationId) -> Self {
        self.rendezvous = Some(invitation_id);
        self
    }
}

/// Serves command envelopes from invitees over duplex byte streams.
///
/// Commands on one connection are handled strictly in order. A connection
/// owns the invitations it successfully sent BEGIN for; when it ends for any
/// reason, those are cancelled. Invitations it merely addressed are left
/// alone.
#[derive(Clone)]
pub struct CommandChannelService {
    inner: Arc<CommandChannelInner>,
}

struct CommandChannelInner {
    registry: Arc<InvitationRegistry>,
    connections: AsyncMutex<HashMap<String, ConnectionHandle>>,
    semaphore: Arc<Semaphore>,
    config: ChannelConfig,
}

struct ConnectionHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl CommandChannelService {
    pub fn new(registry: Arc<InvitationRegistry>, config: ChannelConfig) -> Self {
        let permits = config.max_concurrent_connections.max(1);
        Self {
            inner: Arc::new(CommandChannelInner {
                registry,
                connections: AsyncMutex::new(HashMap::new()),
                semaphore: Arc::new(Semaphore::new(permits)),
                config,
            }),
        }
    }

    pub fn registry(&self) -> &Arc<InvitationRegistry> {
        &self.inner.registry
    }

    /// Serve one stream on a background task. Waits for a connection slot
    /// when the concurrency limit is reached.
    pub fn handle_incoming_stream<S>(
        &self,
        peer: ChannelPeer,
        stream: S,
    ) -> tokio::task::JoinHandle<Result<(), ChannelError>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let inner = self.inner.clone();
        let span = info_span!("greeter.channel.connection", connection_id = %peer.connection_id);
        tokio::spawn(async move { run_connection(inner, peer, stream).await }.instrument(span))
    }

    /// Ask a connection to stop after its current command. Returns false
    /// for unknown connections.
    pub async fn close_connection(&self, connection_id: &str) -> bool {
        let handle = self.inner.connections.lock().await.remove(connection_id);
        match handle {
            Some(handle) => {
                send_shutdown_signal(&handle.shutdown_tx);
                true
            }
            None => false,
        }
    }

    pub async fn open_connections(&self) -> usize {
        self.inner.connections.lock().await.len()
    }
}

async fn run_connection<S>(
    inner: Arc<CommandChannelInner>,
    peer: ChannelPeer,
    stream: S,
) -> Result<(), ChannelError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let _permit: OwnedSemaphorePermit = inner
        .semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ChannelError::Closed)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    {
        let mut connections = inner.connections.lock().await;
        if connections.contains_key(&peer.connection_id) {
            return Err(ChannelError::ConnectionExists {
                connection_id: peer.connection_id.clone(),
            });
        }
        connections.insert(peer.connection_id.clone(), ConnectionHandle { shutdown_tx });
    }
    info!(
        "command connection opened: connection_id={} rendezvous={:?}",
        peer.connection_id, peer.rendezvous
    );

    let mut owned = HashSet::new();
    let result = serve_commands(&inner, &peer, stream, shutdown_rx, &mut owned).await;

    for invitation_id in &owned {
        if inner
            .registry
            .cancel(invitation_id, CancelReason::ConnectionClosed)
            .await
        {
            info!(
                "invitation cancelled on connection close: connection_id={} invitation_id={}",
                peer.connection_id, invitation_id
            );
        }
    }
    inner.connections.lock().await.remove(&peer.connection_id);

    match &result {
        Ok(reason) => info!(
            "command connection closed: connection_id={} reason={}",
            peer.connection_id, reason
        ),
        Err(err) => warn!(
            "command connection failed: connection_id={} error={}",
            peer.connection_id, err
        ),
    }
    result.map(|_| ())
}

async fn serve_commands<S>(
    inner: &CommandChannelInner,
    peer: &ChannelPeer,
    stream: S,
    mut shutdown_rx: watch::Receiver<bool>,
    owned: &mut HashSet<InvitationId>,
) -> Result<CloseReason, ChannelError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let idle_timeout = inner.config.idle_timeout;
    let max_frame_bytes = inner.config.max_frame_bytes;

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                return Ok(CloseReason::ExplicitClose);
            }
            frame = timeout(idle_timeout, read_frame(&mut reader, max_frame_bytes)) => {
                let payload = match frame {
                    Err(_) => return Err(ChannelError::IdleTimeout(idle_timeout)),
                    Ok(Err(err)) => return Err(err.into()),
                    Ok(Ok(None)) => return Ok(CloseReason::ClosedByPeer),
                    Ok(Ok(Some(payload))) => payload,
                };
                let response = match serde_json::from_slice::<CommandEnvelope>(&payload) {
                    Ok(envelope) => {
                        let kind = envelope.command.kind;
                        let (invitation_id, response) = serve_envelope(
                            &inner.registry,
                            envelope,
                            peer.rendezvous.as_ref(),
                        )
                        .await;
                        debug!(
                            command = %kind,
                            invitation_id = ?invitation_id,
                            error = ?response.error.as_ref().map(|e| e.kind.as_str()),
                            "command served"
                        );
                        // BEGIN is accepted once per invitation, so at most one
                        // connection ever owns it.
                        if let (CommandKind::Begin, None, Some(invitation_id)) =
                            (kind, &response.error, invitation_id)
                        {
                            owned.insert(invitation_id);
                        }
                        response
                    }
                    Err(err) => {
                        warn!(
                            "undecodable command envelope: connection_id={} error={}",
                            peer.connection_id, err
                        );
                        ResponseEnvelope::error(GreetingError::Malformed)
                    }
                };
                let encoded = serde_json::to_vec(&response)?;
                write_frame(&mut writer, &encoded, max_frame_bytes).await?;
            }
        }
    }
}

fn send_shutdown_signal(shutdown_tx: &watch::Sender<bool>) {
    if let Err(err) = shutdown_tx.send(true) {
        warn!("command connection shutdown send failed: {err}");
    }
}
