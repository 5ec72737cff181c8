//! Invitation registry: maps invitation ids to live greeter sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use sg_core::config::GreeterConfig;
use sg_core::crypto::Secret;
use sg_core::greeting::{CancelReason, Command, GreeterState, GreetingError, Response};
use sg_core::ids::InvitationId;
use sg_core::ports::GreeterObserverPort;

use super::invitation::{Invitation, InvitationDescriptor, NewInvitation};
use super::session::GreeterSession;

pub struct InvitationRegistry {
    sessions: RwLock<HashMap<InvitationId, Arc<GreeterSession>>>,
    observer: Arc<dyn GreeterObserverPort>,
    invitation_ttl: Duration,
    write_timeout: Duration,
    sweep_interval: Duration,
}

impl InvitationRegistry {
    pub fn new(config: &GreeterConfig, observer: Arc<dyn GreeterObserverPort>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            observer,
            invitation_ttl: config.invitation_ttl,
            write_timeout: config.write_timeout,
            sweep_interval: config.sweep_interval,
        }
    }

    /// Register a new invitation in CREATED. Ids are freshly generated and
    /// never reused.
    pub async fn create_invitation(&self, new: NewInvitation) -> InvitationDescriptor {
        let invitation = Arc::new(Invitation::new(new, Utc::now(), self.invitation_ttl));
        let descriptor = invitation.descriptor();
        let session = Arc::new(GreeterSession::new(
            invitation,
            self.observer.clone(),
            self.write_timeout,
        ));
        self.sessions
            .write()
            .await
            .insert(descriptor.invitation_id.clone(), session);
        info!(
            invitation_id = %descriptor.invitation_id,
            space_id = %descriptor.space_id,
            expires_at = %descriptor.expires_at,
            "invitation created"
        );
        descriptor
    }

    /// Route a command to its session. Unknown, expired and finished
    /// invitations all answer [`GreetingError::NotFound`].
    pub async fn dispatch(
        &self,
        invitation_id: &InvitationId,
        command: Command,
    ) -> Result<Response, GreetingError> {
        let Some(session) = self.session(invitation_id).await else {
            debug!(invitation_id = %invitation_id, command = %command.kind(), "unknown invitation");
            return Err(GreetingError::NotFound);
        };

        if session.invitation().is_expired(Utc::now()) {
            self.cancel(invitation_id, CancelReason::Expired).await;
            return Err(GreetingError::NotFound);
        }

        let result = session.handle(command).await;
        if session.is_released() {
            self.sessions.write().await.remove(invitation_id);
            debug!(invitation_id = %invitation_id, "invitation released");
        }
        result
    }

    /// Remove the invitation and cancel its session. Idempotent.
    pub async fn cancel(&self, invitation_id: &InvitationId, reason: CancelReason) -> bool {
        let removed = self.sessions.write().await.remove(invitation_id);
        match removed {
            Some(session) => {
                session.cancel(reason).await;
                true
            }
            None => false,
        }
    }

    /// Cancel every invitation whose deadline is at or before `now`.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<InvitationId> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(_, session)| session.invitation().is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();

        let mut swept = 0;
        for invitation_id in expired {
            if self.cancel(&invitation_id, CancelReason::Expired).await {
                swept += 1;
            }
        }
        swept
    }

    /// Periodically sweep expired invitations. The task stops once the
    /// registry is dropped.
    pub fn spawn_expiry_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        let period = self.sweep_interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let swept = registry.sweep_expired(Utc::now()).await;
                if swept > 0 {
                    info!(swept, "expired invitations swept");
                }
            }
        })
    }

    pub async fn state(&self, invitation_id: &InvitationId) -> Option<GreeterState> {
        match self.session(invitation_id).await {
            Some(session) => Some(session.state().await),
            None => None,
        }
    }

    /// The invitation's secret, for local display.
    pub async fn secret(&self, invitation_id: &InvitationId) -> Option<Secret> {
        self.session(invitation_id)
            .await
            .and_then(|session| session.invitation().secret())
    }

    pub async fn descriptor(&self, invitation_id: &InvitationId) -> Option<InvitationDescriptor> {
        self.session(invitation_id)
            .await
            .map(|session| session.invitation().descriptor())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn session(&self, invitation_id: &InvitationId) -> Option<Arc<GreeterSession>> {
        self.sessions.read().await.get(invitation_id).cloned()
    }
}
