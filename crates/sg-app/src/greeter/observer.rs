use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use sg_core::credential::AdmissionCredential;
use sg_core::greeting::{CancelReason, GreetingError};
use sg_core::ids::InvitationId;
use sg_core::ports::GreeterObserverPort;

/// Greeter lifecycle notifications, as delivered by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreeterNotification {
    Begun {
        invitation_id: InvitationId,
    },
    Notarized {
        invitation_id: InvitationId,
        credentials: Vec<AdmissionCredential>,
    },
    Failed {
        invitation_id: InvitationId,
        reason: GreetingError,
    },
    Cancelled {
        invitation_id: InvitationId,
        reason: CancelReason,
    },
    Finished {
        invitation_id: InvitationId,
    },
}

/// Forwards notifications into a bounded channel. Never blocks the session.
///
/// When the receiver lags, presence and failure notifications are dropped.
/// `Notarized` is not: it is handed to a background task that waits for
/// capacity, so it may arrive after notifications emitted later.
pub struct ChannelObserver {
    tx: mpsc::Sender<GreeterNotification>,
}

impl ChannelObserver {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<GreeterNotification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    fn emit(&self, notification: GreeterNotification) {
        if let Err(err) = self.tx.try_send(notification) {
            warn!(error = %err, "dropping greeter notification");
        }
    }

    fn emit_reliably(&self, notification: GreeterNotification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(notification)) => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    if tx.send(notification).await.is_err() {
                        warn!("greeter notification receiver closed");
                    }
                });
            }
            Err(TrySendError::Closed(_)) => {
                warn!("greeter notification receiver closed");
            }
        }
    }
}

impl GreeterObserverPort for ChannelObserver {
    fn on_begun(&self, invitation_id: &InvitationId) {
        self.emit(GreeterNotification::Begun {
            invitation_id: invitation_id.clone(),
        });
    }

    fn on_notarized(&self, invitation_id: &InvitationId, credentials: &[AdmissionCredential]) {
        self.emit_reliably(GreeterNotification::Notarized {
            invitation_id: invitation_id.clone(),
            credentials: credentials.to_vec(),
        });
    }

    fn on_failed(&self, invitation_id: &InvitationId, reason: GreetingError) {
        self.emit(GreeterNotification::Failed {
            invitation_id: invitation_id.clone(),
            reason,
        });
    }

    fn on_cancelled(&self, invitation_id: &InvitationId, reason: CancelReason) {
        self.emit(GreeterNotification::Cancelled {
            invitation_id: invitation_id.clone(),
            reason,
        });
    }

    fn on_finished(&self, invitation_id: &InvitationId) {
        self.emit(GreeterNotification::Finished {
            invitation_id: invitation_id.clone(),
        });
    }
}

pub struct NoopObserver;

impl GreeterObserverPort for NoopObserver {
    fn on_begun(&self, _invitation_id: &InvitationId) {}

    fn on_notarized(&self, _invitation_id: &InvitationId, _credentials: &[AdmissionCredential]) {}

    fn on_failed(&self, _invitation_id: &InvitationId, _reason: GreetingError) {}
}
