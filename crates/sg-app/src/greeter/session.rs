//! Greeter session.
//!
//! Drives one invitation's state machine: authorizes commands, runs the
//! resulting actions and feeds the notarization outcome back in.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use sg_core::credential::AdmissionCredential;
use sg_core::crypto::Nonce;
use sg_core::greeting::{
    CancelReason, Command, CommandKind, GreeterAction, GreeterEvent, GreeterState,
    GreeterStateMachine, GreetingError, Response,
};
use sg_core::ports::GreeterObserverPort;

use super::invitation::Invitation;

pub struct GreeterSession {
    invitation: Arc<Invitation>,
    state: Mutex<GreeterState>,
    dispatch_lock: Mutex<()>,
    observer: Arc<dyn GreeterObserverPort>,
    write_timeout: Duration,
    released: AtomicBool,
}

impl GreeterSession {
    pub fn new(
        invitation: Arc<Invitation>,
        observer: Arc<dyn GreeterObserverPort>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            invitation,
            state: Mutex::new(GreeterState::Created),
            dispatch_lock: Mutex::new(()),
            observer,
            write_timeout,
            released: AtomicBool::new(false),
        }
    }

    pub fn invitation(&self) -> &Arc<Invitation> {
        &self.invitation
    }

    pub async fn state(&self) -> GreeterState {
        self.state.lock().await.clone()
    }

    /// Set once the session reached a terminal state that frees its entry.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Process one command. A second command arriving while one is still
    /// in flight is answered with [`GreetingError::Busy`].
    pub async fn handle(&self, command: Command) -> Result<Response, GreetingError> {
        let kind = command.kind();
        let Ok(_dispatch_guard) = self.dispatch_lock.try_lock() else {
            debug!(invitation_id = %self.invitation.id, command = %kind, "command rejected, session busy");
            return Err(GreetingError::Busy);
        };

        let span = info_span!(
            "usecase.greeter_session.handle",
            invitation_id = %self.invitation.id,
            command = %kind,
        );
        async {
            let current = self.state().await;
            GreeterStateMachine::check_command(&current, kind)?;
            let event = self.authorize(&current, command);
            self.run(Some(kind), event).await
        }
        .instrument(span)
        .await
    }

    /// Move a live session to CANCELLED. Waits for an in-flight command.
    /// Returns false if the session was already terminal.
    pub async fn cancel(&self, reason: CancelReason) -> bool {
        let _dispatch_guard = self.dispatch_lock.lock().await;
        if self.state.lock().await.is_terminal() {
            return false;
        }
        let span = info_span!(
            "usecase.greeter_session.cancel",
            invitation_id = %self.invitation.id,
            reason = ?reason,
        );
        let _ = self
            .run(None, GreeterEvent::Cancelled { reason })
            .instrument(span)
            .await;
        true
    }

    fn authorize(&self, current: &GreeterState, command: Command) -> GreeterEvent {
        match command {
            Command::Begin => GreeterEvent::BeginReceived,
            Command::Handshake { secret } => {
                if !self.invitation.validate_secret(&secret) {
                    return GreeterEvent::AuthRejected;
                }
                GreeterEvent::HandshakeAuthorized {
                    candidate_nonce: Nonce::generate(),
                }
            }
            Command::Notarize {
                secret,
                credentials,
            } => {
                if !self.invitation.validate_secret(&secret) {
                    return GreeterEvent::AuthRejected;
                }
                match current.nonce() {
                    Some(nonce) if self.verify_credentials(&credentials, nonce) => {
                        GreeterEvent::NotarizeAuthorized { credentials }
                    }
                    _ => GreeterEvent::CredentialsRejected,
                }
            }
            // A failed session is inert; FINISH there only frees its entry.
            Command::Finish { .. } if matches!(current, GreeterState::Failed { .. }) => {
                GreeterEvent::FinishAuthorized
            }
            Command::Finish { secret } => match secret {
                Some(secret) if !self.invitation.validate_secret(&secret) => {
                    GreeterEvent::AuthRejected
                }
                _ => GreeterEvent::FinishAuthorized,
            },
        }
    }

    fn verify_credentials(&self, credentials: &[AdmissionCredential], nonce: &Nonce) -> bool {
        if credentials.is_empty() {
            return false;
        }
        for (index, credential) in credentials.iter().enumerate() {
            if let Err(err) = credential.verify(&self.invitation.space_id, nonce) {
                warn!(index, error = %err, "admission credential rejected");
                return false;
            }
        }
        true
    }

    async fn apply(&self, event: GreeterEvent) -> Vec<GreeterAction> {
        let mut guard = self.state.lock().await;
        let current = std::mem::replace(&mut *guard, GreeterState::Created);
        let (next, actions) = GreeterStateMachine::transition(current, event);
        debug!(state = ?next, "greeter state updated");
        *guard = next;
        actions
    }

    async fn run(
        &self,
        kind: Option<CommandKind>,
        event: GreeterEvent,
    ) -> Result<Response, GreetingError> {
        let mut queue: VecDeque<GreeterAction> = self.apply(event).await.into();
        let mut reply = Err(GreetingError::ProtocolViolation);
        let id = &self.invitation.id;

        while let Some(action) = queue.pop_front() {
            match action {
                GreeterAction::Acknowledge => {
                    reply = Ok(match kind {
                        Some(CommandKind::Finish) => Response::Finished,
                        _ => Response::Begun,
                    });
                }
                GreeterAction::IssueHandshake { nonce } => {
                    reply = Ok(Response::Handshake {
                        nonce,
                        space_id: self.invitation.space_id,
                    });
                }
                GreeterAction::ReleaseHints { hints } => {
                    reply = Ok(Response::Notarized { hints });
                }
                GreeterAction::Reject { error } => {
                    reply = Err(error);
                }
                GreeterAction::Notarize { credentials } => {
                    let outcome = self.notarize(&credentials).await;
                    queue.extend(self.apply(outcome).await);
                }
                GreeterAction::NotifyBegun => self.observer.on_begun(id),
                GreeterAction::NotifyNotarized { credentials } => {
                    info!(count = credentials.len(), "admission credentials notarized");
                    self.observer.on_notarized(id, &credentials);
                }
                GreeterAction::NotifyFailed { reason } => {
                    warn!(reason = %reason, "greeting failed");
                    self.observer.on_failed(id, reason);
                }
                GreeterAction::NotifyCancelled { reason } => {
                    info!(reason = ?reason, "greeting cancelled");
                    self.observer.on_cancelled(id, reason);
                }
                GreeterAction::NotifyFinished => {
                    info!("greeting finished");
                    self.observer.on_finished(id);
                }
                GreeterAction::Release => self.released.store(true, Ordering::Release),
            }
        }

        reply
    }

    /// Hints are only computed once the write has committed.
    async fn notarize(&self, credentials: &[AdmissionCredential]) -> GreeterEvent {
        let write = self
            .invitation
            .notarizer
            .write(&self.invitation.space_id, credentials);
        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => GreeterEvent::WriteCommitted {
                hints: self.invitation.hints_provider.hints(),
            },
            Ok(Err(err)) => {
                warn!(error = %err, "notarization write failed");
                GreeterEvent::WriteFailed
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.write_timeout.as_millis() as u64,
                    "notarization write timed out"
                );
                GreeterEvent::WriteTimedOut
            }
        }
    }
}
