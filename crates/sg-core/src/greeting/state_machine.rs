//! Greeter state machine.
//!
//! Pure `(state, event) -> (state, actions)` transitions for one invitation.
//! The session in the application layer turns commands into events (after
//! checking the secret and credentials), runs the returned actions, and feeds
//! the outcome of the notarization write back in as another event.
//!
//! ```text
//! Created -BEGIN-> Begun -HANDSHAKE-> Handshaken -NOTARIZE-> Notarizing
//!                                                               | write ok
//!                                      Finished <-FINISH- Notarized
//! ```

#[cfg(feature = "tracing")]
use tracing::warn;

use super::action::GreeterAction;
use super::command::CommandKind;
use super::error::GreetingError;
use super::event::GreeterEvent;
use super::state::GreeterState;

pub struct GreeterStateMachine;

impl GreeterStateMachine {
    /// Gate a command against the current state before any secret is
    /// checked. Rejections here never change state.
    pub fn check_command(state: &GreeterState, kind: CommandKind) -> Result<(), GreetingError> {
        use CommandKind::*;
        match (state, kind) {
            (GreeterState::Created, Begin)
            | (GreeterState::Begun, Handshake | Finish)
            | (GreeterState::Handshaken { .. }, Handshake | Notarize | Finish)
            | (GreeterState::Notarized { .. }, Notarize | Finish)
            | (GreeterState::Failed { .. }, Finish) => Ok(()),
            (GreeterState::Notarizing { .. }, _) => Err(GreetingError::Busy),
            // Released sessions only linger until the registry drops them.
            (GreeterState::Finished | GreeterState::Cancelled { .. }, _) => {
                Err(GreetingError::NotFound)
            }
            _ => Err(GreetingError::ProtocolViolation),
        }
    }

    pub fn transition(
        state: GreeterState,
        event: GreeterEvent,
    ) -> (GreeterState, Vec<GreeterAction>) {
        match (state, event) {
            // ===== Begin =====
            (GreeterState::Created, GreeterEvent::BeginReceived) => (
                GreeterState::Begun,
                vec![GreeterAction::NotifyBegun, GreeterAction::Acknowledge],
            ),

            // ===== Handshake =====
            (GreeterState::Begun, GreeterEvent::HandshakeAuthorized { candidate_nonce }) => (
                GreeterState::Handshaken {
                    nonce: candidate_nonce,
                },
                vec![GreeterAction::IssueHandshake {
                    nonce: candidate_nonce,
                }],
            ),
            (GreeterState::Handshaken { nonce }, GreeterEvent::HandshakeAuthorized { .. }) => (
                GreeterState::Handshaken { nonce },
                vec![GreeterAction::IssueHandshake { nonce }],
            ),

            // ===== Notarize =====
            (GreeterState::Handshaken { nonce }, GreeterEvent::NotarizeAuthorized { credentials }) => (
                GreeterState::Notarizing {
                    nonce,
                    credentials: credentials.clone(),
                },
                vec![GreeterAction::Notarize { credentials }],
            ),
            (
                GreeterState::Notarized {
                    nonce,
                    credentials,
                    hints,
                },
                GreeterEvent::NotarizeAuthorized {
                    credentials: retried,
                },
            ) => {
                // A retry must resend exactly what was written.
                let actions = if retried == credentials {
                    vec![GreeterAction::ReleaseHints {
                        hints: hints.clone(),
                    }]
                } else {
                    vec![GreeterAction::Reject {
                        error: GreetingError::ProtocolViolation,
                    }]
                };
                (
                    GreeterState::Notarized {
                        nonce,
                        credentials,
                        hints,
                    },
                    actions,
                )
            }
            (GreeterState::Notarizing { nonce, credentials }, GreeterEvent::WriteCommitted { hints }) => (
                GreeterState::Notarized {
                    nonce,
                    credentials: credentials.clone(),
                    hints: hints.clone(),
                },
                vec![
                    GreeterAction::NotifyNotarized { credentials },
                    GreeterAction::ReleaseHints { hints },
                ],
            ),
            (GreeterState::Notarizing { .. }, GreeterEvent::WriteFailed) => {
                fail(GreetingError::WriteFailed)
            }
            (GreeterState::Notarizing { .. }, GreeterEvent::WriteTimedOut) => {
                fail(GreetingError::WriteTimeout)
            }

            // ===== Finish =====
            (
                GreeterState::Begun | GreeterState::Handshaken { .. } | GreeterState::Notarized { .. },
                GreeterEvent::FinishAuthorized,
            ) => (
                GreeterState::Finished,
                vec![
                    GreeterAction::NotifyFinished,
                    GreeterAction::Acknowledge,
                    GreeterAction::Release,
                ],
            ),

            // ===== Rejections =====
            (
                GreeterState::Begun | GreeterState::Handshaken { .. } | GreeterState::Notarized { .. },
                GreeterEvent::AuthRejected,
            ) => fail(GreetingError::AuthFailed),
            (
                GreeterState::Handshaken { .. } | GreeterState::Notarized { .. },
                GreeterEvent::CredentialsRejected,
            ) => fail(GreetingError::InvalidCredential),

            // ===== Terminal =====
            // FINISH frees a failed session's entry; the failure still stands.
            (GreeterState::Failed { reason }, GreeterEvent::FinishAuthorized) => (
                GreeterState::Failed { reason },
                vec![
                    GreeterAction::Reject {
                        error: GreetingError::ProtocolViolation,
                    },
                    GreeterAction::Release,
                ],
            ),
            (state, _) if state.is_terminal() => (state, vec![]),

            // ===== Cancel =====
            (_, GreeterEvent::Cancelled { reason }) => (
                GreeterState::Cancelled { reason },
                vec![
                    GreeterAction::NotifyCancelled { reason },
                    GreeterAction::Release,
                ],
            ),

            // ===== Invalid =====
            (state, event) => {
                #[cfg(feature = "tracing")]
                warn!(?state, ?event, "invalid greeter transition");
                #[cfg(not(feature = "tracing"))]
                let _ = event;
                (
                    state,
                    vec![GreeterAction::Reject {
                        error: GreetingError::ProtocolViolation,
                    }],
                )
            }
        }
    }
}

fn fail(reason: GreetingError) -> (GreeterState, Vec<GreeterAction>) {
    (
        GreeterState::Failed { reason },
        vec![
            GreeterAction::NotifyFailed { reason },
            GreeterAction::Reject { error: reason },
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::GreeterStateMachine;
    use crate::credential::AdmissionCredential;
    use crate::crypto::Nonce;
    use crate::greeting::action::GreeterAction;
    use crate::greeting::command::CommandKind;
    use crate::greeting::error::GreetingError;
    use crate::greeting::event::GreeterEvent;
    use crate::greeting::state::{CancelReason, GreeterState};
    use crate::hints::{HintSet, KeyHint};
    use crate::ids::SpaceId;
    use crate::keys::{AdmittedKey, KeyKind, KeyPair};

    fn credentials(nonce: Nonce) -> Vec<AdmissionCredential> {
        let identity = KeyPair::generate();
        let space_id = SpaceId::new(KeyPair::generate().public_key());
        vec![AdmissionCredential::build(
            space_id,
            vec![AdmittedKey::new(identity.public_key(), KeyKind::Identity)],
            nonce,
            &identity,
        )
        .expect("credential")]
    }

    fn hints() -> HintSet {
        HintSet::new(vec![KeyHint::new(
            KeyPair::generate().public_key(),
            KeyKind::Feed,
        )])
    }

    fn cases() -> Vec<(
        &'static str,
        GreeterState,
        GreeterEvent,
        GreeterState,
        Vec<GreeterAction>,
    )> {
        let nonce = Nonce::generate();
        let other_nonce = Nonce::generate();
        let creds = credentials(nonce);
        let hints = hints();

        vec![
            (
                "created -> begin",
                GreeterState::Created,
                GreeterEvent::BeginReceived,
                GreeterState::Begun,
                vec![GreeterAction::NotifyBegun, GreeterAction::Acknowledge],
            ),
            (
                "begun -> handshake issues candidate nonce",
                GreeterState::Begun,
                GreeterEvent::HandshakeAuthorized {
                    candidate_nonce: nonce,
                },
                GreeterState::Handshaken { nonce },
                vec![GreeterAction::IssueHandshake { nonce }],
            ),
            (
                "handshaken -> handshake keeps original nonce",
                GreeterState::Handshaken { nonce },
                GreeterEvent::HandshakeAuthorized {
                    candidate_nonce: other_nonce,
                },
                GreeterState::Handshaken { nonce },
                vec![GreeterAction::IssueHandshake { nonce }],
            ),
            (
                "handshaken -> notarize requests write",
                GreeterState::Handshaken { nonce },
                GreeterEvent::NotarizeAuthorized {
                    credentials: creds.clone(),
                },
                GreeterState::Notarizing {
                    nonce,
                    credentials: creds.clone(),
                },
                vec![GreeterAction::Notarize {
                    credentials: creds.clone(),
                }],
            ),
            (
                "notarizing -> write committed",
                GreeterState::Notarizing {
                    nonce,
                    credentials: creds.clone(),
                },
                GreeterEvent::WriteCommitted {
                    hints: hints.clone(),
                },
                GreeterState::Notarized {
                    nonce,
                    credentials: creds.clone(),
                    hints: hints.clone(),
                },
                vec![
                    GreeterAction::NotifyNotarized {
                        credentials: creds.clone(),
                    },
                    GreeterAction::ReleaseHints {
                        hints: hints.clone(),
                    },
                ],
            ),
            (
                "notarizing -> write failed",
                GreeterState::Notarizing {
                    nonce,
                    credentials: creds.clone(),
                },
                GreeterEvent::WriteFailed,
                GreeterState::Failed {
                    reason: GreetingError::WriteFailed,
                },
                vec![
                    GreeterAction::NotifyFailed {
                        reason: GreetingError::WriteFailed,
                    },
                    GreeterAction::Reject {
                        error: GreetingError::WriteFailed,
                    },
                ],
            ),
            (
                "notarizing -> write timed out",
                GreeterState::Notarizing {
                    nonce,
                    credentials: creds.clone(),
                },
                GreeterEvent::WriteTimedOut,
                GreeterState::Failed {
                    reason: GreetingError::WriteTimeout,
                },
                vec![
                    GreeterAction::NotifyFailed {
                        reason: GreetingError::WriteTimeout,
                    },
                    GreeterAction::Reject {
                        error: GreetingError::WriteTimeout,
                    },
                ],
            ),
            (
                "notarized -> identical retry replays hints",
                GreeterState::Notarized {
                    nonce,
                    credentials: creds.clone(),
                    hints: hints.clone(),
                },
                GreeterEvent::NotarizeAuthorized {
                    credentials: creds.clone(),
                },
                GreeterState::Notarized {
                    nonce,
                    credentials: creds.clone(),
                    hints: hints.clone(),
                },
                vec![GreeterAction::ReleaseHints {
                    hints: hints.clone(),
                }],
            ),
            (
                "notarized -> different retry is rejected",
                GreeterState::Notarized {
                    nonce,
                    credentials: creds.clone(),
                    hints: hints.clone(),
                },
                GreeterEvent::NotarizeAuthorized {
                    credentials: credentials(nonce),
                },
                GreeterState::Notarized {
                    nonce,
                    credentials: creds.clone(),
                    hints: hints.clone(),
                },
                vec![GreeterAction::Reject {
                    error: GreetingError::ProtocolViolation,
                }],
            ),
            (
                "notarized -> finish",
                GreeterState::Notarized {
                    nonce,
                    credentials: creds.clone(),
                    hints: hints.clone(),
                },
                GreeterEvent::FinishAuthorized,
                GreeterState::Finished,
                vec![
                    GreeterAction::NotifyFinished,
                    GreeterAction::Acknowledge,
                    GreeterAction::Release,
                ],
            ),
            (
                "begun -> finish (invitee abort)",
                GreeterState::Begun,
                GreeterEvent::FinishAuthorized,
                GreeterState::Finished,
                vec![
                    GreeterAction::NotifyFinished,
                    GreeterAction::Acknowledge,
                    GreeterAction::Release,
                ],
            ),
            (
                "begun -> auth rejected",
                GreeterState::Begun,
                GreeterEvent::AuthRejected,
                GreeterState::Failed {
                    reason: GreetingError::AuthFailed,
                },
                vec![
                    GreeterAction::NotifyFailed {
                        reason: GreetingError::AuthFailed,
                    },
                    GreeterAction::Reject {
                        error: GreetingError::AuthFailed,
                    },
                ],
            ),
            (
                "handshaken -> credentials rejected",
                GreeterState::Handshaken { nonce },
                GreeterEvent::CredentialsRejected,
                GreeterState::Failed {
                    reason: GreetingError::InvalidCredential,
                },
                vec![
                    GreeterAction::NotifyFailed {
                        reason: GreetingError::InvalidCredential,
                    },
                    GreeterAction::Reject {
                        error: GreetingError::InvalidCredential,
                    },
                ],
            ),
            (
                "handshaken -> cancelled",
                GreeterState::Handshaken { nonce },
                GreeterEvent::Cancelled {
                    reason: CancelReason::ConnectionClosed,
                },
                GreeterState::Cancelled {
                    reason: CancelReason::ConnectionClosed,
                },
                vec![
                    GreeterAction::NotifyCancelled {
                        reason: CancelReason::ConnectionClosed,
                    },
                    GreeterAction::Release,
                ],
            ),
            (
                "failed ignores cancel",
                GreeterState::Failed {
                    reason: GreetingError::AuthFailed,
                },
                GreeterEvent::Cancelled {
                    reason: CancelReason::Expired,
                },
                GreeterState::Failed {
                    reason: GreetingError::AuthFailed,
                },
                vec![],
            ),
            (
                "failed -> finish releases without recovering",
                GreeterState::Failed {
                    reason: GreetingError::AuthFailed,
                },
                GreeterEvent::FinishAuthorized,
                GreeterState::Failed {
                    reason: GreetingError::AuthFailed,
                },
                vec![
                    GreeterAction::Reject {
                        error: GreetingError::ProtocolViolation,
                    },
                    GreeterAction::Release,
                ],
            ),
            (
                "finished ignores begin",
                GreeterState::Finished,
                GreeterEvent::BeginReceived,
                GreeterState::Finished,
                vec![],
            ),
            (
                "created rejects notarize event",
                GreeterState::Created,
                GreeterEvent::NotarizeAuthorized {
                    credentials: creds.clone(),
                },
                GreeterState::Created,
                vec![GreeterAction::Reject {
                    error: GreetingError::ProtocolViolation,
                }],
            ),
        ]
    }

    #[test]
    fn transition_table() {
        for (name, state, event, expected_state, expected_actions) in cases() {
            let (next, actions) = GreeterStateMachine::transition(state, event);
            assert_eq!(next, expected_state, "state mismatch: {name}");
            assert_eq!(actions, expected_actions, "actions mismatch: {name}");
        }
    }

    #[test]
    fn check_command_enforces_order() {
        let nonce = Nonce::generate();
        let allowed = [
            (GreeterState::Created, CommandKind::Begin),
            (GreeterState::Begun, CommandKind::Handshake),
            (GreeterState::Begun, CommandKind::Finish),
            (GreeterState::Handshaken { nonce }, CommandKind::Handshake),
            (GreeterState::Handshaken { nonce }, CommandKind::Notarize),
            (GreeterState::Handshaken { nonce }, CommandKind::Finish),
            (
                GreeterState::Failed {
                    reason: GreetingError::WriteFailed,
                },
                CommandKind::Finish,
            ),
        ];
        for (state, kind) in allowed {
            assert_eq!(
                GreeterStateMachine::check_command(&state, kind),
                Ok(()),
                "{state:?} should accept {kind}"
            );
        }

        let rejected = [
            (GreeterState::Created, CommandKind::Handshake),
            (GreeterState::Created, CommandKind::Finish),
            (GreeterState::Begun, CommandKind::Begin),
            (GreeterState::Begun, CommandKind::Notarize),
            (GreeterState::Handshaken { nonce }, CommandKind::Begin),
            (
                GreeterState::Failed {
                    reason: GreetingError::AuthFailed,
                },
                CommandKind::Handshake,
            ),
        ];
        for (state, kind) in rejected {
            assert_eq!(
                GreeterStateMachine::check_command(&state, kind),
                Err(GreetingError::ProtocolViolation),
                "{state:?} should reject {kind}"
            );
        }
    }

    #[test]
    fn released_sessions_report_not_found() {
        let released = [
            (GreeterState::Finished, CommandKind::Begin),
            (GreeterState::Finished, CommandKind::Finish),
            (
                GreeterState::Cancelled {
                    reason: CancelReason::ByInviter,
                },
                CommandKind::Finish,
            ),
            (
                GreeterState::Cancelled {
                    reason: CancelReason::ConnectionClosed,
                },
                CommandKind::Handshake,
            ),
        ];
        for (state, kind) in released {
            assert_eq!(
                GreeterStateMachine::check_command(&state, kind),
                Err(GreetingError::NotFound),
                "{state:?} should answer not found to {kind}"
            );
        }
    }

    #[test]
    fn notarizing_reports_busy() {
        let nonce = Nonce::generate();
        let state = GreeterState::Notarizing {
            nonce,
            credentials: credentials(nonce),
        };
        assert_eq!(
            GreeterStateMachine::check_command(&state, CommandKind::Notarize),
            Err(GreetingError::Busy)
        );
    }
}
