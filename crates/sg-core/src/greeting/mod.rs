pub mod action;
pub mod command;
pub mod error;
pub mod event;
pub mod state;
pub mod state_machine;

pub use action::GreeterAction;
pub use command::{Command, CommandKind, Response};
pub use error::GreetingError;
pub use event::GreeterEvent;
pub use state::{CancelReason, GreeterState};
pub use state_machine::GreeterStateMachine;
