//! Ports consumed by the greeter. Adapters live in `sg-app` or are supplied
//! by the embedding application.

mod hints;
mod notarize;
mod observer;
mod secret;

pub use hints::*;
pub use notarize::*;
pub use observer::*;
pub use secret::*;
