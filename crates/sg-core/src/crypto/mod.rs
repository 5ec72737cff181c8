pub mod nonce;
pub mod secret;
pub mod secret_hash;

pub use nonce::{Nonce, NONCE_LEN};
pub use secret::Secret;
pub use secret_hash::{HashedSecret, SecretHashParams};
