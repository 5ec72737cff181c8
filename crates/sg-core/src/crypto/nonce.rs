use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::fmt::{Display, Formatter};

/// Width of a handshake nonce in bytes.
pub const NONCE_LEN: usize = 32;

/// Per-session handshake nonce binding admission credentials to one greeting.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(#[serde_as(as = "Hex")] [u8; NONCE_LEN]);

impl Nonce {
    /// Draw a fresh nonce from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        let mut rng = rand::rng();
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

impl Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_nonces_differ() {
        assert_ne!(Nonce::generate(), Nonce::generate());
    }
}
