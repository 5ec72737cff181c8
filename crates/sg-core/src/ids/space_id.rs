use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::keys::PublicKey;

/// Space identifier: the space's own public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(PublicKey);

impl SpaceId {
    pub fn new(key: PublicKey) -> Self {
        Self(key)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl Display for SpaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PublicKey> for SpaceId {
    fn from(key: PublicKey) -> Self {
        Self(key)
    }
}
