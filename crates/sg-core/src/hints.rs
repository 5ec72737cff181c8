//! Bootstrap hints handed to a freshly admitted invitee.

use serde::{Deserialize, Serialize};

use crate::keys::{KeyKind, PublicKey};

/// One bootstrap pointer: a key the invitee should start replicating from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyHint {
    pub public_key: PublicKey,
    pub kind: KeyKind,
}

impl KeyHint {
    pub fn new(public_key: PublicKey, kind: KeyKind) -> Self {
        Self { public_key, kind }
    }
}

/// Ordered, immutable set of hints computed per invitation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HintSet(Vec<KeyHint>);

impl HintSet {
    pub fn new(hints: Vec<KeyHint>) -> Self {
        Self(hints)
    }

    pub fn hints(&self) -> &[KeyHint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hints of one kind, in order.
    pub fn of_kind(&self, kind: KeyKind) -> impl Iterator<Item = &KeyHint> {
        self.0.iter().filter(move |hint| hint.kind == kind)
    }
}

impl FromIterator<KeyHint> for HintSet {
    fn from_iter<T: IntoIterator<Item = KeyHint>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
