use crate::hints::HintSet;

/// Computes the bootstrap hints returned after a successful NOTARIZE.
pub trait HintsProviderPort: Send + Sync {
    fn hints(&self) -> HintSet;
}

impl<F> HintsProviderPort for F
where
    F: Fn() -> HintSet + Send + Sync,
{
    fn hints(&self) -> HintSet {
        self()
    }
}

impl HintsProviderPort for HintSet {
    fn hints(&self) -> HintSet {
        self.clone()
    }
}
