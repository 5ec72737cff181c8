use rand::Rng;
use std::fmt;
use zeroize::Zeroize;

/// Invitation secret supplied by the invitee.
///
/// - not `Clone`
/// - no `Serialize` / `Deserialize`; the wire layer moves bytes in explicitly
/// - `Debug` / `Display` never print the content
/// - wiped on drop
pub struct Secret {
    inner: Vec<u8>,
}

impl Secret {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { inner: bytes }
    }

    /// Random numeric PIN of `digits` characters, e.g. `"0427"`.
    pub fn generate_pin(digits: usize) -> Self {
        let mut rng = rand::rng();
        let pin: String = (0..digits)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        Self::from(pin.as_str())
    }

    pub fn expose(&self) -> &[u8] {
        &self.inner
    }

    /// Lossy text view, for local display of PIN-style secrets.
    pub fn expose_str(&self) -> String {
        String::from_utf8_lossy(&self.inner).into_owned()
    }

    /// Explicit copy for the wire. Callers own wiping the result.
    pub fn to_wire(&self) -> Vec<u8> {
        self.inner.clone()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes().to_vec())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}
