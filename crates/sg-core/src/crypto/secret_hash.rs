//! Argon2id hashing of invitation secrets, so the greeter never keeps the
//! plaintext around for the lifetime of an invitation.

use anyhow::{anyhow, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use subtle::ConstantTimeEq;

use super::Secret;

/// Size of the salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of the hash output in bytes.
pub const HASH_SIZE: usize = 32;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretHashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub lanes: u32,
}

impl SecretHashParams {
    /// OWASP minimum for argon2id.
    pub fn defaults() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            lanes: 1,
        }
    }

    fn to_argon(self) -> Result<Params> {
        Params::new(self.memory_kib, self.iterations, self.lanes, Some(HASH_SIZE))
            .map_err(|e| anyhow!("invalid argon2 params: {e}"))
    }
}

/// A salted argon2id hash of an invitation secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashedSecret {
    pub salt: [u8; SALT_SIZE],
    pub hash: [u8; HASH_SIZE],
    params: SecretHashParams,
}

impl HashedSecret {
    /// Hash `secret` with a fresh random salt.
    pub fn hash(secret: &Secret, params: SecretHashParams) -> Result<Self> {
        let salt = generate_salt();
        let hash = argon2id_hash(secret.expose(), &salt, params)?;
        Ok(Self {
            salt,
            hash,
            params,
        })
    }

    /// Constant-time comparison of `candidate` against the stored hash.
    pub fn matches(&self, candidate: &Secret) -> Result<bool> {
        let computed = argon2id_hash(candidate.expose(), &self.salt, self.params)?;
        Ok(computed.ct_eq(&self.hash).into())
    }
}

fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    let mut rng = rand::rng();
    rng.fill_bytes(&mut salt);
    salt
}

fn argon2id_hash(
    secret: &[u8],
    salt: &[u8; SALT_SIZE],
    params: SecretHashParams,
) -> Result<[u8; HASH_SIZE]> {
    let mut output = [0u8; HASH_SIZE];
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon()?);
    argon
        .hash_password_into(secret, salt, &mut output)
        .map_err(|e| anyhow!("Argon2id hashing failed: {e}"))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> SecretHashParams {
        SecretHashParams {
            memory_kib: 64,
            iterations: 1,
            lanes: 1,
        }
    }

    #[test]
    fn each_hash_gets_a_fresh_salt() {
        let secret = Secret::from("123456");
        let first = HashedSecret::hash(&secret, cheap()).expect("hash");
        let second = HashedSecret::hash(&secret, cheap()).expect("hash");
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn matches_accepts_same_secret() {
        let hashed = HashedSecret::hash(&Secret::from("123456"), cheap()).expect("hash");
        assert!(hashed.matches(&Secret::from("123456")).expect("verify"));
    }

    #[test]
    fn matches_rejects_other_secret() {
        let hashed = HashedSecret::hash(&Secret::from("123456"), cheap()).expect("hash");
        assert!(!hashed.matches(&Secret::from("654321")).expect("verify"));
    }
}
