//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so
//! the scheme and its parameters can be recovered from the stored value.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::RngCore;

use crate::error::{HashError, HashResult};

/// One-way hashing collaborator used by backend modules.
pub trait CredentialHasher: Send + Sync {
    /// Hashes `plaintext` with a fresh salt.
    ///
    /// When `previous` is a hash this hasher understands, its parameters are
    /// reused so an entry keeps its cost settings across password changes.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    fn hash(&self, plaintext: &str, previous: Option<&str>) -> HashResult<String>;

    /// Re-hashes `plaintext` with the salt and parameters recovered from
    /// `stored`. The result equals `stored` exactly when the password matches.
    ///
    /// # Errors
    ///
    /// Returns an error if `stored` is not a hash this hasher understands.
    fn rehash(&self, plaintext: &str, stored: &str) -> HashResult<String>;

    /// Checks `plaintext` against `stored`.
    ///
    /// # Errors
    ///
    /// Returns an error if `stored` is malformed.
    fn verify(&self, plaintext: &str, stored: &str) -> HashResult<bool>;

    /// Checks whether `value` looks like output of this hasher.
    fn recognizes(&self, value: &str) -> bool;
}

/// Argon2 cost settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashPolicy {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: u32,
}

impl Default for HashPolicy {
    fn default() -> Self {
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
        }
    }
}

impl HashPolicy {
    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the parallelism factor.
    #[must_use]
    pub const fn parallelism(mut self, p: u32) -> Self {
        self.parallelism = p;
        self
    }

    fn build_params(&self) -> HashResult<Params> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length as usize),
        )
        .map_err(|e| HashError::hashing(e.to_string()))
    }
}

/// Argon2id implementation of [`CredentialHasher`].
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    policy: HashPolicy,
}

impl Argon2Hasher {
    /// Creates a hasher with the given policy.
    #[must_use]
    pub const fn new(policy: HashPolicy) -> Self {
        Self { policy }
    }

    /// Policy used for fresh hashes.
    #[must_use]
    pub const fn policy(&self) -> &HashPolicy {
        &self.policy
    }

    fn fresh_salt() -> HashResult<SaltString> {
        let mut bytes = [0_u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        SaltString::encode_b64(&bytes).map_err(|e| HashError::hashing(e.to_string()))
    }

    fn parse(stored: &str) -> HashResult<PasswordHash<'_>> {
        let parsed = PasswordHash::new(stored).map_err(|e| HashError::malformed(e.to_string()))?;
        if !parsed.algorithm.as_str().starts_with("argon2") {
            return Err(HashError::malformed(format!(
                "unsupported algorithm {}",
                parsed.algorithm
            )));
        }
        Ok(parsed)
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str, previous: Option<&str>) -> HashResult<String> {
        let salt = Self::fresh_salt()?;

        if let Some(parsed) = previous.and_then(|p| Self::parse(p).ok()) {
            let params =
                Params::try_from(&parsed).map_err(|e| HashError::hashing(e.to_string()))?;
            tracing::trace!(
                m = params.m_cost(),
                t = params.t_cost(),
                p = params.p_cost(),
                "hashing with the previous hash's parameters"
            );
            let hash = Argon2::default()
                .hash_password_customized(
                    plaintext.as_bytes(),
                    Some(parsed.algorithm),
                    parsed.version,
                    params,
                    &salt,
                )
                .map_err(|e| HashError::hashing(e.to_string()))?;
            return Ok(hash.to_string());
        }

        tracing::trace!(
            m = self.policy.memory_cost,
            t = self.policy.time_cost,
            p = self.policy.parallelism,
            "hashing with the configured parameters"
        );
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.policy.build_params()?);
        let hash = argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError::hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn rehash(&self, plaintext: &str, stored: &str) -> HashResult<String> {
        let parsed = Self::parse(stored)?;
        let salt = parsed
            .salt
            .ok_or_else(|| HashError::malformed("hash has no salt"))?;
        let params = Params::try_from(&parsed).map_err(|e| HashError::malformed(e.to_string()))?;

        let hash = Argon2::default()
            .hash_password_customized(
                plaintext.as_bytes(),
                Some(parsed.algorithm),
                parsed.version,
                params,
                salt,
            )
            .map_err(|e| HashError::hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, stored: &str) -> HashResult<bool> {
        let parsed = Self::parse(stored)?;
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                tracing::debug!("password verification failed");
                Ok(false)
            }
            Err(e) => Err(HashError::hashing(e.to_string())),
        }
    }

    fn recognizes(&self, value: &str) -> bool {
        Self::parse(value).is_ok()
    }
}
