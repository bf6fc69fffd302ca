// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id password hashing in PHC string format.
//!
//! Cost parameters come from `[auth]` in the config. Each hash carries its
//! own parameters and salt, so raising the cost later does not invalidate
//! stored hashes.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use waybill_config::model::AuthConfig;
use waybill_core::WaybillError;

/// Hashes and verifies user passwords.
pub struct PasswordHashing {
    argon2: Argon2<'static>,
    rng: SystemRandom,
}

impl PasswordHashing {
    pub fn new(config: &AuthConfig) -> Result<Self, WaybillError> {
        let params = Params::new(
            config.kdf_memory_cost,
            config.kdf_iterations,
            config.kdf_parallelism,
            None,
        )
        .map_err(|e| WaybillError::Config(format!("invalid Argon2id parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            rng: SystemRandom::new(),
        })
    }

    /// Hash `password` with a fresh random 16-byte salt.
    pub fn hash(&self, password: &SecretString) -> Result<String, WaybillError> {
        let mut salt = [0u8; 16];
        self.rng
            .fill(&mut salt)
            .map_err(|_| WaybillError::Internal("failed to generate random salt".to_string()))?;
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| WaybillError::Internal(format!("failed to encode salt: {e}")))?;

        let hash = self
            .argon2
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map_err(|e| WaybillError::Internal(format!("password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    /// True when `password` matches the stored PHC string.
    ///
    /// A malformed stored hash never matches.
    pub fn verify(&self, password: &SecretString, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.expose_secret().as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Characters used for generated passwords. Excludes look-alikes (0/O, 1/l/I).
const PASSWORD_ALPHABET: &[u8] = b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Random password of `len` characters for first-run admin accounts.
pub fn generate_password(len: usize) -> Result<SecretString, WaybillError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| WaybillError::Internal("failed to generate random password".to_string()))?;
    let password: String = bytes
        .iter()
        .map(|b| PASSWORD_ALPHABET[*b as usize % PASSWORD_ALPHABET.len()] as char)
        .collect();
    Ok(SecretString::from(password))
}

#[cfg(test)]
pub(crate) fn fast_config() -> AuthConfig {
    AuthConfig {
        kdf_memory_cost: 8192,
        kdf_iterations: 1,
        kdf_parallelism: 1,
    }
}
