//! Key derivation using Argon2id
//!
//! Derives encryption keys from backup passwords using Argon2id,
//! a memory-hard key derivation function resistant to GPU/ASIC attacks.
//! The parameters are fixed per envelope version so that an envelope never
//! has to carry them.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use crate::error::{BackupError, BackupResult};

/// Size of the random salt in bytes
pub const SALT_SIZE: usize = 16;

/// Size of the derived key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism degree
    pub parallelism: u32,
}

impl KeyDerivationParams {
    /// Parameters used by envelope version 1 (19 MiB, 2 passes, 1 lane)
    pub const V1: Self = Self {
        memory_cost: 19 * 1024,
        time_cost: 2,
        parallelism: 1,
    };

    /// Parameters for a given envelope version
    pub fn for_version(version: u8) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

/// A derived encryption key, zeroed on drop
pub struct DerivedKey {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

/// Generate a fresh random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive an encryption key from a password and salt
pub fn derive_key(
    password: &str,
    salt: &[u8; SALT_SIZE],
    params: &KeyDerivationParams,
) -> BackupResult<DerivedKey> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| BackupError::Precondition(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(password.as_bytes(), salt, key.as_mut())
        .map_err(|_| BackupError::AuthFailure)?;

    Ok(DerivedKey { key })
}
