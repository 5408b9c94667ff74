//! Password-sealed envelopes using AES-256-GCM
//!
//! Layout (all lengths fixed by the version byte):
//!
//! ```text
//! "MBBK"[4] | version[1] | salt[16] | nonce[12] | ciphertext || tag[16]
//! ```
//!
//! Each seal draws a fresh salt and nonce, so sealing the same plaintext
//! twice never produces the same bytes. Every way `open` can fail collapses
//! into [`BackupError::AuthFailure`].

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};

use crate::error::{BackupError, BackupResult};

use super::key_derivation::{derive_key, generate_salt, KeyDerivationParams, SALT_SIZE};

/// Marker at the start of every sealed backup
pub const MAGIC: &[u8; 4] = b"MBBK";

/// Envelope version written by [`seal`]
pub const ENVELOPE_VERSION: u8 = 1;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Bytes before the ciphertext
pub const HEADER_SIZE: usize = MAGIC.len() + 1 + SALT_SIZE + NONCE_SIZE;

/// Whether the bytes look like a sealed envelope
pub fn is_sealed(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

/// Encrypt plaintext under a key derived from `password`
pub fn seal(plaintext: &[u8], password: &str) -> BackupResult<Vec<u8>> {
    if password.is_empty() {
        return Err(BackupError::Precondition(
            "An encryption password must not be empty".to_string(),
        ));
    }

    let salt = generate_salt();
    let key = derive_key(password, &salt, &KeyDerivationParams::V1)?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| BackupError::Precondition(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| BackupError::Precondition(format!("Encryption failed: {}", e)))?;

    let mut envelope = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
    envelope.extend_from_slice(MAGIC);
    envelope.push(ENVELOPE_VERSION);
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);

    Ok(envelope)
}

/// Decrypt and verify an envelope produced by [`seal`]
pub fn open(envelope: &[u8], password: &str) -> BackupResult<Vec<u8>> {
    if envelope.len() < HEADER_SIZE + TAG_SIZE || !is_sealed(envelope) {
        return Err(BackupError::AuthFailure);
    }

    let version = envelope[MAGIC.len()];
    let params = KeyDerivationParams::for_version(version).ok_or(BackupError::AuthFailure)?;

    let salt_start = MAGIC.len() + 1;
    let nonce_start = salt_start + SALT_SIZE;

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&envelope[salt_start..nonce_start]);
    let nonce = Nonce::from_slice(&envelope[nonce_start..HEADER_SIZE]);

    let key = derive_key(password, &salt, &params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| BackupError::AuthFailure)?;

    cipher
        .decrypt(nonce, &envelope[HEADER_SIZE..])
        .map_err(|_| BackupError::AuthFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_seal_open() {
        let plaintext = b"{\"formatVersion\":2}";

        let envelope = seal(plaintext, "hunter2").unwrap();
        let opened = open(&envelope, "hunter2").unwrap();

        assert_eq!(plaintext, opened.as_slice());
    }

    #[test]
    fn test_envelope_layout() {
        let envelope = seal(b"abc", "pw").unwrap();

        assert!(is_sealed(&envelope));
        assert_eq!(&envelope[..4], b"MBBK");
        assert_eq!(envelope[4], ENVELOPE_VERSION);
        assert_eq!(envelope.len(), HEADER_SIZE + 3 + TAG_SIZE);
    }

    #[test]
    fn test_fresh_salt_and_nonce() {
        let a = seal(b"same plaintext", "pw").unwrap();
        let b = seal(b"same plaintext", "pw").unwrap();

        assert_ne!(a[5..HEADER_SIZE], b[5..HEADER_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_password_fails() {
        let envelope = seal(b"secret", "right").unwrap();
        let err = open(&envelope, "wrong").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthFailure);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let mut envelope = seal(b"secret", "pw").unwrap();
        envelope[HEADER_SIZE] ^= 0xFF;

        let err = open(&envelope, "pw").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthFailure);
    }

    #[test]
    fn test_tampered_salt_fails() {
        let mut envelope = seal(b"secret", "pw").unwrap();
        envelope[6] ^= 0x01;

        assert!(matches!(open(&envelope, "pw"), Err(BackupError::AuthFailure)));
    }

    #[test]
    fn test_truncated_envelope_fails() {
        let envelope = seal(b"secret", "pw").unwrap();

        for len in [0, 4, HEADER_SIZE, envelope.len() - 1] {
            let err = open(&envelope[..len], "pw").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthFailure);
        }
    }

    #[test]
    fn test_unknown_version_fails() {
        let mut envelope = seal(b"secret", "pw").unwrap();
        envelope[4] = 9;

        assert!(matches!(open(&envelope, "pw"), Err(BackupError::AuthFailure)));
    }

    #[test]
    fn test_empty_password_rejected() {
        let err = seal(b"x", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_empty_plaintext() {
        let envelope = seal(b"", "pw").unwrap();
        assert!(open(&envelope, "pw").unwrap().is_empty());
    }

    #[test]
    fn test_plain_json_is_not_sealed() {
        assert!(!is_sealed(b"{\"formatVersion\": 2}"));
        assert!(!is_sealed(b"MBB"));
    }
}
