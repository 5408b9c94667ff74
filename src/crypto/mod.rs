//! Cryptographic functions for MyBrain backups
//!
//! Provides AES-256-GCM envelopes with Argon2id key derivation for
//! optional password protection of exported backups.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{is_sealed, open, seal, ENVELOPE_VERSION, MAGIC};
pub use key_derivation::{derive_key, DerivedKey, KeyDerivationParams};
pub use secure_memory::Password;
