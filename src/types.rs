//! Core types, constants, and the library error enum.

use std::time::Duration;

use thiserror::Error;

/// Salt length in bytes (input to key derivation).
pub const SALT_LEN: usize = 16;

/// Nonce length in bytes (both supported AEADs use 96-bit nonces).
pub const NONCE_LEN: usize = 12;

/// AEAD authentication tag length (16 bytes for both supported algorithms).
pub const TAG_LEN: usize = 16;

/// Length of the password verification value stored in a container.
pub const VERIFIER_LEN: usize = 32;

/// Length of the optional expiration field (little-endian tick count).
pub const EXPIRY_LEN: usize = 8;

/// Smallest well-formed container: tag byte, salt, nonce, empty
/// ciphertext with its AEAD tag, and the trailing verifier.
pub const MIN_CONTAINER_LEN: usize = 1 + SALT_LEN + NONCE_LEN + TAG_LEN + VERIFIER_LEN;

/// Supported AEAD algorithms.
///
/// The discriminants are the on-wire tag bytes; they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AeadAlg {
    /// AES-256-GCM (12-byte nonces). Default.
    #[default]
    AesGcm = 0,
    /// ChaCha20-Poly1305 (12-byte nonces).
    ChaCha20Poly1305 = 1,
}

impl AeadAlg {
    /// Parse the tag byte stored in a container. Unknown bytes are a hard
    /// error; the closed two-member set never grows silently.
    pub fn from_tag(tag: u8) -> Result<Self, EncBoxError> {
        match tag {
            0 => Ok(AeadAlg::AesGcm),
            1 => Ok(AeadAlg::ChaCha20Poly1305),
            other => Err(EncBoxError::UnsupportedAlgorithm(other)),
        }
    }

    /// Map a caller-supplied selector string to an algorithm.
    ///
    /// Anything other than the exact `"ChaCha20-Poly1305"` label falls back
    /// to AES-GCM. Existing clients rely on this lenient default, so it is
    /// not an error (the strict path is [`AeadAlg::from_tag`]).
    pub fn from_label(label: &str) -> Self {
        match label {
            "ChaCha20-Poly1305" => AeadAlg::ChaCha20Poly1305,
            _ => AeadAlg::AesGcm,
        }
    }

    /// The byte written into the container header.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Tunable limits for the decrypt path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultConfig {
    /// Failed password attempts tolerated per identifier before lockout.
    pub max_attempts: u32,
    /// How long an identifier stays blocked once attempts are exhausted.
    pub lockout_duration: Duration,
    /// Interval between background sweeps of stale lockout records.
    pub sweep_interval: Duration,
    /// Minimum password length accepted for encryption.
    pub min_password_len: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
            min_password_len: 8,
        }
    }
}

/// Library error type (no panics for expected failures).
#[derive(Error, Debug)]
pub enum EncBoxError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    #[error("encryption/decryption failure")]
    Crypto,
    #[error("malformed container")]
    Malformed,
    #[error("unsupported AEAD algorithm id {0}")]
    UnsupportedAlgorithm(u8),
    #[error("wrong password ({remaining} attempts remaining)")]
    InvalidPassword { remaining: u32 },
    #[error("too many failed attempts; retry in {} seconds", remaining.as_secs())]
    Blocked { remaining: Duration },
    #[error("container failed authentication; data is corrupted")]
    Corrupted,
    #[error("container has expired")]
    Expired,
}
