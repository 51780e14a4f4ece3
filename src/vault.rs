//! Encrypt/decrypt orchestration.
//!
//! [`Vault`] wires the codec, the KDF, the AEAD dispatch, the expiration
//! guard, and the attempt tracker into the two operations callers actually
//! use. The decrypt pipeline is strictly ordered: lockout gate, container
//! decode, password verification, expiration check, AEAD decryption, tracker
//! reset. A blocked identifier must never reach password verification, and
//! expiration is only revealed once the password is known to be correct.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::container::Container;
use crate::crypto::{aead_encrypt, aead_decrypt, generate_nonce, generate_salt};
use crate::expiry;
use crate::kdf::derive_secret;
use crate::lockout::{AttemptTracker, Sweeper};
use crate::types::{AeadAlg, EncBoxError, VaultConfig};

/// A process-wide encryption service instance.
///
/// Holds the lockout state shared across all decrypt calls. Clone-cheap via
/// the inner `Arc`s is intentionally not provided; share the `Vault` itself
/// (or the tracker) behind an `Arc` where concurrent callers need it.
pub struct Vault {
    config: VaultConfig,
    tracker: Arc<AttemptTracker>,
    _sweeper: Option<Sweeper>,
}

impl Vault {
    /// Create a vault with its own tracker and a running background sweeper.
    pub fn new(config: VaultConfig) -> Result<Self, EncBoxError> {
        let tracker = Arc::new(AttemptTracker::new(
            config.max_attempts,
            config.lockout_duration,
        ));
        let sweeper = Sweeper::spawn(Arc::clone(&tracker), config.sweep_interval)?;
        Ok(Self {
            config,
            tracker,
            _sweeper: Some(sweeper),
        })
    }

    /// Create a vault around an externally owned tracker.
    ///
    /// No sweeper is spawned; the owner of the tracker decides when (or
    /// whether) [`AttemptTracker::sweep`] runs.
    pub fn with_tracker(config: VaultConfig, tracker: Arc<AttemptTracker>) -> Self {
        Self {
            config,
            tracker,
            _sweeper: None,
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<AttemptTracker> {
        &self.tracker
    }

    /// Encrypt `plaintext` into a self-describing container.
    ///
    /// A fresh salt and nonce are generated per call; encrypting the same
    /// input twice never reuses either. `deadline`, when given, must be
    /// strictly in the future and is embedded as the optional expiration
    /// field.
    ///
    /// # Errors
    ///
    /// `EncBoxError::Invalid` for an empty or too-short password or a
    /// non-future deadline.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        password: &SecretString,
        alg: AeadAlg,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Vec<u8>, EncBoxError> {
        let pw = password.expose_secret();
        if pw.is_empty() {
            return Err(EncBoxError::Invalid("password must not be empty"));
        }
        if pw.chars().count() < self.config.min_password_len {
            return Err(EncBoxError::Invalid(
                "password must be at least 8 characters",
            ));
        }

        let expiry = deadline.map(expiry::encode_deadline).transpose()?;

        let salt = generate_salt()?;
        let nonce = generate_nonce()?;
        let secret = derive_secret(password, &salt)?;

        let cipher_and_tag = aead_encrypt(alg, &secret, &nonce, plaintext)?;

        let container = Container {
            alg,
            salt,
            nonce,
            expiry,
            cipher_and_tag,
            // Same bytes as the encryption key; fixed by the format.
            verifier: *secret,
        };
        Ok(container.encode())
    }

    /// Decrypt a container, enforcing the lockout policy for `identifier`.
    ///
    /// # Errors
    ///
    /// - `Blocked` when the identifier is locked out (returned before any
    ///   cryptographic work, and again when this call exhausts the attempts)
    /// - `Malformed` for containers that cannot be parsed, including unknown
    ///   algorithm tags
    /// - `InvalidPassword` on verifier mismatch (records a failed attempt)
    /// - `Expired` once a correctly passworded container is past its deadline
    /// - `Corrupted` when AEAD authentication fails after the password
    ///   checked out; this does not count against the attempt limit
    pub fn decrypt(
        &self,
        bytes: &[u8],
        password: &SecretString,
        identifier: &str,
    ) -> Result<Vec<u8>, EncBoxError> {
        if password.expose_secret().is_empty() {
            return Err(EncBoxError::Invalid("password must not be empty"));
        }

        if self.tracker.is_blocked(identifier) {
            debug!("decrypt gate: identifier {identifier:?} is blocked");
            return Err(EncBoxError::Blocked {
                remaining: self.tracker.remaining_block_time(identifier),
            });
        }

        let container = Container::decode(bytes).map_err(|e| match e {
            EncBoxError::UnsupportedAlgorithm(_) => EncBoxError::Malformed,
            other => other,
        })?;

        let secret = derive_secret(password, &container.salt)?;
        if !bool::from(secret[..].ct_eq(&container.verifier[..])) {
            return Err(self.register_failure(identifier));
        }

        expiry::check_expired(container.expiry.as_ref())?;

        let plaintext = aead_decrypt(
            container.alg,
            &secret,
            &container.nonce,
            &container.cipher_and_tag,
        )?;

        self.tracker.reset(identifier);
        Ok(plaintext)
    }

    /// Account for a wrong password and pick the caller-visible error:
    /// `InvalidPassword` with the attempts left, or `Blocked` once this
    /// failure was the one that crossed the limit.
    fn register_failure(&self, identifier: &str) -> EncBoxError {
        self.tracker.record_failure(identifier);
        if self.tracker.is_blocked(identifier) {
            EncBoxError::Blocked {
                remaining: self.tracker.remaining_block_time(identifier),
            }
        } else {
            let used = self.tracker.attempt_count(identifier);
            EncBoxError::InvalidPassword {
                remaining: self.config.max_attempts.saturating_sub(used),
            }
        }
    }
}
