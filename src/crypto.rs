//! Core encryption and decryption primitives.

use aes_gcm::Aes256Gcm;
use aes_gcm::aead::{Aead, KeyInit};
use chacha20poly1305::ChaCha20Poly1305;
use getrandom::fill as getrandom;

use crate::types::{AeadAlg, EncBoxError, NONCE_LEN, SALT_LEN};

/// Generate a cryptographically secure random nonce.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN], EncBoxError> {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom(&mut nonce).map_err(|_| EncBoxError::Crypto)?;
    Ok(nonce)
}

/// Generate a cryptographically secure random salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN], EncBoxError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom(&mut salt).map_err(|_| EncBoxError::Crypto)?;
    Ok(salt)
}

/// Encrypt plaintext using AEAD with the specified algorithm, key, and nonce.
///
/// # Arguments
///
/// * `alg` - The AEAD algorithm to use
/// * `key` - 32-byte encryption key
/// * `nonce` - 12-byte nonce, fresh for this container
/// * `plaintext` - Data to encrypt
///
/// # Returns
///
/// Ciphertext with the 16-byte authentication tag appended.
pub fn aead_encrypt(
    alg: AeadAlg,
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, EncBoxError> {
    match alg {
        AeadAlg::AesGcm => {
            let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncBoxError::Crypto)?;
            cipher
                .encrypt(aes_gcm::Nonce::from_slice(nonce), plaintext)
                .map_err(|_| EncBoxError::Crypto)
        }
        AeadAlg::ChaCha20Poly1305 => {
            let cipher =
                ChaCha20Poly1305::new_from_slice(key).map_err(|_| EncBoxError::Crypto)?;
            cipher
                .encrypt(chacha20poly1305::Nonce::from_slice(nonce), plaintext)
                .map_err(|_| EncBoxError::Crypto)
        }
    }
}

/// Decrypt ciphertext using AEAD with the specified algorithm, key, and nonce.
///
/// # Arguments
///
/// * `alg` - The AEAD algorithm to use
/// * `key` - 32-byte decryption key (same as used for encryption)
/// * `nonce` - 12-byte nonce from the container
/// * `cipher_and_tag` - Ciphertext with the authentication tag appended
///
/// # Returns
///
/// Decrypted plaintext if authentication succeeds.
///
/// # Errors
///
/// Returns `EncBoxError::Corrupted` if the tag does not verify. Callers only
/// reach this point after the password verifier has matched, so a failure
/// here means bit-level tampering or corruption, not a wrong password.
pub fn aead_decrypt(
    alg: AeadAlg,
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    cipher_and_tag: &[u8],
) -> Result<Vec<u8>, EncBoxError> {
    match alg {
        AeadAlg::AesGcm => {
            let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncBoxError::Crypto)?;
            cipher
                .decrypt(aes_gcm::Nonce::from_slice(nonce), cipher_and_tag)
                .map_err(|_| EncBoxError::Corrupted)
        }
        AeadAlg::ChaCha20Poly1305 => {
            let cipher =
                ChaCha20Poly1305::new_from_slice(key).map_err(|_| EncBoxError::Crypto)?;
            cipher
                .decrypt(chacha20poly1305::Nonce::from_slice(nonce), cipher_and_tag)
                .map_err(|_| EncBoxError::Corrupted)
        }
    }
}
