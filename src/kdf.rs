//! Password-based key derivation and verifier computation.
//!
//! Keys are stretched with PBKDF2-HMAC-SHA256 at a fixed iteration count.
//! The iteration count is part of the container format contract: changing it
//! makes every existing container undecryptable, so it is a constant rather
//! than a tunable.
//!
//! # Security Guidelines
//!
//! When handling passwords and derived keys:
//! - Use `SecretString` from the `secrecy` crate for password storage
//! - Keep derived keys inside `Zeroizing` buffers so they are wiped on drop
//! - Ensure salts are cryptographically random and unique per encryption

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::types::{EncBoxError, SALT_LEN};

/// PBKDF2 iteration count. Fixed by the container format.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Length of the derived secret in bytes.
pub const SECRET_LEN: usize = 32;

/// Derive the 32-byte password secret for a container.
///
/// The same derivation feeds both the encryption key and the verification
/// value stored in the container trailer: the two are byte-identical. That
/// equality is load-bearing for compatibility with every container produced
/// so far — a verifier derived any other way would fail to match on decrypt.
/// See DESIGN.md for the consequences and the planned format-versioned fix.
///
/// # Arguments
///
/// * `password` - The password to derive from (securely wrapped)
/// * `salt` - Cryptographically random salt, exactly [`SALT_LEN`] bytes
///
/// # Errors
///
/// Returns `EncBoxError::Invalid` if the salt has the wrong length.
pub fn derive_secret(
    password: &SecretString,
    salt: &[u8],
) -> Result<Zeroizing<[u8; SECRET_LEN]>, EncBoxError> {
    if salt.len() != SALT_LEN {
        return Err(EncBoxError::Invalid("kdf: salt must be exactly 16 bytes"));
    }

    let mut out = Zeroizing::new([0u8; SECRET_LEN]);
    pbkdf2_hmac::<Sha256>(
        password.expose_secret().as_bytes(),
        salt,
        PBKDF2_ITERATIONS,
        out.as_mut(),
    );
    Ok(out)
}
