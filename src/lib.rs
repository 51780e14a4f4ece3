#![forbid(unsafe_code)]
//! # encbox — password-based authenticated file encryption.
//!
//! `encbox` encrypts byte buffers or files into self-describing containers:
//! a password is stretched with PBKDF2-HMAC-SHA256, the payload is sealed
//! with an AEAD cipher (AES-256-GCM or ChaCha20-Poly1305), and the container
//! carries everything needed to decrypt it again — except the password.
//!
//! ## Features
//! - **Byte array and file encryption/decryption**
//! - **Two AEAD algorithms**: AES-256-GCM (default), ChaCha20-Poly1305
//! - **Optional expiration**: containers can carry an absolute deadline
//!   after which decryption is refused
//! - **Brute-force lockout**: repeated wrong-password attempts against the
//!   same identifier are blocked for a configurable window
//!
//! ## Example: Encrypt and decrypt a byte array
//! ```no_run
//! use encbox::{AeadAlg, Vault, VaultConfig};
//! use secrecy::SecretString;
//!
//! let vault = Vault::new(VaultConfig::default()).unwrap();
//! let password = SecretString::new("correcthorse".into());
//!
//! let container = vault
//!     .encrypt(b"Hello, world!", &password, AeadAlg::AesGcm, None)
//!     .unwrap();
//! let plaintext = vault.decrypt(&container, &password, "hello.txt").unwrap();
//! assert_eq!(plaintext, b"Hello, world!");
//! ```
//!
//! See function-level documentation for more details.
//!
//! Safety notes
//! - The crate is not audited or reviewed! Protects data at rest. Does not defend against compromised hosts/side channels.
//! - Lockout state is in-memory only; a process restart clears it.

mod container;
mod crypto;
mod expiry;
mod file;
mod kdf;
mod lockout;
mod types;
mod vault;

// Re-export public API from modules
pub use container::Container;
pub use crypto::{aead_decrypt, aead_encrypt, generate_nonce, generate_salt};
pub use expiry::{check_expired, encode_deadline, looks_like_deadline};
pub use file::{
    ENC_EXT, decrypt_file, default_decrypt_output_path, default_encrypt_output_path, encrypt_file,
    write_all_atomic,
};
pub use kdf::{PBKDF2_ITERATIONS, derive_secret};
pub use lockout::{AttemptTracker, Sweeper};
pub use types::*;
pub use vault::Vault;
