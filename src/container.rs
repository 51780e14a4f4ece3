//! On-wire container layout: encode and decode.
//!
//! A container is a single byte string laid out as
//!
//! ```text
//! [ alg (1) | salt (16) | nonce (12) | expiry (8, optional) | ciphertext‖tag | verifier (32) ]
//! ```
//!
//! There is no presence flag for the expiry field. Whether it exists is
//! decided at decode time by a plausibility heuristic: the 8 bytes after the
//! nonce are read as a tick count, and accepted as a deadline only when they
//! decode to an instant within about a century of now. Ciphertext bytes can
//! defeat this with low probability. The layout predates this crate and is
//! kept bit-for-bit; removing the ambiguity means a new format version, not
//! a quiet change here.

use crate::expiry;
use crate::types::{
    AeadAlg, EXPIRY_LEN, EncBoxError, MIN_CONTAINER_LEN, NONCE_LEN, SALT_LEN, TAG_LEN,
    VERIFIER_LEN,
};

/// Parsed container fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub alg: AeadAlg,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Raw expiration field, when one was written (or detected).
    pub expiry: Option<[u8; EXPIRY_LEN]>,
    /// AEAD output: ciphertext with the 16-byte tag appended.
    pub cipher_and_tag: Vec<u8>,
    /// Password verification value from the container trailer.
    pub verifier: [u8; VERIFIER_LEN],
}

impl Container {
    /// Serialize the fields in wire order. An absent expiry contributes no
    /// bytes at all; container length varies accordingly.
    pub fn encode(&self) -> Vec<u8> {
        let expiry_len = if self.expiry.is_some() { EXPIRY_LEN } else { 0 };
        let mut out = Vec::with_capacity(
            1 + SALT_LEN + NONCE_LEN + expiry_len + self.cipher_and_tag.len() + VERIFIER_LEN,
        );
        out.push(self.alg.tag());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        if let Some(expiry) = &self.expiry {
            out.extend_from_slice(expiry);
        }
        out.extend_from_slice(&self.cipher_and_tag);
        out.extend_from_slice(&self.verifier);
        out
    }

    /// Parse a container from raw bytes.
    ///
    /// # Errors
    ///
    /// `EncBoxError::Malformed` when the input is shorter than
    /// [`MIN_CONTAINER_LEN`]; `EncBoxError::UnsupportedAlgorithm` when the
    /// tag byte is outside the closed algorithm set.
    pub fn decode(bytes: &[u8]) -> Result<Self, EncBoxError> {
        if bytes.len() < MIN_CONTAINER_LEN {
            return Err(EncBoxError::Malformed);
        }

        let alg = AeadAlg::from_tag(bytes[0])?;

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[1..1 + SALT_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[1 + SALT_LEN..1 + SALT_LEN + NONCE_LEN]);
        let mut verifier = [0u8; VERIFIER_LEN];
        verifier.copy_from_slice(&bytes[bytes.len() - VERIFIER_LEN..]);

        // Middle segment between nonce and verifier: possibly an expiry
        // field, then ciphertext‖tag.
        let middle = &bytes[1 + SALT_LEN + NONCE_LEN..bytes.len() - VERIFIER_LEN];

        let (expiry, cipher_and_tag) = match Self::split_expiry(middle) {
            Some((field, rest)) => (Some(field), rest.to_vec()),
            None => (None, middle.to_vec()),
        };

        Ok(Container {
            alg,
            salt,
            nonce,
            expiry,
            cipher_and_tag,
            verifier,
        })
    }

    /// Apply the presence heuristic to the middle segment.
    ///
    /// The leading 8 bytes count as an expiry field only when (a) enough
    /// bytes remain afterwards to hold at least an AEAD tag, and (b) they
    /// decode to a date-like tick count.
    fn split_expiry(middle: &[u8]) -> Option<([u8; EXPIRY_LEN], &[u8])> {
        if middle.len() < EXPIRY_LEN + TAG_LEN {
            return None;
        }
        let mut field = [0u8; EXPIRY_LEN];
        field.copy_from_slice(&middle[..EXPIRY_LEN]);
        if expiry::looks_like_deadline(&field) {
            Some((field, &middle[EXPIRY_LEN..]))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    fn sample(expiry: Option<[u8; EXPIRY_LEN]>, ct_len: usize) -> Container {
        Container {
            alg: AeadAlg::ChaCha20Poly1305,
            salt: [0xA1; SALT_LEN],
            nonce: [0xB2; NONCE_LEN],
            expiry,
            cipher_and_tag: vec![0x5C; ct_len + TAG_LEN],
            verifier: [0xD4; VERIFIER_LEN],
        }
    }

    #[test]
    fn too_short_is_malformed() {
        for len in [0, 1, 48, MIN_CONTAINER_LEN - 1] {
            let bytes = vec![0u8; len];
            assert!(matches!(
                Container::decode(&bytes),
                Err(EncBoxError::Malformed)
            ));
        }
    }

    #[test]
    fn unknown_tag_byte_is_rejected() {
        let mut bytes = sample(None, 10).encode();
        bytes[0] = 7;
        assert!(matches!(
            Container::decode(&bytes),
            Err(EncBoxError::UnsupportedAlgorithm(7))
        ));
    }

    #[test]
    fn round_trip_without_expiry() {
        let c = sample(None, 100);
        let decoded = Container::decode(&c.encode()).unwrap();
        assert_eq!(decoded, c);
    }

    #[test]
    fn round_trip_with_expiry() {
        let field = expiry::encode_deadline(Utc::now() + TimeDelta::days(3)).unwrap();
        let c = sample(Some(field), 100);
        let decoded = Container::decode(&c.encode()).unwrap();
        assert_eq!(decoded, c);
    }

    #[test]
    fn field_offsets_match_wire_layout() {
        let c = sample(None, 4);
        let bytes = c.encode();
        assert_eq!(bytes.len(), MIN_CONTAINER_LEN + 4);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..17], &[0xA1; 16]);
        assert_eq!(&bytes[17..29], &[0xB2; 12]);
        assert_eq!(&bytes[bytes.len() - 32..], &[0xD4; 32]);
    }

    #[test]
    fn zero_ciphertext_bytes_not_mistaken_for_expiry() {
        // All-zero leading ciphertext decodes to year 1, far outside the
        // plausibility window.
        let mut c = sample(None, 64);
        c.cipher_and_tag = vec![0u8; 64 + TAG_LEN];
        let decoded = Container::decode(&c.encode()).unwrap();
        assert!(decoded.expiry.is_none());
        assert_eq!(decoded.cipher_and_tag.len(), 64 + TAG_LEN);
    }

    #[test]
    fn short_middle_segment_never_claims_expiry() {
        // Empty plaintext with a deadline: middle is exactly expiry + tag.
        let field = expiry::encode_deadline(Utc::now() + TimeDelta::days(1)).unwrap();
        let c = sample(Some(field), 0);
        let decoded = Container::decode(&c.encode()).unwrap();
        assert_eq!(decoded.expiry, Some(field));

        // Without a deadline the same lengths must not strip 8 bytes.
        let c = sample(None, 0);
        let decoded = Container::decode(&c.encode()).unwrap();
        assert!(decoded.expiry.is_none());
    }
}
