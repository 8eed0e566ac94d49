//! Token codec: derives opaque access and refresh tokens.
//!
//! Each token is two HMAC-SHA256 digests keyed by the server secret key,
//! rendered as lowercase hex and concatenated:
//!
//! - access token: `mac(sha256(uid) | public_key | secret | now | nonce)`
//!   followed by `mac(now | token_ttl | uid | nonce)`
//! - refresh token: `mac(uid | public_key | sha256(secret) | now | nonce)`
//!   followed by `mac(uid | refresh_ttl | nonce)`
//!
//! The codec is pure: identical inputs, nonce included, give identical
//! tokens. Callers draw a fresh nonce per issuance with [`generate_nonce`].

use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use st_shared::config::TokenConfig;

use crate::errors::DomainError;

type HmacSha256 = Hmac<Sha256>;

/// Length of the per-issuance nonce in bytes
pub const NONCE_LEN: usize = 16;

/// Hex length of one digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Hex length of an access or refresh token
pub const TOKEN_HEX_LEN: usize = 2 * DIGEST_HEX_LEN;

/// Separates MAC input fields so that distinct field splits never produce
/// the same byte stream
const FIELD_SEPARATOR: u8 = 0x1f;

/// Per-issuance inputs to the codec
#[derive(Debug, Clone, Copy)]
pub struct TokenInput<'a> {
    pub uid: &'a str,
    /// Credential-derived secret material; never logged
    pub secret: &'a str,
    /// Epoch seconds of issuance
    pub issued_at: i64,
    pub nonce: &'a [u8; NONCE_LEN],
}

/// Generates token pairs from the server key material
#[derive(Clone)]
pub struct TokenCodec {
    public_key: String,
    secret_key: Vec<u8>,
    token_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenCodec {
    /// Create a codec from token configuration
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            public_key: config.public_key.clone(),
            secret_key: config.secret_key.as_bytes().to_vec(),
            token_ttl_seconds: config.token_ttl_seconds,
            refresh_ttl_seconds: config.refresh_ttl_seconds,
        }
    }

    /// Derive the access token for `input`
    pub fn access_token(&self, input: &TokenInput<'_>) -> Result<String, DomainError> {
        let now = input.issued_at.to_string();
        let ttl = self.token_ttl_seconds.to_string();
        let uid_hash = sha256_hex(input.uid);

        let head = self.mac_hex(&[
            uid_hash.as_bytes(),
            self.public_key.as_bytes(),
            input.secret.as_bytes(),
            now.as_bytes(),
            input.nonce,
        ])?;
        let tail = self.mac_hex(&[now.as_bytes(), ttl.as_bytes(), input.uid.as_bytes(), input.nonce])?;

        Ok(head + &tail)
    }

    /// Derive the refresh token for `input`
    pub fn refresh_token(&self, input: &TokenInput<'_>) -> Result<String, DomainError> {
        let now = input.issued_at.to_string();
        let ttl = self.refresh_ttl_seconds.to_string();
        let secret_hash = sha256_hex(input.secret);

        let head = self.mac_hex(&[
            input.uid.as_bytes(),
            self.public_key.as_bytes(),
            secret_hash.as_bytes(),
            now.as_bytes(),
            input.nonce,
        ])?;
        let tail = self.mac_hex(&[input.uid.as_bytes(), ttl.as_bytes(), input.nonce])?;

        Ok(head + &tail)
    }

    /// Derive both tokens as `(access, refresh)`
    pub fn generate_pair(&self, input: &TokenInput<'_>) -> Result<(String, String), DomainError> {
        Ok((self.access_token(input)?, self.refresh_token(input)?))
    }

    fn mac_hex(&self, fields: &[&[u8]]) -> Result<String, DomainError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret_key).map_err(|_| {
            DomainError::Internal {
                message: "Failed to initialize token MAC".to_string(),
            }
        })?;

        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                mac.update(&[FIELD_SEPARATOR]);
            }
            mac.update(field);
        }

        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish_non_exhaustive()
    }
}

/// Draw a nonce from the operating system RNG
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// SHA-256 of `value` as lowercase hex
pub fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: [u8; NONCE_LEN] = [7u8; NONCE_LEN];

    fn codec() -> TokenCodec {
        TokenCodec::new(&TokenConfig::new("public", "secret", 3600, 86400))
    }

    fn input<'a>(uid: &'a str, secret: &'a str, at: i64, nonce: &'a [u8; NONCE_LEN]) -> TokenInput<'a> {
        TokenInput {
            uid,
            secret,
            issued_at: at,
            nonce,
        }
    }

    fn is_lower_hex(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn test_fixed_length_hex_output() {
        let (token, refresh) = codec().generate_pair(&input("u1", "pw", 0, &NONCE)).unwrap();

        assert_eq!(token.len(), TOKEN_HEX_LEN);
        assert_eq!(refresh.len(), TOKEN_HEX_LEN);
        assert!(is_lower_hex(&token));
        assert!(is_lower_hex(&refresh));
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let a = codec().generate_pair(&input("u1", "pw", 1000, &NONCE)).unwrap();
        let b = codec().generate_pair(&input("u1", "pw", 1000, &NONCE)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_access_and_refresh_differ() {
        let (token, refresh) = codec().generate_pair(&input("u1", "pw", 1000, &NONCE)).unwrap();
        assert_ne!(token, refresh);
    }

    #[test]
    fn test_every_input_changes_the_token() {
        let base = codec().access_token(&input("u1", "pw", 1000, &NONCE)).unwrap();
        let other_nonce = [8u8; NONCE_LEN];

        assert_ne!(base, codec().access_token(&input("u2", "pw", 1000, &NONCE)).unwrap());
        assert_ne!(base, codec().access_token(&input("u1", "pw2", 1000, &NONCE)).unwrap());
        assert_ne!(base, codec().access_token(&input("u1", "pw", 1001, &NONCE)).unwrap());
        assert_ne!(base, codec().access_token(&input("u1", "pw", 1000, &other_nonce)).unwrap());
    }

    #[test]
    fn test_secret_key_changes_the_token() {
        let other = TokenCodec::new(&TokenConfig::new("public", "another-secret", 3600, 86400));
        let i = input("u1", "pw", 1000, &NONCE);
        assert_ne!(codec().access_token(&i).unwrap(), other.access_token(&i).unwrap());
        assert_ne!(codec().refresh_token(&i).unwrap(), other.refresh_token(&i).unwrap());
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        // "u1" + "2pw" and "u12" + "pw" concatenate identically without a separator
        let a = codec().refresh_token(&input("u1", "2pw", 5, &NONCE)).unwrap();
        let b = codec().refresh_token(&input("u12", "pw", 5, &NONCE)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generated_nonces_differ() {
        assert_ne!(generate_nonce(), generate_nonce());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let rendered = format!("{:?}", codec());
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("public"));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
