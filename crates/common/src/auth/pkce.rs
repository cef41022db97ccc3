//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 so the client never needs the confidential client
//! secret: the verifier stays in the client's session store and only its
//! SHA-256 challenge travels through the browser redirect.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use nowplaying_domain::constants::PKCE_CHALLENGE_METHOD;

/// Minimum verifier length allowed by RFC 7636.
pub const MIN_VERIFIER_LEN: usize = 43;

/// Maximum verifier length allowed by RFC 7636.
pub const MAX_VERIFIER_LEN: usize = 128;

const VERIFIER_ENTROPY_BYTES: usize = 32;

/// Generate a cryptographically secure code verifier
///
/// Returns 32 bytes from the thread-local CSPRNG encoded as base64url without
/// padding, which is exactly 43 characters.
#[must_use]
pub fn generate_code_verifier() -> String {
    let mut random_bytes = [0u8; VERIFIER_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Generate code challenge from verifier using SHA256
///
/// `BASE64URL(SHA256(ASCII(code_verifier)))` with padding stripped. Pure and
/// deterministic.
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Check that a verifier has an RFC 7636 length and alphabet.
///
/// The unreserved alphabet is `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`.
#[must_use]
pub fn is_valid_code_verifier(verifier: &str) -> bool {
    (MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&verifier.len())
        && verifier.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

/// PKCE verifier/challenge pair for one authorization attempt.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Kept secret in the session store until token exchange.
    pub code_verifier: String,

    /// Sent in the authorization request.
    pub code_challenge: String,
}

impl PkceChallenge {
    /// Generate a new verifier and derive its challenge.
    ///
    /// # Examples
    /// ```
    /// use nowplaying_common::auth::pkce::PkceChallenge;
    ///
    /// let challenge = PkceChallenge::generate();
    /// assert!(challenge.code_verifier.len() >= 43);
    /// assert!(challenge.code_verifier.len() <= 128);
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);
        Self { code_verifier, code_challenge }
    }

    /// Get the challenge method (always "S256" for SHA256)
    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        PKCE_CHALLENGE_METHOD
    }
}
