//! Passcode gate and player keys.
//!
//! Joining the event requires the shared passcode. A successful join mints
//! a random player key that the caller keeps and presents on every
//! mutation; the server stores only an Argon2id hash of it.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

use crate::error::ExchangeError;

/// Player-key length in random bytes.
pub const PLAYER_KEY_BYTES: usize = 32;

// Inputs are either 256-bit random keys or a passcode held only in memory.
const HASH_MEMORY_KIB: u32 = 1024;
const HASH_ITERATIONS: u32 = 1;
const HASH_LANES: u32 = 1;

fn hasher() -> Result<Argon2<'static>, ExchangeError> {
    let params = Params::new(HASH_MEMORY_KIB, HASH_ITERATIONS, HASH_LANES, None)
        .map_err(|e| ExchangeError::Internal(format!("argon2 params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_secret(secret: &[u8]) -> Result<String, ExchangeError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| ExchangeError::Internal(format!("salt encoding: {e}")))?;
    let hash = hasher()?
        .hash_password(secret, &salt)
        .map_err(|e| ExchangeError::Internal(format!("hashing failed: {e}")))?;
    Ok(hash.to_string())
}

fn verify_secret(secret: &[u8], hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(secret, &parsed).is_ok()
}

/// Caller-held secret authorizing mutations for one participant.
///
/// Stands in for a session: whoever holds the key acts as that participant.
#[derive(Clone, PartialEq, Eq)]
pub struct PlayerKey(String);

impl PlayerKey {
    /// Mints a fresh key: [`PLAYER_KEY_BYTES`] random bytes, base64url.
    #[must_use]
    pub fn mint() -> Self {
        let mut bytes = [0u8; PLAYER_KEY_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wraps a key received from a caller.
    #[must_use]
    pub fn from_string(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key. Only for handing it back to its owner.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Hashes the key for storage.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Internal`] if hashing fails.
    pub fn hash(&self) -> Result<String, ExchangeError> {
        hash_secret(self.0.as_bytes())
    }

    /// Checks the key against a stored hash.
    #[must_use]
    pub fn verify(&self, stored_hash: &str) -> bool {
        verify_secret(self.0.as_bytes(), stored_hash)
    }
}

impl std::fmt::Debug for PlayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PlayerKey(***)")
    }
}

/// Holds the event passcode as a hash and checks join attempts against it.
#[derive(Clone)]
pub struct PasscodeGate {
    hash: String,
}

impl PasscodeGate {
    /// Builds a gate for the given passcode.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Internal`] if hashing fails.
    pub fn new(passcode: &str) -> Result<Self, ExchangeError> {
        Ok(Self {
            hash: hash_secret(passcode.as_bytes())?,
        })
    }

    /// Returns `true` if `candidate` is the passcode.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        verify_secret(candidate.as_bytes(), &self.hash)
    }
}

impl std::fmt::Debug for PasscodeGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasscodeGate").finish_non_exhaustive()
    }
}
