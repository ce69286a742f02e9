//! Salted scrypt password hashing.
//!
//! Stored hashes have the form `<salt>:<key>`, where `<salt>` is 16 random
//! bytes hex encoded and `<key>` is the 64-byte scrypt output hex encoded.
//! The salt's hex text (not its decoded bytes) is the scrypt salt input.

use crate::error::{ServerError, ServerResult};
use rand::RngCore;
use scrypt::Params;
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 64;
// N = 2^14, r = 8, p = 1
const LOG_N: u8 = 14;
const R: u32 = 8;
const P: u32 = 1;

fn derive(password: &str, salt: &str) -> ServerResult<[u8; KEY_LEN]> {
    let params = Params::new(LOG_N, R, P, KEY_LEN)
        .map_err(|e| ServerError::Internal(format!("scrypt params: {e}")))?;
    let mut key = [0u8; KEY_LEN];
    scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut key)
        .map_err(|e| ServerError::Internal(format!("scrypt: {e}")))?;
    Ok(key)
}

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> ServerResult<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    let key = derive(password, &salt)?;
    Ok(format!("{}:{}", salt, hex::encode(key)))
}

/// Checks a password against a stored hash.
///
/// Malformed stored hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, key_hex)) = stored.split_once(':') else {
        return false;
    };
    let Ok(expected) = hex::decode(key_hex) else {
        return false;
    };
    match derive(password, salt) {
        Ok(derived) => derived.as_slice().ct_eq(&expected).into(),
        Err(_) => false,
    }
}

/// Runs the same key derivation as [`verify_password`] against a fixed salt
/// and always returns false.
///
/// Login calls this for unknown accounts so they take as long as a wrong
/// password.
pub fn verify_unknown_account(password: &str) -> bool {
    const UNKNOWN_SALT: &str = "00000000000000000000000000000000";
    let _ = derive(password, UNKNOWN_SALT);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let stored = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn hash_format() {
        let stored = hash_password("pw").unwrap();
        let (salt, key) = stored.split_once(':').unwrap();
        assert_eq!(salt.len(), SALT_LEN * 2);
        assert_eq!(key.len(), KEY_LEN * 2);
    }

    #[test]
    fn salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hashes_fail() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "no-colon"));
        assert!(!verify_password("pw", "abcd:not-hex"));
        assert!(!verify_password("pw", "abcd:00ff"));
    }

    #[test]
    fn unknown_account_check_never_matches() {
        assert!(!verify_unknown_account("password"));
        assert!(!verify_unknown_account(""));
    }
}
