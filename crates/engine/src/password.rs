//! Password rules and salted password hashes.
//!
//! Stored hashes look like `sha256$<salt hex>$<digest hex>`, the digest
//! being `SHA-256(salt || password)` with a random 16 byte salt.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{EngineError, ResultEngine};

pub(crate) const MIN_PASSWORD_LENGTH: usize = 3;

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Rejects passwords that are too short or contain the username.
pub(crate) fn validate_password(username: &str, password: &str) -> ResultEngine<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(EngineError::InvalidPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.contains(username) {
        return Err(EngineError::InvalidPassword(
            "password must not contain the username".to_string(),
        ));
    }
    Ok(())
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

pub(crate) fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!(
        "{SCHEME}${}${}",
        hex::encode(salt),
        hex::encode(digest(&salt, password))
    )
}

/// Checks `password` against a hash made by [`hash_password`]. Malformed
/// hashes never verify.
pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    let actual = digest(&salt, password);
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(&expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_same_password() {
        let stored = hash_password("hunter2");

        assert!(stored.starts_with("sha256$"));
        assert!(!stored.contains("hunter2"));
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        let first = hash_password("secret");
        let second = hash_password("secret");

        assert_ne!(first, second);
        assert!(verify_password("secret", &first));
        assert!(verify_password("secret", &second));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("secret", "secret"));
        assert!(!verify_password("secret", "sha256$zz$zz"));
        assert!(!verify_password("secret", "md5$00$00"));
        assert!(!verify_password("secret", "sha256$00$00$00"));
    }

    #[test]
    fn validate_password_rules() {
        assert_eq!(validate_password("alice", "pwd"), Ok(()));
        assert_eq!(
            validate_password("alice", "pw"),
            Err(EngineError::InvalidPassword(
                "password must be at least 3 characters".to_string()
            ))
        );
        assert_eq!(
            validate_password("alice", "my-alice-pass"),
            Err(EngineError::InvalidPassword(
                "password must not contain the username".to_string()
            ))
        );
    }
}
