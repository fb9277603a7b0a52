//! Password hashing via bcrypt.
//!
//! `bcrypt::verify` compares digests in constant time, so a caller learns
//! nothing from how long a mismatch takes.

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt (cost 10, random salt).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// A malformed hash counts as a mismatch rather than an error: the caller
/// only ever needs a yes/no answer for a credential check.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("password").unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("password", &hash));
        assert!(!verify_password("Password", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("password").unwrap();
        let b = hash_password("password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("password", "not-a-bcrypt-hash"));
    }
}
