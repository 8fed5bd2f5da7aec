use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Newtype for password to prevent accidental logging
#[derive(Debug, Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Newtype for password hash
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password using Argon2id.
///
/// Salt is generated per call and embedded in the hash string.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Verify a password against a stored hash.
///
/// Fails closed: a malformed hash verifies as `false` rather than erroring.
/// The underlying comparison is constant-time.
pub fn verify_password(password: &Password, password_hash: &PasswordHashString) -> bool {
    match PasswordHash::new(password_hash.as_str()) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_str().as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(!hash.as_str().is_empty());
        assert!(hash.as_str().starts_with("$argon2"));
    }

    #[test]
    fn test_verify_password_correct() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(verify_password(&password, &hash));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        let wrong_password = Password::new("wrongPassword".to_string());
        assert!(!verify_password(&wrong_password, &hash));
    }

    #[test]
    fn test_verify_fails_closed_on_malformed_hash() {
        let password = Password::new("mySecurePassword123".to_string());
        let garbage = PasswordHashString::new("not-a-phc-string".to_string());

        assert!(!verify_password(&password, &garbage));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash1 = hash_password(&password).expect("Failed to hash password");
        let hash2 = hash_password(&password).expect("Failed to hash password");

        // Random salts mean distinct hash strings that both verify.
        assert_ne!(hash1.as_str(), hash2.as_str());
        assert!(verify_password(&password, &hash1));
        assert!(verify_password(&password, &hash2));
    }
}
