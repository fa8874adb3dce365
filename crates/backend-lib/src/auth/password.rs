// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng}, Params, Scrypt};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Floor for the configurable scrypt work factor (log2 of the cost)
pub const MIN_WORK_FACTOR: u8 = 12;

/// Work factor used when none is configured
pub const DEFAULT_WORK_FACTOR: u8 = 15;

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
    /// scrypt log2 cost applied when hashing new passwords
    pub work_factor: u8,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
            work_factor: DEFAULT_WORK_FACTOR,
        }
    }
}

impl PasswordRequirements {
    /// Human-readable description used in validation error messages
    pub fn description(&self) -> String {
        format!(
            "Password must be at least {} characters and contain uppercase, lowercase, digit, and special character",
            self.min_length
        )
    }
}

/// Hash a password using scrypt at the default work factor
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    hash_password_with_cost(plain, DEFAULT_WORK_FACTOR)
}

/// Hash a password using scrypt at an explicit work factor.
///
/// The cost is recorded in the PHC string, so verification works no matter
/// which factor a hash was minted at.
pub fn hash_password_with_cost(plain: &str, log_n: u8) -> anyhow::Result<String> {
    let params = Params::new(log_n, 8, 1, Params::RECOMMENDED_LEN)
        .map_err(|e| anyhow::anyhow!("invalid scrypt params: {e}"))?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.len() < requirements.min_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return false;
    }

    true
}

/// Securely hash a password and zeroize the original
pub fn hash_password_secure(plain: &mut String, log_n: u8) -> anyhow::Result<String> {
    let hash = hash_password_with_cost(plain, log_n)?;
    plain.zeroize();
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the suite fast; the PHC string records whatever was used
    const TEST_COST: u8 = 8;

    #[test]
    fn test_hash_and_verify_password() {
        let password = "Str0ng!Pass";
        let hash = hash_password_with_cost(password, TEST_COST).unwrap();

        // PHC string with algorithm identifier
        assert!(hash.starts_with("$scrypt$"));

        assert!(verify_password(&hash, password));
        assert!(!verify_password(&hash, "Wr0ng!Pass"));
    }

    #[test]
    fn test_same_password_different_hashes() {
        let hash1 = hash_password_with_cost("Str0ng!Pass", TEST_COST).unwrap();
        let hash2 = hash_password_with_cost("Str0ng!Pass", TEST_COST).unwrap();

        // Salts are random, so the hashes differ but both verify
        assert_ne!(hash1, hash2);
        assert!(verify_password(&hash1, "Str0ng!Pass"));
        assert!(verify_password(&hash2, "Str0ng!Pass"));
    }

    #[test]
    fn test_malformed_hash_verifies_false() {
        assert!(!verify_password("not-a-valid-hash", "Str0ng!Pass"));
        assert!(!verify_password("", "Str0ng!Pass"));
    }

    #[test]
    fn test_validate_password_strength() {
        let requirements = PasswordRequirements::default();

        assert!(validate_password_strength("Str0ng!Pass", &requirements));
        assert!(validate_password_strength("C0mplex#Password", &requirements));

        // Too short
        assert!(!validate_password_strength("S0g!a", &requirements));
        // Missing uppercase
        assert!(!validate_password_strength("str0ng!pass", &requirements));
        // Missing lowercase
        assert!(!validate_password_strength("STR0NG!PASS", &requirements));
        // Missing digit
        assert!(!validate_password_strength("Strong!Pass", &requirements));
        // Missing special character
        assert!(!validate_password_strength("Str0ngPass1", &requirements));
    }

    #[test]
    fn test_hash_password_secure_zeroizes() {
        let mut plain = "Str0ng!Pass".to_string();
        let hash = hash_password_secure(&mut plain, TEST_COST).unwrap();

        assert!(plain.is_empty());
        assert!(verify_password(&hash, "Str0ng!Pass"));
    }
}
