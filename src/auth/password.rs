use crate::Result;
use bcrypt::DEFAULT_COST;

/// Work factor for new hashes. Raising it is a deployment decision; existing
/// hashes keep the cost they were minted with.
const HASH_COST: u32 = DEFAULT_COST;

/// One-way, salted password hashing over bcrypt.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password. Each call salts independently, so the
    /// same input yields a different digest every time.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        Ok(bcrypt::hash(plaintext, HASH_COST)?)
    }

    /// Verifies a plaintext against a stored digest. The comparison inside
    /// bcrypt is constant-time and does not short-circuit on the first
    /// mismatched byte.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool> {
        Ok(bcrypt::verify(plaintext, digest)?)
    }
}
