use bcrypt::{non_truncating_hash, non_truncating_verify, BcryptError};

/// bcrypt reads at most this many bytes of input.
pub const MAX_INPUT_BYTES: usize = 72;

/// bcrypt with a configurable cost. The produced hash carries its own salt
/// and cost, so verification only needs the stored string.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        PasswordHasher { cost }
    }

    /// Fails for passwords longer than bcrypt's 72 byte input limit instead
    /// of silently truncating them.
    pub fn hash(&self, password: &str) -> Result<String, BcryptError> {
        non_truncating_hash(password, self.cost)
    }

    /// Errors only when `hash` is not a bcrypt hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, BcryptError> {
        match non_truncating_verify(password, hash) {
            Err(BcryptError::Truncation(_)) => Ok(false),
            other => other,
        }
    }
}
