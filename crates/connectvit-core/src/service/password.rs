//! PasswordHasher trait for credential storage.
//!
//! Defined in connectvit-core so `UserService` can hash and verify passwords
//! without coupling to a specific algorithm. The argon2 adapter lives in
//! connectvit-infra.

use connectvit_types::error::UserError;

/// Abstraction over password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash (algorithm, parameters, salt) of `password`.
    fn hash_password(&self, password: &str) -> Result<String, UserError>;

    /// Check `password` against a hash produced by [`hash_password`](Self::hash_password).
    /// A malformed hash verifies as `false`.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}
