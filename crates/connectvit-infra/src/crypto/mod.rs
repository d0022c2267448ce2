//! Cryptographic operations for ConnectVit.
//!
//! - `password`: Argon2id password hashing for user credentials

pub mod password;
