//! Infrastructure layer for ConnectVit.
//!
//! Contains implementations of the repository traits defined in
//! `connectvit-core`: SQLite and PostgreSQL storage behind a single
//! [`gateway::Gateway`], argon2 password hashing, and configuration loading.

pub mod config;
pub mod error;
pub mod crypto;
pub mod gateway;
pub mod postgres;
pub mod sqlite;
