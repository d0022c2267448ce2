//! Real-time messaging core and repository trait definitions for ConnectVit.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, the in-process room registry and session manager, the
//! message ingest and fan-out pipeline, and the request-handling services.
//! It depends only on `connectvit-types` -- never on `connectvit-infra` or
//! any database/IO crate.

pub mod realtime;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;
