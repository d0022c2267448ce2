//! Shared domain types for ConnectVit.
//!
//! This crate contains the domain types used across the ConnectVit backend:
//! users, direct and group messages, groups, posts, rooms, real-time events,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod group;
pub mod message;
pub mod post;
pub mod room;
pub mod session;
pub mod user;
