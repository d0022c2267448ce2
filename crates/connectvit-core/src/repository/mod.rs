//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (connectvit-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod group;
pub mod message;
pub mod post;
pub mod user;

pub use group::GroupRepository;
pub use message::MessageRepository;
pub use post::PostRepository;
pub use user::UserRepository;
