//! Business logic services (use cases).
//!
//! Services orchestrate repository calls and business rules for the REST
//! surface. They depend on traits (ports) -- never on concrete
//! infrastructure implementations.

pub mod group;
pub mod history;
pub mod password;
pub mod post;
pub mod user;
