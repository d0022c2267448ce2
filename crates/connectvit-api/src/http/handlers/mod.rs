pub mod group;
pub mod health;
pub mod message;
pub mod post;
pub mod user;
pub mod ws;
