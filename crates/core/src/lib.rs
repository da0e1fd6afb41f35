//! Pure domain logic for the attendance and membership engine.
//!
//! Nothing in this crate touches the database or performs I/O; the `db` and
//! `engine` crates build on these types and rules.

pub mod attendance;
pub mod clock;
pub mod error;
pub mod membership;
pub mod qr;
pub mod rank;
pub mod roles;
pub mod stats;
pub mod types;
