//! Attendance and membership accounting engine.
//!
//! The library surface called by the web layer. Each module is a set of
//! async operations taking an [`EngineState`]:
//!
//! - [`directory`]: people lookup, registration, and profile edits
//! - [`ledger`]: manual, bulk, and QR check-ins plus attendance queries
//! - [`plans`]: membership plans and remaining-class accounting
//! - [`belts`]: rank promotions and the editable rank history
//!
//! Role authorization is the caller's responsibility.

pub mod belts;
pub mod config;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod plans;
pub mod state;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use state::EngineState;
