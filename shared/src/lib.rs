//! Shared types for the OuterBox label station
//!
//! Domain models used by the station crate and its import/export surfaces,
//! plus the date/time conventions stored in the ledger.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
