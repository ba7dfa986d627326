//! Data models
//!
//! Shared between box-station and its spreadsheet/CLI surfaces.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod print_record;
pub mod product;

// Re-exports
pub use print_record::*;
pub use product::*;
