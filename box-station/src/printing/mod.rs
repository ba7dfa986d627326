//! Box Label Printing Module
//!
//! - Serial collection: scanner lines → batch ready at the case quantity
//! - Box numbering: rule + persisted global sequence
//! - Print session: validate → print via label engine → record every serial

pub mod batch;
pub mod box_number;
pub mod session;

pub use batch::{BatchCollector, CollectorEvent, SerialBatch};
pub use box_number::{BoxNumber, format_box_id, next_box_id, peek_box_id};
pub use session::{PrintOutcome, PrintRequest, PrintSessionError, PrintSettings, PrintStation};
