//! # box-printer
//!
//! Label engine library - drives an external label application, nothing else.
//!
//! ## Scope
//!
//! This crate handles HOW a box label gets printed:
//! - Template resolution (name → `.btw` file under the template directory)
//! - The label engine capability (`LabelEngine` / `LabelDocument`)
//! - The data-only print job: write variables, print, close without saving
//! - BarTender COM automation (Windows only)
//! - A dry-run engine for previews and tests
//!
//! Business logic (WHAT to print, serial accounting, box numbering) stays in
//! box-station.
//!
//! ## Example
//!
//! ```ignore
//! use box_printer::{DryRunEngine, LabelJob, resolve_template};
//!
//! let template = resolve_template(Path::new("templates"), "carton", "btw")?;
//! let job = LabelJob::new(template)
//!     .with_fields(vec![("mingcheng".into(), "Kettle".into())])
//!     .with_serials(vec!["SN001".into(), "SN002".into()]);
//!
//! let report = job.run(&DryRunEngine::new())?;
//! ```

mod dry_run;
mod engine;
mod error;
mod template;

#[cfg(windows)]
mod bartender;

// Re-exports
pub use dry_run::{DryRunDocument, DryRunEngine, DryRunJob};
pub use engine::{JobReport, LabelDocument, LabelEngine, LabelJob};
pub use error::{LabelError, LabelResult};
pub use template::{DEFAULT_TEMPLATE_EXTENSION, resolve_template, template_path};

#[cfg(windows)]
pub use bartender::{BarTenderDocument, BarTenderEngine};
