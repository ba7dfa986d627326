//! Label engine capability and the data-only print job
//!
//! The external label application is reached only through [`LabelEngine`] and
//! [`LabelDocument`]. [`LabelJob`] drives one document session end to end:
//!
//! 1. open the template document
//! 2. write product variables (a rejected write is skipped, never fatal)
//! 3. write serials into slots "1", "2", ... (stops at the first missing slot)
//! 4. print without prompting, then close without saving
//!
//! The template itself is never modified.

use crate::error::LabelResult;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// An external label application able to open template documents
pub trait LabelEngine: Send + Sync {
    type Document: LabelDocument;

    /// Open a document session against a template file
    fn open(&self, template: &Path) -> LabelResult<Self::Document>;
}

/// One open template document
///
/// Dropping a document that was not closed must close it without saving and
/// release the label application.
pub trait LabelDocument {
    /// Set a named variable to a string value
    fn set_field(&mut self, name: &str, value: &str) -> LabelResult<()>;

    /// Submit the document for printing without any dialog
    fn print(&mut self) -> LabelResult<()>;

    /// Close the document without saving and release the application
    fn close(self) -> LabelResult<()>;
}

/// What a finished job wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Product variables the document rejected
    pub skipped_fields: Vec<String>,
    /// Serial slots filled before the document ran out of slots
    pub serials_written: usize,
}

/// A single label print job
#[derive(Debug, Clone)]
pub struct LabelJob {
    pub template: PathBuf,
    /// (variable name, value) pairs written before the serials
    pub fields: Vec<(String, String)>,
    /// Serials written to slots "1".."n" in order
    pub serials: Vec<String>,
}

impl LabelJob {
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            fields: Vec::new(),
            serials: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<(String, String)>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_serials(mut self, serials: Vec<String>) -> Self {
        self.serials = serials;
        self
    }

    /// Run the job against an engine.
    ///
    /// Any error from open, print or close is returned. Field and serial write
    /// failures are reported in the [`JobReport`] instead.
    #[instrument(skip(self, engine), fields(template = %self.template.display(), serials = self.serials.len()))]
    pub fn run<E: LabelEngine + ?Sized>(&self, engine: &E) -> LabelResult<JobReport> {
        let mut doc = engine.open(&self.template)?;
        let mut report = JobReport::default();

        for (name, value) in &self.fields {
            if let Err(e) = doc.set_field(name, value) {
                warn!(field = %name, error = %e, "Field write skipped");
                report.skipped_fields.push(name.clone());
            }
        }

        for (index, serial) in self.serials.iter().enumerate() {
            let slot = (index + 1).to_string();
            match doc.set_field(&slot, serial) {
                Ok(()) => report.serials_written += 1,
                Err(e) => {
                    warn!(
                        slot = %slot,
                        error = %e,
                        unwritten = self.serials.len() - index,
                        "Serial slot unavailable, remaining serials not written"
                    );
                    break;
                }
            }
        }
        debug!(written = report.serials_written, "Serials written");

        // An early return here drops `doc`, which closes it without saving
        doc.print()?;
        doc.close()?;

        info!(
            skipped = report.skipped_fields.len(),
            written = report.serials_written,
            "Label job printed"
        );
        Ok(report)
    }
}
