//! In-memory label engine
//!
//! Used for `--dry-run`, on platforms without the label application, and as
//! the fake engine in tests. Every document session is recorded when it is
//! released.

use crate::engine::{LabelDocument, LabelEngine};
use crate::error::{LabelError, LabelResult};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// A recorded document session
#[derive(Debug, Clone, PartialEq)]
pub struct DryRunJob {
    pub template: PathBuf,
    pub fields: BTreeMap<String, String>,
    pub printed: bool,
    /// Document closed and application released
    pub released: bool,
}

/// Label engine that writes nothing to hardware
#[derive(Debug, Clone, Default)]
pub struct DryRunEngine {
    known_fields: Option<Arc<HashSet<String>>>,
    print_error: Option<String>,
    jobs: Arc<Mutex<Vec<DryRunJob>>>,
}

impl DryRunEngine {
    /// Create an engine whose documents accept any variable name
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict documents to these variable names; others report `FieldNotFound`
    pub fn with_known_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_fields = Some(Arc::new(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Make every print submission fail with this message
    pub fn failing_print(mut self, message: impl Into<String>) -> Self {
        self.print_error = Some(message.into());
        self
    }

    /// Snapshot of all released sessions
    pub fn jobs(&self) -> Vec<DryRunJob> {
        self.jobs.lock().clone()
    }

    /// Number of sessions that were submitted for printing
    pub fn print_count(&self) -> usize {
        self.jobs.lock().iter().filter(|j| j.printed).count()
    }
}

impl LabelEngine for DryRunEngine {
    type Document = DryRunDocument;

    fn open(&self, template: &Path) -> LabelResult<Self::Document> {
        info!(template = %template.display(), "Dry-run document opened");
        Ok(DryRunDocument {
            job: DryRunJob {
                template: template.to_path_buf(),
                fields: BTreeMap::new(),
                printed: false,
                released: false,
            },
            known_fields: self.known_fields.clone(),
            print_error: self.print_error.clone(),
            jobs: Arc::clone(&self.jobs),
        })
    }
}

/// Document session of [`DryRunEngine`]
#[derive(Debug)]
pub struct DryRunDocument {
    job: DryRunJob,
    known_fields: Option<Arc<HashSet<String>>>,
    print_error: Option<String>,
    jobs: Arc<Mutex<Vec<DryRunJob>>>,
}

impl DryRunDocument {
    fn release(&mut self) {
        if self.job.released {
            return;
        }
        self.job.released = true;
        self.jobs.lock().push(self.job.clone());
    }
}

impl LabelDocument for DryRunDocument {
    fn set_field(&mut self, name: &str, value: &str) -> LabelResult<()> {
        if let Some(known) = &self.known_fields
            && !known.contains(name)
        {
            return Err(LabelError::FieldNotFound(name.to_string()));
        }
        self.job.fields.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn print(&mut self) -> LabelResult<()> {
        if let Some(message) = &self.print_error {
            return Err(LabelError::Print(message.clone()));
        }
        self.job.printed = true;
        info!(
            template = %self.job.template.display(),
            fields = ?self.job.fields,
            "Dry-run label printed"
        );
        Ok(())
    }

    fn close(mut self) -> LabelResult<()> {
        self.release();
        Ok(())
    }
}

impl Drop for DryRunDocument {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_rejected() {
        let engine = DryRunEngine::new().with_known_fields(["1"]);
        let mut doc = engine.open(Path::new("a.btw")).unwrap();

        assert!(doc.set_field("1", "SN1").is_ok());
        assert!(matches!(
            doc.set_field("2", "SN2"),
            Err(LabelError::FieldNotFound(name)) if name == "2"
        ));
    }

    #[test]
    fn test_drop_releases_once() {
        let engine = DryRunEngine::new();
        {
            let mut doc = engine.open(Path::new("a.btw")).unwrap();
            doc.set_field("1", "SN1").unwrap();
        }
        let doc = engine.open(Path::new("b.btw")).unwrap();
        doc.close().unwrap();

        let jobs = engine.jobs();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.released && !j.printed));
        assert_eq!(engine.print_count(), 0);
    }
}
