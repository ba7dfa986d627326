//! Print session workflow
//!
//! Turns one validated batch of serials into one printed box label and one
//! ledger record per serial.
//!
//! Validation happens before any external side effect, in this order:
//! product selected, batch size equals case quantity, no duplicate serial
//! (within the batch or already in the ledger). Only then is the template
//! resolved and the label engine invoked. After the physical print the box
//! number is allocated and the records are committed in one transaction.
//!
//! A ledger conflict after printing cannot be undone: the label exists. It is
//! surfaced as [`PrintSessionError::PrintRecordConflict`] for manual
//! reconciliation.
//!
//! The session lock travels with the blocking label job. A job that outlives
//! its deadline keeps the engine locked until it actually returns, so the
//! next session reports [`PrintSessionError::EngineBusy`] instead of opening
//! a second document.
//!
//! In preview mode the label job runs but no box number is consumed and
//! nothing is recorded.

use super::batch::{BatchCollector, SerialBatch};
use super::box_number::{BoxNumber, next_box_id, peek_box_id};
use crate::db::repository::{RepoError, print_record};
use box_printer::{LabelEngine, LabelError, LabelJob, resolve_template};
use chrono::NaiveDate;
use shared::models::{NewPrintRecord, Product, ProductField};
use shared::util::{now_local, today_local};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, instrument, warn};

#[derive(Debug, Error)]
pub enum PrintSessionError {
    #[error("No product selected")]
    NoProductSelected,

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Serial count must be {expected} (got {actual})")]
    BatchSizeMismatch { expected: usize, actual: usize },

    #[error("Serial already printed or repeated: {}", .0.join(", "))]
    DuplicateSerial(Vec<String>),

    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Print engine failure: {0}")]
    PrintEngineFailure(String),

    /// A previous label job is still running on the engine
    #[error("Label engine busy: previous job still running after {0:?}")]
    EngineBusy(Duration),

    /// The label was printed but the ledger already holds `serial`
    #[error("Label {box_id} printed but serial {serial} is already recorded; no records were saved")]
    PrintRecordConflict { box_id: String, serial: String },

    /// The label was printed but the records could not be committed
    #[error("Label printed but records were not saved: {message}")]
    RecordCommitFailed {
        box_id: Option<String>,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] RepoError),
}

impl PrintSessionError {
    /// True when the physical label may already exist
    pub fn after_print(&self) -> bool {
        matches!(
            self,
            PrintSessionError::PrintEngineFailure(_)
                | PrintSessionError::PrintRecordConflict { .. }
                | PrintSessionError::RecordCommitFailed { .. }
        )
    }
}

/// Label-side settings of a print station
#[derive(Debug, Clone)]
pub struct PrintSettings {
    pub template_dir: PathBuf,
    pub template_extension: String,
    /// Label variable name → product attribute
    pub field_mapping: BTreeMap<String, ProductField>,
    /// Upper bound for one label job (open, write, print, close)
    pub print_timeout: Duration,
}

/// One print request
#[derive(Debug, Clone)]
pub struct PrintRequest {
    pub product: Option<Product>,
    pub production_date: NaiveDate,
    pub serials: SerialBatch,
}

/// Result of a printed and recorded box
#[derive(Debug, Clone, PartialEq)]
pub struct PrintOutcome {
    pub box_id: String,
    pub sequence: i64,
    pub product_id: i64,
    pub production_date: NaiveDate,
    pub serials: Vec<String>,
    /// Label variables the template rejected
    pub skipped_fields: Vec<String>,
    /// Serials that fit into the template's serial slots
    pub serials_written: usize,
    /// False for a preview: `box_id` is provisional and the ledger is untouched
    pub recorded: bool,
}

/// Print station: owns the label engine and serializes print sessions
pub struct PrintStation<E> {
    pool: SqlitePool,
    engine: Arc<E>,
    settings: PrintSettings,
    session_lock: Arc<Mutex<()>>,
    preview: bool,
}

impl<E> PrintStation<E>
where
    E: LabelEngine + 'static,
{
    pub fn new(pool: SqlitePool, engine: E, settings: PrintSettings) -> Self {
        Self {
            pool,
            engine: Arc::new(engine),
            settings,
            session_lock: Arc::new(Mutex::new(())),
            preview: false,
        }
    }

    /// Run label jobs without allocating box numbers or recording serials
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn settings(&self) -> &PrintSettings {
        &self.settings
    }

    /// Print the collector's batch; the collector is cleared only on success
    pub async fn print_collected(
        &self,
        product: Option<&Product>,
        production_date: NaiveDate,
        collector: &mut BatchCollector,
    ) -> Result<PrintOutcome, PrintSessionError> {
        let request = PrintRequest {
            product: product.cloned(),
            production_date,
            serials: collector.batch().clone(),
        };
        let outcome = self.print_box(request).await?;
        collector.clear();
        Ok(outcome)
    }

    /// Validate, print and record one box
    #[instrument(
        skip(self, request),
        fields(
            product_id = request.product.as_ref().map(|p| p.id),
            serials = request.serials.len()
        )
    )]
    pub async fn print_box(&self, request: PrintRequest) -> Result<PrintOutcome, PrintSessionError> {
        // One session at a time: the label application is an exclusive resource
        let wait = self.settings.print_timeout;
        let guard = tokio::time::timeout(wait, Arc::clone(&self.session_lock).lock_owned())
            .await
            .map_err(|_| {
                warn!(wait = ?wait, "Label engine still busy");
                PrintSessionError::EngineBusy(wait)
            })?;

        let product = self.validate(&request).await?;
        let serials = request.serials.into_inner();

        let template = resolve_template(
            &self.settings.template_dir,
            &product.template,
            &self.settings.template_extension,
        )
        .map_err(|e| match e {
            LabelError::TemplateNotFound(path) => PrintSessionError::TemplateNotFound(path),
            other => PrintSessionError::PrintEngineFailure(other.to_string()),
        })?;

        let job = LabelJob::new(template)
            .with_fields(self.label_fields(&product))
            .with_serials(serials.clone());
        let (report, _guard) = self.run_job(job, guard).await?;

        if self.preview {
            let box_number = peek_box_id(&self.pool, today_local()).await?;
            info!(box_id = %box_number.id, product = %product.name, "Preview printed, nothing recorded");
            return Ok(PrintOutcome {
                box_id: box_number.id,
                sequence: box_number.sequence,
                product_id: product.id,
                production_date: request.production_date,
                serials,
                skipped_fields: report.skipped_fields,
                serials_written: report.serials_written,
                recorded: false,
            });
        }

        let box_number = next_box_id(&self.pool, today_local())
            .await
            .map_err(|e| {
                error!(error = %e, "Label printed but box number allocation failed");
                PrintSessionError::RecordCommitFailed {
                    box_id: None,
                    message: e.to_string(),
                }
            })?;

        self.commit(&product, &box_number, request.production_date, &serials)
            .await?;

        info!(
            box_id = %box_number.id,
            product = %product.name,
            serials = serials.len(),
            skipped_fields = report.skipped_fields.len(),
            "Box printed and recorded"
        );

        Ok(PrintOutcome {
            box_id: box_number.id,
            sequence: box_number.sequence,
            product_id: product.id,
            production_date: request.production_date,
            serials,
            skipped_fields: report.skipped_fields,
            serials_written: report.serials_written,
            recorded: true,
        })
    }

    /// Checks that run before any side effect
    async fn validate(&self, request: &PrintRequest) -> Result<Product, PrintSessionError> {
        let product = request
            .product
            .clone()
            .ok_or(PrintSessionError::NoProductSelected)?;

        let expected = usize::try_from(product.case_quantity)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                PrintSessionError::InvalidProduct(format!(
                    "{} has case quantity {}",
                    product.name, product.case_quantity
                ))
            })?;

        let actual = request.serials.len();
        if actual != expected {
            return Err(PrintSessionError::BatchSizeMismatch { expected, actual });
        }

        let repeated = request.serials.duplicates();
        if !repeated.is_empty() {
            warn!(serials = ?repeated, "Serial scanned twice in one batch");
            return Err(PrintSessionError::DuplicateSerial(repeated));
        }

        let printed = print_record::find_existing(&self.pool, request.serials.as_slice()).await?;
        if !printed.is_empty() {
            warn!(serials = ?printed, "Serial already printed");
            return Err(PrintSessionError::DuplicateSerial(printed));
        }

        Ok(product)
    }

    fn label_fields(&self, product: &Product) -> Vec<(String, String)> {
        self.settings
            .field_mapping
            .iter()
            .map(|(name, field)| (name.clone(), product.field_value(*field)))
            .collect()
    }

    /// The label application is synchronous: run the job on a blocking thread
    /// with a deadline.
    ///
    /// The session guard moves into the blocking task and comes back only
    /// when the job finishes. On timeout it stays with the abandoned job.
    async fn run_job(
        &self,
        job: LabelJob,
        guard: OwnedMutexGuard<()>,
    ) -> Result<(box_printer::JobReport, OwnedMutexGuard<()>), PrintSessionError> {
        let engine = Arc::clone(&self.engine);
        let timeout = self.settings.print_timeout;
        let handle = tokio::task::spawn_blocking(move || (job.run(engine.as_ref()), guard));

        let joined = tokio::time::timeout(timeout, handle).await.map_err(|_| {
            error!(timeout = ?timeout, "Label job timed out");
            PrintSessionError::PrintEngineFailure(format!(
                "Label job did not finish within {:?}",
                timeout
            ))
        })?;

        let (result, guard) = joined.map_err(|e| {
            PrintSessionError::PrintEngineFailure(format!("Label job task failed: {}", e))
        })?;

        let report = result.map_err(|e| {
            error!(error = %e, "Label job failed");
            match e {
                LabelError::TemplateNotFound(path) => PrintSessionError::TemplateNotFound(path),
                other => PrintSessionError::PrintEngineFailure(other.to_string()),
            }
        })?;
        Ok((report, guard))
    }

    async fn commit(
        &self,
        product: &Product,
        box_number: &BoxNumber,
        production_date: NaiveDate,
        serials: &[String],
    ) -> Result<(), PrintSessionError> {
        let printed_at = now_local();
        let records: Vec<NewPrintRecord> = serials
            .iter()
            .map(|serial| NewPrintRecord {
                product_id: product.id,
                serial_number: serial.clone(),
                box_id: box_number.id.clone(),
                production_date,
                printed_at,
            })
            .collect();

        print_record::insert_batch(&self.pool, &records)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                RepoError::Duplicate(serial) => {
                    error!(box_id = %box_number.id, serial = %serial, "Ledger conflict after print");
                    PrintSessionError::PrintRecordConflict {
                        box_id: box_number.id.clone(),
                        serial,
                    }
                }
                other => {
                    error!(box_id = %box_number.id, error = %other, "Ledger commit failed after print");
                    PrintSessionError::RecordCommitFailed {
                        box_id: Some(box_number.id.clone()),
                        message: other.to_string(),
                    }
                }
            })
    }
}
