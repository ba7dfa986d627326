//! Error types for the label engine library

use std::path::PathBuf;
use thiserror::Error;

/// Label engine error types
#[derive(Debug, Error)]
pub enum LabelError {
    /// The open document has no variable with this name
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// The document refused the value for an existing variable
    #[error("Field rejected: {name}: {reason}")]
    FieldRejected { name: String, reason: String },

    /// Template file is missing on disk
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// Opening the template document failed
    #[error("Open failed: {0}")]
    Open(String),

    /// Submitting the print job failed
    #[error("Print failed: {0}")]
    Print(String),

    /// Closing the document or releasing the application failed
    #[error("Close failed: {0}")]
    Close(String),

    /// Any other failure reported by the label application
    #[error("Engine error: {0}")]
    Engine(String),

    /// IO error while resolving templates
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for label engine operations
pub type LabelResult<T> = Result<T, LabelError>;
