//! Template resource resolution
//!
//! Templates are opaque label-layout files referenced by name. A name without an
//! extension gets the engine's fixed extension appended (`.btw` for BarTender).

use crate::error::{LabelError, LabelResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default template file extension
pub const DEFAULT_TEMPLATE_EXTENSION: &str = "btw";

/// Build the on-disk path for a template name without touching the filesystem.
///
/// Absolute names are used as-is; relative names are joined onto `dir`.
pub fn template_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    let name = name.trim();
    let mut path = PathBuf::from(name);
    if path.extension().is_none() && !extension.is_empty() {
        path.set_extension(extension.trim_start_matches('.'));
    }
    if path.is_absolute() {
        path
    } else {
        dir.join(path)
    }
}

/// Resolve a template name to an existing file.
///
/// Fails with [`LabelError::TemplateNotFound`] naming the expected location when
/// the name is blank or the file does not exist.
pub fn resolve_template(dir: &Path, name: &str, extension: &str) -> LabelResult<PathBuf> {
    if name.trim().is_empty() {
        return Err(LabelError::TemplateNotFound(dir.to_path_buf()));
    }

    let path = template_path(dir, name, extension);
    if !path.is_file() {
        return Err(LabelError::TemplateNotFound(path));
    }

    debug!(path = %path.display(), "Template resolved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_appended() {
        let path = template_path(Path::new("templates"), "carton", "btw");
        assert_eq!(path, Path::new("templates").join("carton.btw"));
    }

    #[test]
    fn test_existing_extension_kept() {
        let path = template_path(Path::new("templates"), "carton.BTW", "btw");
        assert_eq!(path, Path::new("templates").join("carton.BTW"));
    }

    #[test]
    fn test_resolve_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("carton.btw"), b"layout").unwrap();

        let path = resolve_template(dir.path(), " carton ", "btw").unwrap();
        assert_eq!(path, dir.path().join("carton.btw"));
    }

    #[test]
    fn test_resolve_missing_names_location() {
        let dir = tempfile::tempdir().unwrap();

        match resolve_template(dir.path(), "missing", "btw") {
            Err(LabelError::TemplateNotFound(path)) => {
                assert_eq!(path, dir.path().join("missing.btw"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_blank_name() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_template(dir.path(), "  ", "btw"),
            Err(LabelError::TemplateNotFound(_))
        ));
    }
}
