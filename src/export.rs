//! CSV export.
//!
//! The exporter writes the stored export text verbatim; it never transforms
//! the data. The service wraps the CSV in a `data:text/csv;base64,` URI for
//! browser clients, so the wrapped form is decoded once at the parse
//! boundary and plain text passes through untouched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::model::ResultSet;

/// Fixed default filename for exported results.
pub const DEFAULT_EXPORT_FILENAME: &str = "results.csv";

const DATA_URI_PREFIX: &str = "data:text/csv;base64,";

/// Accepts both the data-URI-wrapped and the plain form of the `csv` field.
pub fn decode_csv_field(raw: &str) -> Result<String> {
    match raw.strip_prefix(DATA_URI_PREFIX) {
        Some(encoded) => {
            let bytes = BASE64
                .decode(encoded.trim())
                .context("invalid base64 in csv data URI")?;
            String::from_utf8(bytes).context("csv data URI does not decode to UTF-8")
        }
        None => Ok(raw.to_string()),
    }
}

/// Write the export text to `path`, or to `results.csv` in the current
/// directory when no path is given. Returns the path written.
pub fn export_csv(result: &ResultSet, path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()
            .context("get current directory")?
            .join(DEFAULT_EXPORT_FILENAME),
    };
    std::fs::write(&path, result.export_text.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
