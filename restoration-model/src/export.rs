//! JSON export and import of records.

use chrono::{DateTime, Utc};

use crate::types::CostRecord;

/// Error types for export/import.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to serialize record: {0}")]
    Serialize(serde_json::Error),

    #[error("Failed to parse record document: {0}")]
    Parse(serde_json::Error),
}

/// A serialized record ready to hand to the download surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub filename: String,
    pub json: String,
}

/// Lowercase ASCII alphanumerics; every other run becomes one `_`.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if out.is_empty() {
        "unnamed".to_string()
    } else {
        out
    }
}

/// ISO-8601 UTC time to the second, with `:` and the `T` separator
/// replaced by `-`: `2026-10-18-09-05-00Z`.
pub fn filename_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
        .replace([':', 'T'], "-")
}

/// `<ecosystem>_<method>_<timestamp>.json`
pub fn export_filename(record: &CostRecord, at: DateTime<Utc>) -> String {
    let ecosystem = record.ecosystem.map(|e| e.label()).unwrap_or_default();
    format!(
        "{}_{}_{}.json",
        sanitize_name(ecosystem),
        sanitize_name(&record.method),
        filename_timestamp(at)
    )
}

/// Serialize a record for download.
pub fn export_record(record: &CostRecord, at: DateTime<Utc>) -> Result<ExportDocument, ExportError> {
    let json = serde_json::to_string_pretty(record).map_err(ExportError::Serialize)?;
    let filename = export_filename(record, at);
    tracing::debug!(filename = %filename, bytes = json.len(), "Exported record");
    Ok(ExportDocument { filename, json })
}

/// Parse an exported document back into a record.
pub fn import_record(json: &str) -> Result<CostRecord, ExportError> {
    serde_json::from_str(json).map_err(ExportError::Parse)
}
