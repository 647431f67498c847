//! File intake guard — upload constraints checked before any parsing.
//!
//! Pure checks, fail-fast, first violation wins. A rejected upload is
//! never retried here; the caller must resubmit.

use crate::{
    config::IngestConfig,
    error::{DashError, DashResult},
};

/// What the upload transport hands us. The byte stream itself is delivered
/// separately; the guard only looks at the metadata.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    pub filename: String,
    /// MIME type as declared by the transport, if any.
    pub declared_mime: Option<String>,
    pub size_bytes: u64,
    /// False when the transport reported an error mid-transfer.
    pub transfer_ok: bool,
}

/// MIME types that say nothing about the content. Browsers fall back to
/// these for anything they don't recognize, so the extension decides.
const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream", ""];

/// Validate upload metadata against the configured constraints.
///
/// Order: transfer status, size cap, extension. The extension is
/// authoritative; a declared MIME type only matters when it is specific
/// and contradicts it.
pub fn validate(meta: &UploadMeta, config: &IngestConfig) -> DashResult<()> {
    if !meta.transfer_ok {
        return Err(DashError::Validation(
            "file upload did not complete".into(),
        ));
    }

    if meta.size_bytes > config.max_file_size {
        return Err(DashError::Validation(format!(
            "file too large: {} bytes (maximum {} bytes)",
            meta.size_bytes, config.max_file_size
        )));
    }

    let extension = meta
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !config.allowed_extensions.contains(&extension) {
        return Err(DashError::Validation(format!(
            "file type not allowed: '.{extension}' (only CSV)"
        )));
    }

    if let Some(mime) = meta.declared_mime.as_deref() {
        let mime = mime.to_lowercase();
        if !GENERIC_MIME_TYPES.contains(&mime.as_str())
            && !config.allowed_mime_types.contains(&mime)
        {
            return Err(DashError::Validation(format!(
                "declared MIME type '{mime}' does not look like CSV"
            )));
        }
    }

    Ok(())
}
