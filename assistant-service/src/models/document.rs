//! Uploaded contract document model.

use serde::{Deserialize, Serialize};

/// A contract document after upload and decoding.
///
/// Immutable once decoded; the raw bytes are consumed by the decoder and
/// not retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDocument {
    /// Original file name from the upload.
    pub filename: String,

    /// MIME type reported by the upload.
    pub mime_type: String,

    /// Size of the raw upload in bytes.
    pub size: i64,

    /// Name of the encoding the text was decoded under.
    pub encoding: String,

    /// Decoded document text.
    pub text: String,
}

impl UploadedDocument {
    pub fn new(
        filename: String,
        mime_type: String,
        size: i64,
        encoding: String,
        text: String,
    ) -> Self {
        Self {
            filename,
            mime_type,
            size,
            encoding,
            text,
        }
    }
}
