//! Files attached to answers and messages.
//!
//! Attachments are read from disk when the request is built and sent as a multipart file part.
//! The MIME type is guessed from the file extension.

use crate::error::{ApiError, ApiResult};
use reqwest::multipart::Part;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Build an attachment from bytes already in memory.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ApiError::Attachment {
                path: PathBuf::from(path),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn into_part(self) -> ApiResult<Part> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .map_err(|e| ApiError::InvalidInput(format!("invalid attachment type: {e}")))
    }
}
