//! File transfer helpers: encoding outgoing files and reassembling incoming ones.

use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use hikyaku_shared::protocol::InboundFrame;

use crate::error::ClientError;

/// File type used when a path has no usable extension
const FALLBACK_FILE_TYPE: &str = "bin";

/// Build the inbound file frame for `path`, using its extension as the file type.
pub async fn encode_file(target_id: u64, path: &Path) -> Result<InboundFrame, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let file_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(sanitize_file_type)
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_TYPE.to_string());

    Ok(InboundFrame::File {
        file_type,
        target_id,
        file_data: STANDARD.encode(bytes),
    })
}

/// Keep only ASCII alphanumerics so a file type can never form a path
fn sanitize_file_type(file_type: &str) -> String {
    file_type
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// A file written to the download directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub size: usize,
}

/// Pending `FILE:` header waiting for its `EOF`
#[derive(Debug)]
struct PendingFile {
    file_type: String,
    file_data: String,
}

/// Pairs `FILE:<type>:<data>` frames with the `EOF` that follows them.
#[derive(Debug)]
pub struct FileAssembler {
    download_dir: PathBuf,
    pending: Option<PendingFile>,
}

impl FileAssembler {
    pub fn new(download_dir: PathBuf) -> Self {
        Self {
            download_dir,
            pending: None,
        }
    }

    /// Record a file header. Returns `true` if an unfinished file was discarded.
    pub fn begin(&mut self, file_type: &str, file_data: &str) -> bool {
        self.pending
            .replace(PendingFile {
                file_type: file_type.to_string(),
                file_data: file_data.to_string(),
            })
            .is_some()
    }

    /// Complete the pending file on `EOF`.
    ///
    /// Returns `Ok(None)` when no header preceded the `EOF`.
    pub async fn finish(&mut self, received_at: i64) -> Result<Option<SavedFile>, ClientError> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };

        let bytes = STANDARD.decode(pending.file_data.as_bytes())?;
        let mut file_type = sanitize_file_type(&pending.file_type);
        if file_type.is_empty() {
            file_type = FALLBACK_FILE_TYPE.to_string();
        }
        let path = self
            .download_dir
            .join(format!("received-{}.{}", received_at, file_type));

        tokio::fs::create_dir_all(&self.download_dir).await?;
        tokio::fs::write(&path, &bytes).await?;

        Ok(Some(SavedFile {
            path,
            size: bytes.len(),
        }))
    }
}
