//! Upload payloads and progress reporting.

use std::sync::Arc;

/// Callback observing upload progress as a percentage in `[0, 100]`.
///
/// Invoked zero or more times with monotonically non-decreasing values;
/// the final chunk of a successful upload reports 100.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// A file payload for the upload channel.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl UploadPayload {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }
}
