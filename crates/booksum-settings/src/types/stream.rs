//! Response stream consumption settings.

use serde::{Deserialize, Serialize};

/// How the summary stream is read.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamSettings {
    /// Maximum wait for the next record, in milliseconds. `None` waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,
    /// How long to keep draining after a cancel while waiting for the
    /// backend's `stop` record. `0` aborts the read immediately.
    pub cancel_grace_ms: u64,
    /// Log a warning when the stream ends inside an unterminated record.
    pub warn_on_truncated_record: bool,
    /// Initial capacity of the pending-record buffer, in bytes.
    pub buffer_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            read_timeout_ms: None,
            cancel_grace_ms: 10_000,
            warn_on_truncated_record: true,
            buffer_capacity: 8192,
        }
    }
}
