//! Settings type definitions.
//!
//! Every type uses camelCase field names and `#[serde(default)]`, so a
//! partial JSON file only needs the keys it overrides.

mod backend;
mod stream;

pub use backend::*;
pub use stream::*;

use serde::{Deserialize, Serialize};

/// Root settings for the booksum client.
///
/// ```json
/// {
///   "backend": { "baseUrl": "http://10.0.0.5:5000" },
///   "stream": { "cancelGraceMs": 2000 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BooksumSettings {
    /// Summarization backend endpoint.
    pub backend: BackendSettings,
    /// Response stream consumption.
    pub stream: StreamSettings,
    /// Local checks applied before a document is uploaded.
    pub upload: UploadSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Export of the rendered summary.
    pub export: ExportSettings,
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Export configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    /// Directory exported summaries are written to.
    pub directory: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}
