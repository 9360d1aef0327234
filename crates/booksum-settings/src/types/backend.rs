//! Backend endpoint and upload settings.

use serde::{Deserialize, Serialize};

/// Where the summarization backend lives.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendSettings {
    /// Base URL; route paths are appended to it.
    pub base_url: String,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout_ms: 10_000,
        }
    }
}

/// Checks applied locally before a document is sent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadSettings {
    /// Accepted file extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
    /// Largest accepted document in bytes.
    pub max_bytes: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["txt".to_string(), "pdf".to_string(), "epub".to_string()],
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

impl UploadSettings {
    /// Whether `file_name` carries an accepted extension (case-insensitive).
    pub fn accepts(&self, file_name: &str) -> bool {
        let Some((stem, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        if stem.is_empty() && ext.is_empty() {
            return false;
        }
        let ext = ext.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|allowed| *allowed == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_extensions() {
        let upload = UploadSettings::default();
        assert!(upload.accepts("moby-dick.txt"));
        assert!(upload.accepts("Report.PDF"));
        assert!(upload.accepts("novel.v2.epub"));
    }

    #[test]
    fn rejects_unknown_or_missing_extension() {
        let upload = UploadSettings::default();
        assert!(!upload.accepts("slides.pptx"));
        assert!(!upload.accepts("README"));
        assert!(!upload.accepts("."));
        assert!(!upload.accepts(""));
    }

    #[test]
    fn custom_extension_list() {
        let upload = UploadSettings {
            allowed_extensions: vec!["md".to_string()],
            ..Default::default()
        };
        assert!(upload.accepts("notes.md"));
        assert!(!upload.accepts("notes.txt"));
    }
}
