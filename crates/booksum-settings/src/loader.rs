//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`BooksumSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `BOOKSUM_*` environment overrides
//! 4. Validate
//!
//! Deep merge rules: objects merge per key, arrays and primitives are
//! replaced wholesale, and `null` in the file keeps the default.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::BooksumSettings;

/// Resolve the path to the settings file (`~/.booksum/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".booksum").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<BooksumSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields the defaults; an unreadable or malformed file is an
/// error.
pub fn load_settings_from_path(path: &Path) -> Result<BooksumSettings> {
    load_with_env(path, |name| std::env::var(name).ok())
}

fn load_with_env(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<BooksumSettings> {
    let defaults = serde_json::to_value(BooksumSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: BooksumSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, env);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `BOOKSUM_*` overrides read through `env`.
///
/// Unparseable or out-of-range values are logged and ignored.
pub fn apply_overrides(settings: &mut BooksumSettings, env: impl Fn(&str) -> Option<String>) {
    let string = |name: &str| env(name).filter(|v| !v.is_empty());
    let ranged = |name: &str, min: u64, max: u64| {
        let val = string(name)?;
        let parsed = parse_u64_range(&val, min, max);
        if parsed.is_none() {
            warn!(key = name, value = %val, "invalid integer env var, ignoring");
        }
        parsed
    };

    if let Some(v) = string("BOOKSUM_BASE_URL") {
        settings.backend.base_url = v;
    }
    if let Some(v) = ranged("BOOKSUM_READ_TIMEOUT_MS", 100, 86_400_000) {
        settings.stream.read_timeout_ms = Some(v);
    }
    if let Some(v) = ranged("BOOKSUM_CANCEL_GRACE_MS", 0, 600_000) {
        settings.stream.cancel_grace_ms = v;
    }
    if let Some(v) = string("BOOKSUM_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = string("BOOKSUM_EXPORT_DIR") {
        settings.export.directory = v;
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn validate(settings: &BooksumSettings) -> Result<()> {
    let base = settings.backend.base_url.trim();
    if base.is_empty() {
        return Err(SettingsError::InvalidValue(
            "backend.baseUrl must not be empty".into(),
        ));
    }
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(SettingsError::InvalidValue(format!(
            "backend.baseUrl must be an http(s) URL, got {base}"
        )));
    }
    if settings.upload.allowed_extensions.is_empty() {
        return Err(SettingsError::InvalidValue(
            "upload.allowedExtensions must not be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use booksum_core::logging::capture_logs;
    use tracing::Level;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"backend": {"baseUrl": "a", "connectTimeoutMs": 1}});
        let source = serde_json::json!({"backend": {"baseUrl": "b"}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["backend"]["baseUrl"], "b");
        assert_eq!(merged["backend"]["connectTimeoutMs"], 1);
    }

    #[test]
    fn merge_array_replaces() {
        let target = serde_json::json!({"exts": ["txt", "pdf"]});
        let source = serde_json::json!({"exts": ["md"]});
        assert_eq!(deep_merge(target, source)["exts"], serde_json::json!(["md"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"a": null});
        assert_eq!(deep_merge(target, source)["a"], 1);
    }

    // ── loading ─────────────────────────────────────────────────────

    #[test]
    fn missing_file_returns_defaults() {
        let settings = load_with_env(Path::new("/nonexistent/settings.json"), no_env).unwrap();
        assert_eq!(settings.backend.base_url, "http://127.0.0.1:5000");
    }

    #[test]
    fn partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"backend": {"baseUrl": "http://summarizer:8000"}, "stream": {"cancelGraceMs": 0}}"#,
        )
        .unwrap();

        let settings = load_with_env(&path, no_env).unwrap();
        assert_eq!(settings.backend.base_url, "http://summarizer:8000");
        assert_eq!(settings.stream.cancel_grace_ms, 0);
        assert_eq!(settings.backend.connect_timeout_ms, 10_000);
        assert!(settings.stream.warn_on_truncated_record);
    }

    #[test]
    fn invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let err = load_with_env(&path, no_env).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"backend": {"baseUrl": "ftp://files"}}"#).unwrap();

        let err = load_with_env(&path, no_env).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
    }

    #[test]
    fn empty_extension_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"upload": {"allowedExtensions": []}}"#).unwrap();

        assert!(load_with_env(&path, no_env).is_err());
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"backend": {"baseUrl": "http://file:1"}}"#).unwrap();

        let env = env_from(&[
            ("BOOKSUM_BASE_URL", "http://env:2"),
            ("BOOKSUM_READ_TIMEOUT_MS", "30000"),
            ("BOOKSUM_CANCEL_GRACE_MS", "0"),
            ("BOOKSUM_LOG_LEVEL", "debug"),
            ("BOOKSUM_EXPORT_DIR", "/tmp/out"),
        ]);
        let settings = load_with_env(&path, env).unwrap();
        assert_eq!(settings.backend.base_url, "http://env:2");
        assert_eq!(settings.stream.read_timeout_ms, Some(30_000));
        assert_eq!(settings.stream.cancel_grace_ms, 0);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.export.directory, "/tmp/out");
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let (logs, _guard) = capture_logs();
        let mut settings = BooksumSettings::default();
        apply_overrides(
            &mut settings,
            env_from(&[
                ("BOOKSUM_READ_TIMEOUT_MS", "soon"),
                ("BOOKSUM_CANCEL_GRACE_MS", "999999999"),
                ("BOOKSUM_BASE_URL", ""),
            ]),
        );
        assert!(settings.stream.read_timeout_ms.is_none());
        assert_eq!(settings.stream.cancel_grace_ms, 10_000);
        assert_eq!(settings.backend.base_url, "http://127.0.0.1:5000");
        assert_eq!(logs.count_at_level(Level::WARN), 2);
        let keys: Vec<String> = logs
            .events()
            .iter()
            .filter_map(|e| e.field("key").map(str::to_owned))
            .collect();
        assert_eq!(keys, ["BOOKSUM_READ_TIMEOUT_MS", "BOOKSUM_CANCEL_GRACE_MS"]);
    }

    // ── parse_u64_range ─────────────────────────────────────────────

    #[test]
    fn parse_range() {
        assert_eq!(parse_u64_range("30000", 100, 600_000), Some(30_000));
        assert_eq!(parse_u64_range(" 100 ", 100, 600_000), Some(100));
        assert_eq!(parse_u64_range("99", 100, 600_000), None);
        assert_eq!(parse_u64_range("abc", 100, 600_000), None);
    }
}
