//! Store-level JSON settings files with caller-supplied fallbacks.

use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::BackupError;

pub const CONFIG_FILE: &str = "config.json";
pub const CAST_CONFIG_FILE: &str = "castConfig.json";

/// Read `<store_root>/config.json`, or `fallback` if it does not exist.
pub fn get_configs<T: DeserializeOwned>(store_root: &Path, fallback: T) -> Result<T, BackupError> {
    read_json_or(&store_root.join(CONFIG_FILE), fallback)
}

/// Read `<store_root>/castConfig.json`, or `fallback` if it does not exist.
pub fn get_cast_config<T: DeserializeOwned>(store_root: &Path, fallback: T) -> Result<T, BackupError> {
    read_json_or(&store_root.join(CAST_CONFIG_FILE), fallback)
}

fn read_json_or<T: DeserializeOwned>(path: &Path, fallback: T) -> Result<T, BackupError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file missing, using fallback");
            return Ok(fallback);
        }
        Err(e) => return Err(BackupError::io(format!("reading {}", path.display()))(e)),
    };
    serde_json::from_str(&text).map_err(|source| BackupError::Json {
        context: format!("parsing {}", path.display()),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Cast {
        device: String,
        volume: u8,
    }

    #[test]
    fn test_missing_file_returns_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let value: Value = get_configs(tmp.path(), json!({ "theme": "dark" })).unwrap();
        assert_eq!(value, json!({ "theme": "dark" }));
    }

    #[test]
    fn test_reads_typed_settings() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(CAST_CONFIG_FILE),
            r#"{ "device": "living-room", "volume": 7 }"#,
        )
        .unwrap();

        let fallback = Cast { device: "none".into(), volume: 0 };
        let cast = get_cast_config(tmp.path(), fallback).unwrap();
        assert_eq!(cast, Cast { device: "living-room".into(), volume: 7 });
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "{").unwrap();
        let result: Result<Value, _> = get_configs(tmp.path(), Value::Null);
        assert!(matches!(result, Err(BackupError::Json { .. })));
    }
}
