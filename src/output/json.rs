//! JSON output: records wrapped with a timestamp.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ensure_parent, BenchRecord};
use crate::error::BenchError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub timestamp: String,
    pub results: Vec<BenchRecord>,
}

/// Write records to `path` as pretty JSON.
pub fn write_json(path: impl AsRef<Path>, records: &[BenchRecord]) -> Result<(), BenchError> {
    let path = path.as_ref();
    let report = JsonReport {
        timestamp: chrono::Utc::now().to_rfc3339(),
        results: records.to_vec(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    ensure_parent(path)?;
    fs::write(path, json).map_err(|e| BenchError::io(path, e))?;
    tracing::info!(path = %path.display(), rows = records.len(), "JSON results written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_written_and_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let rec = BenchRecord {
            attention_type: "online".into(),
            batch_size: 2,
            num_heads: 4,
            seq_len: 256,
            head_dim: 32,
            time_ms: 0.75,
            tflops: 0.02,
            bandwidth_gbps: 1.5,
            arithmetic_intensity: 32.0,
            memory_bound: false,
            verified: Some(true),
        };
        write_json(&path, std::slice::from_ref(&rec)).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["timestamp"].is_string());
        assert_eq!(raw["results"][0]["attention_type"], "online");

        let parsed: JsonReport = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.results, vec![rec]);
    }

    #[test]
    fn test_write_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        // parent is a regular file, so it cannot be created as a directory
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let err = write_json(blocker.join("results.json"), &[]).unwrap_err();
        assert!(matches!(err, BenchError::Io { .. }));
    }
}
