//! CSV output, one row per record:
//! attention_type,batch_size,num_heads,seq_len,head_dim,time_ms,tflops,
//! bandwidth_gbps,arithmetic_intensity,memory_bound,verified

use std::fs;
use std::io::Write;
use std::path::Path;

use super::{ensure_parent, BenchRecord};
use crate::error::BenchError;

pub const HEADER: &str = "attention_type,batch_size,num_heads,seq_len,head_dim,time_ms,tflops,bandwidth_gbps,arithmetic_intensity,memory_bound,verified";

/// Render records as CSV text (header included).
pub fn to_csv(records: &[BenchRecord]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(HEADER);
    out.push('\n');
    for r in records {
        let verified = match r.verified {
            Some(true) => "true",
            Some(false) => "false",
            None => "",
        };
        out.push_str(&format!(
            "{},{},{},{},{},{:.4},{:.6},{:.2},{:.2},{},{}\n",
            r.attention_type,
            r.batch_size,
            r.num_heads,
            r.seq_len,
            r.head_dim,
            r.time_ms,
            r.tflops,
            r.bandwidth_gbps,
            r.arithmetic_intensity,
            r.memory_bound,
            verified,
        ));
    }
    out
}

/// Write records to `path`, creating parent directories.
pub fn write_csv(path: impl AsRef<Path>, records: &[BenchRecord]) -> Result<(), BenchError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut file = fs::File::create(path).map_err(|e| BenchError::io(path, e))?;
    file.write_all(to_csv(records).as_bytes())
        .map_err(|e| BenchError::io(path, e))?;
    tracing::info!(path = %path.display(), rows = records.len(), "CSV results written");
    Ok(())
}
