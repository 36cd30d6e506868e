//! Working-set comparison between materialized and fused attention.
//!
//! Materialized attention keeps Q, K, V, O plus the full score matrix
//! (O(N²) per head); a fused kernel keeps only Q, K, V, O (O(N)).

use comfy_table::{Attribute, Cell, CellAlignment, Table};
use serde::{Deserialize, Serialize};

use crate::config::AttentionConfig;
use crate::harness::format_seq_len;

/// Sequence lengths swept by [`scaling_table`].
pub const SCALING_SEQ_LENS: [usize; 7] = [128, 256, 512, 1024, 2048, 4096, 8192];

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub seq_len: usize,
    pub materialized_bytes: usize,
    pub fused_bytes: usize,
}

impl Footprint {
    pub fn materialized_mib(&self) -> f64 {
        self.materialized_bytes as f64 / MIB
    }

    pub fn fused_mib(&self) -> f64 {
        self.fused_bytes as f64 / MIB
    }

    /// How many times larger the materialized working set is.
    pub fn ratio(&self) -> f64 {
        self.materialized_bytes as f64 / self.fused_bytes as f64
    }
}

pub fn footprint(cfg: &AttentionConfig) -> Footprint {
    let fused_bytes = cfg.qkv_size() * 3 + cfg.output_size();
    Footprint {
        seq_len: cfg.seq_len(),
        materialized_bytes: fused_bytes + cfg.attention_matrix_size(),
        fused_bytes,
    }
}

/// Footprints across [`SCALING_SEQ_LENS`] at the given batch/heads/head_dim.
pub fn scaling(batch_size: usize, num_heads: usize, head_dim: usize) -> Vec<Footprint> {
    SCALING_SEQ_LENS
        .iter()
        .map(|&n| footprint(&AttentionConfig::new(batch_size, num_heads, n, head_dim)))
        .collect()
}

pub fn scaling_table(rows: &[Footprint]) -> Table {
    let mut table = Table::new();
    table.set_header(
        ["N", "Materialized (MB)", "Fused (MB)", "Ratio"]
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    for fp in rows {
        table.add_row(vec![
            Cell::new(format_seq_len(fp.seq_len)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}", fp.materialized_mib())).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}", fp.fused_mib())).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}x", fp.ratio())).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_8k() {
        // B=1, H=8, D=64, N=8192: QKVO = 64 MiB, scores = 2048 MiB
        let fp = footprint(&AttentionConfig::new(1, 8, 8192, 64));
        assert_eq!(fp.fused_mib(), 64.0);
        assert_eq!(fp.materialized_mib(), 64.0 + 2048.0);
    }

    #[test]
    fn test_fused_is_linear_materialized_quadratic() {
        let rows = scaling(1, 8, 64);
        assert_eq!(rows.len(), SCALING_SEQ_LENS.len());
        for w in rows.windows(2) {
            assert_eq!(w[1].fused_bytes, 2 * w[0].fused_bytes);
            let scores0 = w[0].materialized_bytes - w[0].fused_bytes;
            let scores1 = w[1].materialized_bytes - w[1].fused_bytes;
            assert_eq!(scores1, 4 * scores0);
        }
    }

    #[test]
    fn test_ratio_grows() {
        let rows = scaling(1, 8, 64);
        assert!(rows.last().unwrap().ratio() > rows[0].ratio());
    }

    #[test]
    fn test_table_renders() {
        let text = scaling_table(&scaling(1, 8, 64)).to_string();
        assert!(text.contains("8K"));
        assert!(text.contains("2112.0"));
    }
}
