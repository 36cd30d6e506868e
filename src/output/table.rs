//! comfy-table rendering of measurements, grouped by kernel.

use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::harness::{format_seq_len, Measurement};

fn header(cols: &[&str]) -> Vec<Cell> {
    cols.iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Build the table for one kernel's measurements.
pub fn build_table(data: &[&Measurement]) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&[
            "Shape", "N", "Mean (ms)", "CV%", "GFLOPS", "GB/s", "FLOP/B", "Bound", "Verified",
        ]));

    for m in data {
        let bound = if m.report.memory_bound {
            Cell::new("memory").fg(Color::Yellow)
        } else {
            Cell::new("compute").fg(Color::Cyan)
        };
        let verified = match m.verified {
            Some(true) => Cell::new("ok").fg(Color::Green),
            Some(false) => Cell::new("FAIL").fg(Color::Red),
            None => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(m.config.label()),
            right(format_seq_len(m.config.seq_len())),
            right(format!("{:.3}", m.stats.mean)),
            right(format!("{:.1}", m.stats.cv_percent)),
            right(format!("{:.2}", m.report.gflops)),
            right(format!("{:.2}", m.report.bandwidth_gbps)),
            right(format!("{:.2}", m.report.arithmetic_intensity)),
            bound,
            verified,
        ]);
    }
    table
}

/// Print one table per kernel, kernels in first-seen order.
pub fn render_all_tables(data: &[Measurement]) {
    if data.is_empty() {
        println!("No results to display.");
        return;
    }

    let mut groups: Vec<(&str, Vec<&Measurement>)> = Vec::new();
    for m in data {
        let name = m.kernel.name();
        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, group)) => group.push(m),
            None => groups.push((name, vec![m])),
        }
    }

    for (name, group) in &groups {
        println!("\n=== {} ===", name);
        println!("{}", build_table(group));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttentionConfig;
    use crate::reference::Kernel;
    use crate::report::PerfReport;
    use crate::stats::compute_stats;

    fn fake(kernel: Kernel, seq_len: usize, ms: f64) -> Measurement {
        let config = AttentionConfig::new(1, 8, seq_len, 64);
        Measurement {
            kernel,
            config,
            samples_ms: vec![ms],
            stats: compute_stats(&[ms]),
            report: PerfReport::new(ms as f32, &config),
            verified: Some(true),
            max_abs_diff: Some(0.0),
        }
    }

    #[test]
    fn test_table_contents() {
        let a = fake(Kernel::Naive, 64, 1.0);
        let b = fake(Kernel::Naive, 1024, 2.0);
        let rendered = build_table(&[&a, &b]).to_string();
        assert!(rendered.contains("B=1,H=8,N=64,D=64"));
        assert!(rendered.contains("1K"));
        assert!(rendered.contains("memory"));
        assert!(rendered.contains("compute"));
    }
}
