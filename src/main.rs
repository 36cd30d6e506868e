mod cli;
mod profile;

use attention_bench::harness::{measure, Measurement, RunConfig};
use attention_bench::output::progress::BenchProgress;
use attention_bench::output::table::render_all_tables;
use attention_bench::output::{csv, json, BenchRecord};
use attention_bench::reference::Kernel;
use attention_bench::{memory, print_stats, summary, AttentionConfig, BenchError, HostStream};
use clap::Parser;
use cli::BenchArgs;
use profile::{get_profile, parse_seq_lens, BenchProfile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Kernels named on the command line, or all of them.
fn resolve_kernels(names: &[String]) -> Result<Vec<Kernel>, BenchError> {
    if names.is_empty() || (names.len() == 1 && names[0].eq_ignore_ascii_case("all")) {
        return Ok(Kernel::ALL.to_vec());
    }
    names.iter().map(|n| n.parse()).collect()
}

/// Shapes to measure, validated before any buffer is allocated.
fn resolve_configs(args: &BenchArgs, seq_lens: &[usize]) -> Result<Vec<AttentionConfig>, BenchError> {
    seq_lens
        .iter()
        .map(|&n| {
            let cfg = AttentionConfig::new(args.batch, args.heads, n, args.head_dim);
            cfg.validate()?;
            Ok(cfg)
        })
        .collect()
}

fn write_outputs(args: &BenchArgs, results: &[Measurement]) -> Result<(), BenchError> {
    let records: Vec<BenchRecord> = results.iter().map(BenchRecord::from).collect();
    if let Some(ref path) = args.csv_file {
        csv::write_csv(path, &records)?;
    }
    if let Some(ref path) = args.json_file {
        json::write_json(path, &records)?;
    }
    if let Some(ref dir) = args.summary_dir {
        summary::write_summary(dir, &summary::summarize(&records))?;
    }
    Ok(())
}

/// Returns whether every verified measurement passed.
fn run(args: &BenchArgs) -> Result<bool, BenchError> {
    if args.memory_table {
        println!("Memory footprint (B=1, H=8, D=64)");
        println!("{}", memory::scaling_table(&memory::scaling(1, 8, 64)));
        return Ok(true);
    }

    // Explicit --seq-lens/--runs/--warmup override the profile
    let profile = match args.profile {
        Some(ref name) => get_profile(name)?,
        None => BenchProfile {
            name: "default".to_string(),
            seq_lens: vec![512],
            runs: 10,
            warmup: 3,
        },
    };
    let seq_lens = match args.seq_lens {
        Some(ref raw) => parse_seq_lens(raw)?,
        None => profile.seq_lens.clone(),
    };
    let run_cfg = RunConfig {
        runs: args.runs.unwrap_or(profile.runs),
        warmup: args.warmup.unwrap_or(profile.warmup),
        verify: !args.no_verify,
    };
    run_cfg.validate()?;

    let kernels = resolve_kernels(&args.kernels)?;
    let configs = resolve_configs(args, &seq_lens)?;

    println!("attention-bench: attention kernel measurement");
    println!(
        "  Kernels: {}",
        kernels.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
    );
    println!(
        "  Shape: B={}, H={}, D={}",
        args.batch, args.heads, args.head_dim
    );
    println!("  Seq lens: {:?}", seq_lens);
    println!(
        "  Profile: {}, Runs: {}, Warmup: {}",
        profile.name, run_cfg.runs, run_cfg.warmup
    );
    println!();

    let stream = attention_bench::device_check!(HostStream::named("bench"));
    tracing::debug!(stream = stream.name(), "stream created");

    let progress = BenchProgress::new();
    let mut results: Vec<Measurement> = Vec::with_capacity(configs.len() * kernels.len());
    for cfg in &configs {
        for &kernel in &kernels {
            let cb = progress.callback();
            results.push(measure(kernel, cfg, &run_cfg, &stream, Some(&cb)));
        }
    }
    progress.finish();

    for m in &results {
        print_stats(m.kernel.name(), m.stats.mean as f32, &m.config);
    }
    render_all_tables(&results);
    write_outputs(args, &results)?;

    let failed = results.iter().filter(|m| m.verified == Some(false)).count();
    if failed > 0 {
        tracing::warn!(failed, "verification failed");
    }
    Ok(failed == 0)
}

fn main() {
    let args = BenchArgs::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
