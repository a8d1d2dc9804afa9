mod config;
mod error;
mod parser;
mod report;

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use parser::{Pipeline, Run};

#[derive(Parser)]
#[command(name = "logsect", about = "Split session logs into scored topic sections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a log and write one JSON document per section plus a summary
    Process {
        /// Input log file
        #[arg(short, long, default_value = "log2.md")]
        input: PathBuf,
        /// Output directory for section documents
        #[arg(short, long, default_value = "log_sections")]
        output: PathBuf,
        /// Print every section's insights
        #[arg(short, long)]
        verbose: bool,
        /// Policy file overriding the built-in rules and weights
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Split each batch into this many line ranges processed in parallel
        #[arg(long, default_value = "1")]
        shards: usize,
    },
    /// Show section statistics without writing anything
    Stats {
        #[arg(short, long, default_value = "log2.md")]
        input: PathBuf,
        #[arg(short, long)]
        verbose: bool,
        #[arg(long)]
        policy: Option<PathBuf>,
        #[arg(long, default_value = "1")]
        shards: usize,
    },
    /// Print the effective policy as JSON
    Policy {
        #[arg(long)]
        policy: Option<PathBuf>,
    },
}

/// Logs go to stderr so the section table on stdout stays clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let started = Instant::now();

    match cli.command {
        Commands::Process {
            input,
            output,
            verbose,
            policy,
            shards,
        } => {
            let run = analyze(&input, policy.as_deref(), shards)?;
            print_sections(&run, verbose);

            let summary = report::summarize(&run, &input.display().to_string());
            let written = report::write_reports(&output, &run, &summary)
                .with_context(|| format!("Failed to write reports to {}", output.display()))?;
            println!(
                "\nSaved {} documents to {} ({} sections, {} insights).",
                written.len(),
                output.display(),
                summary.total_sections,
                summary.total_insights
            );
        }
        Commands::Stats {
            input,
            verbose,
            policy,
            shards,
        } => {
            let run = analyze(&input, policy.as_deref(), shards)?;
            print_sections(&run, verbose);
        }
        Commands::Policy { policy } => {
            let policy = config::load(policy.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&policy)?);
        }
    }

    info!("Finished in {}", elapsed_label(started.elapsed()));
    Ok(())
}

fn analyze(input: &Path, policy: Option<&Path>, shards: usize) -> anyhow::Result<Run> {
    let policy = config::load(policy)?;
    let pipeline = Pipeline::new(policy, shards)?;
    let source = parser::source::LineSource::open(input)?;
    info!(
        input = %source.path().display(),
        bytes = source.byte_len(),
        policy_version = pipeline.policy().version,
        shards,
        "Processing log"
    );

    let pb = ProgressBar::new(source.byte_len());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")?
            .progress_chars("#>-"),
    );

    let t = Instant::now();
    let run = pipeline
        .run_source(&source, &pb)
        .with_context(|| format!("Failed to process {}", input.display()))?;
    pb.finish_and_clear();

    info!(
        lines = run.total_lines,
        skipped = run.skipped_lines,
        sections = run.sections.len(),
        "Processed in {}ms",
        t.elapsed().as_millis()
    );
    Ok(run)
}

fn print_sections(run: &Run, verbose: bool) {
    if run.sections.is_empty() {
        println!("No lines to classify.");
        return;
    }

    println!(
        "{:<22} | {:>7} | {:>9} | {:>7} | {:>8} | {:>4}",
        "Section", "Lines", "Bytes", "Quality", "Insights", "Tier"
    );
    println!("{}", "-".repeat(72));
    for s in &run.sections {
        println!(
            "{:<22} | {:>7} | {:>9} | {:>7.1} | {:>8} | {:>4}",
            s.category.as_str(),
            s.entries.len(),
            s.byte_size,
            s.quality_score,
            s.insights.len(),
            s.assessment.priority_tier
        );
    }
    println!("{}", "-".repeat(72));
    println!(
        "{} lines in {} sections, {} insights, {} skipped",
        run.total_lines,
        run.sections.len(),
        run.total_insights(),
        run.skipped_lines
    );

    for tier in 1..=3u8 {
        let names: Vec<&str> = run
            .sections
            .iter()
            .filter(|s| s.assessment.priority_tier == tier)
            .map(|s| s.category.as_str())
            .collect();
        let label = match tier {
            1 => "ready for integration",
            2 => "needs curation",
            _ => "needs significant work",
        };
        println!("Tier {} ({}): {}", tier, label, if names.is_empty() { "-".to_string() } else { names.join(", ") });
    }

    if verbose {
        for s in run.sections.iter().filter(|s| !s.insights.is_empty()) {
            println!("\n--- {} insights ---", s.category.as_str());
            for insight in &s.insights {
                println!("  {}", clip(insight, 120));
            }
        }
    }
}

/// Cut `s` to at most `max` chars, marking the cut with an ellipsis.
fn clip(s: &str, max: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max) {
        Some((cut, _)) => Cow::Owned(format!("{}…", &s[..cut])),
        None => Cow::Borrowed(s),
    }
}

fn elapsed_label(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, (secs / 60) % 60, secs % 60) {
        (0, 0, 0) => format!("{}ms", d.as_millis()),
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m{:02}s", m, s),
        (h, m, _) => format!("{}h{:02}m", h, m),
    }
}

// ── Tests ──
