//! Colloquy CLI - Report tools for the conversation evaluation harness

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use colloquy_core::report::{render_html, AggregateReport};

#[derive(Parser)]
#[command(name = "colloquy")]
#[command(about = "Conversation evaluation harness CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the HTML report from a run's JSON output
    Render {
        /// Path to the aggregate report JSON
        #[arg(long, default_value = "eval-results/judge-input.json")]
        input: PathBuf,

        /// Where to write the HTML page
        #[arg(long, default_value = "eval-results/report.html")]
        output: PathBuf,
    },
    /// Print success rates from a run's JSON output
    Summary {
        /// Path to the aggregate report JSON
        #[arg(long, default_value = "eval-results/judge-input.json")]
        input: PathBuf,

        /// Emit the folded counts as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { input, output } => render(&input, &output)?,
        Commands::Summary { input, json } => summary(&input, json)?,
        Commands::Version => {
            println!("colloquy {}", env!("CARGO_PKG_VERSION"));
            println!("colloquy-core {}", colloquy_core::VERSION);
        }
    }

    Ok(())
}

fn render(input: &Path, output: &Path) -> Result<()> {
    let report = AggregateReport::load(input)?;
    tracing::debug!(tests = report.tests.len(), run_id = %report.run_id, "loaded report");

    // Image paths inside the report are relative to the directory the JSON
    // lives in
    let results_dir = match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let html = render_html(&report, &results_dir);

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(output, html).with_context(|| format!("writing {}", output.display()))?;

    print_rates(&report);
    println!("Wrote {}", output.display());
    Ok(())
}

fn summary(input: &Path, as_json: bool) -> Result<()> {
    let report = AggregateReport::load(input)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
        return Ok(());
    }

    println!("Run {} generated {}", report.run_id, report.generated_at);
    println!("Total tests: {}", report.summary.total_tests);
    println!("Total turns: {}", report.summary.total_turns);
    print_rates(&report);
    Ok(())
}

fn print_rates(report: &AggregateReport) {
    let scenarios = report.scenarios();
    let scenario_passed = scenarios.iter().filter(|s| s.passed).count();
    let summary = &report.summary;

    println!(
        "Scenario success rate: {}/{} ({:.1}%)",
        scenario_passed,
        scenarios.len(),
        rate(scenario_passed, scenarios.len())
    );
    println!(
        "Test success rate: {}/{} ({:.1}%)",
        summary.passed_tests,
        summary.total_tests,
        rate(summary.passed_tests, summary.total_tests)
    );
    println!(
        "Assertion success rate: {}/{} ({:.1}%)",
        summary.passed_assertions,
        summary.total_assertions,
        rate(summary.passed_assertions, summary.total_assertions)
    );
}

fn rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}
