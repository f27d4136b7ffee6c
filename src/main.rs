use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use opinion_moderation::io::{format_solution, parse_network};
use opinion_moderation::{logging, runner, Outcome, PollPolicy, SolveConfig, SolverKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Finds how to spend a moderation budget to minimise a network's internal conflict
#[derive(Parser, Debug)]
#[command(name = "moderate", version)]
struct Args {
    /// Network description: group count, one `count,opinion_a,opinion_b,rigidity` line
    /// per group, then the budget
    input: PathBuf,

    /// Solver to run; repeat to run several concurrently (default: all)
    #[arg(short, long = "solver", value_enum, env = "MODERATION_SOLVERS", value_delimiter = ',')]
    solvers: Vec<SolverKind>,

    /// Units of work between two cancellation checks
    #[arg(
        long,
        env = "MODERATION_POLL_INTERVAL",
        default_value_t = PollPolicy::default().every
    )]
    poll_interval: NonZeroUsize,

    /// Cancel solvers still running after this many milliseconds
    #[arg(long, env = "MODERATION_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Also write each result to `<output-dir>/<input stem>_<solver>.txt`
    #[arg(short, long, env = "MODERATION_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MODERATION_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

impl Args {
    fn config(&self) -> SolveConfig {
        SolveConfig::default()
            .with_solvers(self.solvers.iter().copied())
            .with_poll(PollPolicy::every(self.poll_interval))
            .with_timeout(self.timeout_ms.map(Duration::from_millis))
    }
}

fn output_path(dir: &Path, input: &Path, kind: SolverKind) -> PathBuf {
    let stem = input.file_stem().and_then(|stem| stem.to_str()).unwrap_or("network");
    dir.join(format!("{stem}_{kind}.txt"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let text = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("reading {}", args.input.display()))?;
    let network =
        parse_network(&text).with_context(|| format!("parsing {}", args.input.display()))?;
    info!(groups = network.group_count(), budget = network.budget(), "network loaded");

    if let Some(dir) = &args.output_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut failed = false;
    for (kind, result) in runner::run(&args.config(), network).await {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(solver = %kind, error = %err, "solver failed");
                failed = true;
                continue;
            }
        };

        match args.format {
            Format::Json => {
                println!("{}", serde_json::json!({ "solver": kind, "outcome": &outcome }))
            }
            Format::Text => match &outcome {
                Outcome::Found(solution) => println!("[{kind}]\n{}", format_solution(solution)),
                Outcome::Infeasible => println!("[{kind}]\nno solution within budget"),
                Outcome::Cancelled => println!("[{kind}]\ncancelled"),
            },
        }

        if let (Some(dir), Outcome::Found(solution)) = (&args.output_dir, &outcome) {
            let path = output_path(dir, &args.input, kind);
            tokio::fs::write(&path, format_solution(solution))
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!(solver = %kind, path = %path.display(), "result written");
        }
    }

    if failed {
        anyhow::bail!("at least one solver failed");
    }
    Ok(())
}
