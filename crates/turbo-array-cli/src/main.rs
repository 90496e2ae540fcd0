//! turbo-array CLI
//!
//! Reads a numeric JSON array (from `--input` or stdin), applies one engine
//! operation and prints the result as JSON. Descriptors are JSON strings:
//!
//! ```text
//! echo '[1, 2, 3]' | turbo-array map '{"expr": "x * x"}'
//! echo '[1, 2, 3]' | turbo-array reduce '{"op": "+"}' --initial 10
//! echo '[5, 12, 3]' | turbo-array chain '[{"type": "sort", "comparator": {"op": "desc"}}]'
//! ```
//!
//! JSON has no NaN or infinity: `null` input elements are read as NaN, and
//! non-finite results are written as `null`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use turbo_array::{ChainOperation, Engine, EngineOptions, Env, Operation};

#[derive(Parser)]
#[command(name = "turbo-array")]
#[command(about = "Element-wise, conditional and reducing operations over numeric arrays")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    /// Engine options as a JSON file (`cacheExpressions`, `cacheCapacity`, `equalityEpsilon`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Input JSON array. Defaults to stdin.
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an operation to every element
    Map {
        /// Operation descriptor, e.g. '{"expr": "x * 2"}'
        operation: String,
    },

    /// Keep elements whose condition is non-zero
    Filter {
        /// Condition descriptor, e.g. '{"op": ">", "value": 0}'
        condition: String,
    },

    /// First element whose condition is non-zero (null if none)
    Find {
        /// Condition descriptor
        condition: String,
    },

    /// Left fold; expressions see `acc` and `x`
    Reduce {
        /// Operation descriptor, e.g. '{"op": "+"}' or '{"expr": "max(acc, x)"}'
        operation: String,

        /// Initial accumulator value
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        initial: f64,
    },

    /// Group elements by a numeric key
    GroupBy {
        /// Key descriptor, e.g. '{"expr": "floor(x / 10)"}'
        key: String,
    },

    /// Stable sort by natural order ('{"op": "asc"}' / '{"op": "desc"}') or by a key
    SortBy {
        /// Comparator descriptor
        comparator: String,
    },

    /// Run map/filter/sort stages in sequence
    Chain {
        /// JSON array of stages, e.g. '[{"type": "map", "operation": {"expr": "x + 1"}}]'
        stages: String,
    },

    /// Compute sum, avg, min, max and/or count
    Aggregate {
        /// Metric names; unknown names are ignored
        #[arg(required = true)]
        metrics: Vec<String>,
    },

    /// Evaluate a single expression (does not read an input array)
    Eval {
        /// Expression, e.g. "2^3^2"
        expr: String,

        /// Value bound to `x`
        #[arg(long, allow_negative_numbers = true)]
        x: Option<f64>,

        /// Value bound to `acc`
        #[arg(long, allow_negative_numbers = true)]
        acc: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = match &cli.config {
        Some(path) => load_options(path)?,
        None => EngineOptions::default(),
    };
    tracing::debug!(?options, "engine options");
    let engine = Engine::new(options);

    let output = run(&engine, &cli)?;
    println!("{output}");
    Ok(())
}

fn run(engine: &Engine, cli: &Cli) -> Result<String> {
    let input = || read_array(cli.input.as_deref());

    let output = match &cli.command {
        Commands::Map { operation } => {
            serde_json::to_string(&engine.map(&input()?, &parse_operation(operation)?)?)?
        }
        Commands::Filter { condition } => {
            serde_json::to_string(&engine.filter(&input()?, &parse_operation(condition)?)?)?
        }
        Commands::Find { condition } => {
            serde_json::to_string(&engine.find_first(&input()?, &parse_operation(condition)?)?)?
        }
        Commands::Reduce { operation, initial } => serde_json::to_string(&engine.reduce(
            &input()?,
            &parse_operation(operation)?,
            *initial,
        )?)?,
        Commands::GroupBy { key } => {
            serde_json::to_string(&engine.group_by(&input()?, &parse_operation(key)?)?)?
        }
        Commands::SortBy { comparator } => {
            serde_json::to_string(&engine.sort_by(&input()?, &parse_operation(comparator)?)?)?
        }
        Commands::Chain { stages } => {
            serde_json::to_string(&engine.chain(&input()?, &parse_stages(stages)?)?)?
        }
        Commands::Aggregate { metrics } => {
            serde_json::to_string(&engine.aggregate(&input()?, metrics))?
        }
        Commands::Eval { expr, x, acc } => {
            let mut env = Env::new();
            if let Some(x) = x {
                env.set("x", *x);
            }
            if let Some(acc) = acc {
                env.set("acc", *acc);
            }
            serde_json::to_string(&engine.evaluate(expr, &env)?)?
        }
    };
    Ok(output)
}

fn load_options(path: &Path) -> Result<EngineOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn read_array(path: Option<&Path>) -> Result<Vec<f64>> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    let array = parse_array(&text)?;
    tracing::info!(elements = array.len(), "input loaded");
    Ok(array)
}

fn parse_array(text: &str) -> Result<Vec<f64>> {
    let values: Vec<Option<f64>> =
        serde_json::from_str(text.trim()).context("input must be a JSON array of numbers")?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn parse_operation(text: &str) -> Result<Operation> {
    serde_json::from_str(text).with_context(|| format!("invalid operation descriptor: {text}"))
}

fn parse_stages(text: &str) -> Result<Vec<ChainOperation>> {
    serde_json::from_str(text).with_context(|| format!("invalid chain stages: {text}"))
}
