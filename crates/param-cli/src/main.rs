//! param-cli: offline tools over exported optimization results.
//!
//! Usage:
//!   cargo run -p param-cli -- select --records runs.json --config opt.json
//!   cargo run -p param-cli -- select --records runs.json --method plateau --minimize
//!   cargo run -p param-cli -- score --records runs.json --config opt.json
//!   cargo run -p param-cli -- windows --config opt.json
//!
//! `--config` defaults to the file named by `OPTIMIZATION_CONFIG`.

use std::path::Path;

use anyhow::{bail, Context};
use param_optimizer::{
    compute_composite_score, select_final_params, OptimizationConfig, ResultRecord, SelectionMethod,
    SelectionOptions, CONFIG_ENV,
};

const USAGE: &str = "usage: param-cli <select|score|windows> [--records FILE] [--config FILE] [--method NAME] [--minimize]";

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn load_records(path: &str) -> anyhow::Result<Vec<ResultRecord>> {
    let raw = std::fs::read_to_string(Path::new(path)).with_context(|| format!("reading records from {}", path))?;
    let records: Vec<ResultRecord> =
        serde_json::from_str(&raw).with_context(|| format!("parsing records from {}", path))?;
    tracing::info!("Loaded {} records from {}", records.len(), path);
    Ok(records)
}

/// Explicit `--config`, else `OPTIMIZATION_CONFIG`, else none.
fn load_config(args: &[String], required: bool) -> anyhow::Result<Option<OptimizationConfig>> {
    let path = flag_value(args, "--config")
        .map(String::from)
        .or_else(|| std::env::var(CONFIG_ENV).ok());
    match path {
        Some(path) => {
            let config =
                OptimizationConfig::from_path(&path).with_context(|| format!("loading config from {}", path))?;
            Ok(Some(config))
        }
        None if required => bail!("no config given: pass --config or set {}", CONFIG_ENV),
        None => Ok(None),
    }
}

fn select(args: &[String]) -> anyhow::Result<()> {
    let records_path = flag_value(args, "--records").context("select needs --records FILE")?;
    let records = load_records(records_path)?;
    let config = load_config(args, false)?;

    let (mut options, mut maximize, grid) = match &config {
        Some(c) => (c.final_selection.clone(), c.ranks_maximize(), Some(&c.param_grid)),
        None => (SelectionOptions::default(), true, None),
    };
    if let Some(method) = flag_value(args, "--method") {
        options.method = method.parse::<SelectionMethod>()?;
    }
    if args.iter().any(|a| a == "--minimize") {
        maximize = false;
    }

    let selection = select_final_params(&records, grid, &options, maximize)?;
    println!("{}", serde_json::to_string_pretty(&selection)?);
    Ok(())
}

fn score(args: &[String]) -> anyhow::Result<()> {
    let records_path = flag_value(args, "--records").context("score needs --records FILE")?;
    let records = load_records(records_path)?;
    let config = load_config(args, true)?.context("score needs a config")?;
    if config.composite_weights.is_empty() {
        bail!("config has no composite_weights");
    }

    let missing = records.iter().filter(|r| r.metrics.is_none()).count();
    if missing > 0 {
        tracing::warn!("{} records carry no metric vector and score neutral", missing);
    }

    let ranked = compute_composite_score(&records, &config.composite_weights);
    println!("{}", serde_json::to_string_pretty(&ranked)?);
    Ok(())
}

fn windows(args: &[String]) -> anyhow::Result<()> {
    let config = load_config(args, true)?.context("windows needs a config")?;
    let spec = config.walk_forward_spec()?;
    let windows = spec.windows();
    tracing::info!(
        "{} windows between {} and {} ({}d train / {}d test)",
        windows.len(),
        spec.from_date,
        spec.to_date,
        spec.train_days,
        spec.test_days
    );
    for (i, w) in windows.iter().enumerate() {
        println!("{:>3}  train {}  test {}", i + 1, w.train, w.test);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "param_cli=info,param_optimizer=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    match command.as_str() {
        "select" => select(&args[1..]),
        "score" => score(&args[1..]),
        "windows" => windows(&args[1..]),
        "-h" | "--help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}
