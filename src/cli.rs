//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvOutcomesAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::config_validation::{
    read_date, read_optional, read_required, validate_evaluation_config,
};
use crate::domain::detector;
use crate::domain::error::EdgecheckError;
use crate::domain::evaluator::{self, BacktestResult, EvaluationConfig};
use crate::domain::rule::SignalRule;
use crate::domain::rule_parser;
use crate::domain::universe::{load_universe, parse_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "edgecheck",
    about = "Monte Carlo significance testing for trading signals"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a signal rule against random entries
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        /// Rule expression, overrides [signal] rule
        #[arg(long)]
        rule: Option<String>,
        /// Comma-separated symbols, overrides [data] symbols
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        simulations: Option<usize>,
        /// JSON report path, overrides [report] json
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Per-outcome CSV path, overrides [report] outcomes_csv
        #[arg(long)]
        outcomes: Option<PathBuf>,
    },
    /// List signal triggers without significance testing
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        rule: Option<String>,
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs the tracing subscriber. Repeated calls keep the first subscriber.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = if verbose {
        EnvFilter::new("debug,edgecheck=debug")
    } else {
        EnvFilter::new("info,edgecheck=info")
    };

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(filter)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    match cli.command {
        Command::Evaluate {
            config,
            rule,
            symbols,
            seed,
            simulations,
            output,
            outcomes,
        } => run_evaluate(
            &config,
            &EvaluateOverrides {
                rule,
                symbols,
                seed,
                simulations,
                output,
                outcomes,
            },
        ),
        Command::Scan {
            config,
            rule,
            symbols,
        } => run_scan(&config, rule.as_deref(), symbols.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct EvaluateOverrides {
    pub rule: Option<String>,
    pub symbols: Option<String>,
    pub seed: Option<u64>,
    pub simulations: Option<usize>,
    pub output: Option<PathBuf>,
    pub outcomes: Option<PathBuf>,
}

fn fail(err: EdgecheckError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Builds the signal rule from `[signal]`, with `rule_override` replacing the expression.
pub fn build_rule(
    config: &dyn ConfigPort,
    rule_override: Option<&str>,
) -> Result<SignalRule, EdgecheckError> {
    let text = match rule_override {
        Some(r) => r.to_string(),
        None => config
            .get_string("signal", "rule")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| EdgecheckError::ConfigMissing {
                section: "signal".into(),
                key: "rule".into(),
            })?,
    };

    let predicates = rule_parser::parse(&text).inspect_err(|e| {
        eprintln!("error: failed to parse rule:\n{}", e.display_with_context(&text));
    })?;

    let name = config
        .get_string("signal", "name")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Unnamed".to_string());
    let lookback: usize = read_required(config, "signal", "lookback")?;
    let cooldown: usize = read_optional(config, "signal", "cooldown")?.unwrap_or(0);

    let rule = SignalRule::new(name, predicates, lookback).with_cooldown(cooldown);
    rule.validate()?;
    Ok(rule)
}

pub fn build_evaluation_config(
    config: &dyn ConfigPort,
    seed_override: Option<u64>,
    simulations_override: Option<usize>,
) -> Result<EvaluationConfig, EdgecheckError> {
    let defaults = EvaluationConfig::default();

    let holding_period = read_optional(config, "evaluation", "holding_period")?
        .unwrap_or(defaults.holding_period);
    let simulations = match simulations_override {
        Some(m) => m,
        None => read_optional(config, "evaluation", "simulations")?.unwrap_or(defaults.simulations),
    };
    let min_signals =
        read_optional(config, "evaluation", "min_signals")?.unwrap_or(defaults.min_signals);
    let seed = match seed_override {
        Some(s) => Some(s),
        None => read_optional(config, "evaluation", "seed")?,
    };

    let eval_config = EvaluationConfig {
        holding_period,
        simulations,
        min_signals,
        seed,
    };
    eval_config.validate()?;
    Ok(eval_config)
}

pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, EdgecheckError> {
    let raw = match symbols_override {
        Some(s) => s.to_string(),
        None => config
            .get_string("data", "symbols")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| EdgecheckError::ConfigMissing {
                section: "data".into(),
                key: "symbols".into(),
            })?,
    };

    parse_symbols(&raw).map_err(|e| EdgecheckError::ConfigInvalid {
        section: "data".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    })
}

pub fn resolve_date_range(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), EdgecheckError> {
    let start_date = read_date(config, "data", "start_date")?;
    let end_date = read_date(config, "data", "end_date")?;
    if start_date >= end_date {
        return Err(EdgecheckError::ConfigInvalid {
            section: "data".into(),
            key: "start_date".into(),
            reason: "start_date must be before end_date".into(),
        });
    }
    Ok((start_date, end_date))
}

pub fn data_adapter(config: &dyn ConfigPort) -> CsvAdapter {
    let directory = config
        .get_string("data", "directory")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "data".to_string());
    CsvAdapter::new(PathBuf::from(directory))
}

fn report_path(
    path_override: Option<&PathBuf>,
    config: &dyn ConfigPort,
    key: &str,
) -> Option<PathBuf> {
    path_override.cloned().or_else(|| {
        config
            .get_string("report", key)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    })
}

fn run_evaluate(config_path: &Path, overrides: &EvaluateOverrides) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Build rule, evaluation settings, universe and date window
    let rule = match build_rule(&adapter, overrides.rule.as_deref()) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let eval_config =
        match build_evaluation_config(&adapter, overrides.seed, overrides.simulations) {
            Ok(c) => c,
            Err(e) => return fail(e),
        };
    let symbols = match resolve_symbols(overrides.symbols.as_deref(), &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let (start_date, end_date) = match resolve_date_range(&adapter) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    let json_path = report_path(overrides.output.as_ref(), &adapter, "json");
    let outcomes_path = report_path(overrides.outcomes.as_ref(), &adapter, "outcomes_csv");

    // Stages 3-5: Load data, evaluate, report
    let data_port = data_adapter(&adapter);
    run_evaluate_pipeline(
        &data_port,
        &rule,
        &eval_config,
        &symbols,
        start_date,
        end_date,
        json_path.as_deref(),
        outcomes_path.as_deref(),
    )
}

#[allow(clippy::too_many_arguments)]
pub fn run_evaluate_pipeline(
    data_port: &dyn PriceDataPort,
    rule: &SignalRule,
    eval_config: &EvaluationConfig,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    json_path: Option<&Path>,
    outcomes_path: Option<&Path>,
) -> ExitCode {
    eprintln!(
        "Evaluating '{}' on {} symbols, {} to {}",
        rule.name,
        symbols.len(),
        start_date,
        end_date
    );

    let result = match evaluator::evaluate_from_port(
        data_port,
        symbols,
        start_date,
        end_date,
        rule,
        eval_config,
    ) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_summary(&result);

    if let Some(path) = json_path {
        if let Err(e) = JsonReportAdapter::new().write(&result, path) {
            return fail(e);
        }
        eprintln!("Report written to: {}", path.display());
    }
    if let Some(path) = outcomes_path {
        if let Err(e) = CsvOutcomesAdapter::new().write(&result, path) {
            return fail(e);
        }
        eprintln!("Outcomes written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

pub fn print_summary(result: &BacktestResult) {
    eprintln!("\n=== {} ===", result.signal_name);
    eprintln!("Rule:             {}", result.rule);
    eprintln!(
        "Lookback/Hold:    {} / {} bars",
        result.lookback, result.holding_period
    );
    eprintln!(
        "Instruments:      {} evaluated, {} skipped",
        result.instruments_evaluated,
        result.skipped.len()
    );
    for skipped in &result.skipped {
        eprintln!("  skipped {}: {}", skipped.symbol, skipped.reason);
    }
    eprintln!("Signals:          {}", result.signal_count);
    eprintln!("Win Rate:         {:.1}%", result.win_rate * 100.0);
    eprintln!("Mean Return:      {:+.3}%", result.mean_return);
    eprintln!("Median Return:    {:+.3}%", result.median_return);

    eprintln!("\n=== Null Distribution ===");
    eprintln!("Population:       {} windows", result.population_size);
    eprintln!("Simulations:      {} (seed {})", result.simulations, result.seed);
    eprintln!("Null Mean:        {:+.3}%", result.null_mean);
    eprintln!("Null Std:         {:.3}%", result.null_std);
    eprintln!("p-value:          {:.4}", result.p_value);
    eprintln!("Effect Size:      {:+.2}", result.effect_size);

    eprintln!("\nVerdict:          {}", result.verdict);
    if !result.is_conclusive() {
        eprintln!(
            "  {} signals is below the minimum of {}",
            result.signal_count, result.min_signals
        );
    }
}

fn run_scan(config_path: &Path, rule_override: Option<&str>, symbols_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let rule = match build_rule(&adapter, rule_override) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let eval_config = match build_evaluation_config(&adapter, None, None) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let symbols = match resolve_symbols(symbols_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let (start_date, end_date) = match resolve_date_range(&adapter) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    let data_port = data_adapter(&adapter);
    run_scan_pipeline(
        &data_port,
        &rule,
        eval_config.holding_period,
        &symbols,
        start_date,
        end_date,
    )
}

/// Prints one line per trigger to stdout: symbol, date, bar index, features.
pub fn run_scan_pipeline(
    data_port: &dyn PriceDataPort,
    rule: &SignalRule,
    holding_period: usize,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> ExitCode {
    let loaded = match load_universe(data_port, symbols, start_date, end_date) {
        Ok(l) => l,
        Err(e) => return fail(e),
    };

    println!("symbol,date,bar_index,features");
    let mut total = 0usize;

    for series in &loaded.series {
        let events = match detector::scan(series, rule, holding_period) {
            Ok(events) => events,
            Err(e) if e.is_instrument_local() => {
                eprintln!("warning: skipping {} ({})", series.symbol(), e);
                continue;
            }
            Err(e) => return fail(e),
        };

        for event in events {
            let features = event
                .feature_values
                .iter()
                .map(|(name, value)| format!("{}={:.4}", name, value))
                .collect::<Vec<_>>()
                .join(";");
            println!(
                "{},{},{},{}",
                event.symbol, event.trigger_date, event.bar_index, features
            );
            total += 1;
        }
    }

    eprintln!("{} signals across {} instruments", total, loaded.series.len());
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_evaluation_config(&adapter) {
        if let (EdgecheckError::RuleParse(pe), Some(text)) =
            (&e, adapter.get_string("signal", "rule"))
        {
            eprintln!("{}", pe.display_with_context(&text));
        }
        return fail(e);
    }

    let rule = match build_rule(&adapter, None) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let eval_config = match build_evaluation_config(&adapter, None, None) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let symbols = match resolve_symbols(None, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!("\nSignal: {}", rule.name);
    eprintln!("  Parsed:   {}", rule);
    eprintln!("  Lookback: {} bars", rule.lookback);
    if rule.cooldown > 0 {
        eprintln!("  Cooldown: {} bars", rule.cooldown);
    }

    eprintln!("\nEvaluation:");
    eprintln!("  holding_period: {}", eval_config.holding_period);
    eprintln!("  simulations:    {}", eval_config.simulations);
    eprintln!("  min_signals:    {}", eval_config.min_signals);
    match eval_config.seed {
        Some(seed) => eprintln!("  seed:           {}", seed),
        None => eprintln!("  seed:           (drawn per run)"),
    }

    eprintln!("\nUniverse:");
    eprintln!("  symbols: {}", symbols.join(", "));

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let adapter = data_adapter(&config);
    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
