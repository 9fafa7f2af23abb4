//! candlescan CLI: screen a universe for recent candlestick patterns and trends.
//!
//! Commands:
//! - `scan`: analyze every instrument in the universe and write the CSV report
//! - `analyze`: analyze one symbol and print the result as JSON
//! - `patterns`: list the detector set in evaluation order

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use candlescan::config::{ProviderKind, ScanConfig};
use candlescan::data::{
    CsvDirProvider, DumpUniverse, MarketDataProvider, StaticUniverse, UniverseProvider,
    YahooProvider,
};
use candlescan::report::{CsvReportWriter, ReportWriter};
use candlescan::{BatchRunner, InstrumentAnalyzer, Outcome};

#[derive(Parser)]
#[command(
    name = "candlescan",
    version,
    about = "Daily candlestick pattern and trend screener"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the whole universe and write the report.
    Scan {
        /// Recency anchor date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        anchor: Option<NaiveDate>,

        /// Report path, overriding the config.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Explicit symbols, bypassing the instrument dump.
        #[arg(long, value_delimiter = ',')]
        symbols: Option<Vec<String>>,

        /// Worker threads for the analysis pool.
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Analyze a single symbol and print the result.
    Analyze {
        /// Provider symbol, e.g. RELIANCE.NS
        symbol: String,

        /// Recency anchor date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        anchor: Option<NaiveDate>,
    },
    /// List the pattern detectors in evaluation order.
    Patterns,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScanConfig::default(),
    };

    match cli.command {
        Commands::Scan {
            anchor,
            output,
            symbols,
            threads,
        } => run_scan(config, anchor, output, symbols, threads),
        Commands::Analyze { symbol, anchor } => run_analyze(&config, &symbol, anchor),
        Commands::Patterns => run_patterns(&config),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn build_provider(config: &ScanConfig) -> Result<Box<dyn MarketDataProvider>> {
    let provider: Box<dyn MarketDataProvider> = match config.data.provider {
        ProviderKind::Yahoo => Box::new(YahooProvider::new()?),
        ProviderKind::Csv => {
            let Some(dir) = &config.data.csv_dir else {
                bail!("data.csv_dir is required for the csv provider");
            };
            Box::new(CsvDirProvider::new(dir))
        }
    };
    Ok(provider)
}

fn run_scan(
    mut config: ScanConfig,
    anchor: Option<NaiveDate>,
    output: Option<PathBuf>,
    symbols: Option<Vec<String>>,
    threads: Option<usize>,
) -> Result<()> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("configuring the worker pool")?;
    }
    if let Some(path) = output {
        config.report.path = path;
    }
    if symbols.is_some() {
        config.universe.symbols = symbols;
    }

    let anchor = anchor.unwrap_or_else(today);
    let analyzer = InstrumentAnalyzer::new(config.analysis.clone())?;
    let provider = build_provider(&config)?;
    let range = config.date_range()?;

    let universe = match &config.universe.symbols {
        Some(list) => StaticUniverse::new(list.iter().cloned()).symbols()?,
        None => DumpUniverse::new(config.universe.source.clone(), config.universe.filter())
            .symbols()
            .context("loading instrument universe")?,
    };

    let summary = BatchRunner::new(&analyzer, provider.as_ref(), range, anchor).run(&universe);

    let mut writer = CsvReportWriter::from_path(&config.report.path)
        .with_context(|| format!("creating report {}", config.report.path.display()))?;
    writer.write_all(&summary.results)?;

    info!(
        path = %config.report.path.display(),
        rows = summary.results.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "report written"
    );
    Ok(())
}

fn run_analyze(config: &ScanConfig, symbol: &str, anchor: Option<NaiveDate>) -> Result<()> {
    let anchor = anchor.unwrap_or_else(today);
    let analyzer = InstrumentAnalyzer::new(config.analysis.clone())?;
    let provider = build_provider(config)?;
    let series = provider
        .fetch(symbol, config.date_range()?)
        .with_context(|| format!("fetching {symbol}"))?;

    let (outcome, hits) = analyzer.analyze_with_hits(symbol, &series, anchor)?;
    match outcome {
        Outcome::Analyzed(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            for hit in &hits {
                info!(pattern = %hit.name, date = %hit.date, "recent pattern");
            }
        }
        Outcome::Skipped(reason) => println!("{symbol}: skipped ({reason})"),
    }
    Ok(())
}

fn run_patterns(config: &ScanConfig) -> Result<()> {
    let analyzer = InstrumentAnalyzer::new(config.analysis.clone())?;
    for name in analyzer.detectors().names() {
        println!("{name}");
    }
    Ok(())
}
