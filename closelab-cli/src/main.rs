//! CloseLab CLI — price download, aggregation, and analysis commands.
//!
//! Commands:
//! - `download` — fetch daily history from EODHD and store per-ticker CSVs
//! - `symbols` — list an exchange's instruments filtered by type
//! - `closes` — merge stored series into the 0-closes.csv aggregate
//! - `returns` — log-returns of a stored closing table
//! - `corr` — correlation matrix of the log-returns
//! - `report` — fetch closes directly and export a report artifact directory
//! - `sp` — S&P 500 membership lookup from bundled reference data
//! - `store status` — per-ticker store report

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use closelab_core::analysis::{
    aggregate_closes, correlation, returns_from_closes, CorrelationMatrix, PriceField,
    AGGREGATE_FILENAME,
};
use closelab_core::data::{
    download_tickers, filter_by_kind, list_exchange, CsvStore, EodhdClient, SpUniverse,
    StdoutProgress, COMMON_STOCK, DEFAULT_EXCHANGE,
};
use closelab_core::report::{fetch_closes, write_report};
use closelab_core::table::WideTable;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "closelab", about = "CloseLab CLI — equity close retrieval and analysis")]
struct Cli {
    /// Optional config file supplying defaults for --data-dir, --token-file, --exchange.
    #[arg(long, default_value = "closelab.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily price history and store one CSV per ticker.
    Download {
        /// Tickers to download (e.g., AAPL MCD NKE).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// Data directory for per-ticker files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Plain-text file holding the API token.
        #[arg(long)]
        token_file: Option<PathBuf>,
    },
    /// List an exchange's instruments, filtered by instrument type.
    Symbols {
        /// Exchange code. Defaults to NYSE.
        #[arg(long)]
        exchange: Option<String>,

        /// Instrument type to keep.
        #[arg(long, default_value = COMMON_STOCK)]
        kind: String,

        /// Plain-text file holding the API token.
        #[arg(long)]
        token_file: Option<PathBuf>,
    },
    /// Merge stored per-ticker series into the closing-price aggregate.
    Closes {
        /// Data directory to scan.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Use adjusted close instead of raw close.
        #[arg(long, default_value_t = false)]
        adjusted: bool,
    },
    /// Log-returns of a stored closing table.
    Returns {
        /// Data directory holding the aggregate.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Aggregate filename.
        #[arg(long, default_value = AGGREGATE_FILENAME)]
        file: String,
    },
    /// Correlation matrix over the log-returns of a stored closing table.
    Corr {
        /// Data directory holding the aggregate.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Aggregate filename.
        #[arg(long, default_value = AGGREGATE_FILENAME)]
        file: String,
    },
    /// Fetch closes directly and export closes/returns/pct-change artifacts.
    Report {
        /// Tickers to include.
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// Use adjusted close instead of raw close.
        #[arg(long, default_value_t = false)]
        adjusted: bool,

        /// Output directory for the artifact set.
        #[arg(long, default_value = "report")]
        output_dir: PathBuf,

        /// Plain-text file holding the API token.
        #[arg(long)]
        token_file: Option<PathBuf>,
    },
    /// S&P 500 membership from the bundled reference CSV.
    Sp {
        /// Restrict to one GICS sector.
        #[arg(long)]
        sector: Option<String>,

        /// List the available sector names instead of symbols.
        #[arg(long, default_value_t = false)]
        sectors: bool,
    },
    /// Store management commands.
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Report which tickers are stored, with date ranges and bar counts.
    Status {
        /// Data directory to inspect.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

/// Defaults loadable from closelab.toml; flags always win.
#[derive(Debug, Default, Deserialize)]
struct Config {
    data_dir: Option<PathBuf>,
    token_file: Option<PathBuf>,
    exchange: Option<String>,
}

impl Config {
    /// Load the config file if present; a missing file means defaults.
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    fn data_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from("data_files"))
    }

    fn token_file(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.token_file.clone())
            .unwrap_or_else(|| PathBuf::from("api_token.txt"))
    }

    fn exchange(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.exchange.clone())
            .unwrap_or_else(|| DEFAULT_EXCHANGE.to_string())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Download {
            tickers,
            start,
            data_dir,
            token_file,
        } => run_download(&config, tickers, start, data_dir, token_file),
        Commands::Symbols {
            exchange,
            kind,
            token_file,
        } => run_symbols(&config, exchange, kind, token_file),
        Commands::Closes { data_dir, adjusted } => run_closes(&config, data_dir, adjusted),
        Commands::Returns { data_dir, file } => run_returns(&config, data_dir, &file),
        Commands::Corr { data_dir, file } => run_corr(&config, data_dir, &file),
        Commands::Report {
            tickers,
            start,
            adjusted,
            output_dir,
            token_file,
        } => run_report(&config, tickers, start, adjusted, output_dir, token_file),
        Commands::Sp { sector, sectors } => run_sp(sector, sectors),
        Commands::Store { action } => match action {
            StoreAction::Status { data_dir } => run_store_status(&config, data_dir),
        },
    }
}

/// Read the API token from its plain-text file; absent file means no token.
fn read_token(path: &Path) -> String {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn parse_start(start: Option<String>) -> Result<NaiveDate> {
    match start {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("invalid --start date '{s}'")),
        None => Ok(chrono::Local::now().date_naive() - chrono::Duration::days(365)),
    }
}

fn price_field(adjusted: bool) -> PriceField {
    if adjusted {
        PriceField::AdjustedClose
    } else {
        PriceField::Close
    }
}

fn run_download(
    config: &Config,
    tickers: Vec<String>,
    start: Option<String>,
    data_dir: Option<PathBuf>,
    token_file: Option<PathBuf>,
) -> Result<()> {
    let from = parse_start(start)?;
    let token = read_token(&config.token_file(token_file));
    if token.is_empty() {
        eprintln!("Warning: no API token found; every ticker will be skipped.");
    }

    let client = EodhdClient::new(token);
    let store = CsvStore::new(config.data_dir(data_dir));
    let ticker_refs: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

    let summary = download_tickers(&client, &store, &ticker_refs, from, &StdoutProgress);

    if !summary.all_downloaded() {
        println!("Skipped tickers:");
        for (ticker, err) in &summary.errors {
            println!("  {ticker}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_symbols(
    config: &Config,
    exchange: Option<String>,
    kind: String,
    token_file: Option<PathBuf>,
) -> Result<()> {
    let exchange = config.exchange(exchange);
    let token = read_token(&config.token_file(token_file));
    let client = EodhdClient::new(token);

    let listing = list_exchange(&client, &exchange)?;
    if listing.is_empty() {
        println!("No instruments listed for {exchange} (missing token or empty exchange).");
        return Ok(());
    }

    let codes = filter_by_kind(&listing, &kind);
    println!("{exchange}: {} instruments of type '{kind}'", codes.len());
    for code in codes {
        println!("{code}");
    }

    Ok(())
}

fn run_closes(config: &Config, data_dir: Option<PathBuf>, adjusted: bool) -> Result<()> {
    let dir = config.data_dir(data_dir);
    let table = aggregate_closes(&dir, price_field(adjusted))?;

    if table.is_empty() {
        println!("No stored series found in {}", dir.display());
        return Ok(());
    }

    println!(
        "Wrote {} ({} dates x {} tickers)",
        dir.join(AGGREGATE_FILENAME).display(),
        table.height(),
        table.width()
    );
    print_table(&table);
    Ok(())
}

fn run_returns(config: &Config, data_dir: Option<PathBuf>, file: &str) -> Result<()> {
    let dir = config.data_dir(data_dir);
    let returns = returns_from_closes(&dir, file)?;
    print_table(&returns);
    Ok(())
}

fn run_corr(config: &Config, data_dir: Option<PathBuf>, file: &str) -> Result<()> {
    let dir = config.data_dir(data_dir);
    let returns = returns_from_closes(&dir, file)?;
    print_matrix(&correlation(&returns));
    Ok(())
}

fn run_report(
    config: &Config,
    tickers: Vec<String>,
    start: Option<String>,
    adjusted: bool,
    output_dir: PathBuf,
    token_file: Option<PathBuf>,
) -> Result<()> {
    let from = parse_start(start)?;
    let token = read_token(&config.token_file(token_file));
    let client = EodhdClient::new(token);
    let ticker_refs: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

    let (closes, skipped) = fetch_closes(&client, &ticker_refs, from, price_field(adjusted));
    for (ticker, err) in &skipped {
        eprintln!("Skipped {ticker}: {err}");
    }

    let paths = write_report(&output_dir, &closes)?;
    println!("Report written to: {}", paths.dir.display());
    Ok(())
}

fn run_sp(sector: Option<String>, sectors: bool) -> Result<()> {
    let universe = SpUniverse::bundled();

    if sectors {
        for name in universe.sectors() {
            println!("{name}");
        }
        return Ok(());
    }

    let symbols = match &sector {
        Some(name) => universe.sector(name),
        None => universe.symbols(),
    };
    for symbol in symbols {
        println!("{symbol}");
    }
    Ok(())
}

fn run_store_status(config: &Config, data_dir: Option<PathBuf>) -> Result<()> {
    let dir = config.data_dir(data_dir);
    let store = CsvStore::new(&dir);
    let tickers = store.list_tickers()?;

    if tickers.is_empty() {
        println!("Store is empty: {}", dir.display());
        return Ok(());
    }

    let ticker_refs: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();
    let statuses = store.status(&ticker_refs);

    println!("Store: {}", dir.display());
    println!("Tickers: {}", statuses.len());
    println!();
    println!("{:<8} {:<25} {:>8}", "Ticker", "Date Range", "Bars");
    println!("{}", "-".repeat(44));
    for status in &statuses {
        let range = match (status.start_date, status.end_date) {
            (Some(start), Some(end)) => format!("{start} to {end}"),
            _ => "(no meta)".to_string(),
        };
        let bars = status
            .bar_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<8} {:<25} {:>8}", status.ticker, range, bars);
    }

    Ok(())
}

/// Print a wide table with a date column and right-aligned values.
fn print_table(table: &WideTable) {
    print!("{:<12}", "date");
    for ticker in table.tickers() {
        print!(" {ticker:>12}");
    }
    println!();

    for (row, date) in table.dates().iter().enumerate() {
        print!("{:<12}", date.to_string());
        for col in 0..table.width() {
            match table.get(row, col) {
                Some(v) => print!(" {v:>12.6}"),
                None => print!(" {:>12}", ""),
            }
        }
        println!();
    }
}

/// Print a correlation matrix with ticker labels on both axes.
fn print_matrix(corr: &CorrelationMatrix) {
    print!("{:<8}", "");
    for ticker in corr.tickers() {
        print!(" {ticker:>8}");
    }
    println!();

    for (i, ticker) in corr.tickers().iter().enumerate() {
        print!("{ticker:<8}");
        for j in 0..corr.size() {
            print!(" {:>8.4}", corr.get(i, j));
        }
        println!();
    }
}
