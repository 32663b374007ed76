//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{validate_config, MAX_LIMIT};
use crate::domain::error::SpottraderError;
use crate::domain::gaps::{fill_candle_gaps, fill_frame};
use crate::domain::pipeline::{normalize_ohlcv, recommend, recommend_advanced};
use crate::domain::quote_cache::{QuoteCache, DEFAULT_TTL};
use crate::domain::recommendation::EngineParams;
use crate::domain::resample::resample_ohlcv;
use crate::domain::valuation::{value_balances, DEFAULT_QUOTE_ASSET};
use crate::ports::candle_port::CandlePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;

pub const DEFAULT_OHLCV_LIMIT: usize = 500;

#[derive(Parser, Debug)]
#[command(name = "spottrader", about = "Spot market indicators and trade signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the latest indicator values and the derived signal
    Recommend {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        interval: String,
        /// Use the MACD + RSI engine
        #[arg(long)]
        advanced: bool,
    },
    /// Print a resampled, gap-filled candle series as CSV
    Ohlcv {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        tf: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Resample a candle CSV file to another timeframe
    Resample {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        tf: String,
        /// Insert flat candles for empty buckets
        #[arg(long)]
        fill: bool,
    },
    /// Fill missing cells of a numeric CSV file
    Fill {
        #[arg(short, long)]
        input: PathBuf,
        /// ffill, linear or zero
        #[arg(short, long, default_value = "ffill")]
        method: String,
    },
    /// Value a balances CSV (asset,free,locked) in the quote asset
    Valuate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        balances: PathBuf,
    },
    /// Load a candle CSV file into the SQLite store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        input: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        interval: String,
    },
    /// Load a symbol,price CSV file into the SQLite store
    ImportTickers {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        input: PathBuf,
    },
    /// List symbols available from the configured data source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Recommend {
            config,
            symbol,
            interval,
            advanced,
        } => run_recommend(&config, &symbol, &interval, advanced),
        Command::Ohlcv {
            config,
            symbol,
            tf,
            limit,
        } => run_ohlcv(&config, &symbol, &tf, limit),
        Command::Resample { input, tf, fill } => run_resample(&input, &tf, fill),
        Command::Fill { input, method } => run_fill(&input, &method),
        Command::Valuate { config, balances } => run_valuate(&config, &balances),
        Command::Import {
            config,
            input,
            symbol,
            interval,
        } => run_import(&config, &input, &symbol, &interval),
        Command::ImportTickers { config, input } => run_import_tickers(&config, &input),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Serve { config } => run_serve(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load and validate an INI config file.
pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, SpottraderError> {
    tracing::debug!(path = %path.display(), "loading config");
    let config = FileConfigAdapter::from_file(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// The candle and price sources selected by `[data] source`.
pub struct Sources {
    pub candles: Arc<dyn CandlePort + Send + Sync>,
    pub prices: Arc<dyn PricePort + Send + Sync>,
}

pub fn open_sources(config: &dyn ConfigPort) -> Result<Sources, SpottraderError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.trim() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            let store = Arc::new(SqliteAdapter::from_config(config)?);
            store.initialize_schema()?;
            Ok(Sources {
                candles: store.clone(),
                prices: store,
            })
        }
        "csv" => {
            let csv = Arc::new(CsvAdapter::from_config(config)?);
            Ok(Sources {
                candles: csv.clone(),
                prices: csv,
            })
        }
        other => Err(SpottraderError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("data source '{}' is not available in this build", other),
        }),
    }
}

pub fn quote_cache_from_config(config: &dyn ConfigPort) -> QuoteCache {
    let secs = config.get_int("cache", "quote_ttl_secs", DEFAULT_TTL.as_secs() as i64);
    QuoteCache::with_system_clock(Duration::from_secs(secs.max(1) as u64))
}

fn fmt_value(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.4}", v),
        None => "n/a".to_string(),
    }
}

fn run_recommend(
    config_path: &PathBuf,
    symbol: &str,
    interval: &str,
    advanced: bool,
) -> Result<(), SpottraderError> {
    let config = load_config(config_path)?;
    let sources = open_sources(&config)?;
    let params = EngineParams::from_config(&config);

    if advanced {
        let rec = recommend_advanced(&*sources.candles, symbol, interval, &params)?;
        println!("symbol:         {}", rec.symbol);
        println!("interval:       {}", rec.interval);
        println!("macd:           {}", fmt_value(rec.macd));
        println!("macd_signal:    {}", fmt_value(rec.macd_signal));
        println!("macd_histogram: {}", fmt_value(rec.macd_histogram));
        println!("rsi14:          {}", fmt_value(rec.rsi14));
        println!("signal:         {}", rec.signal);
    } else {
        let rec = recommend(&*sources.candles, symbol, interval, &params)?;
        println!("symbol:   {}", rec.symbol);
        println!("interval: {}", rec.interval);
        println!("ema12:    {}", fmt_value(rec.ema12));
        println!("ema26:    {}", fmt_value(rec.ema26));
        println!("rsi14:    {}", fmt_value(rec.rsi14));
        println!("signal:   {}", rec.signal);
    }
    Ok(())
}

fn run_ohlcv(
    config_path: &PathBuf,
    symbol: &str,
    tf: &str,
    limit: Option<usize>,
) -> Result<(), SpottraderError> {
    let config = load_config(config_path)?;
    let limit = limit.unwrap_or(DEFAULT_OHLCV_LIMIT);
    if limit == 0 || limit as i64 > MAX_LIMIT {
        return Err(SpottraderError::ConfigInvalid {
            section: "cli".to_string(),
            key: "limit".to_string(),
            reason: format!("limit must be between 1 and {}", MAX_LIMIT),
        });
    }

    let sources = open_sources(&config)?;
    let candles = normalize_ohlcv(&*sources.candles, symbol, tf, limit)?;
    csv_adapter::write_candles(io::stdout().lock(), &candles)
}

fn run_resample(input: &PathBuf, tf: &str, fill: bool) -> Result<(), SpottraderError> {
    let candles = csv_adapter::read_candles_file(input)?;
    let mut out = resample_ohlcv(&candles, tf)?;
    if fill {
        out = fill_candle_gaps(&out, tf)?;
    }
    tracing::info!(input = candles.len(), output = out.len(), tf, "resampled");
    csv_adapter::write_candles(io::stdout().lock(), &out)
}

fn run_fill(input: &PathBuf, method: &str) -> Result<(), SpottraderError> {
    let frame = csv_adapter::read_frame(std::fs::File::open(input)?)?;
    let filled = fill_frame(&frame, method)?;
    csv_adapter::write_frame(io::stdout().lock(), &filled)
}

fn run_valuate(config_path: &PathBuf, balances_path: &PathBuf) -> Result<(), SpottraderError> {
    let config = load_config(config_path)?;
    let sources = open_sources(&config)?;
    let cache = quote_cache_from_config(&config);
    let quote_asset = config
        .get_string("market", "quote_asset")
        .unwrap_or_else(|| DEFAULT_QUOTE_ASSET.to_string());

    let balances = csv_adapter::read_balances(balances_path)?;
    let valuation = value_balances(&balances, &quote_asset, &cache, &*sources.prices);

    println!(
        "{:<8} {:>16} {:>16} {:>16}",
        "asset",
        "quantity",
        format!("price_{}", quote_asset.to_lowercase()),
        format!("value_{}", quote_asset.to_lowercase())
    );
    for item in &valuation.items {
        println!(
            "{:<8} {:>16} {:>16} {:>16}",
            item.asset,
            item.free + item.locked,
            fmt_value(item.price),
            if item.priced {
                fmt_value(item.value)
            } else {
                "unpriced".to_string()
            }
        );
    }
    println!("total: {:.4} {}", valuation.total, quote_asset);
    Ok(())
}

fn run_import(
    config_path: &PathBuf,
    input: &PathBuf,
    symbol: &str,
    interval: &str,
) -> Result<(), SpottraderError> {
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::domain::timeframe::Timeframe;

        let config = load_config(config_path)?;
        let tf: Timeframe = interval.parse()?;
        let candles = csv_adapter::read_candles_file(input)?;

        let store = SqliteAdapter::from_config(&config)?;
        store.initialize_schema()?;
        let rows = store.insert_candles(symbol, tf, &candles)?;

        if let Some((first, last, count)) = store.data_range(symbol, tf)? {
            eprintln!(
                "imported {} rows; {} {} now spans {}..{} ({} candles)",
                rows, symbol, tf, first, last, count
            );
        }
        Ok(())
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config_path, input, symbol, interval);
        Err(SpottraderError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: "sqlite feature is required for import".to_string(),
        })
    }
}

fn run_import_tickers(config_path: &PathBuf, input: &PathBuf) -> Result<(), SpottraderError> {
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let config = load_config(config_path)?;
        let tickers = csv_adapter::read_tickers(input)?;
        let store = SqliteAdapter::from_config(&config)?;
        store.initialize_schema()?;
        for (symbol, price) in &tickers {
            store.upsert_price(symbol, *price)?;
        }
        eprintln!("imported {} tickers", tickers.len());
        Ok(())
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config_path, input);
        Err(SpottraderError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: "sqlite feature is required for import-tickers".to_string(),
        })
    }
}

fn run_list_symbols(config_path: &PathBuf) -> Result<(), SpottraderError> {
    let config = load_config(config_path)?;
    let sources = open_sources(&config)?;
    let symbols = sources.candles.list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_serve(config_path: &PathBuf) -> Result<(), SpottraderError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{serve, AppState, DEFAULT_LISTEN, DEFAULT_STATIC_DIR};

        let config = load_config(config_path)?;
        let sources = open_sources(&config)?;
        let quotes = Arc::new(quote_cache_from_config(&config));
        let state = AppState::new(sources.candles, sources.prices, quotes).configured(&config);

        let listen = config
            .get_string("web", "listen")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let static_dir = config
            .get_bool("web", "serve_static", true)
            .then(|| {
                config
                    .get_string("web", "static_dir")
                    .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
            });

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(serve(state, &listen, static_dir.as_deref()))?;
        Ok(())
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        Err(SpottraderError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: "web feature is required for serve".to_string(),
        })
    }
}
