use std::path::{Path, PathBuf};

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use elliott_wave::config::{self, AppConfig, Overrides};
use elliott_wave::exchange::build_exchange;
use elliott_wave::report::Reporter;
use elliott_wave::report::json::JsonReporter;
use elliott_wave::report::terminal::TerminalReporter;
use elliott_wave::wave::{analyze, analyze_strict};

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("exchange error")]
    Exchange,
    #[display("analysis error")]
    Analysis,
    #[display("report error")]
    Report,
}

#[derive(Parser)]
#[command(
    name = "elliott-wave",
    about = "Elliott Wave annotation of exchange candle history"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Exchange to fetch from (`bitget` or `binance`)
    #[arg(long)]
    exchange: Option<String>,

    /// Trading pair, e.g. `BTC/USDT`
    #[arg(short, long)]
    symbol: Option<String>,

    /// Candle timeframe, e.g. `1h`, `4h`, `1d`
    #[arg(short, long)]
    timeframe: Option<String>,

    /// Number of candles to analyze (100..=1000)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Export the analysis as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail when too few extrema are found to assemble any wave
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let mut config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;
    config.apply(Overrides {
        exchange: cli.exchange,
        symbol: cli.symbol,
        timeframe: cli.timeframe,
        limit: cli.limit,
        json_path: cli.output,
    });
    config::validate(&config).change_context(AppError::Config)?;

    init_tracing(&config);

    let request = config.market_request().change_context(AppError::Config)?;
    let options = config.analysis_options().change_context(AppError::Config)?;

    // ── Fetch ─────────────────────────────────────────────────────────────────
    let exchange = build_exchange(request.exchange);
    info!(
        exchange = %request.exchange,
        symbol = %request.symbol,
        timeframe = %request.timeframe,
        limit = request.limit,
        "fetching candles"
    );
    let candles = exchange
        .fetch_candles(&request.symbol, request.timeframe, request.limit)
        .await
        .change_context(AppError::Exchange)
        .attach_with(|| format!("symbol: {}", request.symbol))?;

    if candles.is_empty() {
        warn!(symbol = %request.symbol, "exchange returned no candles");
    }

    // ── Analyze ───────────────────────────────────────────────────────────────
    let analysis = if cli.strict {
        analyze_strict(&candles, &options).change_context(AppError::Analysis)?
    } else {
        analyze(&candles, &options)
    };

    // ── Report ────────────────────────────────────────────────────────────────
    let mut reporters: Vec<Box<dyn Reporter>> = vec![Box::new(TerminalReporter {
        show_waves: config.output.show_waves,
    })];
    if let Some(path) = &config.output.json_path {
        reporters.push(Box::new(JsonReporter::new(path)));
    }

    for reporter in &reporters {
        reporter
            .report(&request, &candles, &analysis)
            .change_context(AppError::Report)?;
    }

    info!("done");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
