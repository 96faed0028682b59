use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{ExchangeKind, MarketRequest, TimeFrame};
use crate::wave::{AnalysisOptions, PriceField};

/// Candle counts accepted for a single analysis run.
pub const LIMIT_RANGE: std::ops::RangeInclusive<usize> = 100..=1000;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_exchange() -> String {
    "bitget".into()
}

fn default_symbol() -> String {
    "BTC/USDT".into()
}

fn default_timeframe() -> String {
    "1h".into()
}

fn default_limit() -> usize {
    500
}

fn default_price_field() -> String {
    "close".into()
}

fn default_threshold() -> f64 {
    0.02
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            symbol: default_symbol(),
            timeframe: default_timeframe(),
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_price_field")]
    pub price_field: String,
    /// Carried through to extraction, which ignores it.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            price_field: default_price_field(),
            threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// When set, the analysis is exported as JSON to this path.
    #[serde(default)]
    pub json_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub show_waves: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: None,
            show_waves: true,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub exchange: Option<String>,
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub limit: Option<usize>,
    pub json_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(exchange) = overrides.exchange {
            self.market.exchange = exchange;
        }
        if let Some(symbol) = overrides.symbol {
            self.market.symbol = symbol;
        }
        if let Some(timeframe) = overrides.timeframe {
            self.market.timeframe = timeframe;
        }
        if let Some(limit) = overrides.limit {
            self.market.limit = limit;
        }
        if overrides.json_path.is_some() {
            self.output.json_path = overrides.json_path;
        }
    }

    /// Resolve the market section into typed values.
    pub fn market_request(&self) -> Result<MarketRequest, Report<ConfigError>> {
        let market = &self.market;
        let exchange = ExchangeKind::from_str(&market.exchange).ok_or_else(|| {
            invalid(format!(
                "market.exchange: unknown exchange \"{}\"",
                market.exchange
            ))
        })?;
        let timeframe = TimeFrame::from_str(&market.timeframe).ok_or_else(|| {
            invalid(format!(
                "market.timeframe: unknown timeframe \"{}\"",
                market.timeframe
            ))
        })?;
        Ok(MarketRequest {
            exchange,
            symbol: market.symbol.clone(),
            timeframe,
            limit: market.limit,
        })
    }

    pub fn analysis_options(&self) -> Result<AnalysisOptions, Report<ConfigError>> {
        let price_field = PriceField::from_str(&self.analysis.price_field).ok_or_else(|| {
            invalid(format!(
                "analysis.price_field: unknown field \"{}\"",
                self.analysis.price_field
            ))
        })?;
        Ok(AnalysisOptions {
            price_field,
            threshold: self.analysis.threshold,
        })
    }
}

/// Load an `AppConfig` from a TOML file at `path`.
///
/// A missing file yields the defaults. Call [`validate`] after applying
/// command-line overrides.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig, Report<ConfigError>> {
    toml::from_str(content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_log_format(config)?;
    validate_symbol(config)?;
    validate_limit(config)?;
    config.market_request()?;
    config.analysis_options()?;
    Ok(())
}

fn validate_log_format(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&config.general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" is not valid",
            config.general.log_format
        )));
    }
    Ok(())
}

fn validate_symbol(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.market.symbol.trim().is_empty() {
        return Err(invalid("market.symbol must not be empty".into()));
    }
    Ok(())
}

fn validate_limit(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !LIMIT_RANGE.contains(&config.market.limit) {
        return Err(invalid(format!(
            "market.limit {} is outside {}..={}",
            config.market.limit,
            LIMIT_RANGE.start(),
            LIMIT_RANGE.end()
        )));
    }
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}
