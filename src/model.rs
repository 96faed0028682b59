use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Bitget,
    Binance,
}

impl ExchangeKind {
    /// Parse a config-format exchange name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bitget" => Some(Self::Bitget),
            "binance" => Some(Self::Binance),
            _ => None,
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitget => write!(f, "bitget"),
            Self::Binance => write!(f, "binance"),
        }
    }
}

/// Candle timeframe supported by the application.
///
/// String representations match the config file format (e.g. `"1h"`, `"1d"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    Min1,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "30m")]
    Min30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl TimeFrame {
    /// Parse a config-format string into a `TimeFrame`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Self::Min1),
            "5m" => Some(Self::Min5),
            "15m" => Some(Self::Min15),
            "30m" => Some(Self::Min30),
            "1h" => Some(Self::Hour1),
            "4h" => Some(Self::Hour4),
            "1d" => Some(Self::Day1),
            _ => None,
        }
    }

    /// Return the config-format string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min1 => "1m",
            Self::Min5 => "5m",
            Self::Min15 => "15m",
            Self::Min30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Day1 => "1d",
        }
    }

    /// Return the Bitget spot candle `granularity` for this timeframe.
    pub fn bitget_granularity(self) -> &'static str {
        match self {
            Self::Min1 => "1min",
            Self::Min5 => "5min",
            Self::Min15 => "15min",
            Self::Min30 => "30min",
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Day1 => "1day",
        }
    }

    /// Return the Binance kline interval string for this timeframe.
    pub fn binance_interval(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One OHLCV sample. A series is always ordered ascending by `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// What to fetch and analyze in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketRequest {
    pub exchange: ExchangeKind,
    pub symbol: String,
    pub timeframe: TimeFrame,
    pub limit: usize,
}

/// Turn a user-facing pair like `BTC/USDT` into the exchange ticker `BTCUSDT`.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_'))
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_round_trip() {
        let frames = [
            ("1m", TimeFrame::Min1),
            ("5m", TimeFrame::Min5),
            ("15m", TimeFrame::Min15),
            ("30m", TimeFrame::Min30),
            ("1h", TimeFrame::Hour1),
            ("4h", TimeFrame::Hour4),
            ("1d", TimeFrame::Day1),
        ];
        for (s, tf) in frames {
            assert_eq!(TimeFrame::from_str(s), Some(tf));
            assert_eq!(tf.as_str(), s);
        }
    }

    #[test]
    fn timeframe_invalid_string_returns_none() {
        assert_eq!(TimeFrame::from_str("2m"), None);
        assert_eq!(TimeFrame::from_str(""), None);
    }

    #[test]
    fn bitget_granularity_uses_day_suffix() {
        assert_eq!(TimeFrame::Hour4.bitget_granularity(), "4h");
        assert_eq!(TimeFrame::Day1.bitget_granularity(), "1day");
    }

    #[test]
    fn exchange_kind_display_matches_parse() {
        for kind in [ExchangeKind::Bitget, ExchangeKind::Binance] {
            assert_eq!(ExchangeKind::from_str(&kind.to_string()), Some(kind));
        }
        assert_eq!(ExchangeKind::from_str("upbit"), None);
    }

    #[test]
    fn exchange_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ExchangeKind::Bitget).unwrap();
        assert_eq!(json, "\"bitget\"");
    }

    #[test]
    fn timeframe_serializes_config_string() {
        let json = serde_json::to_string(&TimeFrame::Day1).unwrap();
        assert_eq!(json, "\"1d\"");
        let parsed: TimeFrame = serde_json::from_str("\"4h\"").unwrap();
        assert_eq!(parsed, TimeFrame::Hour4);
    }

    #[test]
    fn normalize_symbol_strips_separators() {
        assert_eq!(normalize_symbol("BTC/USDT"), "BTCUSDT");
        assert_eq!(normalize_symbol("eth-usdt"), "ETHUSDT");
        assert_eq!(normalize_symbol("SOLUSDT"), "SOLUSDT");
    }
}
