use std::sync::Arc;

use chrono::DateTime;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ExchangeError;
use crate::exchange::{Exchange, into_ascending};
use crate::model::{Candle, ExchangeKind, TimeFrame, normalize_symbol};

const BITGET_BASE_URL: &str = "https://api.bitget.com";
const CANDLES_PATH: &str = "/api/v2/spot/market/candles";
const MAX_CANDLES_PER_REQUEST: usize = 1000;
const SUCCESS_CODE: &str = "00000";

/// Public market data from Bitget spot. No API key is needed for candles.
pub struct BitgetExchange {
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl BitgetExchange {
    pub fn new() -> Self {
        // Market endpoints allow 20 req/s per IP; stay below it.
        let quota = Quota::per_second(nonzero!(10u32));
        Self {
            client: reqwest::Client::new(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

impl Default for BitgetExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange for BitgetExchange {
    fn kind(&self) -> ExchangeKind {
        ExchangeKind::Bitget
    }

    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Candle>, Report<ExchangeError>>> {
        let symbol = normalize_symbol(symbol);
        Box::pin(async move {
            self.rate_limiter.until_ready().await;

            let url = format!("{BITGET_BASE_URL}{CANDLES_PATH}");
            let limit_str = limit.min(MAX_CANDLES_PER_REQUEST).to_string();
            let params = [
                ("symbol", symbol.as_str()),
                ("granularity", timeframe.bitget_granularity()),
                ("limit", limit_str.as_str()),
            ];

            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .change_context(ExchangeError::Connection {
                    exchange: "bitget".into(),
                })?;

            let status = response.status();
            // Bitget reports errors in the envelope, often alongside a 4xx.
            let envelope: BitgetEnvelope = response
                .json()
                .await
                .change_context(ExchangeError::ResponseParse {
                    exchange: "bitget".into(),
                })
                .attach_with(|| format!("HTTP status: {status}"))?;

            let rows = envelope.into_rows(&symbol)?;
            debug!(symbol = %symbol, rows = rows.len(), "bitget response decoded");

            let candles = rows
                .iter()
                .map(|row| parse_row(row))
                .collect::<Result<Vec<_>, _>>()?;

            info!(
                symbol = %symbol,
                timeframe = %timeframe,
                fetched = candles.len(),
                "bitget candle fetch complete"
            );

            Ok(into_ascending(candles))
        })
    }
}

// ── REST response types ───────────────────────────────────────────────────────

/// `{ "code": "00000", "msg": "success", "requestTime": ..., "data": [...] }`
#[derive(Debug, Deserialize)]
struct BitgetEnvelope {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<Vec<Vec<String>>>,
}

impl BitgetEnvelope {
    fn into_rows(self, symbol: &str) -> Result<Vec<Vec<String>>, Report<ExchangeError>> {
        if self.code != SUCCESS_CODE {
            let context = if self.msg.to_lowercase().contains("symbol") {
                ExchangeError::UnknownSymbol {
                    exchange: "bitget".into(),
                    symbol: symbol.to_owned(),
                }
            } else {
                ExchangeError::Request {
                    exchange: "bitget".into(),
                }
            };
            return Err(Report::new(context).attach(format!("code {}: {}", self.code, self.msg)));
        }
        Ok(self.data.unwrap_or_default())
    }
}

/// Row layout: `[ts_ms, open, high, low, close, base_volume, usdt_volume, quote_volume]`.
fn parse_row(row: &[String]) -> Result<Candle, Report<ExchangeError>> {
    let parse_err = || ExchangeError::ResponseParse {
        exchange: "bitget".into(),
    };
    if row.len() < 6 {
        return Err(Report::new(parse_err()).attach(format!("short candle row: {row:?}")));
    }
    let parse_f64 = |s: &str| -> Result<f64, Report<ExchangeError>> {
        s.parse::<f64>()
            .change_context_lazy(parse_err)
            .attach_with(|| format!("value: {s}"))
    };

    let millis = row[0].parse::<i64>().change_context_lazy(parse_err)?;
    let timestamp = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        Report::new(parse_err()).attach(format!("timestamp out of range: {millis}"))
    })?;

    Ok(Candle {
        timestamp,
        open: parse_f64(&row[1])?,
        high: parse_f64(&row[2])?,
        low: parse_f64(&row[3])?,
        close: parse_f64(&row[4])?,
        volume: parse_f64(&row[5])?,
    })
}
