use std::sync::Arc;

use chrono::DateTime;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::Deserialize;
use tracing::info;

use crate::error::ExchangeError;
use crate::exchange::{Exchange, into_ascending};
use crate::model::{Candle, ExchangeKind, TimeFrame, normalize_symbol};

const BINANCE_BASE_URL: &str = "https://api.binance.com";
const MAX_CANDLES_PER_REQUEST: usize = 1000;
/// Binance error code for an unlisted symbol.
const INVALID_SYMBOL_CODE: i64 = -1121;

pub struct BinanceExchange {
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl BinanceExchange {
    pub fn new() -> Self {
        // Kline endpoint weight is 2 against 6000/min; 20 req/s leaves margin.
        let quota = Quota::per_second(nonzero!(20u32));
        Self {
            client: reqwest::Client::new(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

impl Default for BinanceExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange for BinanceExchange {
    fn kind(&self) -> ExchangeKind {
        ExchangeKind::Binance
    }

    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Candle>, Report<ExchangeError>>> {
        let symbol = normalize_symbol(symbol);
        Box::pin(async move {
            // Wait for rate limiter before making the request
            self.rate_limiter.until_ready().await;

            let url = format!("{}/api/v3/klines", BINANCE_BASE_URL);
            let limit_str = limit.min(MAX_CANDLES_PER_REQUEST).to_string();
            let params = [
                ("symbol", symbol.as_str()),
                ("interval", timeframe.binance_interval()),
                ("limit", limit_str.as_str()),
            ];

            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .change_context(ExchangeError::Connection {
                    exchange: "binance".into(),
                })?;

            let status = response.status();
            if !status.is_success() {
                let body: Option<BinanceErrorBody> = response.json().await.ok();
                return Err(match body {
                    Some(body) if body.code == INVALID_SYMBOL_CODE => {
                        Report::new(ExchangeError::UnknownSymbol {
                            exchange: "binance".into(),
                            symbol,
                        })
                    }
                    Some(body) => Report::new(ExchangeError::Request {
                        exchange: "binance".into(),
                    })
                    .attach(format!("HTTP status: {status}, code {}: {}", body.code, body.msg)),
                    None => Report::new(ExchangeError::Request {
                        exchange: "binance".into(),
                    })
                    .attach(format!("HTTP status: {status}")),
                });
            }

            let raw: Vec<BinanceKlineRow> =
                response
                    .json()
                    .await
                    .change_context(ExchangeError::ResponseParse {
                        exchange: "binance".into(),
                    })?;

            info!(
                symbol = %symbol,
                timeframe = %timeframe,
                fetched = raw.len(),
                "binance candle fetch complete"
            );

            let candles = raw
                .into_iter()
                .map(BinanceKlineRow::into_candle)
                .collect::<Result<Vec<_>, _>>()?;

            Ok(into_ascending(candles))
        })
    }
}

// ── REST response types ───────────────────────────────────────────────────────

/// Binance kline row: 12-element array
/// [open_time, open, high, low, close, volume, close_time, ...]
#[derive(Debug, Deserialize)]
struct BinanceKlineRow(
    i64,                        // 0: open_time (ms)
    String,                     // 1: open
    String,                     // 2: high
    String,                     // 3: low
    String,                     // 4: close
    String,                     // 5: volume
    #[allow(dead_code)] i64,    // 6: close_time
    #[allow(dead_code)] String, // 7: quote asset volume
    #[allow(dead_code)] i64,    // 8: number of trades
    #[allow(dead_code)] String, // 9: taker buy base volume
    #[allow(dead_code)] String, // 10: taker buy quote volume
    #[allow(dead_code)] String, // 11: ignore
);

impl BinanceKlineRow {
    fn into_candle(self) -> Result<Candle, Report<ExchangeError>> {
        let parse_err = || ExchangeError::ResponseParse {
            exchange: "binance".into(),
        };
        let parse_f64 = |s: &str| -> Result<f64, Report<ExchangeError>> {
            s.parse::<f64>().change_context_lazy(parse_err)
        };

        let timestamp = DateTime::from_timestamp_millis(self.0).ok_or_else(|| {
            Report::new(parse_err()).attach(format!("open_time out of range: {}", self.0))
        })?;

        Ok(Candle {
            timestamp,
            open: parse_f64(&self.1)?,
            high: parse_f64(&self.2)?,
            low: parse_f64(&self.3)?,
            close: parse_f64(&self.4)?,
            volume: parse_f64(&self.5)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BinanceErrorBody {
    code: i64,
    msg: String,
}
