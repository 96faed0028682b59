pub mod binance;
pub mod bitget;

use std::sync::Arc;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::ExchangeError;
use crate::model::{Candle, ExchangeKind, TimeFrame};

/// Source of historical candles.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn Exchange`).
pub trait Exchange: Send + Sync {
    fn kind(&self) -> ExchangeKind;

    /// Fetch the most recent `limit` candles via REST API, oldest first.
    ///
    /// `symbol` may use the `BASE/QUOTE` form; implementations normalise it.
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Candle>, Report<ExchangeError>>>;
}

pub fn build_exchange(kind: ExchangeKind) -> Arc<dyn Exchange> {
    match kind {
        ExchangeKind::Bitget => Arc::new(bitget::BitgetExchange::new()),
        ExchangeKind::Binance => Arc::new(binance::BinanceExchange::new()),
    }
}

/// Order candles oldest-first and drop repeated timestamps.
pub(crate) fn into_ascending(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);
    candles
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn candle_at(hour: i64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    #[test]
    fn into_ascending_sorts_newest_first_input() {
        let candles = vec![candle_at(2, 3.0), candle_at(1, 2.0), candle_at(0, 1.0)];
        let sorted = into_ascending(candles);
        let closes: Vec<f64> = sorted.iter().map(|c| c.close).collect();
        assert_eq!(closes, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn into_ascending_drops_duplicate_timestamps() {
        let candles = vec![candle_at(0, 1.0), candle_at(1, 2.0), candle_at(1, 2.5)];
        assert_eq!(into_ascending(candles).len(), 2);
    }

    #[test]
    fn build_exchange_matches_kind() {
        for kind in [ExchangeKind::Bitget, ExchangeKind::Binance] {
            assert_eq!(build_exchange(kind).kind(), kind);
        }
    }
}
