use tracing::debug;

use crate::model::Candle;
use crate::wave::{Extremum, ExtremumKind, PriceField};

/// Samples compared on each side of a candidate.
pub const RADIUS: usize = 2;
const WINDOW: usize = RADIUS * 2 + 1;

/// Peaks and valleys, each ascending by timestamp.
///
/// The two lists are independent: nothing forces a peak to be followed by a
/// valley.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extrema {
    pub peaks: Vec<Extremum>,
    pub valleys: Vec<Extremum>,
}

/// Find local extrema on `field` using a symmetric two-sample window.
///
/// A sample is a peak when it is strictly above all four neighbours and a
/// valley when strictly below all four; any tie disqualifies it. Series
/// shorter than five samples produce nothing.
///
/// `threshold` is accepted for interface compatibility and has no effect.
pub fn find_extrema(candles: &[Candle], field: PriceField, threshold: f64) -> Extrema {
    let mut extrema = Extrema::default();

    for window in candles.windows(WINDOW) {
        let center = &window[RADIUS];
        let price = field.of(center);
        let beats_all = |wins: fn(f64, f64) -> bool| {
            window
                .iter()
                .enumerate()
                .all(|(i, c)| i == RADIUS || wins(price, field.of(c)))
        };

        let kind = if beats_all(|p, n| p > n) {
            ExtremumKind::Peak
        } else if beats_all(|p, n| p < n) {
            ExtremumKind::Valley
        } else {
            continue;
        };

        let extremum = Extremum {
            timestamp: center.timestamp,
            price,
            kind,
        };
        match kind {
            ExtremumKind::Peak => extrema.peaks.push(extremum),
            ExtremumKind::Valley => extrema.valleys.push(extremum),
        }
    }

    debug!(
        samples = candles.len(),
        ?field,
        threshold,
        peaks = extrema.peaks.len(),
        valleys = extrema.valleys.len(),
        "extrema extracted"
    );

    extrema
}
