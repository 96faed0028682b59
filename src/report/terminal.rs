use error_stack::Report;
use tracing::info;

use crate::error::ReportError;
use crate::model::{Candle, MarketRequest};
use crate::report::Reporter;
use crate::wave::{Analysis, WaveGroup};

/// Logs the extremum and wave counts, and optionally every wave label.
pub struct TerminalReporter {
    pub show_waves: bool,
}

impl Reporter for TerminalReporter {
    fn report(
        &self,
        request: &MarketRequest,
        candles: &[Candle],
        analysis: &Analysis,
    ) -> Result<(), Report<ReportError>> {
        info!(
            exchange = %request.exchange,
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            candles = candles.len(),
            peaks = analysis.peaks.len(),
            valleys = analysis.valleys.len(),
            waves = analysis.wave_count(),
            "elliott wave analysis"
        );

        if !self.show_waves {
            return Ok(());
        }

        for (index, wave) in analysis.waves().enumerate() {
            let degree = if wave.kind().is_impulsive() {
                "impulsive"
            } else {
                "corrective"
            };
            info!(
                group = index / WaveGroup::LEN,
                degree,
                start_time = %wave.start_time(),
                start_price = wave.start_price(),
                end_time = %wave.end_time(),
                end_price = wave.end_price(),
                "wave {}",
                wave.kind(),
            );
        }

        Ok(())
    }
}
