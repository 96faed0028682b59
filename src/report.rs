pub mod json;
pub mod terminal;

use error_stack::Report;

use crate::error::ReportError;
use crate::model::{Candle, MarketRequest};
use crate::wave::Analysis;

/// Sink for a finished analysis: the candles, the extrema and the adjusted
/// waves, all read-only.
pub trait Reporter: Send + Sync {
    fn report(
        &self,
        request: &MarketRequest,
        candles: &[Candle],
        analysis: &Analysis,
    ) -> Result<(), Report<ReportError>>;
}
