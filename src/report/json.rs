use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::ReportError;
use crate::model::{Candle, ExchangeKind, MarketRequest, TimeFrame};
use crate::report::Reporter;
use crate::wave::{Analysis, Extremum, Wave};

/// Writes the whole analysis as one pretty-printed JSON document, the
/// shape a chart renderer consumes.
pub struct JsonReporter {
    path: PathBuf,
}

impl JsonReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    exchange: ExchangeKind,
    symbol: &'a str,
    timeframe: TimeFrame,
    candles: &'a [Candle],
    peaks: &'a [Extremum],
    valleys: &'a [Extremum],
    waves: Vec<ExportedWave<'a>>,
}

/// A wave plus the flag a renderer uses to colour 1..5 apart from A..C.
#[derive(Debug, Serialize)]
struct ExportedWave<'a> {
    #[serde(flatten)]
    wave: &'a Wave,
    impulsive: bool,
}

fn document<'a>(
    request: &'a MarketRequest,
    candles: &'a [Candle],
    analysis: &'a Analysis,
) -> ExportDocument<'a> {
    ExportDocument {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        exchange: request.exchange,
        symbol: &request.symbol,
        timeframe: request.timeframe,
        candles,
        peaks: &analysis.peaks,
        valleys: &analysis.valleys,
        waves: analysis
            .waves()
            .map(|wave| ExportedWave {
                wave,
                impulsive: wave.kind().is_impulsive(),
            })
            .collect(),
    }
}

impl Reporter for JsonReporter {
    fn report(
        &self,
        request: &MarketRequest,
        candles: &[Candle],
        analysis: &Analysis,
    ) -> Result<(), Report<ReportError>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .change_context(ReportError::Write)
                .attach_with(|| format!("dir: {}", parent.display()))?;
        }

        let doc = document(request, candles, analysis);
        let file = File::create(&self.path)
            .change_context(ReportError::Write)
            .attach_with(|| format!("path: {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &doc).change_context(ReportError::Serialize)?;
        writer
            .flush()
            .change_context(ReportError::Write)
            .attach_with(|| format!("path: {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            run_id = %doc.run_id,
            waves = doc.waves.len(),
            "analysis exported"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wave::test_support::candles_from_closes;
    use crate::wave::{AnalysisOptions, analyze};

    fn zigzag() -> Vec<Candle> {
        let closes: Vec<f64> = (0..400)
            .map(|i| 100.0 + ((i as f64) * 0.8).sin() * 10.0)
            .collect();
        candles_from_closes(&closes)
    }

    fn request() -> MarketRequest {
        MarketRequest {
            exchange: ExchangeKind::Bitget,
            symbol: "BTC/USDT".into(),
            timeframe: TimeFrame::Hour4,
            limit: 400,
        }
    }

    #[test]
    fn document_serializes_renderer_fields() {
        let candles = zigzag();
        let analysis = analyze(&candles, &AnalysisOptions::default());
        assert!(analysis.wave_count() > 0);

        let req = request();
        let value = serde_json::to_value(document(&req, &candles, &analysis)).unwrap();
        assert_eq!(value["exchange"], "bitget");
        assert_eq!(value["timeframe"], "4h");
        assert_eq!(value["candles"].as_array().unwrap().len(), candles.len());

        let waves = value["waves"].as_array().unwrap();
        assert_eq!(waves.len(), analysis.wave_count());
        assert_eq!(waves[0]["type"], "1");
        assert_eq!(waves[0]["impulsive"], true);
        assert_eq!(waves[5]["type"], "A");
        assert_eq!(waves[5]["impulsive"], false);
        assert!(waves[0]["end_price"].is_f64());
        assert!(waves[0]["end_time"].is_string());
        assert_eq!(value["peaks"][0]["kind"], "peak");
    }

    #[test]
    fn report_writes_file_and_creates_dirs() {
        let dir = std::env::temp_dir().join(format!("elliott-wave-{}", Uuid::new_v4()));
        let path = dir.join("nested").join("analysis.json");
        let candles = zigzag();
        let analysis = analyze(&candles, &AnalysisOptions::default());

        JsonReporter::new(&path)
            .report(&request(), &candles, &analysis)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["symbol"], "BTC/USDT");
        assert!(Uuid::parse_str(value["run_id"].as_str().unwrap()).is_ok());

        fs::remove_dir_all(dir).unwrap();
    }
}
