pub mod adjuster;
pub mod assembler;
pub mod extremum;

use std::fmt;

use chrono::{DateTime, Utc};
use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisError;
use crate::model::Candle;

pub use extremum::Extrema;

/// Candle field the extrema are detected on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl PriceField {
    /// Parse a config-format string into a `PriceField`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "high" => Some(Self::High),
            "low" => Some(Self::Low),
            "close" => Some(Self::Close),
            _ => None,
        }
    }

    pub fn of(self, candle: &Candle) -> f64 {
        match self {
            Self::Open => candle.open,
            Self::High => candle.high,
            Self::Low => candle.low,
            Self::Close => candle.close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumKind {
    Peak,
    Valley,
}

/// A local maximum or minimum of the price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub kind: ExtremumKind,
}

/// Elliott Wave role of a segment: impulsive `1`..`5`, corrective `A`..`C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveKind {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    A,
    B,
    C,
}

impl WaveKind {
    /// Slot order inside a group.
    pub const SEQUENCE: [WaveKind; 8] = [
        Self::One,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::A,
        Self::B,
        Self::C,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    pub fn is_impulsive(self) -> bool {
        matches!(
            self,
            Self::One | Self::Two | Self::Three | Self::Four | Self::Five
        )
    }
}

impl fmt::Display for WaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A labeled price segment between two extrema.
///
/// Only `end_price` ever changes after assembly, and only through the
/// [`adjuster`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    #[serde(rename = "type")]
    kind: WaveKind,
    start_time: DateTime<Utc>,
    start_price: f64,
    end_time: DateTime<Utc>,
    end_price: f64,
}

impl Wave {
    pub fn new(
        kind: WaveKind,
        start_time: DateTime<Utc>,
        start_price: f64,
        end_time: DateTime<Utc>,
        end_price: f64,
    ) -> Self {
        Self {
            kind,
            start_time,
            start_price,
            end_time,
            end_price,
        }
    }

    fn between(kind: WaveKind, start: &Extremum, end: &Extremum) -> Self {
        Self::new(kind, start.timestamp, start.price, end.timestamp, end.price)
    }

    pub fn kind(&self) -> WaveKind {
        self.kind
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn start_price(&self) -> f64 {
        self.start_price
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn end_price(&self) -> f64 {
        self.end_price
    }
}

/// One impulsive + corrective cycle: eight named wave slots.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveGroup {
    one: Wave,
    two: Wave,
    three: Wave,
    four: Wave,
    five: Wave,
    a: Wave,
    b: Wave,
    c: Wave,
}

impl WaveGroup {
    pub const LEN: usize = 8;

    /// Rebuild a group from eight waves in `1,2,3,4,5,A,B,C` order.
    pub fn from_slice(waves: &[Wave]) -> Result<Self, Report<AnalysisError>> {
        if waves.len() != Self::LEN {
            bail!(AnalysisError::MalformedWaveSequence {
                reason: format!("group needs {} waves, got {}", Self::LEN, waves.len()),
            });
        }
        for (slot, (wave, expected)) in waves.iter().zip(WaveKind::SEQUENCE).enumerate() {
            if wave.kind != expected {
                bail!(AnalysisError::MalformedWaveSequence {
                    reason: format!(
                        "slot {slot} holds wave {} where wave {expected} was expected",
                        wave.kind
                    ),
                });
            }
        }
        Ok(Self {
            one: waves[0].clone(),
            two: waves[1].clone(),
            three: waves[2].clone(),
            four: waves[3].clone(),
            five: waves[4].clone(),
            a: waves[5].clone(),
            b: waves[6].clone(),
            c: waves[7].clone(),
        })
    }

    pub fn get(&self, kind: WaveKind) -> &Wave {
        match kind {
            WaveKind::One => &self.one,
            WaveKind::Two => &self.two,
            WaveKind::Three => &self.three,
            WaveKind::Four => &self.four,
            WaveKind::Five => &self.five,
            WaveKind::A => &self.a,
            WaveKind::B => &self.b,
            WaveKind::C => &self.c,
        }
    }

    /// Waves in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Wave> {
        WaveKind::SEQUENCE.into_iter().map(|kind| self.get(kind))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub price_field: PriceField,
    /// Accepted for compatibility; extraction does not filter on it.
    pub threshold: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            price_field: PriceField::Close,
            threshold: 0.02,
        }
    }
}

/// Output of one pipeline run, handed read-only to reporters.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub peaks: Vec<Extremum>,
    pub valleys: Vec<Extremum>,
    pub groups: Vec<WaveGroup>,
}

impl Analysis {
    /// Flat view of all waves, group after group.
    pub fn waves(&self) -> impl Iterator<Item = &Wave> {
        self.groups.iter().flat_map(WaveGroup::iter)
    }

    pub fn wave_count(&self) -> usize {
        self.groups.len() * WaveGroup::LEN
    }
}

/// Run extraction, assembly and adjustment over a candle series.
///
/// Short or flat series yield an empty analysis rather than an error.
pub fn analyze(candles: &[Candle], options: &AnalysisOptions) -> Analysis {
    let Extrema { peaks, valleys } =
        extremum::find_extrema(candles, options.price_field, options.threshold);
    let mut groups = assembler::assemble(&peaks, &valleys);
    adjuster::adjust(&mut groups);

    debug!(
        candles = candles.len(),
        peaks = peaks.len(),
        valleys = valleys.len(),
        groups = groups.len(),
        "analysis complete"
    );

    Analysis {
        peaks,
        valleys,
        groups,
    }
}

/// Like [`analyze`], but reports too few extrema as an error.
pub fn analyze_strict(
    candles: &[Candle],
    options: &AnalysisOptions,
) -> Result<Analysis, Report<AnalysisError>> {
    let analysis = analyze(candles, options);
    let available = analysis.peaks.len().min(analysis.valleys.len());
    if available < assembler::MIN_EXTREMA {
        bail!(AnalysisError::InsufficientData {
            required: assembler::MIN_EXTREMA,
            available,
        });
    }
    Ok(analysis)
}
