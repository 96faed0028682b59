use error_stack::{Report, ResultExt, bail};
use tracing::trace;

use crate::error::AnalysisError;
use crate::wave::{Wave, WaveGroup, WaveKind};

/// Wave 3 is projected to this multiple of wave 1's end when it falls short.
pub const WAVE3_EXTENSION: f64 = 1.618;
/// Wave 4 is lifted to this multiple of wave 1's start when it overlaps.
pub const WAVE4_FLOOR: f64 = 1.05;
/// Wave A retraces to this fraction of the preceding wave's end.
pub const WAVE_A_RETRACEMENT: f64 = 0.618;
/// Wave B ends this far above its reference.
pub const WAVE_B_PREMIUM: f64 = 1.05;
/// Wave 2 stays within this fraction of wave 1's start, either side.
pub const WAVE2_BAND: f64 = 0.2;

/// Rewrite the `end_price` of every group's waves so they follow the
/// proportion rules.
///
/// Slots are visited in `1,2,3,4,5,A,B,C` order and each rule sees the
/// already-adjusted values of earlier slots in the same group. Wave 1 is
/// never touched. Start prices, times and kinds are never touched.
pub fn adjust(groups: &mut [WaveGroup]) {
    for (index, group) in groups.iter_mut().enumerate() {
        adjust_group(index, group);
    }
}

/// Adjust a flat `1..C, 1..C, ...` sequence.
///
/// Fails with `MalformedWaveSequence` unless the sequence splits into
/// complete, correctly ordered groups of eight.
pub fn adjust_sequence(waves: Vec<Wave>) -> Result<Vec<Wave>, Report<AnalysisError>> {
    if waves.len() % WaveGroup::LEN != 0 {
        bail!(AnalysisError::MalformedWaveSequence {
            reason: format!(
                "length {} is not a multiple of {}",
                waves.len(),
                WaveGroup::LEN
            ),
        });
    }

    let mut groups = waves
        .chunks_exact(WaveGroup::LEN)
        .enumerate()
        .map(|(index, chunk)| {
            WaveGroup::from_slice(chunk).attach_with(|| format!("group index: {index}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    adjust(&mut groups);

    Ok(groups
        .iter()
        .flat_map(WaveGroup::iter)
        .cloned()
        .collect())
}

fn adjust_group(index: usize, g: &mut WaveGroup) {
    let wave1_start = g.one.start_price;
    let wave1_end = g.one.end_price;

    // Wave 2: clamp into wave 1's start band.
    let upper = wave1_start * (1.0 + WAVE2_BAND);
    let lower = wave1_start * (1.0 - WAVE2_BAND);
    if g.two.end_price > upper {
        set_end(index, &mut g.two, upper);
    } else if g.two.end_price < lower {
        set_end(index, &mut g.two, lower);
    }

    // Wave 3: must end beyond wave 1.
    if g.three.end_price <= wave1_end {
        set_end(index, &mut g.three, wave1_end * WAVE3_EXTENSION);
    }

    // Wave 4: no overlap with wave 1's start. The second, strict check is
    // usually redundant after the first one.
    if g.four.end_price <= wave1_start {
        set_end(index, &mut g.four, wave1_start * WAVE4_FLOOR);
    }
    if g.four.end_price < wave1_start {
        set_end(index, &mut g.four, wave1_start * WAVE4_FLOOR);
    }

    // Wave 5: repeat wave 1's size, measured from wave 1's end.
    set_end(index, &mut g.five, wave1_end + (wave1_end - wave1_start));

    // Wave A: retrace from the adjusted wave 5.
    set_end(index, &mut g.a, g.five.end_price * WAVE_A_RETRACEMENT);

    // Wave B: two assignments in order; the second one wins but runs after
    // the first has been written.
    let first = g.a.end_price.max(g.five.end_price) * WAVE_B_PREMIUM;
    set_end(index, &mut g.b, first);
    let second = g.b.start_price.max(g.a.end_price) * WAVE_B_PREMIUM;
    set_end(index, &mut g.b, second);

    // Wave C: back to where wave A started.
    set_end(index, &mut g.c, g.a.start_price);
}

fn set_end(group: usize, wave: &mut Wave, price: f64) {
    if wave.end_price != price {
        trace!(
            group,
            wave = %wave.kind,
            from = wave.end_price,
            to = price,
            "wave end adjusted"
        );
    }
    wave.end_price = price;
}
