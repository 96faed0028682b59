use tracing::debug;

use crate::wave::{Extremum, Wave, WaveGroup, WaveKind};

/// Both lists need at least this many entries before anything is assembled.
pub const MIN_EXTREMA: usize = 5;
/// Cursor advance per group. A group reads five valleys but only four
/// peaks, so the fifth peak of each window is never used.
pub const STRIDE: usize = 5;
/// A group is only emitted while `cursor + LOOKAHEAD_GUARD` is below the
/// shorter list's length, although a group never reads past `cursor + 4`.
/// Trailing extrema are therefore left unused.
pub const LOOKAHEAD_GUARD: usize = 8;

/// Group peaks and valleys into consecutive 8-wave Elliott cycles.
///
/// Group `n` anchors on `valleys[5n..=5n+4]` and `peaks[5n..=5n+3]`,
/// alternating valley, peak, valley... regardless of whether the extrema
/// actually alternate in time.
pub fn assemble(peaks: &[Extremum], valleys: &[Extremum]) -> Vec<WaveGroup> {
    if peaks.len() < MIN_EXTREMA || valleys.len() < MIN_EXTREMA {
        debug!(
            peaks = peaks.len(),
            valleys = valleys.len(),
            "not enough extrema to assemble waves"
        );
        return Vec::new();
    }

    let available = peaks.len().min(valleys.len());
    let groups: Vec<WaveGroup> = (0..)
        .step_by(STRIDE)
        .take_while(|cursor| cursor + LOOKAHEAD_GUARD < available)
        .map(|cursor| build_group(&peaks[cursor..], &valleys[cursor..]))
        .collect();

    debug!(
        available,
        groups = groups.len(),
        "waves assembled"
    );

    groups
}

fn build_group(p: &[Extremum], v: &[Extremum]) -> WaveGroup {
    WaveGroup {
        one: Wave::between(WaveKind::One, &v[0], &p[0]),
        two: Wave::between(WaveKind::Two, &p[0], &v[1]),
        three: Wave::between(WaveKind::Three, &v[1], &p[1]),
        four: Wave::between(WaveKind::Four, &p[1], &v[2]),
        five: Wave::between(WaveKind::Five, &v[2], &p[2]),
        a: Wave::between(WaveKind::A, &p[2], &v[3]),
        b: Wave::between(WaveKind::B, &v[3], &p[3]),
        c: Wave::between(WaveKind::C, &p[3], &v[4]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wave::ExtremumKind;
    use crate::wave::test_support::extrema;

    fn ramp(kind: ExtremumKind, n: usize, base: f64) -> Vec<Extremum> {
        let prices: Vec<f64> = (0..n).map(|i| base + i as f64).collect();
        extrema(kind, &prices)
    }

    #[test]
    fn fewer_than_five_of_either_yields_nothing() {
        let peaks = ramp(ExtremumKind::Peak, 4, 100.0);
        let valleys = ramp(ExtremumKind::Valley, 20, 50.0);
        assert!(assemble(&peaks, &valleys).is_empty());
        assert!(assemble(&valleys, &peaks).is_empty());
        assert!(assemble(&[], &[]).is_empty());
    }

    #[test]
    fn guard_requires_nine_for_first_group() {
        let peaks = ramp(ExtremumKind::Peak, 8, 100.0);
        let valleys = ramp(ExtremumKind::Valley, 8, 50.0);
        assert!(assemble(&peaks, &valleys).is_empty());

        let peaks = ramp(ExtremumKind::Peak, 9, 100.0);
        let valleys = ramp(ExtremumKind::Valley, 9, 50.0);
        assert_eq!(assemble(&peaks, &valleys).len(), 1);
    }

    #[test]
    fn group_anchors_alternate_valley_peak() {
        let peaks = ramp(ExtremumKind::Peak, 9, 100.0);
        let valleys = ramp(ExtremumKind::Valley, 9, 50.0);
        let groups = assemble(&peaks, &valleys);
        let g = &groups[0];

        let anchors: Vec<(f64, f64)> = g.iter().map(|w| (w.start_price, w.end_price)).collect();
        assert_eq!(
            anchors,
            [
                (50.0, 100.0),
                (100.0, 51.0),
                (51.0, 101.0),
                (101.0, 52.0),
                (52.0, 102.0),
                (102.0, 53.0),
                (53.0, 103.0),
                (103.0, 54.0),
            ]
        );
        assert_eq!(g.one.start_time, valleys[0].timestamp);
        assert_eq!(g.c.end_time, valleys[4].timestamp);
    }

    #[test]
    fn thirteen_extrema_still_give_one_group() {
        let peaks = ramp(ExtremumKind::Peak, 13, 100.0);
        let valleys = ramp(ExtremumKind::Valley, 13, 50.0);
        assert_eq!(assemble(&peaks, &valleys).len(), 1);
    }

    #[test]
    fn second_group_starts_at_stride() {
        let peaks = ramp(ExtremumKind::Peak, 14, 100.0);
        let valleys = ramp(ExtremumKind::Valley, 14, 50.0);
        let groups = assemble(&peaks, &valleys);
        assert_eq!(groups.len(), 2);

        let second = &groups[1];
        assert_eq!(second.one.start_price, valleys[5].price);
        assert_eq!(second.one.end_price, peaks[5].price);
        assert_eq!(second.c.end_price, valleys[9].price);
        assert_eq!(second.c.start_price, peaks[8].price);
    }

    #[test]
    fn shorter_list_bounds_the_group_count() {
        let peaks = ramp(ExtremumKind::Peak, 40, 100.0);
        let valleys = ramp(ExtremumKind::Valley, 19, 50.0);
        // cursors 0, 5, 10 pass (10 + 8 < 19); 15 does not.
        assert_eq!(assemble(&peaks, &valleys).len(), 3);
    }

    #[test]
    fn non_alternating_extrema_are_consumed_in_list_order() {
        let t0 = extrema(ExtremumKind::Peak, &[0.0])[0].timestamp;
        // All peaks precede all valleys in time.
        let peaks: Vec<Extremum> = (0..9)
            .map(|i| Extremum {
                timestamp: t0 + chrono::Duration::hours(i),
                price: 200.0 + i as f64,
                kind: ExtremumKind::Peak,
            })
            .collect();
        let valleys: Vec<Extremum> = (0..9)
            .map(|i| Extremum {
                timestamp: t0 + chrono::Duration::hours(100 + i),
                price: 10.0 + i as f64,
                kind: ExtremumKind::Valley,
            })
            .collect();

        let groups = assemble(&peaks, &valleys);
        assert_eq!(groups.len(), 1);
        let one = groups[0].get(WaveKind::One);
        assert_eq!(one.start_price(), 10.0);
        assert_eq!(one.end_price(), 200.0);
        // Wave 1 ends before it starts; no ordering check is applied.
        assert!(one.end_time() < one.start_time());
    }
}
