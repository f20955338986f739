use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;

use crate::config::window_samples;
use crate::error::ConfigError;
use crate::types::{BestPeak, PeakDemand, WindowPeak};

/// MDP: høyeste rullende snitt over `window` samples.
///
/// Manglende verdier fjernes før søket (serien "komprimeres"). Gir
/// `PeakDemand::NONE` når ingenting gjenstår eller vinduet er lengre enn
/// serien. Ved likt maksimum vinner tidligste tidsstempel. Tidsstempelet
/// er vinduets siste sample.
pub fn compute_mdp(
    series: &[Option<f64>],
    timestamps: &[NaiveDateTime],
    window: usize,
) -> PeakDemand {
    let points: Vec<(NaiveDateTime, f64)> = series
        .iter()
        .zip(timestamps)
        .filter_map(|(v, t)| v.filter(|x| x.is_finite()).map(|x| (*t, x)))
        .collect();

    let window = window.max(1);
    if points.is_empty() || window > points.len() {
        return PeakDemand::NONE;
    }

    let mut best: Option<(OrderedFloat<f64>, NaiveDateTime)> = None;
    for (end, win) in points.windows(window).enumerate() {
        let mean = win.iter().map(|(_, x)| x).sum::<f64>() / window as f64;
        // avrundingsfeil skal ikke løfte snittet utenfor vinduets verdier
        let lo = win.iter().map(|(_, x)| *x).fold(f64::INFINITY, f64::min);
        let hi = win.iter().map(|(_, x)| *x).fold(f64::NEG_INFINITY, f64::max);
        let mean = OrderedFloat(mean.clamp(lo, hi));
        // streng > gir tidligste ved likhet
        if best.map_or(true, |(b, _)| mean > b) {
            best = Some((mean, points[end + window - 1].0));
        }
    }

    match best {
        Some((v, t)) => PeakDemand {
            value: Some(v.into_inner()),
            timestamp: Some(t),
        },
        None => PeakDemand::NONE,
    }
}

/// Én MDP per vinduslengde (sekunder), uavhengig beregnet.
pub fn compute_peaks(
    series: &[Option<f64>],
    timestamps: &[NaiveDateTime],
    windows_secs: &[u32],
    sample_rate_hz: f64,
) -> Result<Vec<WindowPeak>, ConfigError> {
    windows_secs
        .iter()
        .map(|&secs| {
            let n = window_samples(secs, sample_rate_hz)?;
            Ok(WindowPeak {
                window_secs: secs,
                peak: compute_mdp(series, timestamps, n),
            })
        })
        .collect()
}

/// Høyeste topp over alle vinduer. Ved likhet foretrekkes korteste vindu.
pub fn overall_peak(peaks: &[WindowPeak]) -> Option<BestPeak> {
    let mut sorted: Vec<&WindowPeak> = peaks.iter().collect();
    sorted.sort_by_key(|p| p.window_secs);

    let mut best: Option<BestPeak> = None;
    for p in sorted {
        let Some(v) = p.peak.value else { continue };
        if best.map_or(true, |b| OrderedFloat(v) > OrderedFloat(b.value)) {
            best = Some(BestPeak {
                value: v,
                window_secs: p.window_secs,
                timestamp: p.peak.timestamp,
            });
        }
    }
    best
}
