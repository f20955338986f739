use serde::{Deserialize, Serialize};

use crate::config::{window_samples, Normalization, SignalWeights};
use crate::error::ConfigError;
use crate::types::{AvailableSignals, Session};

/// Rullende snitt av ett signal for én vinduslengde, justert mot øktas tidsstempler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSeries {
    pub window_secs: u32,
    pub window_samples: usize,
    pub values: Vec<Option<f64>>,
}

/// Bakovervendt rullende snitt.
///
/// Posisjon `i` får snittet av de `window` siste samplene som slutter i `i`.
/// Posisjoner uten fullt vindu, eller der vinduet inneholder et hull, blir
/// `None` ("for lite data"), aldri 0.
pub fn rolling_mean(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        let slice = &series[i + 1 - window..=i];
        let mut sum = 0.0f64;
        let mut complete = true;
        for v in slice {
            match v {
                Some(x) => sum += x,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        out.push(if complete { Some(sum / window as f64) } else { None });
    }
    out
}

/// Rullende snitt med vindu oppgitt i sekunder.
pub fn window_series(
    series: &[Option<f64>],
    window_secs: u32,
    sample_rate_hz: f64,
) -> Result<WindowSeries, ConfigError> {
    let n = window_samples(window_secs, sample_rate_hz)?;
    Ok(WindowSeries {
        window_secs,
        window_samples: n,
        values: rolling_mean(series, n),
    })
}

fn defined(series: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    series.iter().filter_map(|v| *v)
}

/// Skalerer et signal mot hele økta. Konstant signal → 0.
pub fn normalize(series: &[Option<f64>], method: Normalization) -> Vec<Option<f64>> {
    let n = defined(series).count();
    if n == 0 {
        return vec![None; series.len()];
    }
    match method {
        Normalization::MinMax => {
            let lo = defined(series).fold(f64::INFINITY, f64::min);
            let hi = defined(series).fold(f64::NEG_INFINITY, f64::max);
            let span = hi - lo;
            series
                .iter()
                .map(|v| v.map(|x| if span > 0.0 { (x - lo) / span } else { 0.0 }))
                .collect()
        }
        Normalization::ZScore => {
            let mean = defined(series).sum::<f64>() / n as f64;
            let var = defined(series).map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
            let sd = var.sqrt();
            series
                .iter()
                .map(|v| v.map(|x| if sd > 0.0 { (x - mean) / sd } else { 0.0 }))
                .collect()
        }
    }
}

/// Lineær kompositt av normaliserte signaler:
/// `w_speed*norm(speed) + w_acc*norm(acc) + w_hr*norm(hr) + w_mp*norm(mp)`.
///
/// Vektene re-normaliseres over signalene som faktisk har verdi i hver
/// sample, så et manglende signal blir aldri fylt med 0.
pub fn composite_intensity(
    session: &Session,
    available: &AvailableSignals,
    weights: &SignalWeights,
    method: Normalization,
) -> Vec<Option<f64>> {
    let columns: Vec<(f64, Vec<Option<f64>>)> = available
        .iter()
        .map(|sig| (weights.weight(sig), normalize(&session.signal(sig), method)))
        .filter(|(w, _)| *w > 0.0)
        .collect();

    (0..session.len())
        .map(|i| {
            let mut acc = 0.0;
            let mut w_sum = 0.0;
            for (w, col) in &columns {
                if let Some(x) = col[i] {
                    acc += w * x;
                    w_sum += w;
                }
            }
            if w_sum > 0.0 {
                Some(acc / w_sum)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sample, Signal};
    use chrono::{Duration, NaiveDate};

    #[test]
    fn leading_positions_are_undefined() {
        let s: Vec<Option<f64>> = [1.0, 2.0, 3.0, 4.0].iter().map(|x| Some(*x)).collect();
        let r = rolling_mean(&s, 3);
        assert_eq!(r, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn gap_inside_window_is_undefined() {
        let s = vec![Some(1.0), None, Some(3.0), Some(5.0), Some(7.0)];
        let r = rolling_mean(&s, 2);
        assert_eq!(r, vec![None, None, None, Some(4.0), Some(6.0)]);
    }

    #[test]
    fn window_longer_than_series_is_all_undefined() {
        let s = vec![Some(1.0); 4];
        assert!(rolling_mean(&s, 5).iter().all(Option::is_none));
    }

    #[test]
    fn minmax_of_constant_signal_is_zero() {
        let s = vec![Some(4.0), None, Some(4.0)];
        assert_eq!(normalize(&s, Normalization::MinMax), vec![Some(0.0), None, Some(0.0)]);
    }

    fn sample(sec: i64, speed: f64, acc: f64, hr: Option<f64>, mp: f64) -> Sample {
        let t0 = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        Sample {
            timestamp: t0 + Duration::seconds(sec),
            player_id: "p".into(),
            player_number: None,
            speed: Some(speed),
            acc: Some(acc),
            hr,
            mp: Some(mp),
        }
    }

    // normalisert: speed [0, .8, 1], acc [0, .5, 1], hr [0, -, 1], mp [0, .2, 1]
    fn session_with_hr_gap() -> Session {
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        Session::new(
            "p",
            d,
            vec![
                sample(0, 0.0, 0.0, Some(100.0), 0.0),
                sample(1, 8.0, 5.0, None, 2.0),
                sample(2, 10.0, 10.0, Some(200.0), 10.0),
            ],
        )
    }

    #[test]
    fn missing_signal_drops_out_of_the_weight_sum() {
        let w = SignalWeights { speed: 0.1, acc: 0.2, hr: 0.3, mp: 0.4 };
        let c = composite_intensity(&session_with_hr_gap(), &AvailableSignals::all(), &w, Normalization::MinMax);

        assert_eq!(c.len(), 3);
        assert!(c[0].unwrap().abs() < 1e-12);
        // hr mangler: (0.1*0.8 + 0.2*0.5 + 0.4*0.2) / (0.1 + 0.2 + 0.4), ikke / 1.0
        let expected = (0.1 * 0.8 + 0.2 * 0.5 + 0.4 * 0.2) / 0.7;
        assert!((c[1].unwrap() - expected).abs() < 1e-12, "{:?}", c[1]);
        assert!((c[2].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn three_available_signals_average_evenly() {
        let available = AvailableSignals::from_signals([Signal::Speed, Signal::Acc, Signal::Mp]);
        let c = composite_intensity(&session_with_hr_gap(), &available, &SignalWeights::default(), Normalization::MinMax);
        assert!((c[1].unwrap() - 0.5).abs() < 1e-12, "{:?}", c[1]);
    }

    #[test]
    fn zero_weight_signal_is_ignored() {
        let w = SignalWeights { speed: 0.0, acc: 0.0, hr: 1.0, mp: 0.0 };
        let c = composite_intensity(&session_with_hr_gap(), &AvailableSignals::all(), &w, Normalization::MinMax);
        assert_eq!(c, vec![Some(0.0), None, Some(1.0)]);
    }

    #[test]
    fn zscore_normalization_is_centered() {
        let s = vec![Some(1.0), Some(2.0), Some(3.0)];
        let z = normalize(&s, Normalization::ZScore);
        let sum: f64 = z.iter().flatten().sum();
        assert!(sum.abs() < 1e-12);
        assert!(z[2].unwrap() > 0.0);
    }
}
