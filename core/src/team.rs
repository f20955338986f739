use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Snitt og standardavvik for en sammenligningsgruppe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub n: usize,
    pub mean: f64,
    /// Populasjons-standardavvik (N i nevneren): gruppen er hele laget.
    pub std: f64,
}

/// Under dette regnes spredningen som null.
const STD_EPSILON: f64 = 1e-12;

impl GroupStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            n: finite.len(),
            mean,
            std: var.sqrt(),
        })
    }

    /// Z-verdi der null spredning gir 0 (ikke divisjonsfeil).
    pub fn standardize(&self, value: f64) -> f64 {
        if self.std < STD_EPSILON {
            0.0
        } else {
            (value - self.mean) / self.std
        }
    }
}

/// Persentilrang med gjennomsnittsrang for like verdier, skalert til (0, 100].
///
/// `rank / n * 100`, der `rank` er snittet av posisjonene (1-basert) som
/// likeverdiene ville hatt. Manglende/ikke-endelige verdier teller ikke med.
pub fn percentile_rank(value: f64, group: &[f64]) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let finite: Vec<OrderedFloat<f64>> = group
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .map(OrderedFloat)
        .collect();
    let n = finite.len();
    if n == 0 {
        return None;
    }
    let v = OrderedFloat(value);
    let below = finite.iter().filter(|x| **x < v).count();
    let equal = finite.iter().filter(|x| **x == v).count();
    if equal == 0 {
        // verdien er ikke med i gruppen: ranger den som om den var lagt til
        let rank = below as f64 + 1.0;
        return Some((rank / (n + 1) as f64 * 100.0).clamp(0.0, 100.0));
    }
    // posisjoner below+1 ..= below+equal, snitt
    let rank = below as f64 + (equal as f64 + 1.0) / 2.0;
    Some((rank / n as f64 * 100.0).clamp(0.0, 100.0))
}

/// Lag-z for rapportering: `None` for lag med én spiller, 0 ved null spredning.
pub fn team_z_score(value: f64, group: &[f64]) -> Option<f64> {
    let stats = GroupStats::from_values(group)?;
    if stats.n < 2 || !value.is_finite() {
        return None;
    }
    Some(stats.standardize(value))
}

/// Persentil og z for én spiller mot lagkamerater (inkludert seg selv).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub percentile: Option<f64>,
    pub z_score: Option<f64>,
}

/// Rangerer `value` i `group`; `None`-verdi gir tom plassering.
pub fn team_standing(value: Option<f64>, group: &[Option<f64>]) -> TeamStanding {
    let Some(v) = value else {
        return TeamStanding::default();
    };
    let present: Vec<f64> = group.iter().filter_map(|x| *x).collect();
    TeamStanding {
        percentile: percentile_rank(v, &present),
        z_score: team_z_score(v, &present),
    }
}

/// Lagsnitt per tidsstempel ("Alle spillere"-visningen).
pub fn team_average_timeline(
    series: &[(Vec<NaiveDateTime>, Vec<Option<f64>>)],
) -> Vec<(NaiveDateTime, f64)> {
    let mut acc: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
    for (ts, values) in series {
        for (t, v) in ts.iter().zip(values) {
            if let Some(x) = v {
                let e = acc.entry(*t).or_insert((0.0, 0));
                e.0 += x;
                e.1 += 1;
            }
        }
    }
    acc.into_iter()
        .map(|(t, (sum, n))| (t, sum / n as f64))
        .collect()
}
