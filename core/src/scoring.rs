use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, IntensityWeights};
use crate::error::ConfigError;
use crate::rolling::{composite_intensity, window_series, WindowSeries};
use crate::team::GroupStats;
use crate::types::{AvailableSignals, Session, Signal, SubScores, WindowPeak};

/// Hvor intensitetssignalet kom fra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "signal", rename_all = "snake_case")]
pub enum IntensitySource {
    /// Vektet kompositt av normaliserte signaler.
    Composite,
    /// For få signaler: ett rå-signal brukt direkte.
    Passthrough(Signal),
    /// Ingen signaler i det hele tatt.
    Unavailable,
}

/// Intensitet per tidsstempel + rullende serier per vindu (for grafer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityTimeline {
    pub source: IntensitySource,
    pub timestamps: Vec<NaiveDateTime>,
    pub intensity: Vec<Option<f64>>,
    pub windows: Vec<WindowSeries>,
}

/// Statistikk for sammenligningsgruppen, per sub-score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComparisonStats {
    pub explosiveness: Option<GroupStats>,
    pub repeatability: Option<GroupStats>,
    pub volume: Option<GroupStats>,
}

impl ComparisonStats {
    /// Lagstatistikk fra alle spillernes rå sub-scores.
    pub fn from_team(scores: &[SubScores]) -> Self {
        let collect = |f: fn(&SubScores) -> Option<f64>| -> Option<GroupStats> {
            let v: Vec<f64> = scores.iter().filter_map(f).collect();
            GroupStats::from_values(&v)
        };
        Self {
            explosiveness: collect(|s| s.explosiveness),
            repeatability: collect(|s| s.repeatability),
            volume: collect(|s| s.volume),
        }
    }
}

/// Kompositt-scorer. Kapabilitet og konfigurasjon sendes inn eksplisitt.
#[derive(Debug, Clone, Copy)]
pub struct CompositeIntensityScorer<'a> {
    config: &'a EngineConfig,
    available: &'a AvailableSignals,
}

impl<'a> CompositeIntensityScorer<'a> {
    pub fn new(config: &'a EngineConfig, available: &'a AvailableSignals) -> Self {
        Self { config, available }
    }

    pub fn source(&self) -> IntensitySource {
        if self.available.len() >= self.config.min_signals {
            IntensitySource::Composite
        } else {
            match self.available.passthrough_signal() {
                Some(sig) => IntensitySource::Passthrough(sig),
                None => IntensitySource::Unavailable,
            }
        }
    }

    /// Intensitet per sample.
    pub fn intensity(&self, session: &Session) -> Vec<Option<f64>> {
        match self.source() {
            IntensitySource::Composite => composite_intensity(
                session,
                self.available,
                &self.config.signal_weights,
                self.config.normalization,
            ),
            IntensitySource::Passthrough(sig) => session.signal(sig),
            IntensitySource::Unavailable => vec![None; session.len()],
        }
    }

    /// Datasettet har metabolsk effekt, men denne økta mangler den helt.
    pub fn lacks_power(&self, session: &Session) -> bool {
        self.available.contains(Signal::Mp)
            && !session.samples().iter().any(|s| Signal::Mp.value(s).is_some())
    }

    /// Kravsignalet MDP og volum beregnes fra: metabolsk effekt når økta
    /// har den, ellers intensiteten.
    pub fn demand_signal(&self, session: &Session) -> Vec<Option<f64>> {
        if self.available.contains(Signal::Mp) && !self.lacks_power(session) {
            session.signal(Signal::Mp)
        } else {
            self.intensity(session)
        }
    }

    pub fn timeline(&self, session: &Session) -> Result<IntensityTimeline, ConfigError> {
        let intensity = self.intensity(session);
        let windows = self
            .config
            .windows_sorted()
            .into_iter()
            .map(|secs| window_series(&intensity, secs, self.config.sample_rate_hz))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IntensityTimeline {
            source: self.source(),
            timestamps: session.timestamps(),
            intensity,
            windows,
        })
    }

    /// Rå sub-scores fra toppene og totalbelastningen.
    pub fn sub_scores(&self, peaks: &[WindowPeak], total_load: Option<f64>) -> SubScores {
        let peak = |secs: u32| {
            peaks
                .iter()
                .find(|p| p.window_secs == secs)
                .and_then(|p| p.peak.value)
        };
        let sustained: Vec<f64> = self
            .config
            .repeatability_windows_secs
            .iter()
            .filter_map(|w| peak(*w))
            .collect();
        SubScores {
            explosiveness: peak(self.config.explosiveness_window_secs),
            repeatability: if sustained.is_empty() {
                None
            } else {
                Some(sustained.iter().sum::<f64>() / sustained.len() as f64)
            },
            volume: total_load,
        }
    }
}

/// Totalbelastning: integralet av effekt over økta (Σ p · dt).
pub fn total_load(power: &[Option<f64>], sample_rate_hz: f64) -> Option<f64> {
    let mut sum = 0.0;
    let mut cnt = 0usize;
    for p in power.iter().flatten() {
        sum += p;
        cnt += 1;
    }
    if cnt == 0 || sample_rate_hz <= 0.0 {
        None
    } else {
        Some(sum / sample_rate_hz)
    }
}

/// Z-normaliserer hver sub-score mot sin gruppe (std 0 → 0).
pub fn standardize(scores: &SubScores, stats: &ComparisonStats) -> SubScores {
    let z = |v: Option<f64>, s: Option<GroupStats>| match (v, s) {
        (Some(v), Some(s)) => Some(s.standardize(v)),
        _ => None,
    };
    SubScores {
        explosiveness: z(scores.explosiveness, stats.explosiveness),
        repeatability: z(scores.repeatability, stats.repeatability),
        volume: z(scores.volume, stats.volume),
    }
}

/// Kombiner z-scores med vektene. Manglende sub-score faller ut og de
/// øvrige vektene skaleres opp proporsjonalt; ingen sub-score → `None`.
pub fn combine_index(z: &SubScores, weights: &IntensityWeights) -> Option<f64> {
    let parts = [
        (weights.explosiveness(), z.explosiveness),
        (weights.repeatability(), z.repeatability),
        (weights.volume(), z.volume),
    ];
    let present: Vec<(f64, f64)> = parts
        .iter()
        .filter_map(|(w, v)| v.map(|v| (*w, v)))
        .collect();
    if present.is_empty() {
        return None;
    }
    let w_present: f64 = present.iter().map(|(w, _)| w).sum();
    if w_present <= 0.0 {
        return Some(0.0);
    }
    let scale = weights.sum() / w_present;
    Some(present.iter().map(|(w, v)| w * v).sum::<f64>() * scale)
}
