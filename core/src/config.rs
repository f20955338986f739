use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Signal;

pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 1.0;
pub const DEFAULT_WINDOWS_SECS: [u32; 4] = [5, 10, 20, 30];
pub const DEFAULT_EXPLOSIVENESS_WINDOW_SECS: u32 = 10;
pub const DEFAULT_REPEATABILITY_WINDOWS_SECS: [u32; 2] = [20, 30];
pub const DEFAULT_MIN_SIGNALS: usize = 3;
pub const DEFAULT_BASELINE_DAYS: u32 = 28;
/// Hundre år; lengre vindu gir ingen mening og kan ikke regnes som dato.
pub const MAX_BASELINE_DAYS: u32 = 36_500;
pub const DEFAULT_BASELINE_MIN_SESSIONS: usize = 2;
pub const DEFAULT_TREND_THRESHOLD_PCT: f64 = 5.0;
pub const DEFAULT_COVERAGE_WARNING_PCT: f64 = 80.0;

fn check_weight(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFiniteWeight { name, value });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::WeightOutOfRange { name, value });
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct IntensityWeightsIn {
    #[serde(alias = "w_explosiveness")]
    explosiveness: f64,
    #[serde(alias = "w_repeatability")]
    repeatability: f64,
    #[serde(alias = "w_volume")]
    volume: f64,
}

impl TryFrom<IntensityWeightsIn> for IntensityWeights {
    type Error = ConfigError;

    fn try_from(w: IntensityWeightsIn) -> Result<Self, Self::Error> {
        IntensityWeights::new(w.explosiveness, w.repeatability, w.volume)
    }
}

/// Vekter for explosiveness / repeatability / volume.
///
/// Hver vekt må ligge i [0, 1]. Summen *bør* være 1, men det håndheves
/// ikke. Ingen `Default`: vektene skal alltid oppgis eksplisitt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IntensityWeightsIn")]
pub struct IntensityWeights {
    explosiveness: f64,
    repeatability: f64,
    volume: f64,
}

impl IntensityWeights {
    pub fn new(explosiveness: f64, repeatability: f64, volume: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            explosiveness: check_weight("explosiveness", explosiveness)?,
            repeatability: check_weight("repeatability", repeatability)?,
            volume: check_weight("volume", volume)?,
        })
    }

    pub fn explosiveness(&self) -> f64 {
        self.explosiveness
    }

    pub fn repeatability(&self) -> f64 {
        self.repeatability
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn sum(&self) -> f64 {
        self.explosiveness + self.repeatability + self.volume
    }
}

/// Forhåndsdefinerte vektsett fra trenerflaten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPreset {
    MatchLike,
    SpeedEmphasis,
    Conditioning,
}

impl WeightPreset {
    pub const ALL: [WeightPreset; 3] = [
        WeightPreset::MatchLike,
        WeightPreset::SpeedEmphasis,
        WeightPreset::Conditioning,
    ];

    pub fn weights(self) -> IntensityWeights {
        let (e, r, v) = match self {
            WeightPreset::MatchLike => (0.30, 0.50, 0.20),
            WeightPreset::SpeedEmphasis => (0.50, 0.30, 0.20),
            WeightPreset::Conditioning => (0.20, 0.40, 0.40),
        };
        // konstantene over er gyldige
        IntensityWeights {
            explosiveness: e,
            repeatability: r,
            volume: v,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WeightPreset::MatchLike => "Match-like / Balanced",
            WeightPreset::SpeedEmphasis => "Speed Emphasis",
            WeightPreset::Conditioning => "Conditioning / Volume",
        }
    }
}

/// Vekter per rå-signal i komposittintensiteten.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub speed: f64,
    pub acc: f64,
    pub hr: f64,
    pub mp: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            speed: 0.25,
            acc: 0.25,
            hr: 0.25,
            mp: 0.25,
        }
    }
}

impl SignalWeights {
    #[inline]
    pub fn weight(&self, sig: Signal) -> f64 {
        match sig {
            Signal::Speed => self.speed,
            Signal::Acc => self.acc,
            Signal::Hr => self.hr,
            Signal::Mp => self.mp,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weight("speed", self.speed)?;
        check_weight("acc", self.acc)?;
        check_weight("hr", self.hr)?;
        check_weight("mp", self.mp)?;
        Ok(())
    }
}

/// Hvordan hvert signal skaleres før summering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    MinMax,
    ZScore,
}

/// Sammenligningsgrunnlag for sub-score z-verdier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonBasis {
    #[default]
    Team,
    Baseline,
}

fn default_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE_HZ
}
fn default_windows() -> Vec<u32> {
    DEFAULT_WINDOWS_SECS.to_vec()
}
fn default_explosiveness_window() -> u32 {
    DEFAULT_EXPLOSIVENESS_WINDOW_SECS
}
fn default_repeatability_windows() -> Vec<u32> {
    DEFAULT_REPEATABILITY_WINDOWS_SECS.to_vec()
}
fn default_min_signals() -> usize {
    DEFAULT_MIN_SIGNALS
}
fn default_baseline_days() -> u32 {
    DEFAULT_BASELINE_DAYS
}
fn default_baseline_min_sessions() -> usize {
    DEFAULT_BASELINE_MIN_SESSIONS
}
fn default_trend_threshold() -> f64 {
    DEFAULT_TREND_THRESHOLD_PCT
}
fn default_coverage_warning() -> f64 {
    DEFAULT_COVERAGE_WARNING_PCT
}

/// All konfigurasjon for ett motor-kall. Sendes eksplisitt inn; motoren
/// leser aldri global tilstand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub weights: IntensityWeights,
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,
    #[serde(default = "default_windows")]
    pub windows_secs: Vec<u32>,
    #[serde(default = "default_explosiveness_window")]
    pub explosiveness_window_secs: u32,
    #[serde(default = "default_repeatability_windows")]
    pub repeatability_windows_secs: Vec<u32>,
    #[serde(default)]
    pub signal_weights: SignalWeights,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default = "default_min_signals")]
    pub min_signals: usize,
    #[serde(default)]
    pub basis: ComparisonBasis,
    #[serde(default = "default_baseline_days")]
    pub baseline_days: u32,
    #[serde(default = "default_baseline_min_sessions")]
    pub baseline_min_sessions: usize,
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold_pct: f64,
    #[serde(default = "default_coverage_warning")]
    pub coverage_warning_pct: f64,
}

impl EngineConfig {
    pub fn new(weights: IntensityWeights) -> Self {
        Self {
            weights,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            windows_secs: default_windows(),
            explosiveness_window_secs: DEFAULT_EXPLOSIVENESS_WINDOW_SECS,
            repeatability_windows_secs: default_repeatability_windows(),
            signal_weights: SignalWeights::default(),
            normalization: Normalization::default(),
            min_signals: DEFAULT_MIN_SIGNALS,
            basis: ComparisonBasis::default(),
            baseline_days: DEFAULT_BASELINE_DAYS,
            baseline_min_sessions: DEFAULT_BASELINE_MIN_SESSIONS,
            trend_threshold_pct: DEFAULT_TREND_THRESHOLD_PCT,
            coverage_warning_pct: DEFAULT_COVERAGE_WARNING_PCT,
        }
    }

    pub fn from_preset(preset: WeightPreset) -> Self {
        Self::new(preset.weights())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // vektene er validert ved konstruksjon, men feltene kan være satt direkte
        IntensityWeights::new(
            self.weights.explosiveness,
            self.weights.repeatability,
            self.weights.volume,
        )?;
        self.signal_weights.validate()?;

        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate_hz));
        }
        if self.windows_secs.is_empty() {
            return Err(ConfigError::NoWindows);
        }
        if self.windows_secs.contains(&0) {
            return Err(ConfigError::ZeroWindow);
        }
        let sub_windows = std::iter::once(&self.explosiveness_window_secs)
            .chain(self.repeatability_windows_secs.iter());
        for w in sub_windows {
            if !self.windows_secs.contains(w) {
                return Err(ConfigError::UnknownSubScoreWindow(*w));
            }
        }
        if !(1..=Signal::ALL.len()).contains(&self.min_signals) {
            return Err(ConfigError::InvalidMinSignals(self.min_signals));
        }
        if self.baseline_days == 0 {
            return Err(ConfigError::ZeroBaselineDays);
        }
        if self.baseline_days > MAX_BASELINE_DAYS {
            return Err(ConfigError::BaselineDaysTooLarge(self.baseline_days));
        }
        for (name, value) in [
            ("trend_threshold_pct", self.trend_threshold_pct),
            ("coverage_warning_pct", self.coverage_warning_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }

    /// Vinduslengder stigende og uten duplikater.
    pub fn windows_sorted(&self) -> Vec<u32> {
        let mut w = self.windows_secs.clone();
        w.sort_unstable();
        w.dedup();
        w
    }

    pub fn window_samples(&self, secs: u32) -> Result<usize, ConfigError> {
        window_samples(secs, self.sample_rate_hz)
    }
}

/// Sekunder → antall samples med eksplisitt samplingsrate (minst 1).
pub fn window_samples(secs: u32, sample_rate_hz: f64) -> Result<usize, ConfigError> {
    if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
        return Err(ConfigError::InvalidSampleRate(sample_rate_hz));
    }
    if secs == 0 {
        return Err(ConfigError::ZeroWindow);
    }
    let n = (f64::from(secs) * sample_rate_hz).round();
    Ok((n as usize).max(1))
}
