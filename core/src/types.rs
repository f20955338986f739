use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::baseline::BaselineComparison;

/// Én sensoravlesning (typisk 1 Hz eller 10 Hz fra GPS-vest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub player_id: String,
    #[serde(default)]
    pub player_number: Option<u32>,
    #[serde(default)]
    pub speed: Option<f64>, // m/s
    #[serde(default)]
    pub acc: Option<f64>, // m/s²
    #[serde(default)]
    pub hr: Option<f64>, // bpm
    #[serde(default)]
    pub mp: Option<f64>, // metabolsk effekt, W/kg
}

/// Rå-signalene motoren kan kombinere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Speed,
    Acc,
    Hr,
    Mp,
}

impl Signal {
    pub const ALL: [Signal; 4] = [Signal::Speed, Signal::Acc, Signal::Hr, Signal::Mp];

    /// Prioritet når motoren faller tilbake til ett rå-signal.
    pub const PASSTHROUGH_ORDER: [Signal; 4] = [Signal::Mp, Signal::Speed, Signal::Acc, Signal::Hr];

    #[inline]
    pub fn value(self, s: &Sample) -> Option<f64> {
        let v = match self {
            Signal::Speed => s.speed,
            Signal::Acc => s.acc,
            Signal::Hr => s.hr,
            Signal::Mp => s.mp,
        };
        v.filter(|x| x.is_finite())
    }

    pub fn name(self) -> &'static str {
        match self {
            Signal::Speed => "speed",
            Signal::Acc => "acc",
            Signal::Hr => "hr",
            Signal::Mp => "mp",
        }
    }
}

/// Kapabilitetsbeskrivelse: hvilke signaler datasettet faktisk har.
/// Beregnes én gang per datasett og sendes videre til scorer/aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSignals {
    signals: Vec<Signal>,
}

impl AvailableSignals {
    /// Et signal regnes som tilgjengelig hvis minst én rad har en endelig verdi.
    pub fn detect(samples: &[Sample]) -> Self {
        Self::from_signals(
            Signal::ALL
                .into_iter()
                .filter(|sig| samples.iter().any(|s| sig.value(s).is_some())),
        )
    }

    pub fn from_signals<I: IntoIterator<Item = Signal>>(signals: I) -> Self {
        let mut v: Vec<Signal> = signals.into_iter().collect();
        v.sort();
        v.dedup();
        Self { signals: v }
    }

    pub fn all() -> Self {
        Self::from_signals(Signal::ALL)
    }

    #[inline]
    pub fn contains(&self, sig: Signal) -> bool {
        self.signals.contains(&sig)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        self.signals.iter().copied()
    }

    /// Rå-signalet som brukes direkte når for få signaler finnes.
    pub fn passthrough_signal(&self) -> Option<Signal> {
        Signal::PASSTHROUGH_ORDER
            .into_iter()
            .find(|s| self.contains(*s))
    }
}

/// Samples for én spiller på én dato, sortert på tid.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: String,
    pub player_number: Option<u32>,
    pub date: NaiveDate,
    samples: Vec<Sample>,
}

impl Session {
    /// Stabil sortering på timestamp, slik at like tidsstempler beholder radrekkefølgen.
    pub fn new(player_id: impl Into<String>, date: NaiveDate, mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        let player_number = samples.iter().find_map(|s| s.player_number);
        Self {
            player_id: player_id.into(),
            player_number,
            date,
            samples,
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    pub fn signal(&self, sig: Signal) -> Vec<Option<f64>> {
        self.samples.iter().map(|s| sig.value(s)).collect()
    }

    /// Sekunder mellom første og siste sample (0 for én sample).
    pub fn elapsed_secs(&self) -> Option<f64> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        let ms = (last.timestamp - first.timestamp).num_milliseconds();
        Some(ms as f64 / 1000.0)
    }
}

/// Toppverdi for én vinduslengde.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakDemand {
    pub value: Option<f64>,
    pub timestamp: Option<NaiveDateTime>,
}

impl PeakDemand {
    pub const NONE: PeakDemand = PeakDemand {
        value: None,
        timestamp: None,
    };

    pub fn is_some(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowPeak {
    pub window_secs: u32,
    #[serde(flatten)]
    pub peak: PeakDemand,
}

/// Høyeste topp på tvers av vinduer, og hvilket vindu som ga den.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestPeak {
    pub value: f64,
    pub window_secs: u32,
    pub timestamp: Option<NaiveDateTime>,
}

/// Explosiveness / repeatability / volume (rå eller z-normalisert).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub explosiveness: Option<f64>,
    pub repeatability: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntensityCategory {
    Easy,
    Medium,
    Hard,
    #[serde(rename = "Very Hard")]
    VeryHard,
}

impl IntensityCategory {
    pub fn label(self) -> &'static str {
        match self {
            IntensityCategory::Easy => "Easy",
            IntensityCategory::Medium => "Medium",
            IntensityCategory::Hard => "Hard",
            IntensityCategory::VeryHard => "Very Hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosivenessClass {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very high")]
    VeryHigh,
}

impl ExplosivenessClass {
    pub fn label(self) -> &'static str {
        match self {
            ExplosivenessClass::Low => "Low",
            ExplosivenessClass::Moderate => "Moderate",
            ExplosivenessClass::High => "High",
            ExplosivenessClass::VeryHigh => "Very high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Snitt av kravsignalet i første, midtre og siste tredjedel av økta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseBreakdown {
    pub early: Option<f64>,
    pub mid: Option<f64>,
    pub late: Option<f64>,
    /// (late - early) / early * 100
    pub trend_pct: Option<f64>,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub samples: usize,
    /// None når økta er tom eller varer 0 sekunder.
    pub coverage_pct: Option<f64>,
}

/// Utdata for én spiller + økt. Lages én gang og endres aldri.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSessionMetrics {
    pub player_id: String,
    pub player_number: Option<u32>,
    pub date: NaiveDate,

    pub duration_s: Option<f64>,
    pub mean_power: Option<f64>,
    pub peaks: Vec<WindowPeak>,
    pub best_peak: Option<BestPeak>,
    pub total_load: Option<f64>,

    pub sub_scores: SubScores,
    pub sub_z: SubScores,
    pub intensity_index: Option<f64>,

    pub intensity_percentile: Option<f64>,
    pub intensity_z: Option<f64>,
    pub peak10_percentile: Option<f64>,
    pub total_load_percentile: Option<f64>,
    pub category: Option<IntensityCategory>,
    pub explosiveness_class: Option<ExplosivenessClass>,

    pub phases: PhaseBreakdown,
    pub baseline: Option<BaselineComparison>,
    pub data_quality: DataQuality,
    pub has_peak_data: bool,
    /// Rå-signal brukt direkte (for få signaler til kompositt).
    pub passthrough: bool,
}

impl PlayerSessionMetrics {
    /// Tom økt: alle felt eksplisitt None og `has_peak_data = false`.
    pub fn empty(player_id: impl Into<String>, player_number: Option<u32>, date: NaiveDate) -> Self {
        Self {
            player_id: player_id.into(),
            player_number,
            date,
            duration_s: None,
            mean_power: None,
            peaks: Vec::new(),
            best_peak: None,
            total_load: None,
            sub_scores: SubScores::default(),
            sub_z: SubScores::default(),
            intensity_index: None,
            intensity_percentile: None,
            intensity_z: None,
            peak10_percentile: None,
            total_load_percentile: None,
            category: None,
            explosiveness_class: None,
            phases: PhaseBreakdown::default(),
            baseline: None,
            data_quality: DataQuality::default(),
            has_peak_data: false,
            passthrough: false,
        }
    }

    /// MDP for gitt vinduslengde, hvis beregnet.
    pub fn peak(&self, window_secs: u32) -> Option<f64> {
        self.peaks
            .iter()
            .find(|p| p.window_secs == window_secs)
            .and_then(|p| p.peak.value)
    }
}

/// Alle spillere i én økt (dato).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSessionAggregate {
    pub date: NaiveDate,
    pub players: Vec<PlayerSessionMetrics>,
}

impl TeamSessionAggregate {
    pub fn player(&self, player_id: &str) -> Option<&PlayerSessionMetrics> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}

/// Ikke-fatal melding til kalleren (warning-nivå).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// For få signaler: rå-verdier brukes direkte som intensitet.
    MissingSignal {
        available: Vec<Signal>,
        required: usize,
        passthrough: Option<Signal>,
    },
    /// Spilleren mangler metabolsk effekt; topper og volum fra intensiteten.
    DemandFallback { player_id: String, date: NaiveDate },
    /// Baseline manglet for én spiller; team brukt som sammenligning.
    BaselineFallback { player_id: String, date: NaiveDate },
    /// Ingen rader å analysere.
    EmptyDataset,
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::MissingSignal {
                available,
                required,
                passthrough,
            } => {
                let names: Vec<&str> = available.iter().map(|s| s.name()).collect();
                match passthrough {
                    Some(sig) => format!(
                        "Not all intensity columns available ({} of {} required: [{}]). Using raw `{}` directly.",
                        available.len(),
                        required,
                        names.join(", "),
                        sig.name()
                    ),
                    None => "No intensity columns available; no intensity can be computed.".to_string(),
                }
            }
            Notice::DemandFallback { player_id, date } => format!(
                "No metabolic power for {player_id} on {date}; peaks and load use the composite intensity instead."
            ),
            Notice::BaselineFallback { player_id, date } => format!(
                "Insufficient baseline data for {player_id} on {date}; compared against team instead."
            ),
            Notice::EmptyDataset => "No samples to analyze.".to_string(),
        }
    }
}
