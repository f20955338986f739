//! Øktintensitet og MDP (maximal demand periods) for lagidrett.
//!
//! Rå sensorrader (fart, akselerasjon, puls, metabolsk effekt) grupperes per
//! spiller og dato. Motoren finner toppkrav per vinduslengde, bygger
//! sub-scores, kombinerer dem til en vektet indeks og rangerer spilleren mot
//! laget og egen historikk.

pub mod api;
pub mod baseline;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod insights;
pub mod mdp;
pub mod rolling;
pub mod scoring;
pub mod summary;
pub mod team;
pub mod telemetry;
pub mod types;

#[cfg(feature = "python")]
mod py;

pub use api::{analyze_json, parse_json, presets_json, timeline_json};
pub use baseline::{BaselineComparison, BaselineHistory, HistoryRecord};
pub use config::{ComparisonBasis, EngineConfig, IntensityWeights, Normalization, SignalWeights, WeightPreset};
pub use engine::{AnalysisReport, Dataset, IntensityEngine};
pub use error::{ConfigError, EngineError};
pub use insights::{classify, InsightGenerator};
pub use mdp::{compute_mdp, compute_peaks, overall_peak};
pub use scoring::{combine_index, CompositeIntensityScorer, IntensitySource};
pub use telemetry::EngineMetrics;
pub use types::{
    AvailableSignals, ExplosivenessClass, IntensityCategory, Notice, PlayerSessionMetrics, Sample, Session, Signal, SubScores,
    TeamSessionAggregate, Trend,
};
