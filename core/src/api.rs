use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json as json;
use serde_path_to_error as spte;

use crate::baseline::BaselineHistory;
use crate::config::{EngineConfig, IntensityWeights, WeightPreset};
use crate::display::{event_display, player_display_map};
use crate::engine::{AnalysisReport, Dataset, IntensityEngine};
use crate::error::{EngineError, Result};
use crate::scoring::IntensityTimeline;
use crate::summary::{filter_records, highlights, summarize, Highlights, RecordFilter, SessionSummary, DEFAULT_TOP_N};
use crate::telemetry::EngineMetrics;
use crate::types::{AvailableSignals, Sample, Session, Signal};

/// Parse JSON med sti til feltet som feilet, f.eks. `samples[3].timestamp`.
pub fn parse_json<T: DeserializeOwned>(what: &'static str, input: &str) -> Result<T> {
    let mut de = json::Deserializer::from_str(input);
    spte::deserialize(&mut de).map_err(|e| EngineError::Parse {
        what,
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}

/// Enten full konfigurasjon eller bare et forhåndsvalg.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub config: Option<EngineConfig>,
    #[serde(default)]
    pub preset: Option<WeightPreset>,
    /// Overstyrer kolonnedeteksjon (kolonner kjent fra filheader).
    #[serde(default)]
    pub signals: Option<Vec<Signal>>,
    #[serde(default)]
    pub history: BaselineHistory,
    /// Utvalg for oppsummering og topplister. Rapporten er alltid komplett.
    #[serde(default)]
    pub filter: RecordFilter,
}

impl AnalyzeRequest {
    pub fn engine_config(&self) -> Result<EngineConfig> {
        match (&self.config, self.preset) {
            (Some(cfg), _) => Ok(cfg.clone()),
            (None, Some(p)) => Ok(EngineConfig::from_preset(p)),
            (None, None) => Err(EngineError::Parse {
                what: "AnalyzeRequest",
                path: ".".to_string(),
                message: "either `config` or `preset` is required".to_string(),
            }),
        }
    }

    pub fn dataset(&self) -> Dataset {
        match &self.signals {
            Some(sigs) => Dataset::with_signals(self.samples.clone(), AvailableSignals::from_signals(sigs.iter().copied())),
            None => Dataset::new(self.samples.clone()),
        }
    }
}

/// Innsikter og visningsnavn for én spiller + økt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInsights {
    pub player_id: String,
    pub date: NaiveDate,
    pub display_name: String,
    pub event: String,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub report: AnalysisReport,
    pub messages: Vec<String>,
    pub insights: Vec<PlayerInsights>,
    pub summary: SessionSummary,
    pub highlights: Highlights,
}

/// Hele kjeden: dataset → rapport → oppsummering og tekst.
pub fn analyze(request: &AnalyzeRequest, metrics: Option<&EngineMetrics>) -> Result<AnalyzeResponse> {
    let cfg = request.engine_config()?;
    let mut engine = IntensityEngine::new(&cfg)?;
    if let Some(m) = metrics {
        engine = engine.with_metrics(m);
    }
    let report = engine.analyze_with_history(&request.dataset(), &request.history)?;

    let names = player_display_map(report.records().map(|m| m.player_id.as_str()));
    let insights = report
        .records()
        .map(|m| {
            let display_name = names.get(&m.player_id).cloned().unwrap_or_else(|| m.player_id.clone());
            PlayerInsights {
                player_id: m.player_id.clone(),
                date: m.date,
                event: event_display(&display_name, m.date),
                display_name,
                insights: engine.insights(m),
            }
        })
        .collect();

    let records: Vec<_> = filter_records(report.records(), &request.filter).into_iter().cloned().collect();
    Ok(AnalyzeResponse {
        messages: report.notices.iter().map(|n| n.message()).collect(),
        summary: summarize(&records),
        highlights: highlights(&records, DEFAULT_TOP_N),
        insights,
        report,
    })
}

pub fn analyze_json(input: &str) -> Result<String> {
    analyze_json_with_metrics(input, None)
}

pub fn analyze_json_with_metrics(input: &str, metrics: Option<&EngineMetrics>) -> Result<String> {
    let request: AnalyzeRequest = parse_json("AnalyzeRequest", input)?;
    let response = analyze(&request, metrics)?;
    Ok(json::to_string(&response)?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineRequest {
    #[serde(flatten)]
    pub analyze: AnalyzeRequest,
    pub player_id: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineResponse {
    pub timeline: Option<IntensityTimeline>,
    pub team_average: Vec<(NaiveDateTime, f64)>,
}

/// Tidsserie for én spiller (eller bare lagsnitt når `player_id` mangler).
pub fn timeline_json(input: &str) -> Result<String> {
    let request: TimelineRequest = parse_json("TimelineRequest", input)?;
    let cfg = request.analyze.engine_config()?;
    let engine = IntensityEngine::new(&cfg)?;
    let dataset = request.analyze.dataset();
    let team: Vec<Session> = dataset.sessions().remove(&request.date).unwrap_or_default();

    let timeline = match &request.player_id {
        Some(pid) => team
            .iter()
            .find(|s| &s.player_id == pid)
            .map(|s| engine.timeline(s, dataset.available()))
            .transpose()?,
        None => None,
    };
    let response = TimelineResponse {
        timeline,
        team_average: engine.team_average(&team, dataset.available()),
    };
    Ok(json::to_string(&response)?)
}

#[derive(Debug, Clone, Serialize)]
struct PresetOut {
    key: WeightPreset,
    label: &'static str,
    weights: IntensityWeights,
}

/// Forhåndsvalgene med vekter, for nedtrekksmenyen.
pub fn presets_json() -> Result<String> {
    let out: BTreeMap<&'static str, PresetOut> = WeightPreset::ALL
        .into_iter()
        .map(|p| {
            (
                p.label(),
                PresetOut {
                    key: p,
                    label: p.label(),
                    weights: p.weights(),
                },
            )
        })
        .collect();
    Ok(json::to_string(&out)?)
}
