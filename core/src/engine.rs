use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::baseline::{baseline_stats, compare_to_history, trailing_values, BaselineHistory, HistoryRecord};
use crate::config::{ComparisonBasis, EngineConfig};
use crate::error::ConfigError;
use crate::insights::{classify, classify_explosiveness, phase_breakdown, InsightConfig, InsightGenerator};
use crate::mdp::{compute_peaks, overall_peak};
use crate::scoring::{
    combine_index, standardize, total_load, ComparisonStats, CompositeIntensityScorer, IntensitySource,
    IntensityTimeline,
};
use crate::team::{team_average_timeline, team_standing};
use crate::telemetry::EngineMetrics;
use crate::types::{
    AvailableSignals, DataQuality, Notice, PlayerSessionMetrics, Sample, Session, SubScores, TeamSessionAggregate,
};

/// Datasett i minnet: rader + kapabilitetsbeskrivelse (beregnet én gang).
#[derive(Debug, Clone)]
pub struct Dataset {
    samples: Vec<Sample>,
    available: AvailableSignals,
}

impl Dataset {
    pub fn new(samples: Vec<Sample>) -> Self {
        let available = AvailableSignals::detect(&samples);
        Self { samples, available }
    }

    /// Når kalleren vet hvilke kolonner som finnes (f.eks. fra CSV-header).
    pub fn with_signals(samples: Vec<Sample>, available: AvailableSignals) -> Self {
        Self { samples, available }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn available(&self) -> &AvailableSignals {
        &self.available
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Grupperer på (dato, spiller). BTreeMap gir deterministisk rekkefølge.
    pub fn sessions(&self) -> BTreeMap<NaiveDate, Vec<Session>> {
        let mut grouped: BTreeMap<NaiveDate, BTreeMap<&str, Vec<Sample>>> = BTreeMap::new();
        for s in &self.samples {
            grouped
                .entry(s.timestamp.date())
                .or_default()
                .entry(s.player_id.as_str())
                .or_default()
                .push(s.clone());
        }
        grouped
            .into_iter()
            .map(|(date, players)| {
                let sessions = players
                    .into_iter()
                    .map(|(pid, samples)| Session::new(pid, date, samples))
                    .collect();
                (date, sessions)
            })
            .collect()
    }
}

/// Resultat for et helt datasett.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub available: AvailableSignals,
    pub source: IntensitySource,
    pub sessions: Vec<TeamSessionAggregate>,
    pub notices: Vec<Notice>,
}

impl AnalysisReport {
    pub fn records(&self) -> impl Iterator<Item = &PlayerSessionMetrics> {
        self.sessions.iter().flat_map(|s| s.players.iter())
    }

    pub fn session(&self, date: NaiveDate) -> Option<&TeamSessionAggregate> {
        self.sessions.iter().find(|s| s.date == date)
    }
}

/// Selve motoren. Holder bare referanser til eksplisitt konfigurasjon;
/// hvert kall er en ren funksjon av (data, konfigurasjon).
#[derive(Clone, Copy)]
pub struct IntensityEngine<'a> {
    config: &'a EngineConfig,
    metrics: Option<&'a EngineMetrics>,
}

impl<'a> IntensityEngine<'a> {
    pub fn new(config: &'a EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, metrics: None })
    }

    pub fn with_metrics(mut self, metrics: &'a EngineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Analyser hele datasettet. Baseline bygges fra tidligere datoer i
    /// samme datasett.
    pub fn analyze(&self, dataset: &Dataset) -> Result<AnalysisReport, ConfigError> {
        self.analyze_with_history(dataset, &BaselineHistory::new())
    }

    /// Som `analyze`, men med ekstra historikk fra kalleren.
    pub fn analyze_with_history(
        &self,
        dataset: &Dataset,
        history: &BaselineHistory,
    ) -> Result<AnalysisReport, ConfigError> {
        let available = dataset.available().clone();
        let scorer = CompositeIntensityScorer::new(self.config, &available);
        let source = scorer.source();
        let mut notices = Vec::new();

        if dataset.is_empty() {
            notices.push(Notice::EmptyDataset);
            return Ok(AnalysisReport {
                available,
                source,
                sessions: Vec::new(),
                notices,
            });
        }

        if let Some(n) = self.signal_notice(&available, source) {
            warn!("{}", n.message());
            if let Some(m) = self.metrics {
                m.passthrough_fallbacks().inc();
            }
            notices.push(n);
        }

        let mut history = history.clone();
        let mut sessions = Vec::new();
        for (date, team) in dataset.sessions() {
            let agg = self.analyze_team_session(date, &team, &available, &history, &mut notices)?;
            for p in &agg.players {
                history.entry(p.player_id.clone()).or_default().push(HistoryRecord {
                    date,
                    sub_scores: p.sub_scores,
                    intensity_index: p.intensity_index,
                });
            }
            sessions.push(agg);
        }

        Ok(AnalysisReport {
            available,
            source,
            sessions,
            notices,
        })
    }

    fn signal_notice(&self, available: &AvailableSignals, source: IntensitySource) -> Option<Notice> {
        match source {
            IntensitySource::Composite => None,
            IntensitySource::Passthrough(sig) => Some(Notice::MissingSignal {
                available: available.iter().collect(),
                required: self.config.min_signals,
                passthrough: Some(sig),
            }),
            IntensitySource::Unavailable => Some(Notice::MissingSignal {
                available: Vec::new(),
                required: self.config.min_signals,
                passthrough: None,
            }),
        }
    }

    /// Alle spillere på én dato: toppverdier, sub-scores, indeks og lagrang.
    pub fn analyze_team_session(
        &self,
        date: NaiveDate,
        team: &[Session],
        available: &AvailableSignals,
        history: &BaselineHistory,
        notices: &mut Vec<Notice>,
    ) -> Result<TeamSessionAggregate, ConfigError> {
        let scorer = CompositeIntensityScorer::new(self.config, available);
        let mut drafts = Vec::with_capacity(team.len());
        for session in team {
            if !session.is_empty() && scorer.lacks_power(session) {
                warn!("no mp for {} on {date}; using intensity as demand", session.player_id);
                notices.push(Notice::DemandFallback {
                    player_id: session.player_id.clone(),
                    date,
                });
            }
            drafts.push(self.player_draft(&scorer, session)?);
        }

        let raw: Vec<SubScores> = drafts.iter().map(|d| d.sub_scores).collect();
        let team_stats = ComparisonStats::from_team(&raw);

        // første runde: z mot lag eller baseline, og indeks
        let mut scored: Vec<PlayerSessionMetrics> = Vec::with_capacity(drafts.len());
        for mut m in drafts {
            if m.data_quality.samples > 0 {
                let past = history.get(&m.player_id).map(Vec::as_slice).unwrap_or(&[]);
                let stats = match self.config.basis {
                    ComparisonBasis::Team => team_stats,
                    ComparisonBasis::Baseline => {
                        let (stats, complete) = self.baseline_or_team(past, date, &team_stats);
                        if !complete {
                            warn!("baseline incomplete for {} on {date}; using team", m.player_id);
                            notices.push(Notice::BaselineFallback {
                                player_id: m.player_id.clone(),
                                date,
                            });
                        }
                        stats
                    }
                };
                m.sub_z = standardize(&m.sub_scores, &stats);
                m.intensity_index = combine_index(&m.sub_z, &self.config.weights);
                m.baseline = m.intensity_index.map(|idx| {
                    let values = trailing_values(past, date, self.config.baseline_days, |h| h.intensity_index);
                    compare_to_history(idx, &values, self.config.baseline_min_sessions)
                });
            }
            scored.push(m);
        }

        // andre runde: rang mot lagkamerater
        let indices: Vec<Option<f64>> = scored.iter().map(|m| m.intensity_index).collect();
        let peaks10: Vec<Option<f64>> = scored.iter().map(|m| m.sub_scores.explosiveness).collect();
        let loads: Vec<Option<f64>> = scored.iter().map(|m| m.total_load).collect();

        let players = scored
            .into_iter()
            .map(|mut m| {
                let intensity = team_standing(m.intensity_index, &indices);
                let peak10 = team_standing(m.sub_scores.explosiveness, &peaks10);
                let load = team_standing(m.total_load, &loads);
                m.intensity_percentile = intensity.percentile;
                m.intensity_z = intensity.z_score;
                m.peak10_percentile = peak10.percentile;
                m.total_load_percentile = load.percentile;
                m.category = m.intensity_percentile.map(classify);
                m.explosiveness_class = m.peak10_percentile.map(classify_explosiveness);
                m
            })
            .collect::<Vec<_>>();

        debug!("analyzed {} player session(s) for {date}", players.len());
        Ok(TeamSessionAggregate { date, players })
    }

    /// Sub-score-statistikk fra spillerens historikk der den finnes, ellers
    /// lagets. `bool` er false hvis minst én sub-score falt tilbake til lag.
    fn baseline_or_team(
        &self,
        past: &[HistoryRecord],
        date: NaiveDate,
        team: &ComparisonStats,
    ) -> (ComparisonStats, bool) {
        let days = self.config.baseline_days;
        let min = self.config.baseline_min_sessions;
        let e = baseline_stats(past, date, days, min, |h| h.sub_scores.explosiveness);
        let r = baseline_stats(past, date, days, min, |h| h.sub_scores.repeatability);
        let v = baseline_stats(past, date, days, min, |h| h.sub_scores.volume);
        let complete = e.is_some() && r.is_some() && v.is_some();
        (
            ComparisonStats {
                explosiveness: e.or(team.explosiveness),
                repeatability: r.or(team.repeatability),
                volume: v.or(team.volume),
            },
            complete,
        )
    }

    /// Alt som kan beregnes for én spiller uten å se på laget.
    fn player_draft(
        &self,
        scorer: &CompositeIntensityScorer<'_>,
        session: &Session,
    ) -> Result<PlayerSessionMetrics, ConfigError> {
        if session.is_empty() {
            if let Some(m) = self.metrics {
                m.empty_sessions().inc();
            }
            return Ok(PlayerSessionMetrics::empty(
                session.player_id.clone(),
                session.player_number,
                session.date,
            ));
        }

        let cfg = self.config;
        let demand = scorer.demand_signal(session);
        let timestamps = session.timestamps();
        let peaks = compute_peaks(&demand, &timestamps, &cfg.windows_sorted(), cfg.sample_rate_hz)?;

        let missing = peaks.iter().filter(|p| !p.peak.is_some()).count();
        if let Some(m) = self.metrics {
            m.sessions_analyzed().inc();
            m.insufficient_windows().inc_by(missing as u64);
        }

        let load = total_load(&demand, cfg.sample_rate_hz);
        let defined: Vec<f64> = demand.iter().flatten().copied().collect();
        let mean_power = if defined.is_empty() {
            None
        } else {
            Some(defined.iter().sum::<f64>() / defined.len() as f64)
        };
        let elapsed = session.elapsed_secs();

        let mut m = PlayerSessionMetrics::empty(session.player_id.clone(), session.player_number, session.date);
        m.duration_s = elapsed;
        m.mean_power = mean_power;
        m.best_peak = overall_peak(&peaks);
        m.has_peak_data = peaks.iter().any(|p| p.peak.is_some());
        m.sub_scores = scorer.sub_scores(&peaks, load);
        m.peaks = peaks;
        m.total_load = load;
        m.phases = phase_breakdown(&demand, cfg.trend_threshold_pct);
        m.data_quality = DataQuality {
            samples: session.len(),
            coverage_pct: coverage_pct(session.len(), elapsed, cfg.sample_rate_hz),
        };
        m.passthrough = matches!(scorer.source(), IntensitySource::Passthrough(_));
        Ok(m)
    }

    /// Én spiller alene (lag på én): persentil 100, z `None`.
    pub fn analyze_player_session(
        &self,
        session: &Session,
        available: &AvailableSignals,
    ) -> Result<PlayerSessionMetrics, ConfigError> {
        let mut notices = Vec::new();
        let agg = self.analyze_team_session(
            session.date,
            std::slice::from_ref(session),
            available,
            &BaselineHistory::new(),
            &mut notices,
        )?;
        Ok(agg
            .players
            .into_iter()
            .next()
            .unwrap_or_else(|| PlayerSessionMetrics::empty(session.player_id.clone(), session.player_number, session.date)))
    }

    /// Intensitet per tidsstempel og rullende vinduer, for grafer.
    pub fn timeline(&self, session: &Session, available: &AvailableSignals) -> Result<IntensityTimeline, ConfigError> {
        CompositeIntensityScorer::new(self.config, available).timeline(session)
    }

    /// Lagsnitt av intensitet per tidsstempel.
    pub fn team_average(&self, team: &[Session], available: &AvailableSignals) -> Vec<(NaiveDateTime, f64)> {
        let scorer = CompositeIntensityScorer::new(self.config, available);
        let series: Vec<_> = team
            .iter()
            .map(|s| (s.timestamps(), scorer.intensity(s)))
            .collect();
        team_average_timeline(&series)
    }

    pub fn insights(&self, m: &PlayerSessionMetrics) -> Vec<String> {
        InsightGenerator::new(InsightConfig::from(self.config)).generate(m)
    }
}

/// Dekning i prosent: samples / (sekunder * rate + 1), maks 100.
/// `None` når økta er tom eller varer 0 sekunder.
pub fn coverage_pct(samples: usize, elapsed_secs: Option<f64>, sample_rate_hz: f64) -> Option<f64> {
    let elapsed = elapsed_secs?;
    if samples == 0 || elapsed <= 0.0 || sample_rate_hz <= 0.0 {
        return None;
    }
    let expected = elapsed * sample_rate_hz + 1.0;
    Some((samples as f64 / expected * 100.0).min(100.0))
}
