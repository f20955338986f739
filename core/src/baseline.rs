use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::team::{percentile_rank, GroupStats};
use crate::types::SubScores;

/// Én tidligere økt for en spiller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: NaiveDate,
    pub sub_scores: SubScores,
    pub intensity_index: Option<f64>,
}

/// Spillerhistorikk, nøkkel = player_id. BTreeMap for deterministisk rekkefølge.
pub type BaselineHistory = BTreeMap<String, Vec<HistoryRecord>>;

/// Resultat av sammenligning mot egen historikk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BaselineComparison {
    /// Færre enn minimum antall økter i vinduet.
    Insufficient { sessions: usize },
    Compared {
        sessions: usize,
        percentile: f64,
        z_score: f64,
        mean: f64,
    },
}

impl BaselineComparison {
    pub fn percentile(&self) -> Option<f64> {
        match self {
            BaselineComparison::Compared { percentile, .. } => Some(*percentile),
            BaselineComparison::Insufficient { .. } => None,
        }
    }

    pub fn z_score(&self) -> Option<f64> {
        match self {
            BaselineComparison::Compared { z_score, .. } => Some(*z_score),
            BaselineComparison::Insufficient { .. } => None,
        }
    }

    pub fn is_sufficient(&self) -> bool {
        matches!(self, BaselineComparison::Compared { .. })
    }
}

/// Verdier fra økter strengt før `session_date` og innenfor `days` dager.
pub fn trailing_values<F>(
    history: &[HistoryRecord],
    session_date: NaiveDate,
    days: u32,
    metric: F,
) -> Vec<f64>
where
    F: Fn(&HistoryRecord) -> Option<f64>,
{
    // før kalenderens start: vinduet dekker hele historikken
    let start = session_date.checked_sub_signed(Duration::days(i64::from(days)));
    history
        .iter()
        .filter(|h| h.date < session_date && start.map_or(true, |s| h.date >= s))
        .filter_map(|h| metric(h).filter(|v| v.is_finite()))
        .collect()
}

/// Persentil (selv inkludert) og z mot egen historikk. Bruker det som finnes
/// av historikk, men krever minst `min_sessions` økter.
pub fn compare_to_history(value: f64, past: &[f64], min_sessions: usize) -> BaselineComparison {
    let sessions = past.len();
    if sessions < min_sessions.max(2) {
        return BaselineComparison::Insufficient { sessions };
    }
    let Some(stats) = GroupStats::from_values(past) else {
        return BaselineComparison::Insufficient { sessions };
    };
    let mut pool = past.to_vec();
    pool.push(value);
    let percentile = percentile_rank(value, &pool).unwrap_or(100.0);
    BaselineComparison::Compared {
        sessions,
        percentile,
        z_score: stats.standardize(value),
        mean: stats.mean,
    }
}

/// Statistikk for én sub-score over spillerens vindu, hvis nok økter.
pub fn baseline_stats<F>(
    history: &[HistoryRecord],
    session_date: NaiveDate,
    days: u32,
    min_sessions: usize,
    metric: F,
) -> Option<GroupStats>
where
    F: Fn(&HistoryRecord) -> Option<f64>,
{
    let past = trailing_values(history, session_date, days, metric);
    if past.len() < min_sessions.max(2) {
        return None;
    }
    GroupStats::from_values(&past)
}
