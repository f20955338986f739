use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::types::PlayerSessionMetrics;

/// Kvantilen "Top 25 %"-filteret bruker.
pub const HIGH_INTENSITY_QUANTILE: f64 = 0.75;
pub const DEFAULT_TOP_N: usize = 5;

/// Nøkkeltall for et utvalg økter (oversiktsside).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub n_sessions: usize,
    pub avg_intensity: Option<f64>,
    pub max_intensity: Option<f64>,
    pub min_intensity: Option<f64>,
    pub avg_mdp_10: Option<f64>,
    pub avg_total_load: Option<f64>,
}

fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        None
    } else {
        Some(v.iter().sum::<f64>() / v.len() as f64)
    }
}

pub fn summarize<'a, I>(records: I) -> SessionSummary
where
    I: IntoIterator<Item = &'a PlayerSessionMetrics>,
{
    let records: Vec<&PlayerSessionMetrics> = records.into_iter().collect();
    let idx: Vec<f64> = records.iter().filter_map(|m| m.intensity_index).collect();
    let mdp: Vec<f64> = records.iter().filter_map(|m| m.sub_scores.explosiveness).collect();
    let load: Vec<f64> = records.iter().filter_map(|m| m.total_load).collect();

    SessionSummary {
        n_sessions: records.len(),
        avg_intensity: mean(&idx),
        max_intensity: idx.iter().copied().map(OrderedFloat).max().map(OrderedFloat::into_inner),
        min_intensity: idx.iter().copied().map(OrderedFloat).min().map(OrderedFloat::into_inner),
        avg_mdp_10: mean(&mdp),
        avg_total_load: mean(&load),
    }
}

/// Kvantil med lineær interpolasjon mellom nærmeste rangposisjoner.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(v[lo] + (v[hi] - v[lo]) * frac)
}

/// Utvalg fra øktutforskeren: spillere og datointervall (inklusivt).
/// Tomme felt betyr "alle".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    pub players: Option<BTreeSet<String>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn matches(&self, m: &PlayerSessionMetrics) -> bool {
        self.players.as_ref().map_or(true, |p| p.contains(&m.player_id))
            && self.from.map_or(true, |d| m.date >= d)
            && self.to.map_or(true, |d| m.date <= d)
    }
}

pub fn filter_records<'a, I>(records: I, filter: &RecordFilter) -> Vec<&'a PlayerSessionMetrics>
where
    I: IntoIterator<Item = &'a PlayerSessionMetrics>,
{
    records.into_iter().filter(|m| filter.matches(m)).collect()
}

/// Økter med indeks på eller over 75-persentilen av utvalget.
pub fn high_intensity_only<'a, I>(records: I) -> Vec<&'a PlayerSessionMetrics>
where
    I: IntoIterator<Item = &'a PlayerSessionMetrics>,
{
    let records: Vec<&PlayerSessionMetrics> = records.into_iter().collect();
    let idx: Vec<f64> = records.iter().filter_map(|m| m.intensity_index).collect();
    let Some(cut) = quantile(&idx, HIGH_INTENSITY_QUANTILE) else {
        return Vec::new();
    };
    records
        .into_iter()
        .filter(|m| m.intensity_index.is_some_and(|i| i >= cut))
        .collect()
}

fn desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    // None sist
    match (a, b) {
        (Some(a), Some(b)) => OrderedFloat(b).cmp(&OrderedFloat(a)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sortert på indeks, høyest først. Likt → dato, så player_id.
pub fn rank_by_intensity<'a, I>(records: I) -> Vec<&'a PlayerSessionMetrics>
where
    I: IntoIterator<Item = &'a PlayerSessionMetrics>,
{
    let mut out: Vec<&PlayerSessionMetrics> = records.into_iter().collect();
    out.sort_by(|a, b| {
        desc(a.intensity_index, b.intensity_index)
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub player_id: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// Topplister for oversiktssiden.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    /// Høyest 10s-topp.
    pub most_explosive: Vec<Highlight>,
    /// Høyest snitt av 20s- og 30s-toppene.
    pub best_sustained: Vec<Highlight>,
    /// Høyest totalbelastning.
    pub biggest_workload: Vec<Highlight>,
}

fn top_by<F>(records: &[PlayerSessionMetrics], n: usize, metric: F) -> Vec<Highlight>
where
    F: Fn(&PlayerSessionMetrics) -> Option<f64>,
{
    let mut v: Vec<Highlight> = records
        .iter()
        .filter_map(|m| {
            metric(m).map(|value| Highlight {
                player_id: m.player_id.clone(),
                date: m.date,
                value,
            })
        })
        .collect();
    v.sort_by(|a, b| {
        desc(Some(a.value), Some(b.value))
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    v.truncate(n);
    v
}

pub fn highlights(records: &[PlayerSessionMetrics], top_n: usize) -> Highlights {
    Highlights {
        most_explosive: top_by(records, top_n, |m| m.sub_scores.explosiveness),
        best_sustained: top_by(records, top_n, |m| m.sub_scores.repeatability),
        biggest_workload: top_by(records, top_n, |m| m.total_load),
    }
}
