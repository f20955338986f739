use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;

use crate::baseline::BaselineComparison;
use crate::types::PlayerSessionMetrics;

/// Trenervennlige navn på vinduslengder.
static WINDOW_LABELS: Lazy<BTreeMap<u32, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        (5, "Burst (5s)"),
        (10, "Burst (10s)"),
        (20, "Short press (20s)"),
        (30, "Extended press (30s)"),
        (60, "Sustained phase (60s)"),
        (180, "Long phase (180s)"),
    ])
});

pub fn window_label(window_secs: u32) -> String {
    WINDOW_LABELS
        .get(&window_secs)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{window_secs}s window"))
}

/// Intern nøkkel for en rullende intensitetsserie, f.eks. `intensity_10s`.
pub fn window_key(window_secs: u32) -> String {
    format!("intensity_{window_secs}s")
}

pub fn window_secs_from_key(key: &str) -> Option<u32> {
    key.strip_prefix("intensity_")?.strip_suffix('s')?.parse().ok()
}

pub fn window_secs_from_label(label: &str) -> Option<u32> {
    WINDOW_LABELS
        .iter()
        .find(|(_, l)| **l == label)
        .map(|(w, _)| *w)
}

/// 1 → "1st", 12 → "12th", 23 → "23rd". Persentilen avrundes først.
pub fn ordinal_suffix(value: f64) -> String {
    let n = value.round().max(0.0) as u64;
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

pub fn format_percentile(p: Option<f64>) -> String {
    match p {
        Some(p) => format!("{} percentile", ordinal_suffix(p)),
        None => "N/A".to_string(),
    }
}

pub fn format_z_score(z: Option<f64>) -> String {
    match z {
        Some(z) => format!("{z:+.2}"),
        None => "N/A".to_string(),
    }
}

pub fn format_mdp(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "N/A".to_string(),
    }
}

/// Stabil visningsnavn-mapping: sorterte player_id → "Player 01", "Player 02", ...
pub fn player_display_map<'a, I>(player_ids: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ids: Vec<&str> = player_ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids.into_iter()
        .enumerate()
        .map(|(i, id)| (id.to_string(), format!("Player {:02}", i + 1)))
        .collect()
}

/// "Player 01" + 2025-12-11 → "Player01_event_12-11-2025".
pub fn event_display(player_display: &str, date: NaiveDate) -> String {
    let compact: String = player_display.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{compact}_event_{}", date.format("%m-%d-%Y"))
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Flat kolonne/verdi-rad for tabelleksport (CSV). Tom streng = null.
pub fn export_row(m: &PlayerSessionMetrics) -> Vec<(String, String)> {
    let mut row = vec![
        ("player_id".to_string(), m.player_id.clone()),
        (
            "player_number".to_string(),
            m.player_number.map(|n| n.to_string()).unwrap_or_default(),
        ),
        ("date".to_string(), m.date.to_string()),
        ("session_duration_s".to_string(), opt(m.duration_s)),
        ("mean_mp".to_string(), opt(m.mean_power)),
    ];
    for p in &m.peaks {
        row.push((format!("mdp_{}", p.window_secs), opt(p.peak.value)));
    }
    row.extend([
        ("mdp_peak_value".to_string(), opt(m.best_peak.map(|b| b.value))),
        (
            "mdp_peak_window".to_string(),
            m.best_peak
                .map(|b| format!("{}s", b.window_secs))
                .unwrap_or_default(),
        ),
        ("total_mp_load".to_string(), opt(m.total_load)),
        ("explosiveness".to_string(), opt(m.sub_scores.explosiveness)),
        ("repeatability".to_string(), opt(m.sub_scores.repeatability)),
        ("volume".to_string(), opt(m.sub_scores.volume)),
        ("explosiveness_z".to_string(), opt(m.sub_z.explosiveness)),
        ("repeatability_z".to_string(), opt(m.sub_z.repeatability)),
        ("volume_z".to_string(), opt(m.sub_z.volume)),
        ("session_intensity_index".to_string(), opt(m.intensity_index)),
        ("intensity_percentile".to_string(), opt(m.intensity_percentile)),
        ("z_intensity".to_string(), opt(m.intensity_z)),
        ("peak10_percentile".to_string(), opt(m.peak10_percentile)),
        ("total_load_percentile".to_string(), opt(m.total_load_percentile)),
        (
            "intensity_category".to_string(),
            m.category.map(|c| c.label().to_string()).unwrap_or_default(),
        ),
        (
            "explosiveness_class".to_string(),
            m.explosiveness_class
                .map(|c| c.label().to_string())
                .unwrap_or_default(),
        ),
        ("early_mp".to_string(), opt(m.phases.early)),
        ("mid_mp".to_string(), opt(m.phases.mid)),
        ("late_mp".to_string(), opt(m.phases.late)),
        ("trend_pct".to_string(), opt(m.phases.trend_pct)),
        (
            "baseline_intensity_percentile".to_string(),
            opt(m.baseline.as_ref().and_then(BaselineComparison::percentile)),
        ),
        ("samples".to_string(), m.data_quality.samples.to_string()),
        ("coverage_pct".to_string(), opt(m.data_quality.coverage_pct)),
        ("has_peak_data".to_string(), m.has_peak_data.to_string()),
    ]);
    row
}
