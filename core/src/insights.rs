use crate::baseline::BaselineComparison;
use crate::config::EngineConfig;
use crate::display::{ordinal_suffix, window_label};
use crate::types::{ExplosivenessClass, IntensityCategory, PhaseBreakdown, PlayerSessionMetrics, Trend};

const HIGH_PERCENTILE: f64 = 85.0;
const LOW_PERCENTILE: f64 = 25.0;
const Z_HARD: f64 = 1.0;
const Z_LIGHT: f64 = -1.0;

/// Persentil → kategori. Nedre grense inkludert, øvre ekskludert:
/// <25 Easy, [25,60) Medium, [60,85) Hard, ≥85 Very Hard.
pub fn classify(percentile: f64) -> IntensityCategory {
    if percentile < 25.0 {
        IntensityCategory::Easy
    } else if percentile < 60.0 {
        IntensityCategory::Medium
    } else if percentile < 85.0 {
        IntensityCategory::Hard
    } else {
        IntensityCategory::VeryHard
    }
}

/// Samme grenser som `classify`, brukt på persentilen til 10s-toppen.
pub fn classify_explosiveness(percentile: f64) -> ExplosivenessClass {
    match classify(percentile) {
        IntensityCategory::Easy => ExplosivenessClass::Low,
        IntensityCategory::Medium => ExplosivenessClass::Moderate,
        IntensityCategory::Hard => ExplosivenessClass::High,
        IntensityCategory::VeryHard => ExplosivenessClass::VeryHigh,
    }
}

/// >+terskel = økende, <-terskel = synkende, ellers stabil.
pub fn classify_trend(trend_pct: f64, threshold_pct: f64) -> Trend {
    if trend_pct > threshold_pct {
        Trend::Increasing
    } else if trend_pct < -threshold_pct {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

fn mean_defined(xs: &[Option<f64>]) -> Option<f64> {
    let v: Vec<f64> = xs.iter().flatten().copied().collect();
    if v.is_empty() {
        None
    } else {
        Some(v.iter().sum::<f64>() / v.len() as f64)
    }
}

/// Del serien i tre like deler og sammenlign første og siste tredjedel.
pub fn phase_breakdown(series: &[Option<f64>], threshold_pct: f64) -> PhaseBreakdown {
    let n = series.len();
    if n < 3 {
        return PhaseBreakdown::default();
    }
    let a = n / 3;
    let b = 2 * n / 3;
    let early = mean_defined(&series[..a]);
    let mid = mean_defined(&series[a..b]);
    let late = mean_defined(&series[b..]);

    let trend_pct = match (early, late) {
        (Some(e), Some(l)) if e > 0.0 => Some((l - e) / e * 100.0),
        _ => None,
    };
    PhaseBreakdown {
        early,
        mid,
        late,
        trend_pct,
        trend: trend_pct.map(|p| classify_trend(p, threshold_pct)),
    }
}

/// Terskler for tekstinnsikter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsightConfig {
    pub explosiveness_window_secs: u32,
    pub baseline_days: u32,
    pub coverage_warning_pct: f64,
}

impl From<&EngineConfig> for InsightConfig {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            explosiveness_window_secs: cfg.explosiveness_window_secs,
            baseline_days: cfg.baseline_days,
            coverage_warning_pct: cfg.coverage_warning_pct,
        }
    }
}

/// Deterministisk tekst fra et metrics-record. Feiler aldri; manglende
/// felt gir bare færre innsikter.
#[derive(Debug, Clone, Copy)]
pub struct InsightGenerator {
    config: InsightConfig,
}

impl InsightGenerator {
    pub fn new(config: InsightConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, m: &PlayerSessionMetrics) -> Vec<String> {
        let mut out = Vec::new();

        if let Some(p) = m.intensity_percentile {
            out.push(format!(
                "{} session: {} percentile intensity vs team.",
                classify(p).label(),
                ordinal_suffix(p)
            ));
        }

        if let Some(z) = m.intensity_z {
            if z >= Z_HARD {
                out.push(format!("Intensity well above team average (z = {z:+.2})."));
            } else if z <= Z_LIGHT {
                out.push(format!(
                    "Intensity well below team average (z = {z:+.2}), consistent with a light or recovery session."
                ));
            }
        }

        if let Some(p) = m.peak10_percentile {
            let w = self.config.explosiveness_window_secs;
            if p >= HIGH_PERCENTILE {
                out.push(format!(
                    "Top explosive output: peak {w}s demand in the {} percentile.",
                    ordinal_suffix(p)
                ));
            } else if p < LOW_PERCENTILE {
                out.push(format!(
                    "Explosive output was low: peak {w}s demand in the {} percentile.",
                    ordinal_suffix(p)
                ));
            }
        }

        if let Some(p) = m.total_load_percentile {
            if p >= HIGH_PERCENTILE {
                out.push(format!("High session volume: total load in the {} percentile.", ordinal_suffix(p)));
            } else if p < LOW_PERCENTILE {
                out.push(format!("Low session volume: total load in the {} percentile.", ordinal_suffix(p)));
            }
        }

        if let (Some(trend), Some(pct)) = (m.phases.trend, m.phases.trend_pct) {
            out.push(match trend {
                Trend::Increasing => format!("Intensity increased from early to late session ({pct:+.1}%)."),
                Trend::Decreasing => {
                    format!("Intensity dropped from early to late session ({pct:+.1}%); check for fatigue.")
                }
                Trend::Stable => format!("Intensity stayed stable through the session (±{:.1}%).", pct.abs()),
            });
        }

        if let Some(best) = m.best_peak {
            out.push(format!(
                "Highest demand came in the {} window ({:.1}).",
                window_label(best.window_secs),
                best.value
            ));
        }

        let days = self.config.baseline_days;
        match m.baseline {
            Some(BaselineComparison::Compared { percentile, .. }) => {
                let ord = ordinal_suffix(percentile);
                out.push(if percentile >= HIGH_PERCENTILE {
                    format!("Well above own {days}-day baseline ({ord} percentile).")
                } else if percentile < LOW_PERCENTILE {
                    format!("Below own {days}-day baseline ({ord} percentile).")
                } else {
                    format!("In line with own {days}-day baseline ({ord} percentile).")
                });
            }
            Some(BaselineComparison::Insufficient { sessions }) => {
                out.push(format!(
                    "Insufficient baseline data: {sessions} session(s) in the last {days} days."
                ));
            }
            None => {}
        }

        if let Some(c) = m.data_quality.coverage_pct {
            if c < self.config.coverage_warning_pct {
                out.push(format!("Data coverage was {c:.0}%; interpret peaks with caution."));
            }
        }

        if m.passthrough {
            out.push("Intensity is based on a single raw signal; not all sensor columns were available.".to_string());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BestPeak, DataQuality};
    use chrono::NaiveDate;

    #[test]
    fn classification_is_exhaustive_on_grid() {
        let mut p = 0.0;
        while p <= 100.0 {
            // hver verdi får nøyaktig én kategori, og rekkefølgen er monoton
            let c = classify(p);
            let expected = if p < 25.0 {
                IntensityCategory::Easy
            } else if p < 60.0 {
                IntensityCategory::Medium
            } else if p < 85.0 {
                IntensityCategory::Hard
            } else {
                IntensityCategory::VeryHard
            };
            assert_eq!(c, expected, "p={p}");
            p += 0.25;
        }
    }

    fn generator() -> InsightGenerator {
        InsightGenerator::new(InsightConfig {
            explosiveness_window_secs: 10,
            baseline_days: 28,
            coverage_warning_pct: 80.0,
        })
    }

    fn blank() -> PlayerSessionMetrics {
        PlayerSessionMetrics::empty("p", Some(4), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
    }

    fn compared(percentile: f64) -> Option<BaselineComparison> {
        Some(BaselineComparison::Compared { sessions: 4, percentile, z_score: 0.0, mean: 0.0 })
    }

    #[test]
    fn empty_record_gives_no_insights() {
        assert!(generator().generate(&blank()).is_empty());
    }

    #[test]
    fn every_rule_fires_in_fixed_order() {
        let mut m = blank();
        m.intensity_percentile = Some(90.0);
        m.intensity_z = Some(1.5);
        m.peak10_percentile = Some(95.0);
        m.total_load_percentile = Some(10.0);
        m.phases = PhaseBreakdown {
            early: Some(100.0),
            mid: Some(95.0),
            late: Some(88.0),
            trend_pct: Some(-12.0),
            trend: Some(Trend::Decreasing),
        };
        m.best_peak = Some(BestPeak { value: 310.0, window_secs: 10, timestamp: None });
        m.baseline = compared(90.0);
        m.data_quality = DataQuality { samples: 50, coverage_pct: Some(60.0) };
        m.passthrough = true;

        let g = generator();
        let out = g.generate(&m);
        assert_eq!(
            out,
            vec![
                "Very Hard session: 90th percentile intensity vs team.",
                "Intensity well above team average (z = +1.50).",
                "Top explosive output: peak 10s demand in the 95th percentile.",
                "Low session volume: total load in the 10th percentile.",
                "Intensity dropped from early to late session (-12.0%); check for fatigue.",
                "Highest demand came in the Burst (10s) window (310.0).",
                "Well above own 28-day baseline (90th percentile).",
                "Data coverage was 60%; interpret peaks with caution.",
                "Intensity is based on a single raw signal; not all sensor columns were available.",
            ]
        );
        assert_eq!(g.generate(&m), out);
    }

    #[test]
    fn baseline_text_follows_percentile_bands() {
        let g = generator();
        let line = |b| {
            let mut m = blank();
            m.baseline = b;
            g.generate(&m)
        };
        assert_eq!(line(compared(85.0)), vec!["Well above own 28-day baseline (85th percentile)."]);
        assert!(line(compared(84.9))[0].starts_with("In line with own 28-day baseline"));
        assert_eq!(line(compared(25.0)), vec!["In line with own 28-day baseline (25th percentile)."]);
        assert_eq!(line(compared(24.9))[0], "Below own 28-day baseline (25th percentile).");
        assert_eq!(
            line(Some(BaselineComparison::Insufficient { sessions: 1 })),
            vec!["Insufficient baseline data: 1 session(s) in the last 28 days."]
        );
    }

    #[test]
    fn coverage_warning_is_strictly_below_threshold() {
        let g = generator();
        let mut m = blank();
        m.data_quality = DataQuality { samples: 80, coverage_pct: Some(80.0) };
        assert!(g.generate(&m).is_empty());
        m.data_quality.coverage_pct = Some(79.9);
        assert_eq!(g.generate(&m), vec!["Data coverage was 80%; interpret peaks with caution."]);
    }

    #[test]
    fn phases_need_three_samples() {
        assert_eq!(phase_breakdown(&[Some(1.0), Some(2.0)], 5.0), PhaseBreakdown::default());
    }

    #[test]
    fn ramp_is_increasing() {
        let s: Vec<Option<f64>> = (0..30).map(|i| Some(50.0 + i as f64)).collect();
        let ph = phase_breakdown(&s, 5.0);
        assert_eq!(ph.trend, Some(Trend::Increasing));
        assert!(ph.early.unwrap() < ph.mid.unwrap() && ph.mid.unwrap() < ph.late.unwrap());
    }

    #[test]
    fn trend_threshold_is_exclusive() {
        assert_eq!(classify_trend(5.0, 5.0), Trend::Stable);
        assert_eq!(classify_trend(5.01, 5.0), Trend::Increasing);
        assert_eq!(classify_trend(-5.0, 5.0), Trend::Stable);
        assert_eq!(classify_trend(-5.01, 5.0), Trend::Decreasing);
    }
}
