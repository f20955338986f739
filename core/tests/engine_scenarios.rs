mod common;

use common::*;
use mdp_intensity_core::team::team_z_score;
use mdp_intensity_core::*;

fn engine_report(samples: Vec<Sample>, cfg: &EngineConfig) -> AnalysisReport {
    let engine = IntensityEngine::new(cfg).unwrap();
    engine.analyze(&Dataset::new(samples)).unwrap()
}

/// Belastning: A 6000, B 5000, C 7000. A ligger midt i laget.
fn three_players() -> Vec<Sample> {
    let d = day(1);
    let mut s = full("A", d, &constant(100.0, 60));
    s.extend(full("B", d, &ramp(50.0, 150.0, 50)));
    s.extend(full("C", d, &burst(80.0, 300.0, 12, 10, 60)));
    s
}

#[test]
fn burst_player_tops_explosive_demand() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let report = engine_report(three_players(), &cfg);

    assert_eq!(report.source, IntensitySource::Composite);
    assert!(report.notices.is_empty(), "{:?}", report.notices);
    assert_eq!(report.sessions.len(), 1);

    let session = &report.sessions[0];
    let a = session.player("A").unwrap();
    let b = session.player("B").unwrap();
    let c = session.player("C").unwrap();

    let (a10, b10, c10) = (a.peak(10).unwrap(), b.peak(10).unwrap(), c.peak(10).unwrap());
    assert!((a10 - 100.0).abs() < 1e-9);
    assert!((c10 - 300.0).abs() < 1e-9);
    assert!(c10 > a10 && c10 > b10);

    // burst 12..22 → vinduet slutter på sekund 21
    let c_peak = c.peaks.iter().find(|p| p.window_secs == 10).unwrap();
    assert_eq!(c_peak.peak.timestamp, Some(at(day(1), 21)));

    assert_eq!(c.peak10_percentile, Some(100.0));
    assert_eq!(c.explosiveness_class, Some(ExplosivenessClass::VeryHigh));
    assert_eq!(c.intensity_percentile, Some(100.0));
    assert_eq!(c.category, Some(IntensityCategory::VeryHard));
    assert!(c.intensity_index.unwrap() > a.intensity_index.unwrap());
    assert!(c.intensity_index.unwrap() > b.intensity_index.unwrap());
    assert!(c.intensity_z.unwrap() > 0.0);

    let loads: Vec<f64> = session.players.iter().map(|m| m.total_load.unwrap()).collect();
    let a_load_z = team_z_score(a.total_load.unwrap(), &loads).unwrap();
    assert!(a_load_z.abs() < 1e-9, "A load z = {a_load_z}");
    assert!(a.sub_z.volume.unwrap().abs() < 1e-9);
    assert!(c.sub_z.volume.unwrap() > 1.0);

    let best = c.best_peak.unwrap();
    assert_eq!(best.window_secs, 5, "shorter window wins the tie at 300");
    assert!((best.value - 300.0).abs() < 1e-9);

    assert_eq!(b.phases.trend, Some(Trend::Increasing));
    assert_eq!(a.phases.trend, Some(Trend::Stable));
    assert_eq!(a.data_quality.samples, 60);
    assert_eq!(a.data_quality.coverage_pct, Some(100.0));
    assert!(a.has_peak_data && !a.passthrough);
}

#[test]
fn player_without_power_uses_intensity_as_demand() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let d = day(7);
    let mut s = full("a", d, &burst(100.0, 250.0, 10, 10, 60));
    s.extend((0..60).map(|i| Sample {
        timestamp: at(d, i),
        player_id: "b".into(),
        player_number: Some(9),
        speed: Some(if (20..30).contains(&i) { 8.0 } else { 3.0 }),
        acc: Some(if (20..30).contains(&i) { 2.0 } else { 0.1 }),
        hr: Some(140.0 + i as f64),
        mp: None,
    }));
    let report = engine_report(s, &cfg);

    assert_eq!(report.source, IntensitySource::Composite);
    assert_eq!(report.notices, vec![Notice::DemandFallback { player_id: "b".into(), date: d }]);

    let b = report.sessions[0].player("b").unwrap();
    assert!(b.has_peak_data);
    assert!(b.peak(10).is_some());
    assert!(b.total_load.is_some());
    assert!(b.intensity_index.is_some());
    assert!(b.intensity_percentile.is_some());

    // a har mp og beholder den som belastningssignal
    let a = report.sessions[0].player("a").unwrap();
    assert!((a.peak(10).unwrap() - 250.0).abs() < 1e-9);
}

#[test]
fn three_of_four_signals_still_composite() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let d = day(9);
    let samples: Vec<Sample> = full("p", d, &burst(100.0, 300.0, 5, 10, 40))
        .into_iter()
        .chain(full("q", d, &constant(150.0, 40)))
        .map(|mut x| {
            x.hr = None;
            x
        })
        .collect();
    let report = engine_report(samples, &cfg);

    assert_eq!(report.source, IntensitySource::Composite);
    assert!(report.notices.is_empty(), "{:?}", report.notices);
    let sigs: Vec<Signal> = report.available.iter().collect();
    assert_eq!(sigs, vec![Signal::Speed, Signal::Acc, Signal::Mp]);
    let p = report.sessions[0].player("p").unwrap();
    assert!(!p.passthrough);
    assert!(p.intensity_index.is_some());
}

#[test]
fn single_player_team_is_neutral() {
    let cfg = EngineConfig::from_preset(WeightPreset::Conditioning);
    let report = engine_report(full("solo", day(2), &ramp(80.0, 160.0, 45)), &cfg);
    let m = &report.sessions[0].players[0];

    assert_eq!(m.intensity_index, Some(0.0));
    assert_eq!(m.intensity_percentile, Some(100.0));
    assert_eq!(m.intensity_z, None);
    assert_eq!(m.category, Some(IntensityCategory::VeryHard));
}

#[test]
fn empty_session_has_all_fields_missing() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let engine = IntensityEngine::new(&cfg).unwrap();
    let session = Session::new("ghost", day(3), Vec::new());
    let m = engine.analyze_player_session(&session, &AvailableSignals::all()).unwrap();

    assert!(!m.has_peak_data);
    assert_eq!(m.best_peak, None);
    assert_eq!(m.total_load, None);
    assert_eq!(m.intensity_index, None);
    assert_eq!(m.intensity_percentile, None);
    assert_eq!(m.category, None);
    assert_eq!(m.data_quality.samples, 0);
    assert_eq!(m.data_quality.coverage_pct, None);
}

#[test]
fn empty_dataset_gives_notice_not_error() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let report = engine_report(Vec::new(), &cfg);
    assert!(report.sessions.is_empty());
    assert_eq!(report.notices, vec![Notice::EmptyDataset]);
}

#[test]
fn short_session_drops_long_windows_and_renormalizes() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let d = day(4);
    let mut s = full("short", d, &constant(120.0, 15));
    s.extend(full("long", d, &constant(90.0, 60)));
    let report = engine_report(s, &cfg);
    let m = report.sessions[0].player("short").unwrap();

    assert!(m.peak(5).is_some() && m.peak(10).is_some());
    assert_eq!(m.peak(20), None);
    assert_eq!(m.peak(30), None);
    assert_eq!(m.sub_scores.repeatability, None);
    assert!(m.intensity_index.is_some());
    assert!(m.has_peak_data);
}

#[test]
fn too_few_signals_falls_back_to_raw_signal() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let d = day(5);
    let samples: Vec<Sample> = (0..30)
        .map(|i| Sample {
            timestamp: at(d, i),
            player_id: "p".into(),
            player_number: None,
            speed: Some(if i < 10 { 7.0 } else { 3.0 }),
            acc: None,
            hr: None,
            mp: None,
        })
        .collect();
    let report = engine_report(samples, &cfg);

    assert_eq!(report.source, IntensitySource::Passthrough(Signal::Speed));
    assert_eq!(report.notices.len(), 1);
    match &report.notices[0] {
        Notice::MissingSignal { available, passthrough, required } => {
            assert_eq!(available, &vec![Signal::Speed]);
            assert_eq!(*passthrough, Some(Signal::Speed));
            assert_eq!(*required, 3);
        }
        other => panic!("unexpected notice {other:?}"),
    }

    let m = &report.sessions[0].players[0];
    assert!(m.passthrough);
    assert_eq!(m.peak(10), Some(7.0));
}

#[test]
fn history_builds_up_across_dates() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let mut s = Vec::new();
    for (i, d) in [1, 2, 3, 4].into_iter().enumerate() {
        let lift = 20.0 * i as f64;
        s.extend(full("a", day(d), &burst(100.0, 250.0 + lift, 5, 10, 60)));
        s.extend(full("b", day(d), &constant(120.0 + lift, 60)));
    }
    let report = engine_report(s, &cfg);
    assert_eq!(report.sessions.len(), 4);

    let a1 = report.session(day(1)).unwrap().player("a").unwrap();
    let a2 = report.session(day(2)).unwrap().player("a").unwrap();
    let a4 = report.session(day(4)).unwrap().player("a").unwrap();
    assert_eq!(a1.baseline, Some(BaselineComparison::Insufficient { sessions: 0 }));
    assert_eq!(a2.baseline, Some(BaselineComparison::Insufficient { sessions: 1 }));
    match a4.baseline {
        Some(BaselineComparison::Compared { sessions, percentile, .. }) => {
            assert_eq!(sessions, 3);
            assert!((0.0..=100.0).contains(&percentile));
        }
        other => panic!("expected comparison, got {other:?}"),
    }
}

#[test]
fn baseline_basis_falls_back_to_team_until_history_exists() {
    let mut cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    cfg.basis = ComparisonBasis::Baseline;
    let mut s = Vec::new();
    for d in [1, 2, 3, 4] {
        let bump = f64::from(d) * 10.0;
        s.extend(full("a", day(d), &burst(100.0, 200.0 + bump, 3, 10, 60)));
        s.extend(full("b", day(d), &ramp(60.0, 140.0 + bump, 60)));
    }
    let report = engine_report(s, &cfg);

    let fallbacks: Vec<_> = report
        .notices
        .iter()
        .filter_map(|n| match n {
            Notice::BaselineFallback { player_id, date } => Some((player_id.as_str(), *date)),
            _ => None,
        })
        .collect();
    assert_eq!(fallbacks, vec![("a", day(1)), ("b", day(1)), ("a", day(2)), ("b", day(2))]);

    // dag 4: egen historikk, og økende topper gir positiv z mot den
    let a4 = report.session(day(4)).unwrap().player("a").unwrap();
    assert!(a4.sub_z.explosiveness.unwrap() > 0.0);
}

#[test]
fn external_history_is_used_for_baseline() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let engine = IntensityEngine::new(&cfg).unwrap();
    let mut history = BaselineHistory::new();
    history.insert(
        "a".into(),
        [-1.0, -0.5, 0.0]
            .iter()
            .enumerate()
            .map(|(i, idx)| HistoryRecord {
                date: day(1 + i as u32),
                sub_scores: SubScores::default(),
                intensity_index: Some(*idx),
            })
            .collect(),
    );
    let mut s = full("a", day(10), &burst(100.0, 300.0, 5, 10, 60));
    s.extend(full("b", day(10), &constant(100.0, 60)));
    let report = engine.analyze_with_history(&Dataset::new(s), &history).unwrap();
    let a = report.sessions[0].player("a").unwrap();

    assert!(a.intensity_index.unwrap() > 0.0);
    assert_eq!(a.baseline.and_then(|b| b.percentile()), Some(100.0));
}

#[test]
fn invalid_config_is_the_only_hard_error() {
    let mut cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    cfg.windows_secs = vec![5, 20, 30];
    assert_eq!(
        IntensityEngine::new(&cfg).err(),
        Some(ConfigError::UnknownSubScoreWindow(10))
    );
    assert!(IntensityWeights::new(0.3, f64::NAN, 0.2).is_err());
    assert!(IntensityWeights::new(0.3, 1.2, 0.2).is_err());
}

#[test]
fn analysis_is_deterministic() {
    let cfg = EngineConfig::from_preset(WeightPreset::SpeedEmphasis);
    let a = serde_json::to_string(&engine_report(three_players(), &cfg)).unwrap();
    let b = serde_json::to_string(&engine_report(three_players(), &cfg)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn telemetry_counts_sessions() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let metrics = EngineMetrics::new().unwrap();
    let engine = IntensityEngine::new(&cfg).unwrap().with_metrics(&metrics);

    let d = day(6);
    let mut s = full("x", d, &constant(100.0, 15));
    s.extend(full("y", d, &constant(110.0, 60)));
    engine.analyze(&Dataset::new(s)).unwrap();

    assert_eq!(metrics.sessions_analyzed().get(), 2);
    // x er for kort for 20s og 30s
    assert_eq!(metrics.insufficient_windows().get(), 2);
    assert_eq!(metrics.passthrough_fallbacks().get(), 0);
    let text = metrics.render().unwrap();
    assert!(text.contains("intensity_sessions_analyzed_total 2"), "{text}");
}

#[test]
fn timeline_and_team_average() {
    let cfg = EngineConfig::from_preset(WeightPreset::MatchLike);
    let engine = IntensityEngine::new(&cfg).unwrap();
    let ds = Dataset::new(three_players());
    let team = ds.sessions().remove(&day(1)).unwrap();

    let tl = engine.timeline(&team[0], ds.available()).unwrap();
    assert_eq!(tl.intensity.len(), 60);
    assert_eq!(tl.windows.len(), 4);
    assert_eq!(tl.windows[0].window_secs, 5);
    assert!(tl.windows[0].values[..4].iter().all(Option::is_none));
    assert!(tl.windows[0].values[4].is_some());

    let avg = engine.team_average(&team, ds.available());
    assert_eq!(avg.len(), 60);
}
