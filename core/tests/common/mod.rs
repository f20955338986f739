#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use mdp_intensity_core::Sample;

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

pub fn at(date: NaiveDate, sec: i64) -> NaiveDateTime {
    date.and_hms_opt(10, 0, 0).unwrap() + Duration::seconds(sec)
}

/// 1 Hz, bare metabolsk effekt.
pub fn mp_only(player: &str, date: NaiveDate, mp: &[f64]) -> Vec<Sample> {
    mp.iter()
        .enumerate()
        .map(|(i, v)| Sample {
            timestamp: at(date, i as i64),
            player_id: player.to_string(),
            player_number: None,
            speed: None,
            acc: None,
            hr: None,
            mp: Some(*v),
        })
        .collect()
}

/// 1 Hz med alle fire signaler; fart/akselerasjon/puls følger mp.
pub fn full(player: &str, date: NaiveDate, mp: &[f64]) -> Vec<Sample> {
    mp.iter()
        .enumerate()
        .map(|(i, v)| Sample {
            timestamp: at(date, i as i64),
            player_id: player.to_string(),
            player_number: Some(7),
            speed: Some(v / 40.0),
            acc: Some((v - 100.0) / 100.0),
            hr: Some(120.0 + v / 5.0),
            mp: Some(*v),
        })
        .collect()
}

pub fn constant(v: f64, n: usize) -> Vec<f64> {
    vec![v; n]
}

pub fn ramp(from: f64, to: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| from + (to - from) * i as f64 / (n - 1) as f64)
        .collect()
}

/// Konstant `base`, med `peak` fra og med `start` i `len` sekunder.
pub fn burst(base: f64, peak: f64, start: usize, len: usize, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| if i >= start && i < start + len { peak } else { base })
        .collect()
}
