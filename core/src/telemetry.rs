use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::error::Result;

/// Prometheus-tellere for motoren. Eies av kalleren og sendes inn
/// eksplisitt; motoren har ingen global tilstand.
#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    sessions_analyzed: IntCounter,
    passthrough_fallbacks: IntCounter,
    insufficient_windows: IntCounter,
    empty_sessions: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let c = IntCounter::new(name, help)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl EngineMetrics {
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Registrer tellerne i et eksisterende register (f.eks. appens).
    pub fn with_registry(registry: Registry) -> Result<Self> {
        Ok(Self {
            sessions_analyzed: counter(
                &registry,
                "intensity_sessions_analyzed_total",
                "Player sessions run through the intensity engine",
            )?,
            passthrough_fallbacks: counter(
                &registry,
                "intensity_passthrough_fallback_total",
                "Datasets analyzed with raw pass-through intensity",
            )?,
            insufficient_windows: counter(
                &registry,
                "intensity_insufficient_window_total",
                "Window lengths with no MDP because the session was too short",
            )?,
            empty_sessions: counter(
                &registry,
                "intensity_empty_sessions_total",
                "Player sessions without any usable samples",
            )?,
            registry,
        })
    }

    pub fn sessions_analyzed(&self) -> &IntCounter {
        &self.sessions_analyzed
    }

    pub fn passthrough_fallbacks(&self) -> &IntCounter {
        &self.passthrough_fallbacks
    }

    pub fn insufficient_windows(&self) -> &IntCounter {
        &self.insufficient_windows
    }

    pub fn empty_sessions(&self) -> &IntCounter {
        &self.empty_sessions
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Tekstformat for /metrics-endepunkt hos kalleren.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
