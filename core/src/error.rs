use thiserror::Error;

/// Strukturelt ugyldig konfigurasjon. Dette er den eneste feilklassen som
/// skal nå kalleren; datakvalitet (manglende signal, for kort økt osv.)
/// representeres som `None`/flagg i resultatet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("weight `{name}` must be finite, got {value}")]
    NonFiniteWeight { name: &'static str, value: f64 },

    #[error("weight `{name}` must be within [0, 1], got {value}")]
    WeightOutOfRange { name: &'static str, value: f64 },

    #[error("sample rate must be a positive finite number of Hz, got {0}")]
    InvalidSampleRate(f64),

    #[error("window length must be at least one second")]
    ZeroWindow,

    #[error("at least one window length must be configured")]
    NoWindows,

    #[error("sub-score window {0}s is not among the configured windows")]
    UnknownSubScoreWindow(u32),

    #[error("baseline window must cover at least one day")]
    ZeroBaselineDays,

    #[error("baseline window of {0} days is too long (max {max})", max = crate::config::MAX_BASELINE_DAYS)]
    BaselineDaysTooLarge(u32),

    #[error("minimum signal count must be within 1..=4, got {0}")]
    InvalidMinSignals(usize),

    #[error("threshold `{name}` must be finite and non-negative, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Feil fra JSON-grensesnittet og oppsett rundt motoren.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Parse-feil med sti til feltet som feilet (serde_path_to_error).
    #[error("{what} parse at {path}: {message}")]
    Parse {
        what: &'static str,
        path: String,
        message: String,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("telemetry registration failed: {0}")]
    Telemetry(#[from] prometheus::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
