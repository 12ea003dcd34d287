//! Configuration — immutable parameter sets handed to the generator and
//! detectors at construction time.
//!
//! Every section has working defaults, so a config file only needs to list
//! the values it overrides. Configs can be loaded from TOML (native tools)
//! or JSON (the browser side passes a JSON string through WASM).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sequence::pattern::PatternKind;

/// Top-level configuration grouping every component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToyConfig {
    pub generator: GeneratorConfig,
    pub beat: BeatConfig,
    pub tempo: TempoConfig,
    pub pitch: PitchConfig,
}

impl ToyConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: ToyConfig = toml::from_str(source)?;
        config.validate()?;
        log::debug!("Loaded TOML config: {config:?}");
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: ToyConfig = serde_json::from_str(source)?;
        config.validate()?;
        log::debug!("Loaded JSON config: {config:?}");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generator.validate()?;
        self.beat.validate()?;
        self.tempo.validate()?;
        self.pitch.validate()
    }
}

// ── Generator ───────────────────────────────────────────────

/// A fixed bonus added to the hash when `keyword` occurs in the
/// normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordBonus {
    pub keyword: String,
    pub bonus: u32,
}

impl KeywordBonus {
    pub fn new(keyword: &str, bonus: u32) -> Self {
        KeywordBonus {
            keyword: keyword.to_string(),
            bonus,
        }
    }
}

/// Per-pattern timing tables. A pattern without a table falls back to its
/// arithmetic timing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingTables {
    pub steady: Option<Vec<f64>>,
    pub crescendo: Option<Vec<f64>>,
    pub call_and_response: Option<Vec<f64>>,
    pub scattered: Option<Vec<f64>>,
}

impl TimingTables {
    /// Tables with no entries at all; every pattern uses its rule.
    pub fn empty() -> Self {
        TimingTables {
            steady: None,
            crescendo: None,
            call_and_response: None,
            scattered: None,
        }
    }

    pub fn get(&self, kind: PatternKind) -> Option<&[f64]> {
        let table = match kind {
            PatternKind::Steady => &self.steady,
            PatternKind::Crescendo => &self.crescendo,
            PatternKind::CallAndResponse => &self.call_and_response,
            PatternKind::Scattered => &self.scattered,
        };
        table.as_deref()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for kind in PatternKind::ALL {
            if let Some(table) = self.get(kind) {
                if table.is_empty() {
                    return Err(ConfigError::invalid(
                        "generator.timing_tables",
                        format!("table for {kind:?} is empty"),
                    ));
                }
                if let Some(bad) = table.iter().find(|t| !t.is_finite() || **t <= 0.0) {
                    return Err(ConfigError::invalid(
                        "generator.timing_tables",
                        format!("table for {kind:?} has non-positive entry {bad}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for TimingTables {
    fn default() -> Self {
        TimingTables {
            steady: Some(vec![1.0]),
            crescendo: None,
            call_and_response: None,
            scattered: Some(vec![0.6, 1.4, 0.8, 1.2, 1.0]),
        }
    }
}

/// Parameters of the text-to-sequence generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Exclusive upper bound of every hash.
    pub max_hash: u32,
    /// Number of events produced per sequence.
    pub sequence_length: usize,
    /// Number of distinct actors (soundboard voices) events can address.
    pub actor_count: u32,
    pub keywords: Vec<KeywordBonus>,
    pub timing_tables: TimingTables,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            max_hash: 10_000,
            sequence_length: 8,
            actor_count: 5,
            keywords: vec![
                KeywordBonus::new("pourquoi", 137),
                KeywordBonus::new("comment", 89),
                KeywordBonus::new("president", 251),
                KeywordBonus::new("reponse", 173),
                KeywordBonus::new("question", 59),
                KeywordBonus::new("merci", 31),
            ],
            timing_tables: TimingTables::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hash == 0 {
            return Err(ConfigError::invalid("generator.max_hash", "must be > 0"));
        }
        if self.sequence_length == 0 {
            return Err(ConfigError::invalid(
                "generator.sequence_length",
                "must be > 0",
            ));
        }
        if self.actor_count == 0 {
            return Err(ConfigError::invalid("generator.actor_count", "must be > 0"));
        }
        if self.keywords.iter().any(|k| k.keyword.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "generator.keywords",
                "keywords must not be empty",
            ));
        }
        self.timing_tables.validate()
    }
}

// ── Beat detection ──────────────────────────────────────────

/// Parameters of the energy beat detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// Rolling energy history length, in ticks.
    pub history_capacity: usize,
    /// Number of recent beat timestamps kept for tempo estimation.
    pub beat_history_capacity: usize,
    /// Standard deviations above the local mean a beat must reach.
    pub sensitivity: f64,
    /// Absolute floor below which no beat is ever accepted.
    pub static_threshold: f64,
    /// Refractory interval between two beats (250ms caps at 240 BPM).
    pub min_beat_interval_ms: f64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        BeatConfig {
            history_capacity: 43,
            beat_history_capacity: 24,
            sensitivity: 1.5,
            static_threshold: 0.3,
            min_beat_interval_ms: 250.0,
        }
    }
}

impl BeatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity < 3 {
            return Err(ConfigError::invalid("beat.history_capacity", "must be >= 3"));
        }
        if self.beat_history_capacity < 2 {
            return Err(ConfigError::invalid(
                "beat.beat_history_capacity",
                "must be >= 2",
            ));
        }
        if !self.sensitivity.is_finite() || self.sensitivity < 0.0 {
            return Err(ConfigError::invalid("beat.sensitivity", "must be >= 0"));
        }
        if !(0.0..1.0).contains(&self.static_threshold) {
            return Err(ConfigError::invalid(
                "beat.static_threshold",
                "must be in [0, 1)",
            ));
        }
        if !self.min_beat_interval_ms.is_finite() || self.min_beat_interval_ms < 0.0 {
            return Err(ConfigError::invalid(
                "beat.min_beat_interval_ms",
                "must be >= 0",
            ));
        }
        Ok(())
    }
}

// ── Tempo estimation ────────────────────────────────────────

/// Parameters of the tempo tracker. The defaults are empirically tuned
/// for pop/dance material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Beats required before a tempo is computed.
    pub min_beats: usize,
    /// Instantaneous tempos outside `[min_bpm, max_bpm]` are outliers.
    pub min_bpm: f64,
    pub max_bpm: f64,
    /// Below this difference the prior dominates the blend.
    pub fine_threshold_bpm: f64,
    /// Below this difference prior and candidate are blended evenly.
    /// At or above it the candidate is adopted directly.
    pub coarse_threshold_bpm: f64,
    /// Weight of the prior for small differences.
    pub fine_prior_weight: f64,
    /// Weight of the prior for medium differences.
    pub coarse_prior_weight: f64,
}

impl Default for TempoConfig {
    fn default() -> Self {
        TempoConfig {
            min_beats: 4,
            min_bpm: 60.0,
            max_bpm: 200.0,
            fine_threshold_bpm: 10.0,
            coarse_threshold_bpm: 20.0,
            fine_prior_weight: 0.7,
            coarse_prior_weight: 0.5,
        }
    }
}

impl TempoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_beats < 2 {
            return Err(ConfigError::invalid("tempo.min_beats", "must be >= 2"));
        }
        if !(self.min_bpm > 0.0 && self.min_bpm < self.max_bpm && self.max_bpm.is_finite()) {
            return Err(ConfigError::invalid(
                "tempo.min_bpm",
                format!(
                    "bpm range [{}, {}] must be positive and ordered",
                    self.min_bpm, self.max_bpm
                ),
            ));
        }
        if !(self.fine_threshold_bpm >= 0.0 && self.fine_threshold_bpm <= self.coarse_threshold_bpm)
        {
            return Err(ConfigError::invalid(
                "tempo.fine_threshold_bpm",
                "must be >= 0 and <= coarse_threshold_bpm",
            ));
        }
        for (field, weight) in [
            ("tempo.fine_prior_weight", self.fine_prior_weight),
            ("tempo.coarse_prior_weight", self.coarse_prior_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::invalid(field, "must be in [0, 1]"));
            }
        }
        Ok(())
    }
}

// ── Pitch detection ─────────────────────────────────────────

/// Parameters of the autocorrelation pitch detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Lowest frequency searched (sets the largest lag).
    pub min_freq: f64,
    /// Highest frequency searched (sets the smallest lag).
    pub max_freq: f64,
    /// Refined frequencies outside `[accept_min_freq, accept_max_freq]`
    /// are reported as "no pitch".
    pub accept_min_freq: f64,
    pub accept_max_freq: f64,
    /// Reference frequency of A4.
    pub reference_a4: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        PitchConfig {
            min_freq: 50.0,
            max_freq: 1000.0,
            accept_min_freq: 50.0,
            accept_max_freq: 2000.0,
            reference_a4: 440.0,
        }
    }
}

impl PitchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_freq > 0.0 && self.min_freq < self.max_freq && self.max_freq.is_finite()) {
            return Err(ConfigError::invalid(
                "pitch.min_freq",
                format!(
                    "search range [{}, {}] must be positive and ordered",
                    self.min_freq, self.max_freq
                ),
            ));
        }
        if !(self.accept_min_freq >= 0.0
            && self.accept_min_freq < self.accept_max_freq
            && self.accept_max_freq.is_finite())
        {
            return Err(ConfigError::invalid(
                "pitch.accept_min_freq",
                "accept range must be ordered",
            ));
        }
        if !(self.reference_a4.is_finite() && self.reference_a4 > 0.0) {
            return Err(ConfigError::invalid("pitch.reference_a4", "must be > 0"));
        }
        Ok(())
    }
}
