//! Beat Detector — dynamic-threshold peak picking over a stream of
//! energy frames.
//!
//! Each tick absorbs one energy value into a rolling history, derives a
//! threshold from the history's mean and spread, and accepts a beat when
//! the new value clears that threshold, is a local peak, and falls outside
//! the refractory interval of the previous beat. Accepted beats feed the
//! tempo tracker.

use std::collections::VecDeque;

use serde::Serialize;

use crate::config::{BeatConfig, TempoConfig};
use crate::error::ConfigError;

use super::tempo::{TempoEstimate, TempoTracker};

/// A detected beat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatEvent {
    pub timestamp_ms: f64,
    /// How far the energy cleared the threshold, in [0, 1].
    pub confidence: f64,
}

/// Energy beat detector with tempo tracking.
///
/// Owned by exactly one tick loop; every call mutates its histories.
#[derive(Debug, Clone)]
pub struct BeatDetector {
    config: BeatConfig,
    energy_history: VecDeque<f64>,
    beat_times: VecDeque<f64>,
    last_beat_ms: Option<f64>,
    tempo: TempoTracker,
}

impl BeatDetector {
    pub fn new(config: BeatConfig, tempo: TempoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.beat_history_capacity < tempo.min_beats {
            return Err(ConfigError::invalid(
                "beat.beat_history_capacity",
                format!("must hold at least tempo.min_beats ({})", tempo.min_beats),
            ));
        }
        let tempo = TempoTracker::new(tempo)?;
        Ok(Self::from_validated(config, tempo))
    }

    fn from_validated(config: BeatConfig, tempo: TempoTracker) -> Self {
        log::debug!(
            "BeatDetector created: history={}, sensitivity={}, static_threshold={}, min_interval={}ms",
            config.history_capacity,
            config.sensitivity,
            config.static_threshold,
            config.min_beat_interval_ms
        );
        BeatDetector {
            energy_history: VecDeque::with_capacity(config.history_capacity + 1),
            beat_times: VecDeque::with_capacity(config.beat_history_capacity + 1),
            last_beat_ms: None,
            tempo,
            config,
        }
    }

    pub fn config(&self) -> &BeatConfig {
        &self.config
    }

    /// Feed one energy frame. Returns the beat if this tick produced one.
    ///
    /// Energy is clamped to [0, 1]; non-finite values count as silence.
    pub fn on_energy_tick(&mut self, energy: f64, timestamp_ms: f64) -> Option<BeatEvent> {
        let energy = if energy.is_finite() {
            energy.clamp(0.0, 1.0)
        } else {
            0.0
        };

        // SAMPLE
        self.energy_history.push_back(energy);
        if self.energy_history.len() > self.config.history_capacity {
            self.energy_history.pop_front();
        }

        // EVALUATE
        let n = self.energy_history.len();
        let mean = self.energy_history.iter().sum::<f64>() / n as f64;
        let variance = self
            .energy_history
            .iter()
            .map(|e| (e - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        let dynamic_threshold = mean + variance.sqrt() * self.config.sensitivity;
        let threshold = dynamic_threshold.max(self.config.static_threshold);

        if energy <= threshold {
            return None;
        }

        if let Some(last) = self.last_beat_ms {
            if timestamp_ms - last <= self.config.min_beat_interval_ms {
                return None;
            }
        }

        // Strict peak against the two ticks before this one.
        if n < 3 {
            return None;
        }
        let prev1 = self.energy_history[n - 2];
        let prev2 = self.energy_history[n - 3];
        if !(energy > prev1 && energy > prev2) {
            return None;
        }

        self.beat_times.push_back(timestamp_ms);
        if self.beat_times.len() > self.config.beat_history_capacity {
            self.beat_times.pop_front();
        }
        self.last_beat_ms = Some(timestamp_ms);

        let confidence =
            ((energy - threshold) / (1.0 - threshold).max(f64::EPSILON)).clamp(0.0, 1.0);
        let tempo = self.tempo.recompute(&self.beat_times);

        log::trace!(
            "Beat at {timestamp_ms:.1}ms: energy={energy:.3} threshold={threshold:.3} tempo={:.1}",
            tempo.bpm
        );

        Some(BeatEvent {
            timestamp_ms,
            confidence,
        })
    }

    /// Recompute the tempo from the current beat history.
    pub fn recompute_tempo(&mut self) -> TempoEstimate {
        self.tempo.recompute(&self.beat_times)
    }

    /// The estimate from the last accepted beat.
    pub fn tempo(&self) -> TempoEstimate {
        self.tempo.current()
    }

    /// Timestamps of the beats currently used for tempo, oldest first.
    pub fn beat_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.beat_times.iter().copied()
    }

    pub fn last_beat_ms(&self) -> Option<f64> {
        self.last_beat_ms
    }

    /// Forget all history, e.g. when the input source changes.
    pub fn reset(&mut self) {
        self.energy_history.clear();
        self.beat_times.clear();
        self.last_beat_ms = None;
        self.tempo.reset();
        log::debug!("BeatDetector reset");
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::from_validated(BeatConfig::default(), TempoTracker::default())
    }
}
