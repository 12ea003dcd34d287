//! Tempo Tracker — smoothed BPM estimate from recent beat timestamps.

use serde::Serialize;

use crate::config::TempoConfig;
use crate::error::ConfigError;

/// A tempo estimate with a confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoEstimate {
    /// Beats per minute; 0 until enough beats have been seen.
    pub bpm: f64,
    pub confidence: f64,
}

/// Keeps the smoothed tempo between recomputations.
#[derive(Debug, Clone)]
pub struct TempoTracker {
    config: TempoConfig,
    /// Last tempo derived from surviving intervals.
    smoothed_bpm: Option<f64>,
    current: TempoEstimate,
}

impl TempoTracker {
    pub fn new(config: TempoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: TempoConfig) -> Self {
        TempoTracker {
            config,
            smoothed_bpm: None,
            current: TempoEstimate::default(),
        }
    }

    pub fn config(&self) -> &TempoConfig {
        &self.config
    }

    /// The most recent estimate.
    pub fn current(&self) -> TempoEstimate {
        self.current
    }

    /// Recompute the estimate from beat timestamps in ms, oldest first.
    ///
    /// With fewer than `min_beats` timestamps the tempo is left alone and
    /// confidence grows 5% per beat, capped at 25%. If every interval is an
    /// outlier the previous estimate is kept.
    pub fn recompute<'a, I>(&mut self, beat_times: I) -> TempoEstimate
    where
        I: IntoIterator<Item = &'a f64>,
    {
        let times: Vec<f64> = beat_times.into_iter().copied().collect();

        if times.len() < self.config.min_beats {
            self.current = TempoEstimate {
                bpm: self.smoothed_bpm.unwrap_or(0.0),
                confidence: (times.len() as f64 * 0.05).min(0.25),
            };
            return self.current;
        }

        let (min_bpm, max_bpm) = (self.config.min_bpm, self.config.max_bpm);
        let mut intervals: Vec<f64> = times
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|&interval| {
                interval > 0.0 && (min_bpm..=max_bpm).contains(&(60_000.0 / interval))
            })
            .collect();

        if intervals.is_empty() {
            log::trace!("All beat intervals rejected as outliers");
            return self.current;
        }

        intervals.sort_by(|a, b| a.total_cmp(b));
        let median = median_of_sorted(&intervals);
        let candidate = 60_000.0 / median;

        let bpm = match self.smoothed_bpm {
            None => candidate,
            Some(prior) => {
                let diff = (prior - candidate).abs();
                if diff < self.config.fine_threshold_bpm {
                    blend(prior, candidate, self.config.fine_prior_weight)
                } else if diff < self.config.coarse_threshold_bpm {
                    blend(prior, candidate, self.config.coarse_prior_weight)
                } else {
                    candidate
                }
            }
        };

        let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
        let variance =
            intervals.iter().map(|i| (i - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
        let cov = variance.sqrt() / mean;
        let confidence = 1.0 - cov.min(0.5) * 2.0;

        self.smoothed_bpm = Some(bpm);
        self.current = TempoEstimate { bpm, confidence };
        log::trace!(
            "Tempo recomputed: candidate={candidate:.1} bpm={bpm:.1} confidence={confidence:.2}"
        );
        self.current
    }

    pub fn reset(&mut self) {
        self.smoothed_bpm = None;
        self.current = TempoEstimate::default();
    }
}

impl Default for TempoTracker {
    fn default() -> Self {
        Self::from_validated(TempoConfig::default())
    }
}

fn blend(prior: f64, candidate: f64, prior_weight: f64) -> f64 {
    prior * prior_weight + candidate * (1.0 - prior_weight)
}

fn median_of_sorted(values: &[f64]) -> f64 {
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
