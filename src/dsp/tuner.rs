//! Pitch Tuner — fundamental frequency detection for live waveform buffers.
//!
//! Uses a Hann window followed by autocorrelation. Each lag is divided by
//! the window's own autocorrelation at that lag, which undoes the taper so
//! long periods score as well as short ones. The first strong local
//! maximum is refined with parabolic interpolation and named against
//! 12-tone equal temperament.

use serde::Serialize;

use crate::config::PitchConfig;
use crate::error::ConfigError;

use super::note::frequency_to_note;

/// A later correlation peak has to beat the earliest one by more than this
/// ratio to win; period multiples score about the same as the period.
const PEAK_RATIO: f64 = 0.9;

/// Result of pitch detection on one buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchReading {
    /// Estimated fundamental frequency in Hz (0 when nothing was found).
    pub frequency: f64,
    /// Nearest note name, empty when nothing was found.
    pub note_name: &'static str,
    pub octave: i32,
    /// Offset from the nearest note in whole cents.
    pub cents_offset: i32,
    /// Peak prominence in [0, 1].
    pub confidence: f64,
}

impl PitchReading {
    /// The "no pitch" sentinel.
    pub fn none() -> Self {
        PitchReading {
            frequency: 0.0,
            note_name: "",
            octave: 0,
            cents_offset: 0,
            confidence: 0.0,
        }
    }

    pub fn is_pitched(&self) -> bool {
        self.frequency > 0.0
    }
}

/// Autocorrelation pitch detector bound to one configuration.
///
/// Holds scratch buffers so repeated calls on same-sized buffers do not
/// rebuild the window or reallocate the windowed copy.
#[derive(Debug, Clone)]
pub struct PitchDetector {
    config: PitchConfig,
    /// Hann coefficients for the last buffer length seen.
    window: Vec<f64>,
    windowed: Vec<f64>,
}

impl PitchDetector {
    pub fn new(config: PitchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::debug!(
            "PitchDetector created: search {}-{} Hz, accept {}-{} Hz",
            config.min_freq,
            config.max_freq,
            config.accept_min_freq,
            config.accept_max_freq
        );
        Ok(PitchDetector {
            config,
            window: Vec::new(),
            windowed: Vec::new(),
        })
    }

    pub fn config(&self) -> &PitchConfig {
        &self.config
    }

    /// Detect the pitch of a mono buffer.
    ///
    /// Empty, silent, or too-short buffers and out-of-range results all
    /// return [`PitchReading::none`].
    pub fn detect(&mut self, samples: &[f32], sample_rate: u32) -> PitchReading {
        let n = samples.len();
        if n < 4 || sample_rate == 0 {
            return PitchReading::none();
        }
        let sr = sample_rate as f64;

        let min_lag = ((sr / self.config.max_freq).floor() as usize).max(2);
        let max_lag = ((sr / self.config.min_freq).ceil() as usize).min(n / 2);
        if max_lag <= min_lag {
            return PitchReading::none();
        }

        if self.window.len() != n {
            self.window = hann(n);
        }
        self.windowed.clear();
        self.windowed
            .extend(samples.iter().zip(&self.window).map(|(&s, w)| s as f64 * w));
        let (x, w) = (&self.windowed, &self.window);

        let energy = lagged_dot(x, 0);
        if !(energy.is_finite() && energy > 1e-12) {
            return PitchReading::none();
        }
        let window_energy = lagged_dot(w, 0);

        // corr[k - first_lag] for k in first_lag..=last_lag; one extra lag on
        // each side so every lag in range has two neighbours. max_lag is at
        // most n / 2, so last_lag stays inside the buffer.
        let first_lag = min_lag - 1;
        let last_lag = max_lag + 1;
        let corr: Vec<f64> = (first_lag..=last_lag)
            .map(|lag| {
                let taper = lagged_dot(w, lag) / window_energy;
                if taper > 1e-9 {
                    lagged_dot(x, lag) / energy / taper
                } else {
                    0.0
                }
            })
            .collect();
        let at = |lag: usize| corr[lag - first_lag];

        let peaks: Vec<usize> = (min_lag..=max_lag)
            .filter(|&lag| at(lag) > 0.0 && at(lag) >= at(lag - 1) && at(lag) >= at(lag + 1))
            .collect();
        let Some(strongest) = peaks.iter().map(|&lag| at(lag)).reduce(f64::max) else {
            return PitchReading::none();
        };
        let Some(&best_lag) = peaks.iter().find(|&&lag| at(lag) >= strongest * PEAK_RATIO) else {
            return PitchReading::none();
        };

        // Parabolic interpolation for sub-sample accuracy
        let refined_lag = {
            let alpha = at(best_lag - 1);
            let beta = at(best_lag);
            let gamma = at(best_lag + 1);
            let denom = alpha - 2.0 * beta + gamma;
            if denom.abs() > 1e-12 {
                best_lag as f64 + 0.5 * (alpha - gamma) / denom
            } else {
                best_lag as f64
            }
        };
        if refined_lag <= 0.0 {
            return PitchReading::none();
        }

        let frequency = sr / refined_lag;
        if !(self.config.accept_min_freq..=self.config.accept_max_freq).contains(&frequency) {
            return PitchReading::none();
        }

        // Peak height over the average correlation across the search range
        let in_range = &corr[min_lag - first_lag..=max_lag - first_lag];
        let mean = in_range.iter().sum::<f64>() / in_range.len() as f64;
        let confidence = (at(best_lag) - mean).clamp(0.0, 1.0);

        let Some(note) = frequency_to_note(frequency, self.config.reference_a4) else {
            return PitchReading::none();
        };

        PitchReading {
            frequency,
            note_name: note.name,
            octave: note.octave,
            cents_offset: note.cents,
            confidence,
        }
    }
}

impl Default for PitchDetector {
    fn default() -> Self {
        PitchDetector {
            config: PitchConfig::default(),
            window: Vec::new(),
            windowed: Vec::new(),
        }
    }
}

fn hann(n: usize) -> Vec<f64> {
    let span = (n - 1) as f64;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / span).cos()))
        .collect()
}

/// `sum(v[i] * v[i + lag])` over the overlapping part.
fn lagged_dot(v: &[f64], lag: usize) -> f64 {
    v[..v.len() - lag]
        .iter()
        .zip(&v[lag..])
        .map(|(a, b)| a * b)
        .sum()
}

/// Detect the pitch of a mono buffer with the default configuration
/// (search 50-1000 Hz, accept 50-2000 Hz, A4 = 440 Hz).
pub fn detect_pitch(samples: &[f32], sample_rate: u32) -> PitchReading {
    PitchDetector::default().detect(samples, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn generate_sine(freq: f64, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (2.0 * PI * freq * t).sin() as f32
            })
            .collect()
    }

    #[test]
    fn detect_a4_440hz() {
        let samples = generate_sine(440.0, 44100, 2048);
        let result = detect_pitch(&samples, 44100);

        assert_eq!(result.note_name, "A");
        assert_eq!(result.octave, 4);
        assert!(result.cents_offset.abs() < 10, "cents: {}", result.cents_offset);
        assert!(
            (result.frequency - 440.0).abs() < 4.4,
            "Expected ~440Hz, got {}",
            result.frequency
        );
        assert!(result.confidence > 0.8, "Confidence should be high: {}", result.confidence);
    }

    #[test]
    fn detect_a4_longer_buffer() {
        let samples = generate_sine(440.0, 44100, 4096);
        let result = detect_pitch(&samples, 44100);
        assert_eq!(result.note_name, "A");
        assert_eq!(result.octave, 4);
        assert!((result.frequency - 440.0).abs() < 4.4);
    }

    #[test]
    fn detect_c4_262hz() {
        let samples = generate_sine(261.63, 44100, 4096);
        let result = detect_pitch(&samples, 44100);

        assert!(
            (result.frequency - 261.63).abs() < 2.7,
            "Expected ~261.63Hz, got {}",
            result.frequency
        );
        assert_eq!(result.note_name, "C");
        assert_eq!(result.octave, 4);
    }

    fn assert_note(freq: f64, len: usize, name: &str, octave: i32) -> PitchReading {
        let result = detect_pitch(&generate_sine(freq, 44100, len), 44100);
        assert!(
            (result.frequency - freq).abs() / freq < 0.01,
            "Expected ~{freq}Hz from {len} samples, got {}",
            result.frequency
        );
        assert_eq!(result.note_name, name, "{freq}Hz");
        assert_eq!(result.octave, octave, "{freq}Hz");
        result
    }

    #[test]
    fn detect_e2_long_buffer() {
        assert_note(82.41, 16384, "E", 2);
    }

    // 2048 samples is the browser analyser's default buffer.
    #[test]
    fn detect_a1_55hz_default_buffer() {
        let result = assert_note(55.0, 2048, "A", 1);
        assert!(result.confidence > 0.8, "confidence: {}", result.confidence);
    }

    #[test]
    fn detect_e2_82hz_default_buffer() {
        let result = assert_note(82.41, 2048, "E", 2);
        assert!(result.confidence > 0.8, "confidence: {}", result.confidence);
    }

    #[test]
    fn detect_a2_110hz_default_buffer() {
        let result = assert_note(110.0, 2048, "A", 2);
        assert!(result.cents_offset.abs() < 10, "cents: {}", result.cents_offset);
    }

    #[test]
    fn detect_low_notes_in_short_buffer() {
        assert_note(146.83, 1024, "D", 3);
        let a3 = assert_note(220.0, 1024, "A", 3);
        assert!(a3.cents_offset.abs() < 10, "cents: {}", a3.cents_offset);
    }

    #[test]
    fn search_range_floor_is_reachable() {
        assert_note(51.0, 2048, "G#", 1);
    }

    #[test]
    fn harmonics_do_not_shift_the_octave() {
        let fundamental = generate_sine(110.0, 44100, 2048);
        let second = generate_sine(220.0, 44100, 2048);
        let third = generate_sine(330.0, 44100, 2048);
        let rich: Vec<f32> = fundamental
            .iter()
            .zip(&second)
            .zip(&third)
            .map(|((a, b), c)| a + 0.8 * b + 0.5 * c)
            .collect();
        let result = detect_pitch(&rich, 44100);
        assert_eq!(result.note_name, "A");
        assert_eq!(result.octave, 2);

        // Weak fundamental under a strong octave
        let weak: Vec<f32> = fundamental.iter().zip(&second).map(|(a, b)| 0.3 * a + b).collect();
        let result = detect_pitch(&weak, 44100);
        assert_eq!(result.octave, 2);
    }

    #[test]
    fn noise_has_low_confidence() {
        let mut rng: u64 = 12345;
        let samples: Vec<f32> = (0..4096)
            .map(|_| {
                rng = rng
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((rng >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0) as f32
            })
            .collect();

        let result = detect_pitch(&samples, 44100);
        assert!(
            result.confidence < 0.5,
            "Noise should have low confidence: {}",
            result.confidence
        );
    }

    #[test]
    fn empty_buffer() {
        let result = detect_pitch(&[], 44100);
        assert!(!result.is_pitched());
        assert_eq!(result, PitchReading::none());
    }

    #[test]
    fn silent_buffer() {
        let result = detect_pitch(&[0.0; 2048], 44100);
        assert_eq!(result, PitchReading::none());
    }

    #[test]
    fn buffer_shorter_than_search_range() {
        let samples = generate_sine(440.0, 44100, 60);
        assert_eq!(detect_pitch(&samples, 44100), PitchReading::none());
    }

    #[test]
    fn narrow_accept_range_rejects() {
        let mut detector = PitchDetector::new(PitchConfig {
            accept_min_freq: 500.0,
            ..PitchConfig::default()
        })
        .unwrap();
        let samples = generate_sine(440.0, 44100, 2048);
        assert_eq!(detector.detect(&samples, 44100), PitchReading::none());
    }

    #[test]
    fn detector_is_reusable() {
        let mut detector = PitchDetector::default();
        let a = detector.detect(&generate_sine(440.0, 44100, 2048), 44100);
        let c = detector.detect(&generate_sine(523.25, 44100, 2048), 44100);
        let e = detector.detect(&generate_sine(82.41, 44100, 4096), 44100);
        assert_eq!(a.note_name, "A");
        assert_eq!(c.note_name, "C");
        assert_eq!(c.octave, 5);
        assert_eq!((e.note_name, e.octave), ("E", 2));
    }
}
