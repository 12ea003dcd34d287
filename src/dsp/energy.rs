//! Energy — turns raw analyser output into normalized energy frames.
//!
//! The browser hands over either a time-domain waveform
//! (`getFloatTimeDomainData`) or a byte magnitude spectrum
//! (`getByteFrequencyData`); both reduce to a scalar in [0, 1] that the
//! beat detector consumes once per tick.

use serde::{Deserialize, Serialize};

/// A frequency range in Hz, inclusive of `low_hz`, exclusive of `high_hz`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyBand {
    pub low_hz: f32,
    pub high_hz: f32,
}

impl FrequencyBand {
    /// Kick drums and bass lines; the band beats are usually taken from.
    pub const BASS: FrequencyBand = FrequencyBand::new(20.0, 250.0);
    /// Voice and most melodic content.
    pub const MID: FrequencyBand = FrequencyBand::new(250.0, 2000.0);
    pub const TREBLE: FrequencyBand = FrequencyBand::new(2000.0, 16000.0);

    pub const fn new(low_hz: f32, high_hz: f32) -> Self {
        FrequencyBand { low_hz, high_hz }
    }

    pub fn contains(&self, freq: f32) -> bool {
        freq >= self.low_hz && freq < self.high_hz
    }
}

/// Root mean square of a waveform buffer, clamped to [0, 1].
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    let value = (sum_sq / samples.len() as f32).sqrt();
    if value.is_finite() {
        value.min(1.0)
    } else {
        0.0
    }
}

/// Scale a byte spectrum (0-255 per bin) to [0, 1].
pub fn normalize_byte_spectrum(bytes: &[u8]) -> Vec<f32> {
    bytes.iter().map(|&b| b as f32 / 255.0).collect()
}

/// Mean magnitude of the bins whose centre frequency falls in `band`.
///
/// `spectrum` holds the positive-frequency half of an FFT, so bin `i`
/// is centred on `i * sample_rate / (2 * spectrum.len())`. Returns 0 when
/// no bin falls in the band.
pub fn band_energy(spectrum: &[f32], sample_rate: u32, band: FrequencyBand) -> f32 {
    if spectrum.is_empty() || sample_rate == 0 {
        return 0.0;
    }
    let bin_width = sample_rate as f32 / (2 * spectrum.len()) as f32;

    let (sum, count) = spectrum
        .iter()
        .enumerate()
        .filter(|(i, _)| band.contains(*i as f32 * bin_width))
        .fold((0.0f32, 0usize), |(sum, count), (_, &m)| (sum + m, count + 1));

    if count == 0 {
        0.0
    } else {
        (sum / count as f32).clamp(0.0, 1.0)
    }
}
