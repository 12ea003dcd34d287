pub mod config;
pub mod dsp;
pub mod error;
pub mod sequence;

use crate::config::ToyConfig;
use crate::dsp::beat::BeatDetector;
use crate::dsp::energy::{FrequencyBand, band_energy, normalize_byte_spectrum};
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the soundtoys-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: hash free text into `[0, 10000)` with the default generator.
#[wasm_bindgen]
pub fn text_hash(text: &str) -> u32 {
    sequence::compute_hash(text)
}

/// WASM-exposed: hash and expand text into `{ hash, pattern, events }`.
#[wasm_bindgen]
pub fn generate_sequence(text: &str) -> Result<JsValue, JsValue> {
    let generated = sequence::generate(text);
    serde_wasm_bindgen::to_value(&generated).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: detect the pitch of an analyser's time-domain buffer.
/// Returns `{ frequency, noteName, octave, centsOffset, confidence }`.
#[wasm_bindgen]
pub fn detect_pitch_f32(samples: Vec<f32>, sample_rate: u32) -> Result<JsValue, JsValue> {
    let reading = dsp::tuner::detect_pitch(&samples, sample_rate);
    serde_wasm_bindgen::to_value(&reading).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: mean energy of a byte spectrum (`getByteFrequencyData`)
/// between `low_hz` and `high_hz`.
#[wasm_bindgen]
pub fn spectrum_band_energy(bytes: Vec<u8>, sample_rate: u32, low_hz: f32, high_hz: f32) -> f32 {
    let spectrum = normalize_byte_spectrum(&bytes);
    band_energy(&spectrum, sample_rate, FrequencyBand::new(low_hz, high_hz))
}

/// WASM-exposed beat detector handle. The page creates one per audio
/// session and calls `tick` from its animation loop.
#[wasm_bindgen]
pub struct WasmBeatDetector {
    inner: BeatDetector,
}

#[wasm_bindgen]
impl WasmBeatDetector {
    /// Create a detector. `config_json` may carry `beat` and `tempo`
    /// sections; omitted values use the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmBeatDetector, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) => ToyConfig::from_json_str(json).map_err(|e| {
                log::warn!("Rejected beat detector config: {e}");
                JsValue::from_str(&format!("{e}"))
            })?,
            None => ToyConfig::default(),
        };
        let inner = BeatDetector::new(config.beat, config.tempo)
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(WasmBeatDetector { inner })
    }

    /// Feed one energy frame; returns a `{ timestampMs, confidence }`
    /// object on a beat, `null` otherwise.
    pub fn tick(&mut self, energy: f64, timestamp_ms: f64) -> Result<JsValue, JsValue> {
        match self.inner.on_energy_tick(energy, timestamp_ms) {
            Some(beat) => serde_wasm_bindgen::to_value(&beat)
                .map_err(|e| JsValue::from_str(&format!("{e}"))),
            None => Ok(JsValue::NULL),
        }
    }

    /// Current `{ bpm, confidence }`.
    pub fn tempo(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.tempo())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Forget all energy and beat history, e.g. when the microphone changes.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}
