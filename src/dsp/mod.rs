//! DSP — live audio analysis for the microphone-driven toys.
//!
//! Everything here is synchronous and allocation-light so it can run once
//! per animation frame, either natively or inside the browser through WASM.
//! Callers own the tick loop; these types only turn numbers into numbers.

pub mod beat;
pub mod energy;
pub mod note;
pub mod tempo;
pub mod tuner;
