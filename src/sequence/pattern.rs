//! Pattern kinds and the emotion palette used by generated sequences.

use serde::{Deserialize, Serialize};

/// The rhythmic shape of a generated sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    /// Evenly spaced events.
    Steady,
    /// Building intensity: spacing shrinks as the sequence advances.
    Crescendo,
    /// Alternating long/short spacing, like a question and its answer.
    CallAndResponse,
    /// Irregular spacing.
    Scattered,
}

impl PatternKind {
    /// Selection order: `hash % ALL.len()` indexes this array.
    pub const ALL: [PatternKind; 4] = [
        PatternKind::Steady,
        PatternKind::Crescendo,
        PatternKind::CallAndResponse,
        PatternKind::Scattered,
    ];

    pub fn from_hash(hash: u32) -> Self {
        Self::ALL[hash as usize % Self::ALL.len()]
    }

    /// Timing used when no table is configured for this pattern.
    ///
    /// `step` is the event index, `seed` the generator state after that
    /// step's LCG advance.
    pub fn fallback_timing(self, step: usize, seed: u32) -> f64 {
        match self {
            PatternKind::Steady => 1.0,
            PatternKind::Crescendo => (1.0 - 0.1 * step as f64).max(0.3),
            PatternKind::CallAndResponse => {
                if step % 2 == 0 {
                    1.0
                } else {
                    0.5
                }
            }
            PatternKind::Scattered => 0.75 + 0.5 * ((seed >> 8) % 2) as f64,
        }
    }
}

/// The emotion a voice line should be delivered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Emotion {
    Neutral,
    Happy,
    Angry,
    Surprised,
}

impl Emotion {
    pub const PALETTE: [Emotion; 4] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Angry,
        Emotion::Surprised,
    ];

    pub fn from_index(index: u32) -> Self {
        Self::PALETTE[index as usize % Self::PALETTE.len()]
    }
}
