//! Sequence Generator — deterministic text-to-playback mapping.
//!
//! Free text (a question shouted at the soundboard) is reduced to a bounded
//! hash, and the hash is expanded into a fixed-length list of events naming
//! which actor speaks, with which emotion, and how long to wait before the
//! next one. The same text always produces the same sequence.

pub mod hash;
pub mod pattern;

use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::error::ConfigError;

use self::hash::{hash_text, normalize};
use self::pattern::{Emotion, PatternKind};

/// LCG multiplier (Numerical Recipes).
const LCG_A: u32 = 1_664_525;
/// LCG increment.
const LCG_C: u32 = 1_013_904_223;

/// One step of a generated sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceEvent {
    /// Index of the actor that plays this step, in `[0, actor_count)`.
    pub actor_index: usize,
    pub emotion: Emotion,
    /// Multiplier applied to the caller's base spacing.
    pub relative_timing: f64,
}

/// A hash together with its expanded sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSequence {
    pub hash: u32,
    pub pattern: PatternKind,
    pub events: Vec<SequenceEvent>,
}

impl GeneratedSequence {
    /// Start offset of every event, in ms, given the spacing of a `1.0`
    /// timing. The first event starts at 0; each event's timing delays the
    /// one after it.
    pub fn onsets(&self, base_spacing_ms: f64) -> Vec<f64> {
        let mut at = 0.0;
        self.events
            .iter()
            .map(|event| {
                let start = at;
                at += event.relative_timing * base_spacing_ms;
                start
            })
            .collect()
    }

    /// Total length of the sequence in ms.
    pub fn duration_ms(&self, base_spacing_ms: f64) -> f64 {
        self.events
            .iter()
            .map(|e| e.relative_timing * base_spacing_ms)
            .sum()
    }
}

/// Generator bound to one configuration. Cheap to share; every method is
/// pure.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    config: GeneratorConfig,
    /// Keywords pre-normalized once so matching compares like with like.
    keywords: Vec<(String, u32)>,
}

impl SequenceGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: GeneratorConfig) -> Self {
        let keywords = config
            .keywords
            .iter()
            .map(|k| (normalize(&k.keyword), k.bonus))
            .collect();
        log::debug!(
            "SequenceGenerator created: max_hash={}, length={}, actors={}",
            config.max_hash,
            config.sequence_length,
            config.actor_count
        );
        SequenceGenerator { config, keywords }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Hash `text` into `[0, max_hash)`. The empty string hashes to 0.
    pub fn compute_hash(&self, text: &str) -> u32 {
        hash_text(text, &self.keywords, self.config.max_hash)
    }

    /// Expand a hash into `sequence_length` events.
    pub fn expand_to_sequence(&self, hash: u32) -> Vec<SequenceEvent> {
        let pattern = PatternKind::from_hash(hash);
        self.expand_with_pattern(hash, pattern)
    }

    fn expand_with_pattern(&self, hash: u32, pattern: PatternKind) -> Vec<SequenceEvent> {
        let actor_count = self.config.actor_count;
        let table = self.config.timing_tables.get(pattern);
        let mut seed = hash;

        (0..self.config.sequence_length)
            .map(|step| {
                seed = seed.wrapping_mul(LCG_A).wrapping_add(LCG_C);
                let actor_index = (seed % actor_count) as usize;
                let emotion = Emotion::from_index(seed / actor_count);
                let relative_timing = match table {
                    Some(t) => t[step % t.len()],
                    None => pattern.fallback_timing(step, seed),
                };
                SequenceEvent {
                    actor_index,
                    emotion,
                    relative_timing,
                }
            })
            .collect()
    }

    /// Hash and expand in one call.
    pub fn generate(&self, text: &str) -> GeneratedSequence {
        let hash = self.compute_hash(text);
        let pattern = PatternKind::from_hash(hash);
        GeneratedSequence {
            hash,
            pattern,
            events: self.expand_with_pattern(hash, pattern),
        }
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::from_validated(GeneratorConfig::default())
    }
}

/// [`SequenceGenerator::compute_hash`] with the default configuration.
pub fn compute_hash(text: &str) -> u32 {
    SequenceGenerator::default().compute_hash(text)
}

/// [`SequenceGenerator::expand_to_sequence`] with the default configuration.
pub fn expand_to_sequence(hash: u32) -> Vec<SequenceEvent> {
    SequenceGenerator::default().expand_to_sequence(hash)
}

/// [`SequenceGenerator::generate`] with the default configuration.
pub fn generate(text: &str) -> GeneratedSequence {
    SequenceGenerator::default().generate(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingTables;

    #[test]
    fn pourquoi_is_stable_and_bounded() {
        let first = compute_hash("Pourquoi?");
        let second = compute_hash("Pourquoi?");
        assert_eq!(first, second);
        assert!(first < 10_000);
    }

    #[test]
    fn keyword_changes_the_hash() {
        let plain = SequenceGenerator::new(GeneratorConfig {
            keywords: vec![],
            ..GeneratorConfig::default()
        })
        .unwrap();
        let default = SequenceGenerator::default();
        assert_eq!(
            (plain.compute_hash("Pourquoi?") + 137) % 10_000,
            default.compute_hash("Pourquoi?")
        );
    }

    #[test]
    fn accented_keywords_are_normalized() {
        let generator = SequenceGenerator::new(GeneratorConfig {
            keywords: vec![crate::config::KeywordBonus::new("Réponse", 500)],
            ..GeneratorConfig::default()
        })
        .unwrap();
        let plain = SequenceGenerator::new(GeneratorConfig {
            keywords: vec![],
            ..GeneratorConfig::default()
        })
        .unwrap();
        assert_eq!(
            generator.compute_hash("la reponse"),
            (plain.compute_hash("la reponse") + 500) % 10_000
        );
    }

    #[test]
    fn empty_text_gives_zero_and_a_full_sequence() {
        let generated = generate("");
        assert_eq!(generated.hash, 0);
        assert_eq!(generated.pattern, PatternKind::Steady);
        assert_eq!(generated.events.len(), 8);
    }

    #[test]
    fn expansion_is_repeatable() {
        for hash in [0, 1, 42, 4321, 9999] {
            assert_eq!(expand_to_sequence(hash), expand_to_sequence(hash));
        }
    }

    #[test]
    fn first_event_follows_lcg_step() {
        // seed = 0 * A + C
        let events = expand_to_sequence(0);
        let seed = LCG_C;
        assert_eq!(events[0].actor_index, (seed % 5) as usize);
        assert_eq!(events[0].emotion, Emotion::from_index(seed / 5));
        assert_eq!(events[0].relative_timing, 1.0);
    }

    #[test]
    fn scattered_uses_its_table() {
        // 3 % 4 selects Scattered
        let timings: Vec<f64> = expand_to_sequence(3)
            .iter()
            .map(|e| e.relative_timing)
            .collect();
        assert_eq!(timings, vec![0.6, 1.4, 0.8, 1.2, 1.0, 0.6, 1.4, 0.8]);
    }

    #[test]
    fn crescendo_falls_back_to_decreasing_rule() {
        // 1 % 4 selects Crescendo, which has no default table
        let events = expand_to_sequence(1);
        assert!(events
            .windows(2)
            .all(|w| w[1].relative_timing < w[0].relative_timing));
    }

    #[test]
    fn steady_without_table_uses_rule() {
        let generator = SequenceGenerator::new(GeneratorConfig {
            timing_tables: TimingTables::empty(),
            ..GeneratorConfig::default()
        })
        .unwrap();
        assert!(generator
            .expand_to_sequence(8)
            .iter()
            .all(|e| e.relative_timing == 1.0));
    }

    #[test]
    fn custom_length_and_actor_count() {
        let generator = SequenceGenerator::new(GeneratorConfig {
            sequence_length: 20,
            actor_count: 3,
            ..GeneratorConfig::default()
        })
        .unwrap();
        let events = generator.expand_to_sequence(777);
        assert_eq!(events.len(), 20);
        assert!(events.iter().all(|e| e.actor_index < 3));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = SequenceGenerator::new(GeneratorConfig {
            sequence_length: 0,
            ..GeneratorConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn onsets_accumulate_timing() {
        let generated = GeneratedSequence {
            hash: 0,
            pattern: PatternKind::CallAndResponse,
            events: vec![
                SequenceEvent {
                    actor_index: 0,
                    emotion: Emotion::Neutral,
                    relative_timing: 1.0,
                },
                SequenceEvent {
                    actor_index: 1,
                    emotion: Emotion::Angry,
                    relative_timing: 0.5,
                },
                SequenceEvent {
                    actor_index: 2,
                    emotion: Emotion::Happy,
                    relative_timing: 1.0,
                },
            ],
        };
        assert_eq!(generated.onsets(400.0), vec![0.0, 400.0, 600.0]);
        assert_eq!(generated.duration_ms(400.0), 1000.0);
    }

    #[test]
    fn serializes_for_javascript() {
        let json = serde_json::to_value(generate("Merci")).unwrap();
        assert!(json["hash"].is_u64());
        assert_eq!(json["events"].as_array().unwrap().len(), 8);
        assert!(json["events"][0]["actorIndex"].is_u64());
        assert!(json["events"][0]["relativeTiming"].is_f64());
    }
}
