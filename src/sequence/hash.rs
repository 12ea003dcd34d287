//! Text hashing — a bounded, reproducible fingerprint of free text.
//!
//! The hash mixes several cheap features of the text (length, character
//! histogram, adjacent pairs, keywords, punctuation) so that short, similar
//! phrases still land far apart. It is not a cryptographic hash.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Weight applied to the normalized length.
const LENGTH_WEIGHT: u64 = 7;
/// Modulus bounding each distinct-character contribution.
const CHAR_BOUND: u64 = 997;
/// Modulus bounding each adjacent-pair contribution before position weighting.
const PAIR_BOUND: u64 = 211;
/// Punctuation counted in the original, unnormalized text.
const PUNCTUATION: [char; 6] = ['?', '!', '.', ',', ';', ':'];
const PUNCTUATION_WEIGHT: u64 = 17;

/// Case-fold, strip diacritics and drop everything that is not alphanumeric.
///
/// `"Réponse, Président!"` becomes `"reponsepresident"`.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Hash `text` into `[0, max_hash)`.
///
/// `keywords` must already be normalized (see [`normalize`]); each one
/// found in the normalized text adds its bonus once.
pub(crate) fn hash_text(text: &str, keywords: &[(String, u32)], max_hash: u32) -> u32 {
    if text.is_empty() || max_hash == 0 {
        return 0;
    }

    let normalized = normalize(text);
    let chars: Vec<char> = normalized.chars().collect();
    let mut sum: u64 = (chars.len() as u64).wrapping_mul(LENGTH_WEIGHT);

    // Distinct characters in first-appearance order with their counts.
    let mut distinct: Vec<(char, u64)> = Vec::new();
    for &c in &chars {
        match distinct.iter_mut().find(|(d, _)| *d == c) {
            Some((_, count)) => *count += 1,
            None => distinct.push((c, 1)),
        }
    }
    for (rank, (c, count)) in distinct.iter().enumerate() {
        let code = *c as u64;
        let contribution = (count * 31 + code * (rank as u64 + 1)) % CHAR_BOUND;
        sum = sum.wrapping_add(contribution);
    }

    for (i, pair) in chars.windows(2).enumerate() {
        let (a, b) = (pair[0] as u64, pair[1] as u64);
        let contribution = ((a * 31 + b) % PAIR_BOUND) * (i as u64 + 1);
        sum = sum.wrapping_add(contribution);
    }

    for (keyword, bonus) in keywords {
        if !keyword.is_empty() && normalized.contains(keyword.as_str()) {
            sum = sum.wrapping_add(*bonus as u64);
        }
    }

    for (index, mark) in PUNCTUATION.iter().enumerate() {
        let count = text.chars().filter(|c| c == mark).count() as u64;
        sum = sum.wrapping_add(count * (index as u64 + 1) * PUNCTUATION_WEIGHT);
    }

    (sum % max_hash as u64) as u32
}
