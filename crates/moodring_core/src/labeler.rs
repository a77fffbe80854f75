//! Turns the winning emotion into a display word.
//!
//! The published choice and the diagnostic related-word lookup draw from two
//! separate generators, so logging diagnostics never changes which synonym a
//! seeded labeler publishes.

use crate::emotion::Emotion;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

const SYNONYMS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Anticipation,
        &["expectation", "eagerness", "anticipatory", "hopefulness", "excitement"],
    ),
    (
        Emotion::Joy,
        &["joyful", "content", "cheerful", "pleased", "delighted", "ecstatic", "elated"],
    ),
    (
        Emotion::Positive,
        &["optimistic", "upbeat", "encouraging", "hopeful", "constructive", "favorable"],
    ),
    (
        Emotion::Surprise,
        &["astonishment", "amazement", "shock", "wonder", "stunned", "bewildered"],
    ),
    (
        Emotion::Trust,
        &["confidence", "faith", "reliance", "dependence", "belief", "assurance"],
    ),
    (
        Emotion::Anger,
        &["rage", "fury", "irritation", "outrage", "resentment", "annoyance"],
    ),
    (
        Emotion::Disgust,
        &["revulsion", "distaste", "repulsion", "aversion", "displeasure", "nausea"],
    ),
    (
        Emotion::Fear,
        &["terror", "anxiety", "apprehension", "dread", "fright", "worry"],
    ),
    (
        Emotion::Negative,
        &["pessimistic", "unfavorable", "dismal", "bleak", "downbeat", "gloomy"],
    ),
    (
        Emotion::Sadness,
        &["sorrow", "grief", "melancholy", "despair", "dejection", "dismay"],
    ),
];

/// Display synonyms per emotion.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    entries: HashMap<Emotion, Vec<&'static str>>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self {
            entries: SYNONYMS
                .iter()
                .map(|(e, words)| (*e, words.to_vec()))
                .collect(),
        }
    }
}

impl SynonymTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, emotion: Emotion) -> &[&'static str] {
        self.entries.get(&emotion).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The emotion a display word belongs to, if any.
    pub fn emotion_of(&self, word: &str) -> Option<Emotion> {
        let word = word.to_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| self.get(*e).iter().any(|w| *w == word))
    }
}

pub struct MoodLabeler<R: Rng = StdRng> {
    table: SynonymTable,
    rng: R,
    diagnostic_rng: R,
}

impl MoodLabeler<StdRng> {
    /// Both generators derive from `seed`; the diagnostic one is offset so the
    /// two streams differ.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rngs(
            SynonymTable::default(),
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        )
    }

    pub fn from_entropy() -> Self {
        Self::with_rngs(
            SynonymTable::default(),
            StdRng::from_entropy(),
            StdRng::from_entropy(),
        )
    }
}

impl<R: Rng> MoodLabeler<R> {
    pub fn with_rngs(table: SynonymTable, rng: R, diagnostic_rng: R) -> Self {
        Self {
            table,
            rng,
            diagnostic_rng,
        }
    }

    /// Uniform pick from the emotion's synonyms, or the raw label when the
    /// table has none. Never empty.
    pub fn label(&mut self, emotion: Emotion) -> String {
        match self.table.get(emotion).choose(&mut self.rng) {
            Some(word) => (*word).to_string(),
            None => emotion.as_str().to_string(),
        }
    }

    /// Diagnostic only: a random sibling of `word` among the sorted synonyms
    /// of its emotion, ranks `start_rank..=end_rank` (1-based). Falls back to
    /// `word` when no siblings are available.
    pub fn related_word(&mut self, word: &str, start_rank: usize, end_rank: usize) -> String {
        let mut siblings: Vec<&str> = self
            .table
            .emotion_of(word)
            .map(|e| self.table.get(e).to_vec())
            .unwrap_or_default();
        siblings.sort_unstable();
        siblings.dedup();

        let start = start_rank.max(1);
        if siblings.len() < start {
            return word.to_string();
        }
        let end = end_rank.min(siblings.len()).max(start);
        let idx = self.diagnostic_rng.gen_range(start - 1..end);
        siblings[idx].to_string()
    }
}

/// First character uppercased, the rest lowercased.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
