//! Word-level emotion lexicon scoring.
//!
//! Reads the NRC Emotion Lexicon word-level layout (`word<TAB>emotion<TAB>0|1`)
//! and counts, per message, how many tokens are associated with each emotion.
//! A compact English table ships with the crate; point the config at a full
//! NRC file for better coverage.

use crate::emotion::{Emotion, EmotionScores};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.tsv");

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("lexicon contains no associations")]
    Empty,
}

/// Anything that can turn text into raw per-emotion intensities.
///
/// Implementations must be total: unscoreable text yields an empty map.
pub trait EmotionScorer: Send + Sync {
    fn score(&self, text: &str) -> EmotionScores;
}

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, Vec<Emotion>>,
}

impl Lexicon {
    /// The table embedded in the crate.
    pub fn builtin() -> Self {
        // The embedded table is non-empty, checked by test_builtin_is_populated.
        Self::parse(BUILTIN_LEXICON).unwrap_or_default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LexiconError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| LexiconError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse NRC word-level rows. Rows flagged 0, malformed rows and unknown
    /// labels are skipped.
    pub fn parse(content: &str) -> Result<Self, LexiconError> {
        let mut entries: HashMap<String, Vec<Emotion>> = HashMap::new();
        for line in content.lines() {
            let mut cols = line.split('\t');
            let (Some(word), Some(label), Some(flag)) = (cols.next(), cols.next(), cols.next())
            else {
                continue;
            };
            if flag.trim() != "1" {
                continue;
            }
            let Some(emotion) = Emotion::parse(label) else {
                tracing::debug!("Skipping unknown lexicon label '{}'", label);
                continue;
            };
            let list = entries.entry(word.trim().to_lowercase()).or_default();
            if !list.contains(&emotion) {
                list.push(emotion);
            }
        }
        if entries.is_empty() {
            return Err(LexiconError::Empty);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emotions for a token, trying the singular form when the token itself is absent.
    pub fn lookup(&self, token: &str) -> Option<&[Emotion]> {
        if let Some(found) = self.entries.get(token) {
            return Some(found.as_slice());
        }
        ["es", "s"]
            .iter()
            .filter_map(|suffix| token.strip_suffix(suffix))
            .filter(|stem| stem.len() > 2)
            .find_map(|stem| self.entries.get(stem))
            .map(Vec::as_slice)
    }
}

impl EmotionScorer for Lexicon {
    fn score(&self, text: &str) -> EmotionScores {
        let mut scores = EmotionScores::new();
        for token in tokenize(text) {
            if let Some(emotions) = self.lookup(&token) {
                for emotion in emotions {
                    *scores.entry(*emotion).or_insert(0.0) += 1.0;
                }
            }
        }
        scores
    }
}

/// Lowercased word tokens. Apostrophes survive inside a word only.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
