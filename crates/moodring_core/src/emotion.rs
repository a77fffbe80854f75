//! The closed emotion set shared by the lexicon, the aggregator and the labeler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the ten NRC emotion/polarity labels.
///
/// Variant order is the canonical order. `Ord` follows it, so iterating a
/// `BTreeMap<Emotion, _>` visits labels in canonical order and the arg-max
/// tie-break falls to the earliest label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anticipation,
    Joy,
    Positive,
    Surprise,
    Trust,
    Anger,
    Disgust,
    Fear,
    Negative,
    Sadness,
}

/// Per-message raw intensities. Absent labels score 0.
pub type EmotionScores = BTreeMap<Emotion, f64>;

impl Emotion {
    pub const ALL: [Emotion; 10] = [
        Emotion::Anticipation,
        Emotion::Joy,
        Emotion::Positive,
        Emotion::Surprise,
        Emotion::Trust,
        Emotion::Anger,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Negative,
        Emotion::Sadness,
    ];

    /// Parse a lexicon spelling. `happy` and `anticip` are accepted as aliases.
    pub fn parse(s: &str) -> Option<Self> {
        let e = match s.trim().to_ascii_lowercase().as_str() {
            "anticipation" | "anticip" => Emotion::Anticipation,
            "joy" | "happy" => Emotion::Joy,
            "positive" => Emotion::Positive,
            "surprise" => Emotion::Surprise,
            "trust" => Emotion::Trust,
            "anger" => Emotion::Anger,
            "disgust" => Emotion::Disgust,
            "fear" => Emotion::Fear,
            "negative" => Emotion::Negative,
            "sadness" => Emotion::Sadness,
            _ => return None,
        };
        Some(e)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Anticipation => "anticipation",
            Emotion::Joy => "joy",
            Emotion::Positive => "positive",
            Emotion::Surprise => "surprise",
            Emotion::Trust => "trust",
            Emotion::Anger => "anger",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Negative => "negative",
            Emotion::Sadness => "sadness",
        }
    }

    /// Coarse polarity labels, damped before aggregation.
    pub fn is_polarity(&self) -> bool {
        matches!(self, Emotion::Positive | Emotion::Negative)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
