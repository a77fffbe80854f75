//! Weighted emotion aggregation over one window.

use crate::emotion::{Emotion, EmotionScores};
use crate::lexicon::EmotionScorer;
use crate::window::{author_weight, AuthorCounts, Window};

/// Default multiplier applied to `positive`/`negative` before weighting.
pub const DEFAULT_POLARITY_DAMPING: f64 = 0.1;

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub scores: EmotionScores,
    pub prevailing: Option<Emotion>,
}

/// Sums weighted lexicon scores across a window.
pub struct EmotionAggregator<'a> {
    scorer: &'a dyn EmotionScorer,
    polarity_damping: f64,
}

impl<'a> EmotionAggregator<'a> {
    pub fn new(scorer: &'a dyn EmotionScorer) -> Self {
        Self {
            scorer,
            polarity_damping: DEFAULT_POLARITY_DAMPING,
        }
    }

    pub fn with_polarity_damping(mut self, damping: f64) -> Self {
        self.polarity_damping = damping.max(0.0);
        self
    }

    /// Authors missing from `counts` are weighted as single-message authors.
    pub fn aggregate(&self, window: &Window, counts: &AuthorCounts) -> Aggregate {
        let mut scores = EmotionScores::new();
        for msg in window.messages() {
            let weight = author_weight(counts.get(&msg.author).copied().unwrap_or(1));
            for (emotion, raw) in self.scorer.score(&msg.content) {
                let raw = if emotion.is_polarity() {
                    raw * self.polarity_damping
                } else {
                    raw
                };
                *scores.entry(emotion).or_insert(0.0) += raw * weight;
            }
        }
        let prevailing = prevailing_emotion(&scores);
        Aggregate { scores, prevailing }
    }
}

/// Arg-max by accumulated score; ties go to the earliest label in canonical
/// order. `None` when nothing scored above zero.
pub fn prevailing_emotion(scores: &EmotionScores) -> Option<Emotion> {
    let mut best: Option<(Emotion, f64)> = None;
    for (&emotion, &score) in scores {
        if score <= 0.0 || !score.is_finite() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((emotion, score)),
        }
    }
    best.map(|(e, _)| e)
}
