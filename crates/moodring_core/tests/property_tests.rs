//! Property-based tests for moodring_core.
//!
//! Invariants of the damping policy, the aggregator and the topic updater
//! that must hold for every input, not just hand-picked examples.

use moodring_core::{
    author_weight, update_topic, ChatMessage, Emotion, EmotionAggregator, Lexicon, TopicParts,
    Window, MOOD_MARKER,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

const VOCAB: &[&str] = &[
    "happy", "sad", "terror", "yay", "rage", "trust", "gross", "wow", "table", "hope", "cry",
    "friends", "the", "worry",
];

/// A message drawn from a small author pool and a mixed vocabulary.
fn arb_message() -> impl Strategy<Value = ChatMessage> {
    (0usize..5, prop::collection::vec(prop::sample::select(VOCAB), 0..8)).prop_map(
        |(author, words)| ChatMessage::new(format!("user{}", author), words.join(" ")),
    )
}

fn arb_window() -> impl Strategy<Value = Vec<ChatMessage>> {
    prop::collection::vec(arb_message(), 0..=18)
}

/// Topic text without the marker.
fn arb_plain_topic() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!\n]{0,60}"
}

fn arb_mood() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,12}"
}

// ============================================================================
// Author weighting
// ============================================================================

proptest! {
    #[test]
    fn weight_never_exceeds_one(n in 1usize..10_000) {
        let w = author_weight(n);
        prop_assert!(w > 0.0);
        prop_assert!(w <= 1.0);
    }

    #[test]
    fn weight_is_non_increasing(n in 1usize..10_000) {
        prop_assert!(author_weight(n + 1) <= author_weight(n));
    }

    #[test]
    fn weight_strictly_decays_past_one(n in 2usize..10_000) {
        prop_assert!(author_weight(n + 1) < author_weight(n));
    }
}

// ============================================================================
// Aggregation
// ============================================================================

proptest! {
    /// Reordering a window never changes the accumulated scores.
    #[test]
    fn aggregation_is_order_independent(
        (msgs, perm) in arb_window().prop_flat_map(|m| {
            let len = m.len();
            (Just(m), Just((0..len).collect::<Vec<_>>()).prop_shuffle())
        })
    ) {
        let lex = Lexicon::builtin();
        let in_order = Window::from_recent(msgs.clone(), 18);
        let shuffled = Window::from_recent(perm.iter().map(|&i| msgs[i].clone()).collect(), 18);

        let a = EmotionAggregator::new(&lex).aggregate(&in_order, &in_order.author_counts());
        let b = EmotionAggregator::new(&lex).aggregate(&shuffled, &shuffled.author_counts());

        for e in Emotion::ALL {
            let x = a.scores.get(&e).copied().unwrap_or(0.0);
            let y = b.scores.get(&e).copied().unwrap_or(0.0);
            prop_assert!((x - y).abs() < 1e-9, "{}: {} vs {}", e, x, y);
        }
    }

    /// The prevailing emotion, when present, holds the maximum score.
    #[test]
    fn prevailing_is_the_maximum(msgs in arb_window()) {
        let lex = Lexicon::builtin();
        let w = Window::from_recent(msgs, 18);
        let agg = EmotionAggregator::new(&lex).aggregate(&w, &w.author_counts());
        match agg.prevailing {
            Some(top) => {
                let best = agg.scores[&top];
                prop_assert!(best > 0.0);
                for (e, s) in &agg.scores {
                    prop_assert!(*s <= best);
                    if *s == best {
                        prop_assert!(top <= *e);
                    }
                }
            }
            None => prop_assert!(agg.scores.values().all(|s| *s <= 0.0)),
        }
    }

    #[test]
    fn scores_are_non_negative(msgs in arb_window()) {
        let lex = Lexicon::builtin();
        let w = Window::from_recent(msgs, 18);
        let agg = EmotionAggregator::new(&lex).aggregate(&w, &w.author_counts());
        prop_assert!(agg.scores.values().all(|s| *s >= 0.0 && s.is_finite()));
    }
}

// ============================================================================
// Topic state
// ============================================================================

proptest! {
    /// Applying the same mood twice leaves the second call a no-op.
    #[test]
    fn update_is_idempotent(topic in "[a-zA-Z0-9 :\n]{0,80}", mood in arb_mood()) {
        let first = update_topic(&topic, &mood);
        let second = update_topic(&first.topic, &mood);
        prop_assert!(!second.changed);
        prop_assert_eq!(second.topic, first.topic);
    }

    /// Text outside the mood value survives byte-for-byte.
    #[test]
    fn update_preserves_surroundings(
        before in arb_plain_topic(),
        after in "(\n[a-z ]{0,20}){0,3}",
        old in arb_mood(),
        new in arb_mood(),
    ) {
        prop_assume!(old.to_lowercase() != new.to_lowercase());
        let topic = format!("{}{} {}{}", before, MOOD_MARKER, old, after);
        let up = update_topic(&topic, &new);
        prop_assert!(up.changed);
        prop_assert_eq!(up.topic, format!("{}{} {}{}", before, MOOD_MARKER, new, after));
    }

    /// A marker-free topic gains exactly one mood line at the end.
    #[test]
    fn update_appends_when_marker_missing(topic in arb_plain_topic(), mood in arb_mood()) {
        let up = update_topic(&topic, &mood);
        prop_assert!(up.changed);
        let parts = TopicParts::parse(&up.topic).unwrap();
        prop_assert_eq!(parts.mood(), mood.as_str());
        prop_assert!(up.topic.starts_with(topic.as_str()));
        prop_assert_eq!(up.topic.matches(MOOD_MARKER).count(), 1);
    }
}
