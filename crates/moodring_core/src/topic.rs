//! Channel topic state: locate the mood line, rewrite just its value.

/// Marker preceding the mood value inside a free-text topic.
pub const MOOD_MARKER: &str = "Prevailing mood:";

/// A topic split around the first marker's value.
///
/// `prefix` runs through the end of the marker, `value` up to (not
/// including) the next `\n`, `suffix` is everything after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicParts<'a> {
    pub prefix: &'a str,
    pub value: &'a str,
    pub suffix: &'a str,
}

impl<'a> TopicParts<'a> {
    /// `None` when the topic has no marker.
    pub fn parse(topic: &'a str) -> Option<Self> {
        let start = topic.find(MOOD_MARKER)? + MOOD_MARKER.len();
        let end = topic[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(topic.len());
        Some(Self {
            prefix: &topic[..start],
            value: &topic[start..end],
            suffix: &topic[end..],
        })
    }

    /// The mood as displayed, without surrounding whitespace.
    pub fn mood(&self) -> &'a str {
        self.value.trim()
    }

    /// Recombine with a new mood in place of the old value.
    pub fn render(&self, mood: &str) -> String {
        format!("{} {}{}", self.prefix, mood, self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicUpdate {
    pub topic: String,
    pub changed: bool,
}

/// Fold `mood` into `current`. Pure; the caller writes only when `changed`.
pub fn update_topic(current: &str, mood: &str) -> TopicUpdate {
    match TopicParts::parse(current) {
        Some(parts) if parts.mood().to_lowercase() == mood.trim().to_lowercase() => TopicUpdate {
            topic: current.to_string(),
            changed: false,
        },
        Some(parts) => TopicUpdate {
            topic: parts.render(mood),
            changed: true,
        },
        None if current.is_empty() => TopicUpdate {
            topic: format!("{} {}", MOOD_MARKER, mood),
            changed: true,
        },
        None => TopicUpdate {
            topic: format!("{}\n{} {}", current, MOOD_MARKER, mood),
            changed: true,
        },
    }
}

/// The mood currently shown in `topic`, if any.
pub fn current_mood(topic: &str) -> Option<&str> {
    TopicParts::parse(topic).map(|p| p.mood())
}
