//! One mood pass per incoming message.
//!
//! The pipeline only sees plain data through [`ChannelService`]; the chat
//! client that implements it lives elsewhere. Topic read-compute-write runs
//! under a per-channel lock so overlapping passes on one channel cannot
//! write a mood over a stale topic.

use crate::aggregate::EmotionAggregator;
use crate::config::MoodConfig;
use crate::emotion::Emotion;
use crate::labeler::{capitalize, MoodLabeler};
use crate::lexicon::EmotionScorer;
use crate::topic::{current_mood, update_topic};
use crate::window::{AuthorId, ChannelId, ChatMessage, Window};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Chat platform operations the pipeline depends on.
#[async_trait]
pub trait ChannelService: Send + Sync {
    /// Up to `limit` most recent messages, oldest first, including the trigger.
    async fn fetch_recent(&self, channel: &ChannelId, limit: usize) -> anyhow::Result<Vec<ChatMessage>>;
    async fn read_topic(&self, channel: &ChannelId) -> anyhow::Result<Option<String>>;
    async fn write_topic(&self, channel: &ChannelId, topic: &str) -> anyhow::Result<()>;
}

/// "A new message arrived in this channel."
#[derive(Debug, Clone)]
pub struct MessageTrigger {
    pub channel: ChannelId,
    pub author: AuthorId,
    pub content: String,
    pub author_is_bot: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Trigger came from a bot.
    Ignored,
    /// Window carried no emotional signal; nothing written.
    NoSignal,
    /// Topic already shows this mood; nothing written.
    Unchanged { emotion: Emotion, mood: String },
    Updated {
        emotion: Emotion,
        mood: String,
        topic: String,
    },
}

#[derive(Debug, Error)]
pub enum PassError {
    #[error("failed to fetch history for channel {channel}: {source}")]
    Fetch {
        channel: ChannelId,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to read topic for channel {channel}: {source}")]
    ReadTopic {
        channel: ChannelId,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to write topic for channel {channel}: {source}")]
    WriteTopic {
        channel: ChannelId,
        #[source]
        source: anyhow::Error,
    },
}

pub struct MoodPipeline {
    service: Arc<dyn ChannelService>,
    scorer: Arc<dyn EmotionScorer>,
    labeler: Mutex<MoodLabeler>,
    config: MoodConfig,
    channel_locks: Mutex<HashMap<ChannelId, Arc<tokio::sync::Mutex<()>>>>,
}

impl MoodPipeline {
    pub fn new(
        service: Arc<dyn ChannelService>,
        scorer: Arc<dyn EmotionScorer>,
        labeler: MoodLabeler,
        config: MoodConfig,
    ) -> Self {
        Self {
            service,
            scorer,
            labeler: Mutex::new(labeler),
            config,
            channel_locks: Mutex::new(HashMap::new()),
        }
    }

    fn channel_lock(&self, channel: &ChannelId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .channel_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(channel.clone()).or_default().clone()
    }

    /// Pick a display word for `emotion`, logging a related word if enabled.
    fn label(&self, emotion: Emotion) -> String {
        let mut labeler = self
            .labeler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let word = labeler.label(emotion);
        if self.config.related_word_diagnostics {
            let related = labeler.related_word(&word, 1, 10);
            tracing::debug!("Related word for '{}': {}", word, related);
        }
        word
    }

    /// Run one full pass. External failures surface as `PassError`; the next
    /// trigger retries from scratch.
    pub async fn on_message(&self, trigger: &MessageTrigger) -> Result<PassOutcome, PassError> {
        if trigger.author_is_bot {
            return Ok(PassOutcome::Ignored);
        }
        tracing::debug!("[{}] {}: {}", trigger.channel, trigger.author, trigger.content);

        let channel = &trigger.channel;
        let limit = self.config.effective_window_size();
        let history = self
            .service
            .fetch_recent(channel, limit)
            .await
            .map_err(|source| PassError::Fetch {
                channel: channel.clone(),
                source,
            })?;
        let window = Window::from_recent(history, limit);
        let counts = window.author_counts();

        let aggregate = EmotionAggregator::new(self.scorer.as_ref())
            .with_polarity_damping(self.config.polarity_damping)
            .aggregate(&window, &counts);
        tracing::debug!("[{}] emotion scores: {:?}", channel, aggregate.scores);

        let Some(emotion) = aggregate.prevailing else {
            tracing::debug!("[{}] no prevailing mood in {} messages", channel, window.len());
            return Ok(PassOutcome::NoSignal);
        };
        let mood = capitalize(&self.label(emotion));
        tracing::info!("[{}] most prevailing mood: {} ({})", channel, emotion, mood);

        let lock = self.channel_lock(channel);
        let _guard = lock.lock().await;

        let current = self
            .service
            .read_topic(channel)
            .await
            .map_err(|source| PassError::ReadTopic {
                channel: channel.clone(),
                source,
            })?
            .unwrap_or_default();
        tracing::debug!("[{}] previous mood: {:?}", channel, current_mood(&current));
        let update = update_topic(&current, &mood);
        if !update.changed {
            return Ok(PassOutcome::Unchanged { emotion, mood });
        }

        self.service
            .write_topic(channel, &update.topic)
            .await
            .map_err(|source| PassError::WriteTopic {
                channel: channel.clone(),
                source,
            })?;
        tracing::info!("[{}] topic updated", channel);

        Ok(PassOutcome::Updated {
            emotion,
            mood,
            topic: update.topic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeChannel {
        history: Mutex<Vec<ChatMessage>>,
        topic: Mutex<Option<String>>,
        writes: AtomicUsize,
        fail_fetch: bool,
        fail_write: bool,
        /// Largest fetch limit seen.
        max_limit: AtomicUsize,
        /// Pause inside the topic read so overlapping passes get a chance to run.
        read_delay: Option<Duration>,
        /// Passes currently between `read_topic` and the end of the topic section.
        open_sections: AtomicUsize,
        max_open_sections: AtomicUsize,
    }

    impl FakeChannel {
        fn with(history: Vec<ChatMessage>, topic: Option<&str>) -> Self {
            Self {
                history: Mutex::new(history),
                topic: Mutex::new(topic.map(str::to_string)),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ChannelService for FakeChannel {
        async fn fetch_recent(&self, _channel: &ChannelId, limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
            if self.fail_fetch {
                anyhow::bail!("history unavailable");
            }
            self.max_limit.fetch_max(limit, Ordering::SeqCst);
            let all = self.history.lock().unwrap().clone();
            let skip = all.len().saturating_sub(limit);
            Ok(all.into_iter().skip(skip).collect())
        }

        async fn read_topic(&self, _channel: &ChannelId) -> anyhow::Result<Option<String>> {
            let topic = self.topic.lock().unwrap().clone();
            if let Some(delay) = self.read_delay {
                let open = self.open_sections.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_open_sections.fetch_max(open, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                self.open_sections.fetch_sub(1, Ordering::SeqCst);
            }
            Ok(topic)
        }

        async fn write_topic(&self, _channel: &ChannelId, topic: &str) -> anyhow::Result<()> {
            if self.fail_write {
                anyhow::bail!("missing permissions");
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            *self.topic.lock().unwrap() = Some(topic.to_string());
            Ok(())
        }
    }

    fn pipeline(service: Arc<FakeChannel>, seed: u64) -> MoodPipeline {
        MoodPipeline::new(
            service,
            Arc::new(Lexicon::builtin()),
            MoodLabeler::seeded(seed),
            MoodConfig::default(),
        )
    }

    fn trigger(content: &str) -> MessageTrigger {
        MessageTrigger {
            channel: ChannelId::from("c1"),
            author: AuthorId::from("u1"),
            content: content.to_string(),
            author_is_bot: false,
        }
    }

    #[tokio::test]
    async fn test_bot_trigger_is_ignored() {
        let svc = Arc::new(FakeChannel::with(vec![ChatMessage::new("u1", "sad")], None));
        let p = pipeline(svc.clone(), 1);
        let mut t = trigger("sad");
        t.author_is_bot = true;
        assert_eq!(p.on_message(&t).await.unwrap(), PassOutcome::Ignored);
        assert_eq!(svc.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sets_topic_then_is_idempotent() {
        let history = vec![
            ChatMessage::new("u1", "I'm so sad today"),
            ChatMessage::new("u2", "sorry, that is sad"),
        ];
        let svc = Arc::new(FakeChannel::with(history, Some("General chat")));
        let p = pipeline(svc.clone(), 5);

        let first = p.on_message(&trigger("sad")).await.unwrap();
        let PassOutcome::Updated { emotion, mood, topic } = first else {
            panic!("expected an update");
        };
        assert_eq!(emotion, Emotion::Sadness);
        assert_eq!(topic, format!("General chat\nPrevailing mood: {}", mood));
        assert_eq!(svc.writes.load(Ordering::SeqCst), 1);

        // A second pass may pick another synonym, but never another emotion.
        let again = p.on_message(&trigger("sad")).await.unwrap();
        match again {
            PassOutcome::Unchanged { emotion, .. } => assert_eq!(emotion, Emotion::Sadness),
            PassOutcome::Updated { emotion, .. } => assert_eq!(emotion, Emotion::Sadness),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_mood_skips_write() {
        let svc = Arc::new(FakeChannel::with(
            vec![ChatMessage::new("u1", "sad")],
            None,
        ));
        // Predict the label a fresh labeler with this seed will publish.
        let expected = capitalize(&MoodLabeler::seeded(21).label(Emotion::Sadness));
        *svc.topic.lock().unwrap() = Some(format!("Prevailing mood: {}", expected.to_lowercase()));

        let p = pipeline(svc.clone(), 21);
        let outcome = p.on_message(&trigger("sad")).await.unwrap();
        assert_eq!(
            outcome,
            PassOutcome::Unchanged {
                emotion: Emotion::Sadness,
                mood: expected
            }
        );
        assert_eq!(svc.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_signal_writes_nothing() {
        let svc = Arc::new(FakeChannel::with(
            vec![ChatMessage::new("u1", "the table is by the door")],
            Some("topic"),
        ));
        let p = pipeline(svc.clone(), 1);
        assert_eq!(p.on_message(&trigger("x")).await.unwrap(), PassOutcome::NoSignal);
        assert_eq!(svc.writes.load(Ordering::SeqCst), 0);
        assert_eq!(svc.topic.lock().unwrap().as_deref(), Some("topic"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported() {
        let svc = Arc::new(FakeChannel {
            fail_fetch: true,
            ..Default::default()
        });
        let p = pipeline(svc, 1);
        let err = p.on_message(&trigger("sad")).await.unwrap_err();
        assert!(matches!(err, PassError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_write_failure_leaves_topic() {
        let svc = Arc::new(FakeChannel {
            history: Mutex::new(vec![ChatMessage::new("u1", "terror and panic")]),
            topic: Mutex::new(Some("keep me".to_string())),
            fail_write: true,
            ..Default::default()
        });
        let p = pipeline(svc.clone(), 1);
        let err = p.on_message(&trigger("x")).await.unwrap_err();
        assert!(matches!(err, PassError::WriteTopic { .. }));
        assert!(err.to_string().contains("c1"));
        assert_eq!(svc.topic.lock().unwrap().as_deref(), Some("keep me"));
    }

    #[tokio::test]
    async fn test_window_limit_is_respected() {
        let mut history: Vec<_> = (0..30).map(|_| ChatMessage::new("old", "terror")).collect();
        history.extend((0..18).map(|i| ChatMessage::new(format!("u{}", i), "yay")));
        let svc = Arc::new(FakeChannel::with(history, None));
        let p = pipeline(svc, 1);
        let outcome = p.on_message(&trigger("yay")).await.unwrap();
        let PassOutcome::Updated { emotion, .. } = outcome else {
            panic!("expected update");
        };
        assert_eq!(emotion, Emotion::Anticipation);
    }

    #[tokio::test]
    async fn test_oversized_window_config_is_capped() {
        let history: Vec<_> = (0..40).map(|_| ChatMessage::new("u1", "terror")).collect();
        let svc = Arc::new(FakeChannel::with(history, None));
        let mut config = MoodConfig::default();
        config.window_size = 25;
        let p = MoodPipeline::new(
            svc.clone(),
            Arc::new(Lexicon::builtin()),
            MoodLabeler::seeded(1),
            config,
        );
        p.on_message(&trigger("terror")).await.unwrap();
        assert_eq!(svc.max_limit.load(Ordering::SeqCst), 18);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_passes_do_not_interleave() {
        let svc = Arc::new(FakeChannel {
            history: Mutex::new(vec![ChatMessage::new("u1", "terror")]),
            topic: Mutex::new(Some("base".to_string())),
            read_delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let p = Arc::new(pipeline(svc.clone(), 8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let p = p.clone();
                tokio::spawn(async move { p.on_message(&trigger("terror")).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(svc.max_open_sections.load(Ordering::SeqCst), 1);
        let topic = svc.topic.lock().unwrap().clone().unwrap();
        assert!(topic.starts_with("base\nPrevailing mood: "));
        assert_eq!(topic.matches("Prevailing mood:").count(), 1);
    }
}
