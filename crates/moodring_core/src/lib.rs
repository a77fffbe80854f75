pub mod aggregate;
pub mod config;
pub mod emotion;
pub mod labeler;
pub mod lexicon;
pub mod pipeline;
pub mod topic;
pub mod window;

pub use aggregate::{prevailing_emotion, Aggregate, EmotionAggregator};
pub use config::{DiscordConfig, MoodConfig, MoodringConfig};
pub use emotion::{Emotion, EmotionScores};
pub use labeler::{capitalize, MoodLabeler, SynonymTable};
pub use lexicon::{EmotionScorer, Lexicon, LexiconError};
pub use pipeline::{ChannelService, MessageTrigger, MoodPipeline, PassError, PassOutcome};
pub use topic::{update_topic, TopicParts, TopicUpdate, MOOD_MARKER};
pub use window::{author_weight, AuthorCounts, AuthorId, ChannelId, ChatMessage, Window};
