use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::aggregate::DEFAULT_POLARITY_DAMPING;
use crate::window::{DEFAULT_WINDOW_SIZE, MAX_WINDOW_SIZE};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MoodringConfig {
    pub discord: DiscordConfig,
    pub mood: MoodConfig,
}

impl MoodringConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: MoodringConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DISCORD_BOT_TOKEN").or_else(|_| std::env::var("botToken")) {
            self.discord.token = Some(v);
        }
        if let Ok(v) = std::env::var("MOODRING_WINDOW_SIZE") {
            if let Ok(n) = v.parse() {
                self.mood.window_size = n;
            }
        }
        if let Ok(v) = std::env::var("MOODRING_SEED") {
            if let Ok(n) = v.parse() {
                self.mood.seed = Some(n);
            }
        }
        if let Ok(v) = std::env::var("MOODRING_LEXICON") {
            self.mood.lexicon_path = Some(PathBuf::from(v));
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub token: Option<String>,
    pub api_base: String,
    pub gateway_url: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://discord.com/api/v10".to_string(),
            gateway_url: "wss://gateway.discord.gg/?v=10&encoding=json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    /// Messages per pass, including the trigger. Clamped to `1..=18` by
    /// `effective_window_size`.
    pub window_size: usize,
    /// Multiplier for the coarse `positive`/`negative` labels.
    pub polarity_damping: f64,
    /// Fixed seed for synonym selection; random when unset.
    pub seed: Option<u64>,
    /// NRC word-level lexicon file; the built-in table is used when unset.
    pub lexicon_path: Option<PathBuf>,
    /// Log a related word next to each published mood.
    pub related_word_diagnostics: bool,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            polarity_damping: DEFAULT_POLARITY_DAMPING,
            seed: None,
            lexicon_path: None,
            related_word_diagnostics: false,
        }
    }
}

impl MoodConfig {
    pub fn effective_window_size(&self) -> usize {
        self.window_size.clamp(1, MAX_WINDOW_SIZE)
    }
}

// ============================================================================
// Tests
// ============================================================================
