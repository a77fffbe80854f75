use anyhow::Context;
use clap::Parser;
use moodring_core::{Lexicon, MoodLabeler, MoodPipeline, MoodringConfig, PassError, PassOutcome};
use moodring_discord::{DiscordRest, GatewayClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "moodring.toml")]
    config: PathBuf,

    /// Bot token (overrides config and DISCORD_BOT_TOKEN)
    #[arg(long, env = "MOODRING_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// NRC word-level lexicon file (overrides config)
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Seed for synonym selection (overrides config)
    #[arg(long)]
    seed: Option<u64>,
}

fn load_lexicon(path: Option<&PathBuf>) -> anyhow::Result<Lexicon> {
    match path {
        Some(p) => {
            let lex = Lexicon::from_path(p)
                .with_context(|| format!("Failed to load lexicon from {}", p.display()))?;
            info!("Loaded lexicon with {} words from {}", lex.len(), p.display());
            Ok(lex)
        }
        None => {
            let lex = Lexicon::builtin();
            info!("Using built-in lexicon ({} words)", lex.len());
            Ok(lex)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    info!("Initializing Moodring...");
    let mut config = MoodringConfig::load_or_default(&args.config);
    if let Some(token) = args.token {
        config.discord.token = Some(token);
    }
    if let Some(path) = args.lexicon {
        config.mood.lexicon_path = Some(path);
    }
    if let Some(seed) = args.seed {
        config.mood.seed = Some(seed);
    }
    let token = config
        .discord
        .token
        .clone()
        .context("No bot token: set DISCORD_BOT_TOKEN or [discord].token")?;

    let lexicon = load_lexicon(config.mood.lexicon_path.as_ref())?;
    let labeler = match config.mood.seed {
        Some(seed) => MoodLabeler::seeded(seed),
        None => MoodLabeler::from_entropy(),
    };
    info!(
        "Window of {} messages, polarity damping {}",
        config.mood.effective_window_size(),
        config.mood.polarity_damping
    );

    let rest = Arc::new(DiscordRest::new(&config.discord.api_base, &token));
    let pipeline = Arc::new(MoodPipeline::new(
        rest,
        Arc::new(lexicon),
        labeler,
        config.mood.clone(),
    ));

    let (gateway, mut triggers) = GatewayClient::new(&config.discord.gateway_url, token)?;
    info!("Listening on {}", gateway.url());

    loop {
        tokio::select! {
            trigger = triggers.recv() => {
                let Some(trigger) = trigger else {
                    warn!("Gateway stopped delivering messages");
                    break;
                };
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    match pipeline.on_message(&trigger).await {
                        Ok(PassOutcome::Updated { emotion, mood, .. }) => {
                            info!("[{}] {} -> {}", trigger.channel, emotion, mood);
                        }
                        Ok(outcome) => tracing::debug!("[{}] {:?}", trigger.channel, outcome),
                        Err(e @ PassError::WriteTopic { .. }) => {
                            warn!("{}; keeping previous topic until the next message", e);
                        }
                        Err(e) => error!("{}", e),
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    gateway.shutdown();
    Ok(())
}
