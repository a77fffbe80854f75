use moodring_core::{AuthorId, ChannelId, ChatMessage, MessageTrigger};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const OP_DISPATCH: u8 = 0;
pub const OP_HEARTBEAT: u8 = 1;
pub const OP_IDENTIFY: u8 = 2;
pub const OP_RECONNECT: u8 = 7;
pub const OP_INVALID_SESSION: u8 = 9;
pub const OP_HELLO: u8 = 10;
pub const OP_HEARTBEAT_ACK: u8 = 11;

pub const INTENT_GUILDS: u64 = 1 << 0;
pub const INTENT_GUILD_MESSAGES: u64 = 1 << 9;
pub const INTENT_MESSAGE_CONTENT: u64 = 1 << 15;

/// Raw gateway frame.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ready {
    pub user: User,
}

/// A message object, shared by `MESSAGE_CREATE` and the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordMessage {
    pub id: String,
    pub channel_id: String,
    pub author: User,
    #[serde(default)]
    pub content: String,
}

impl DiscordMessage {
    pub fn is_bot(&self) -> bool {
        self.author.bot.unwrap_or(false)
    }

    pub fn to_trigger(&self) -> MessageTrigger {
        MessageTrigger {
            channel: ChannelId(self.channel_id.clone()),
            author: AuthorId(self.author.id.clone()),
            content: self.content.clone(),
            author_is_bot: self.is_bot(),
        }
    }
}

impl From<DiscordMessage> for ChatMessage {
    fn from(msg: DiscordMessage) -> Self {
        let is_bot = msg.is_bot();
        ChatMessage {
            id: msg.id,
            author: AuthorId(msg.author.id),
            content: msg.content,
            is_bot,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordChannel {
    pub id: String,
    #[serde(default)]
    pub topic: Option<String>,
}

/// What the connection loop needs to act on.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Hello(Hello),
    Ready { seq: Option<u64>, user: User },
    MessageCreate { seq: Option<u64>, message: DiscordMessage },
    OtherDispatch { seq: Option<u64>, name: String },
    HeartbeatRequest,
    HeartbeatAck,
    Reconnect,
    InvalidSession,
    Unknown(u8),
}

impl GatewayEvent {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let payload: GatewayPayload = serde_json::from_str(text)?;
        let seq = payload.s;
        let event = match payload.op {
            OP_HELLO => GatewayEvent::Hello(serde_json::from_value(payload.d)?),
            OP_DISPATCH => match payload.t.as_deref() {
                Some("READY") => {
                    let ready: Ready = serde_json::from_value(payload.d)?;
                    GatewayEvent::Ready { seq, user: ready.user }
                }
                Some("MESSAGE_CREATE") => GatewayEvent::MessageCreate {
                    seq,
                    message: serde_json::from_value(payload.d)?,
                },
                other => GatewayEvent::OtherDispatch {
                    seq,
                    name: other.unwrap_or_default().to_string(),
                },
            },
            OP_HEARTBEAT => GatewayEvent::HeartbeatRequest,
            OP_HEARTBEAT_ACK => GatewayEvent::HeartbeatAck,
            OP_RECONNECT => GatewayEvent::Reconnect,
            OP_INVALID_SESSION => GatewayEvent::InvalidSession,
            op => GatewayEvent::Unknown(op),
        };
        Ok(event)
    }

    pub fn seq(&self) -> Option<u64> {
        match self {
            GatewayEvent::Ready { seq, .. }
            | GatewayEvent::MessageCreate { seq, .. }
            | GatewayEvent::OtherDispatch { seq, .. } => *seq,
            _ => None,
        }
    }
}

pub fn identify_payload(token: &str, intents: u64) -> Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "moodring",
                "device": "moodring",
            },
        },
    })
}

pub fn heartbeat_payload(seq: Option<u64>) -> Value {
    json!({ "op": OP_HEARTBEAT, "d": seq })
}
