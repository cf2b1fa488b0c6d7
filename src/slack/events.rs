//! Slack Events API envelopes, decoded once into [`ChatEvent`].

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed event envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("event envelope failed token verification")]
    Unverified,
}

/// One chat message the bot may have to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub event_id: String,
    pub text: String,
    pub requester_id: String,
    pub channel_id: String,
    /// Set when the message was posted by an app rather than a person.
    pub bot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Handshake { challenge: String },
    Mention(InboundEvent),
    DirectMessage(InboundEvent),
    Ignored { reason: &'static str },
}

/// Every envelope kind carries the verification token at the top level.
#[derive(Debug, Deserialize)]
struct EnvelopeHeader {
    #[serde(default)]
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event_id: String,
        event: InnerEvent,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InnerEvent {
    AppMention(MessagePayload),
    Message(MessagePayload),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    channel: String,
    #[serde(default)]
    channel_type: Option<String>,
    #[serde(default)]
    subtype: Option<String>,
}

// Edits, deletions and membership notices are not questions.
const IGNORED_SUBTYPES: &[&str] = &[
    "message_changed",
    "message_deleted",
    "channel_join",
    "channel_leave",
];

impl MessagePayload {
    fn into_inbound(self, event_id: String) -> Result<InboundEvent, &'static str> {
        if let Some(subtype) = self.subtype.as_deref()
            && IGNORED_SUBTYPES.contains(&subtype)
        {
            return Err("message subtype is not actionable");
        }
        let requester_id = match self.user {
            Some(user) if !user.is_empty() => user,
            _ => return Err("message has no author"),
        };
        Ok(InboundEvent {
            event_id,
            text: self.text,
            requester_id,
            channel_id: self.channel,
            bot_id: self.bot_id,
        })
    }
}

pub struct EnvelopeDecoder {
    verification_token: SecretString,
}

impl EnvelopeDecoder {
    pub fn new(verification_token: SecretString) -> Self {
        Self { verification_token }
    }

    pub fn decode(&self, body: &[u8]) -> Result<ChatEvent, EnvelopeError> {
        let header: EnvelopeHeader = serde_json::from_slice(body)?;
        self.verify(&header.token)?;

        let event = match serde_json::from_slice::<Envelope>(body)? {
            Envelope::UrlVerification { challenge } => ChatEvent::Handshake { challenge },
            Envelope::EventCallback { event_id, event } => {
                match event {
                    InnerEvent::AppMention(payload) => match payload.into_inbound(event_id) {
                        Ok(inbound) => ChatEvent::Mention(inbound),
                        Err(reason) => ChatEvent::Ignored { reason },
                    },
                    InnerEvent::Message(payload) => {
                        if payload.channel_type.as_deref() != Some("im") {
                            ChatEvent::Ignored {
                                reason: "message outside a direct conversation",
                            }
                        } else {
                            match payload.into_inbound(event_id) {
                                Ok(inbound) => ChatEvent::DirectMessage(inbound),
                                Err(reason) => ChatEvent::Ignored { reason },
                            }
                        }
                    }
                    InnerEvent::Other => ChatEvent::Ignored {
                        reason: "unsupported inner event type",
                    },
                }
            }
            Envelope::Unsupported => ChatEvent::Ignored {
                reason: "unsupported envelope type",
            },
        };

        Ok(event)
    }

    fn verify(&self, token: &str) -> Result<(), EnvelopeError> {
        let expected = self.verification_token.expose_secret().as_bytes();
        let given = token.as_bytes();
        if expected.is_empty() || !constant_time_eq(expected, given) {
            return Err(EnvelopeError::Unverified);
        }
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
