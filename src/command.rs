//! Cross-context commands sent to the player by other browsing contexts.
//!
//! Two payload shapes exist in the wild: the structured JSON command
//! `{"type":"gotoPage","pageNumber":7}` and the bare legacy string
//! `start-audio`. Payloads are only looked at once the sender's origin is on
//! the allow-list.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

pub const START_AUDIO: &str = "start-audio";

/// Structured command accepted from another context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export)]
pub enum PageRequest {
    GotoPage {
        #[serde(rename = "pageNumber")]
        page_number: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyCommand {
    StartAudio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    GotoPage { page_number: u32 },
    Legacy(LegacyCommand),
    Unrecognized(String),
}

/// A raw message together with the origin of its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub origin: String,
    pub data: String,
}

#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|origin| origin.into().trim_end_matches('/').to_string())
                .collect(),
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.allowed.iter().any(|allowed| allowed == origin)
    }

    /// Parse `message` if its origin is trusted; `None` otherwise.
    pub fn accept(&self, message: &InboundMessage) -> Option<ParsedCommand> {
        if !self.allows(&message.origin) {
            warn!(origin = %message.origin, "Discarding message from untrusted origin");
            return None;
        }
        Some(parse_command(&message.data))
    }
}

pub fn parse_command(data: &str) -> ParsedCommand {
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(value) => parse_structured(value),
        Err(_) if data == START_AUDIO => ParsedCommand::Legacy(LegacyCommand::StartAudio),
        Err(err) => {
            debug!(payload = %data, "Payload is neither JSON nor a legacy command: {err}");
            ParsedCommand::Unrecognized(format!("unparseable payload: {err}"))
        }
    }
}

fn parse_structured(value: serde_json::Value) -> ParsedCommand {
    // A JSON-encoded string may itself carry the legacy command.
    if value.as_str() == Some(START_AUDIO) {
        return ParsedCommand::Legacy(LegacyCommand::StartAudio);
    }
    match serde_json::from_value::<PageRequest>(value) {
        Ok(PageRequest::GotoPage { page_number }) => ParsedCommand::GotoPage { page_number },
        Err(err) => ParsedCommand::Unrecognized(format!("unsupported command: {err}")),
    }
}
