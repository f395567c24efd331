//! Socket.IO packets carried over the Engine.IO websocket transport.
//!
//! Every websocket text frame holds one Engine.IO packet whose first byte is
//! its type. Message packets (`4`) wrap a Socket.IO packet, so an event on
//! the default namespace reads `42["receiveMessage",{...}]`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{ChatMessage, RealtimeEvent, UserId};

pub const RECEIVE_MESSAGE: &str = "receiveMessage";
pub const USER_ONLINE: &str = "userOnline";
pub const USER_OFFLINE: &str = "userOffline";
pub const SEND_MESSAGE: &str = "sendMessage";

/// Socket.IO CONNECT to the default namespace.
pub const CONNECT: &str = "40";
/// Socket.IO DISCONNECT from the default namespace.
pub const DISCONNECT: &str = "41";
/// Engine.IO answer to a server ping.
pub const PONG: &str = "3";

/// Frames the client emits.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    SendMessage(SendMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub message: String,
}

impl From<&ChatMessage> for OutboundEvent {
    fn from(message: &ChatMessage) -> Self {
        OutboundEvent::SendMessage(SendMessage {
            sender_id: message.sender_id.clone(),
            receiver_id: message.receiver_id.clone(),
            message: message.message.clone(),
        })
    }
}

/// Payload of the Engine.IO OPEN packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub ping_interval: u64,
    pub ping_timeout: u64,
}

impl Handshake {
    /// How long the server may stay silent before the session is dead.
    pub fn liveness(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// A decoded inbound packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Open(Handshake),
    Ping,
    Close,
    /// The server accepted our namespace CONNECT.
    Connected,
    ConnectRefused(String),
    Disconnected,
    Event(RealtimeEvent),
    /// Well-formed, but nothing this client reacts to.
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("empty packet")]
    Empty,
    #[error("unknown packet type `{0}`")]
    UnknownType(String),
    #[error("event packet without a name")]
    MissingEventName,
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Presence payloads are either a bare id or `{"userId": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PresencePayload {
    Id(UserId),
    Object {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
}

impl From<PresencePayload> for UserId {
    fn from(payload: PresencePayload) -> Self {
        match payload {
            PresencePayload::Id(id) | PresencePayload::Object { user_id: id } => id,
        }
    }
}

pub fn encode(event: &OutboundEvent) -> serde_json::Result<String> {
    let args = match event {
        OutboundEvent::SendMessage(message) => serde_json::to_string(&(SEND_MESSAGE, message))?,
    };
    Ok(format!("42{args}"))
}

pub fn decode(text: &str) -> Result<Inbound, FrameError> {
    let (kind, rest) = split_type(text)?;
    match kind {
        '0' => Ok(Inbound::Open(serde_json::from_str(rest)?)),
        '1' => Ok(Inbound::Close),
        '2' => Ok(Inbound::Ping),
        // pong, upgrade, noop
        '3' | '5' | '6' => Ok(Inbound::Ignored),
        '4' => decode_socket_packet(rest),
        other => Err(FrameError::UnknownType(other.to_string())),
    }
}

fn split_type(text: &str) -> Result<(char, &str), FrameError> {
    let kind = text.chars().next().ok_or(FrameError::Empty)?;
    Ok((kind, &text[kind.len_utf8()..]))
}

fn decode_socket_packet(packet: &str) -> Result<Inbound, FrameError> {
    let (kind, body) = split_type(packet)?;

    // Only the default namespace is joined; it is never spelled out.
    if body.starts_with('/') {
        return Ok(Inbound::Ignored);
    }

    match kind {
        '0' => Ok(Inbound::Connected),
        '1' => Ok(Inbound::Disconnected),
        '2' => decode_event(body),
        '4' => Ok(Inbound::ConnectRefused(connect_error(body))),
        // ack, binary event, binary ack
        '3' | '5' | '6' => Ok(Inbound::Ignored),
        other => Err(FrameError::UnknownType(format!("4{other}"))),
    }
}

fn decode_event(body: &str) -> Result<Inbound, FrameError> {
    // An ack id may precede the argument array.
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
    let mut args = serde_json::from_str::<Vec<Value>>(body)?.into_iter();

    let Some(Value::String(name)) = args.next() else {
        return Err(FrameError::MissingEventName);
    };
    let data = args.next().unwrap_or(Value::Null);

    let event = match name.as_str() {
        RECEIVE_MESSAGE => RealtimeEvent::MessageReceived(serde_json::from_value(data)?),
        USER_ONLINE => {
            RealtimeEvent::UserOnline(serde_json::from_value::<PresencePayload>(data)?.into())
        }
        USER_OFFLINE => {
            RealtimeEvent::UserOffline(serde_json::from_value::<PresencePayload>(data)?.into())
        }
        _ => return Ok(Inbound::Ignored),
    };
    Ok(Inbound::Event(event))
}

fn connect_error(body: &str) -> String {
    #[derive(Deserialize)]
    struct ConnectError {
        message: String,
    }

    serde_json::from_str::<ConnectError>(body)
        .map(|error| error.message)
        .unwrap_or_else(|_| body.to_string())
}
