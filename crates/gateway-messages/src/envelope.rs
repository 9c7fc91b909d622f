//! The JSON wire envelope exchanged with a kernel gateway socket.

use bytes::Bytes;
use jupyter_protocol::{Channel, Header, JupyterMessage, JupyterMessageContent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::buffers::{decode_buffers, encode_buffers};

/// Error type for wire codec failures.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The `content` object did not match the `msg_type` tag in the header.
    #[error("failed to parse message content: {0}")]
    Content(#[from] anyhow::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Intermediate shape for inbound frames.
///
/// `content` stays raw JSON until the header's `msg_type` selects the
/// variant; `parent_header` may be `{}`, `null`, or absent on frames from
/// some gateways, all of which read as `None`.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    header: Header,

    #[serde(
        default,
        deserialize_with = "jupyter_protocol::deserialize_parent_header"
    )]
    parent_header: Option<Header>,

    #[serde(default)]
    metadata: Value,

    content: Value,

    #[serde(default, deserialize_with = "decode_buffers")]
    buffers: Vec<Bytes>,

    #[serde(default)]
    channel: Option<Channel>,
}

/// A Jupyter message as it appears on the gateway WebSocket, in either
/// direction. Content is the tagged union keyed by `header.msg_type`;
/// buffers are base64 on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct WireEnvelope {
    pub header: Header,
    pub parent_header: Option<Header>,
    pub metadata: Value,
    pub content: JupyterMessageContent,

    #[serde(serialize_with = "encode_buffers")]
    pub buffers: Vec<Bytes>,

    pub channel: Option<Channel>,
}

impl WireEnvelope {
    /// Parse one inbound text frame.
    pub fn from_wire_json(text: &str) -> Result<Self, WireError> {
        let raw: RawEnvelope = serde_json::from_str(text)?;
        let content = JupyterMessageContent::from_type_and_content(&raw.header.msg_type, raw.content)?;
        Ok(WireEnvelope {
            header: raw.header,
            parent_header: raw.parent_header,
            metadata: raw.metadata,
            content,
            buffers: raw.buffers,
            channel: raw.channel,
        })
    }

    /// Serialize for an outbound text frame.
    pub fn to_wire_json(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Direct deserialization support: `serde_json::from_str::<WireEnvelope>(...)`.
impl<'de> Deserialize<'de> for WireEnvelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawEnvelope::deserialize(deserializer)?;
        let content = JupyterMessageContent::from_type_and_content(&raw.header.msg_type, raw.content)
            .map_err(serde::de::Error::custom)?;
        Ok(WireEnvelope {
            header: raw.header,
            parent_header: raw.parent_header,
            metadata: raw.metadata,
            content,
            buffers: raw.buffers,
            channel: raw.channel,
        })
    }
}

impl From<JupyterMessage> for WireEnvelope {
    fn from(msg: JupyterMessage) -> Self {
        WireEnvelope {
            header: msg.header,
            parent_header: msg.parent_header,
            metadata: msg.metadata,
            content: msg.content,
            buffers: msg.buffers,
            channel: msg.channel,
        }
    }
}

impl From<WireEnvelope> for JupyterMessage {
    fn from(envelope: WireEnvelope) -> Self {
        JupyterMessage {
            zmq_identities: Vec::new(),
            header: envelope.header,
            parent_header: envelope.parent_header,
            metadata: envelope.metadata,
            content: envelope.content,
            buffers: envelope.buffers,
            channel: envelope.channel,
        }
    }
}
