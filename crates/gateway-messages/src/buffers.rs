//! Base64 codec for side-channel message buffers.
//!
//! WebSocket gateway frames are JSON, so binary buffers travel as
//! base64-encoded strings. Missing and `null` buffer fields both read as
//! an empty list.

use base64::prelude::*;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serialize buffers as base64 strings.
///
/// Used with `#[serde(serialize_with = "encode_buffers")]`
pub fn encode_buffers<S>(buffers: &[Bytes], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    buffers
        .iter()
        .map(|bytes| BASE64_STANDARD.encode(bytes))
        .collect::<Vec<_>>()
        .serialize(serializer)
}

/// Deserialize base64 buffer strings into `Bytes`, tolerating `null`
/// and missing fields.
///
/// Used with `#[serde(default, deserialize_with = "decode_buffers")]`
pub fn decode_buffers<'de, D>(deserializer: D) -> Result<Vec<Bytes>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = Option::<Vec<String>>::deserialize(deserializer)?;
    encoded
        .unwrap_or_default()
        .iter()
        .map(|s| {
            BASE64_STANDARD
                .decode(s)
                .map(Bytes::from)
                .map_err(serde::de::Error::custom)
        })
        .collect()
}
