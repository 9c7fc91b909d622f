//! Execute-request construction.

use std::collections::HashMap;

use jupyter_protocol::{Channel, ExecuteRequest, JupyterMessage};
use serde_json::json;

use crate::envelope::WireEnvelope;

/// Build a ready-to-send `execute_request` envelope for the shell channel.
///
/// The content fields are fixed: not silent, history stored, an empty
/// user-expression mapping, stdin allowed, stop-on-error. The code string is
/// forwarded verbatim; an empty string is legal. The envelope carries a fresh
/// unique msg_id and timestamp, the active session id, and the caller
/// identity. `cell_id`, when known, rides in the metadata so replies can be
/// routed back to the originating cell.
pub fn execute_request(
    code: &str,
    session_id: &str,
    username: &str,
    cell_id: Option<&str>,
) -> WireEnvelope {
    let request = ExecuteRequest {
        code: code.to_string(),
        silent: false,
        store_history: true,
        user_expressions: Some(HashMap::new()),
        allow_stdin: true,
        stop_on_error: true,
    };

    // `into` generates the header: unique msg_id, current timestamp,
    // msg_type "execute_request", protocol version.
    let mut message: JupyterMessage = request.into();
    message.header.session = session_id.to_string();
    message.header.username = username.to_string();

    let metadata = match cell_id {
        Some(id) => json!({ "cell_id": id }),
        None => json!({}),
    };

    WireEnvelope {
        header: message.header,
        parent_header: None,
        metadata,
        content: message.content,
        buffers: Vec::new(),
        channel: Some(Channel::Shell),
    }
}
