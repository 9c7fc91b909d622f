//! gateway-messages - Jupyter wire message types for kernel gateway sockets.
//!
//! The gateway's `/api/kernels/{id}/channels` WebSocket speaks JSON envelopes:
//! the standard Jupyter header/parent_header/metadata/content shape, a channel
//! tag (`shell`, `iopub`, ...), and side-channel buffers base64-encoded into
//! the JSON frame. This crate provides that envelope ([`WireEnvelope`]) in
//! both directions plus the execute-request builder.

pub mod buffers;
pub mod envelope;
pub mod execute;

pub use envelope::{WireEnvelope, WireError};
pub use execute::execute_request;
