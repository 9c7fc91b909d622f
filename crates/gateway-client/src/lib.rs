//! gateway-client - Client for Jupyter-compatible kernel gateways.
//!
//! Two surfaces:
//! - [`client::GatewayClient`], a thin async REST client for the gateway's
//!   contents/kernelspecs/kernels/sessions endpoints;
//! - [`channel::KernelChannel`], the WebSocket kernel channel with an explicit
//!   Disconnected/Connecting/Open/Closed lifecycle.
//!
//! Every operation returns a result; nothing here retries automatically or
//! fails silently. Dropping an in-flight request future cancels it.

pub mod channel;
pub mod client;
pub mod models;

pub use channel::{ChannelError, ChannelState, KernelChannel};
pub use client::{ClientError, GatewayClient};
pub use models::{Kernel, KernelSpec, KernelSpecs, NotebookLocator, Session, SessionRequest};
