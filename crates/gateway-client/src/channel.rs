//! WebSocket kernel channel with an explicit lifecycle.
//!
//! One channel per session. `open` dials the gateway and spawns two tasks:
//! a writer draining a bounded FIFO queue into the socket, and a reader
//! parsing inbound frames into [`WireEnvelope`]s surfaced through a
//! take-able receiver. `send` is only legal while Open and fails fast with
//! [`ChannelError::NotReady`] otherwise - there is no silent no-op sender.
//! No automatic reconnect: a transport close or error moves the channel to
//! Closed and stays there until the caller reopens.

use std::fmt;
use std::sync::{Arc, Mutex as StdMutex};

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use gateway_messages::{WireEnvelope, WireError};

/// Lifecycle state of a kernel channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Error type for channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Sending is only meaningful while the channel is Open.
    #[error("channel not ready to send (state: {0})")]
    NotReady(ChannelState),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("outbound queue full")]
    QueueFull,

    #[error("outbound queue closed")]
    QueueClosed,

    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] WireError),
}

const OUTBOUND_QUEUE: usize = 64;
const INBOUND_QUEUE: usize = 256;

/// A single bidirectional channel to a kernel session endpoint.
pub struct KernelChannel {
    state: Arc<StdMutex<ChannelState>>,
    outbound: Option<mpsc::Sender<String>>,
    inbound: Option<mpsc::Receiver<WireEnvelope>>,
    writer_task: Option<JoinHandle<()>>,
    reader_task: Option<JoinHandle<()>>,
}

impl Default for KernelChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelChannel {
    /// A channel in the Disconnected state; call [`open`](Self::open) to dial.
    pub fn new() -> Self {
        Self {
            state: Arc::new(StdMutex::new(ChannelState::Disconnected)),
            outbound: None,
            inbound: None,
            writer_task: None,
            reader_task: None,
        }
    }

    pub fn state(&self) -> ChannelState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: ChannelState) {
        *self.state.lock().unwrap() = state;
    }

    /// Dial the kernel channel endpoint.
    ///
    /// If a transport is already open it is closed first; two live
    /// transports for one session are never allowed. On connect failure the
    /// channel returns to Disconnected so the caller can retry explicitly.
    pub async fn open(&mut self, url: &Url) -> Result<(), ChannelError> {
        if self.state() == ChannelState::Open {
            info!("[channel] closing previous transport before reopening");
            self.close();
        }

        self.set_state(ChannelState::Connecting);
        debug!("[channel] dialing {}", url);
        let (socket, _response) = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok(ok) => ok,
            Err(e) => {
                self.set_state(ChannelState::Disconnected);
                return Err(ChannelError::WebSocket(e));
            }
        };

        let (mut sink, mut stream) = socket.split();

        // Stamp Open before the tasks exist: a transport that dies
        // immediately has its reader write Closed, which must win over
        // the transition out of Connecting.
        self.set_state(ChannelState::Open);

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);
        let writer_state = Arc::clone(&self.state);
        let writer_task = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(frame)).await {
                    warn!("[channel] outbound send failed: {}", e);
                    *writer_state.lock().unwrap() = ChannelState::Closed;
                    break;
                }
            }
        });

        let (inbound_tx, inbound_rx) = mpsc::channel::<WireEnvelope>(INBOUND_QUEUE);
        let reader_state = Arc::clone(&self.state);
        let reader_task = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match WireEnvelope::from_wire_json(&text) {
                        Ok(envelope) => {
                            debug!(
                                "[channel] inbound {} on {:?}",
                                envelope.header.msg_type, envelope.channel
                            );
                            if inbound_tx.try_send(envelope).is_err() {
                                debug!("[channel] inbound frame dropped (no consumer)");
                            }
                        }
                        Err(e) => warn!("[channel] discarding unparseable frame: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        info!("[channel] close frame from gateway");
                        break;
                    }
                    Ok(_) => {} // ping/pong/binary keepalive
                    Err(e) => {
                        warn!("[channel] transport error: {}", e);
                        break;
                    }
                }
            }
            *reader_state.lock().unwrap() = ChannelState::Closed;
        });

        self.outbound = Some(outbound_tx);
        self.inbound = Some(inbound_rx);
        self.writer_task = Some(writer_task);
        self.reader_task = Some(reader_task);
        info!("[channel] open");
        Ok(())
    }

    /// Queue a message for sending, FIFO relative to this channel.
    ///
    /// Fails fast with [`ChannelError::NotReady`] in any state but Open;
    /// no I/O is performed in that case.
    pub fn send(&self, envelope: &WireEnvelope) -> Result<(), ChannelError> {
        let state = self.state();
        if state != ChannelState::Open {
            return Err(ChannelError::NotReady(state));
        }
        let outbound = self.outbound.as_ref().ok_or(ChannelError::QueueClosed)?;
        let frame = envelope.to_wire_json()?;
        outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ChannelError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => ChannelError::QueueClosed,
        })
    }

    /// Take the inbound frame receiver.
    ///
    /// The hook for handling kernel replies; frames arriving while nobody
    /// holds the receiver are dropped after parsing. Returns `None` if the
    /// receiver was already taken or the channel was never opened.
    pub fn take_inbound(&mut self) -> Option<mpsc::Receiver<WireEnvelope>> {
        self.inbound.take()
    }

    /// Tear down the transport and both tasks; the channel ends Closed.
    pub fn close(&mut self) {
        if let Some(task) = self.writer_task.take() {
            task.abort();
        }
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        self.outbound = None;
        self.inbound = None;
        self.set_state(ChannelState::Closed);
    }
}

impl Drop for KernelChannel {
    fn drop(&mut self) {
        if let Some(task) = self.writer_task.take() {
            task.abort();
        }
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}
