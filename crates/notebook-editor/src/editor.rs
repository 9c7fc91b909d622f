//! The editor context: one notebook, one session, one channel.

use log::{debug, info};

use gateway_client::{
    ChannelError, ChannelState, ClientError, GatewayClient, Kernel, KernelChannel,
    NotebookLocator, Session, SessionRequest,
};
use gateway_messages::{execute_request, WireEnvelope};
use notebook_doc::{select_rendering, DocError, Notebook, Rendering};
use tokio::sync::mpsc;

/// Error type for editor operations.
///
/// `NoKernel`/`NoSession` cover operations attempted before their
/// prerequisites exist; everything else wraps the failing layer's error.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("no kernel selected; pick a kernel before starting a session")]
    NoKernel,

    #[error("no active session; start a session first")]
    NoSession,

    #[error(transparent)]
    Gateway(#[from] ClientError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Document(#[from] DocError),
}

/// Editor state for one open notebook.
///
/// Owns the document, the session/kernel identity, and the kernel channel
/// for its whole lifetime; constructed once per editor instance and passed
/// explicitly to the UI layer rather than captured in view-local globals.
pub struct NotebookEditor {
    client: GatewayClient,
    path: String,
    username: String,
    notebook: Notebook,
    kernel: Option<Kernel>,
    session: Option<Session>,
    channel: KernelChannel,
    focused: usize,
}

impl NotebookEditor {
    /// A new editor over an empty document. Call [`load`](Self::load) to
    /// pull the stored notebook from the gateway.
    pub fn new(client: GatewayClient, path: impl Into<String>) -> Self {
        let username = std::env::var("USER").unwrap_or_else(|_| "nbgate".to_string());
        Self {
            client,
            path: path.into(),
            username,
            notebook: Notebook::default(),
            kernel: None,
            session: None,
            channel: KernelChannel::new(),
            focused: 0,
        }
    }

    /// Override the caller identity stamped into outgoing message headers.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    pub fn kernel(&self) -> Option<&Kernel> {
        self.kernel.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    /// Index of the currently focused cell.
    pub fn focused(&self) -> usize {
        self.focused
    }

    // ── Document ────────────────────────────────────────────────────

    /// Fetch the stored notebook from the gateway, replacing the in-memory
    /// document. Dropping the returned future cancels the request (a stale
    /// fetch abandoned on navigation never lands).
    ///
    /// On failure the prior document is left untouched.
    pub async fn load(&mut self) -> Result<(), EditorError> {
        let notebook = self.client.fetch_notebook(&self.path).await?;
        self.focused = 0;
        self.notebook = notebook;
        Ok(())
    }

    /// Save the in-memory document back through the contents endpoint.
    pub async fn save(&self) -> Result<(), EditorError> {
        self.client.save_notebook(&self.path, &self.notebook).await?;
        Ok(())
    }

    /// Insert a blank cell above `index` and focus it.
    pub fn add_cell_above(&mut self, index: usize) -> usize {
        let at = self.notebook.add_cell_above(index);
        self.focused = at;
        at
    }

    /// Insert a blank cell below `index` and focus it.
    pub fn add_cell_below(&mut self, index: usize) -> usize {
        let at = self.notebook.add_cell_below(index);
        self.focused = at;
        at
    }

    /// Delete the cell at `index`; out-of-range fails and changes nothing.
    pub fn delete_cell(&mut self, index: usize) -> Result<(), EditorError> {
        self.notebook.delete_cell(index)?;
        if self.focused >= self.notebook.len() {
            self.focused = self.notebook.len().saturating_sub(1);
        }
        Ok(())
    }

    /// Replace the source text of the cell at `index`.
    pub fn edit_cell(&mut self, index: usize, source: impl Into<String>) -> Result<(), EditorError> {
        let len = self.notebook.len();
        let cell = self
            .notebook
            .cells
            .get_mut(index)
            .ok_or(DocError::OutOfRange { index, len })?;
        cell.source = source.into();
        Ok(())
    }

    /// Move focus to the next cell; stays put at the last cell.
    pub fn focus_next(&mut self) -> usize {
        if let Some(next) = self.notebook.next_index(self.focused) {
            self.focused = next;
        }
        self.focused
    }

    /// Move focus to the previous cell; stays put at the first cell.
    pub fn focus_previous(&mut self) -> usize {
        if let Some(previous) = self.notebook.previous_index(self.focused) {
            self.focused = previous;
        }
        self.focused
    }

    /// Rendering for the outputs of the cell at `index`, if any.
    pub fn rendered_output(&self, index: usize) -> Result<Option<Rendering>, EditorError> {
        let cell = self.notebook.cell(index)?;
        Ok(select_rendering(&cell.outputs))
    }

    // ── Session & kernel ────────────────────────────────────────────

    /// Select the kernel to bind future sessions to.
    pub fn set_kernel(&mut self, kernel: Kernel) {
        info!("[editor] kernel selected: {} ({})", kernel.name, kernel.id);
        self.kernel = Some(kernel);
    }

    /// Adopt an already-running session (e.g. found via `GET /api/sessions`).
    pub fn resume_session(&mut self, session: Session) {
        info!("[editor] resuming session {}", session.id);
        self.kernel = Some(session.kernel.clone());
        self.session = Some(session);
    }

    /// Start a session binding this notebook to the selected kernel.
    ///
    /// Idempotent by presence: if a session is already held it is returned
    /// as-is and no creation request is issued (the existing session is not
    /// verified against `name`/`session_type`). Requires a selected kernel
    /// otherwise.
    pub async fn start_session(
        &mut self,
        name: &str,
        session_type: &str,
    ) -> Result<Session, EditorError> {
        if let Some(session) = &self.session {
            debug!("[editor] session {} already active, skipping create", session.id);
            return Ok(session.clone());
        }

        let kernel = self.kernel.clone().ok_or(EditorError::NoKernel)?;
        let request = SessionRequest {
            path: self.path.clone(),
            name: name.to_string(),
            session_type: session_type.to_string(),
            kernel,
            notebook: NotebookLocator {
                path: self.path.clone(),
                name: name.to_string(),
            },
        };
        let session = self.client.create_session(&request).await?;
        self.session = Some(session.clone());
        Ok(session)
    }

    // ── Channel & execution ─────────────────────────────────────────

    /// Open the kernel channel for the active session. Reopening closes
    /// the previous transport first.
    pub async fn open_channel(&mut self) -> Result<(), EditorError> {
        let session = self.session.as_ref().ok_or(EditorError::NoSession)?;
        let url = self.client.channel_url(&session.kernel.id, &session.id)?;
        self.channel.open(&url).await?;
        Ok(())
    }

    /// Submit the cell at `index` for execution; returns the request's
    /// msg_id for matching replies. Fails fast if there is no session or
    /// the channel is not open - an unsent execute request is an error,
    /// never a silent drop.
    pub fn submit_cell(&mut self, index: usize) -> Result<String, EditorError> {
        let cell = self.notebook.cell(index)?;
        let session = self.session.as_ref().ok_or(EditorError::NoSession)?;
        let envelope = execute_request(
            &cell.source,
            &session.id,
            &self.username,
            cell.id.as_deref(),
        );
        let msg_id = envelope.header.msg_id.clone();
        self.channel.send(&envelope)?;
        info!("[editor] submitted cell {} (msg_id {})", index, msg_id);
        Ok(msg_id)
    }

    /// Record the execution counter handed back for a completed run.
    pub fn record_execution(&mut self, index: usize, count: i64) -> Result<(), EditorError> {
        self.notebook.set_execution_count(index, count)?;
        Ok(())
    }

    /// Take the channel's inbound frame receiver (kernel replies hook).
    pub fn take_inbound(&mut self) -> Option<mpsc::Receiver<WireEnvelope>> {
        self.channel.take_inbound()
    }

    /// Close the kernel channel, keeping session and document state.
    pub fn close_channel(&mut self) {
        self.channel.close();
    }
}
