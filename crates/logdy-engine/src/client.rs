//! A single subscriber session: cursor state, pending buffer, bulk flush.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use logdy_protocol::Message;
use tokio::sync::{mpsc, Mutex};

/// How many pending messages a single flush batch carries at most.
pub(crate) const FLUSH_BUFFER_SIZE: usize = 1000;

/// Whether a client is receiving new messages as they arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Not accepting newly-ingested messages; only explicit `Load`/`Resume`
    /// calls enqueue anything.
    Stopped,
    /// Every newly-ingested message is appended to `pending`.
    Following,
}

struct ClientState {
    cursor_state: CursorState,
    cursor_position: String,
    pending: Vec<Message>,
    outbound_tx: Option<mpsc::Sender<Vec<Message>>>,
}

/// One subscriber. Owns no transport; `outbound_tx`'s paired receiver is
/// handed to whatever is actually writing frames to the client (a WebSocket
/// task, in the common case).
pub struct Client {
    pub id: String,
    state: Mutex<ClientState>,
    closed: AtomicBool,
}

impl Client {
    fn new(id: String, outbound_tx: mpsc::Sender<Vec<Message>>) -> Arc<Self> {
        Arc::new(Self {
            id,
            state: Mutex::new(ClientState {
                cursor_state: CursorState::Stopped,
                cursor_position: String::new(),
                pending: Vec::new(),
                outbound_tx: Some(outbound_tx),
            }),
            closed: AtomicBool::new(false),
        })
    }

    /// Create a client plus its outbound channel and background flush loop.
    /// `bulk_window` is the sleep interval the flush loop wakes on.
    pub fn spawn(id: String, channel_capacity: usize, bulk_window: Duration) -> (Arc<Self>, mpsc::Receiver<Vec<Message>>) {
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        let client = Self::new(id, tx);
        tokio::spawn(flush_loop(client.clone(), bulk_window));
        (client, rx)
    }

    /// Append a message to the pending buffer. Non-force appends are dropped
    /// while the client is [`CursorState::Stopped`]; force appends (tail
    /// join, `Load`, `Resume`) always land regardless of cursor state.
    pub async fn handle_message(&self, message: Message, force: bool) {
        let mut state = self.state.lock().await;
        if !force && state.cursor_state == CursorState::Stopped {
            return;
        }
        state.pending.push(message);
    }

    pub async fn cursor_state(&self) -> CursorState {
        self.state.lock().await.cursor_state
    }

    pub async fn cursor_position(&self) -> String {
        self.state.lock().await.cursor_position.clone()
    }

    pub async fn set_stopped(&self) {
        self.state.lock().await.cursor_state = CursorState::Stopped;
    }

    /// Block until `pending` has drained via the flush loop. Used by
    /// `PauseFollowing` to guarantee no further bulk deliveries land after
    /// it returns.
    pub async fn wait_for_drain(&self) {
        loop {
            {
                let state = self.state.lock().await;
                if state.pending.is_empty() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Force-append `replay`, flush synchronously, and resume following.
    /// Used by `ResumeFollowing`.
    pub async fn resume_with_replay(&self, replay: Vec<Message>) {
        let mut state = self.state.lock().await;
        state.pending.extend(replay);
        flush_locked(&mut state).await;
        state.cursor_state = CursorState::Following;
    }

    /// Force-append `replay` and flush synchronously, leaving cursor state
    /// untouched. Used by `Load`.
    pub async fn load_replay(&self, replay: Vec<Message>) {
        let mut state = self.state.lock().await;
        state.pending.extend(replay);
        flush_locked(&mut state).await;
    }

    /// Force-append `replay` without flushing; the periodic flush loop will
    /// pick it up. Used by `Join`'s tail delivery.
    pub async fn enqueue_tail(&self, replay: Vec<Message>) {
        let mut state = self.state.lock().await;
        state.pending.extend(replay);
    }

    pub async fn set_following(&self) {
        self.state.lock().await.cursor_state = CursorState::Following;
    }

    /// Signal the flush loop to drop its outbound sender and exit on its
    /// next wake. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    async fn flush(&self) {
        let mut state = self.state.lock().await;
        flush_locked(&mut state).await;
    }

    async fn drop_outbound(&self) {
        self.state.lock().await.outbound_tx = None;
    }
}

async fn flush_locked(state: &mut ClientState) {
    if state.pending.is_empty() {
        return;
    }
    let last_id = state
        .pending
        .last()
        .expect("checked non-empty above")
        .id
        .clone();
    state.cursor_position = last_id;
    let pending = std::mem::take(&mut state.pending);
    for batch in pending.chunks(FLUSH_BUFFER_SIZE) {
        let Some(tx) = state.outbound_tx.as_ref() else {
            break;
        };
        // Held across this await deliberately: a full outbound channel
        // backpressures new appends onto the same client, not just delivery.
        let _ = tx.send(batch.to_vec()).await;
    }
}

async fn flush_loop(client: Arc<Client>, bulk_window: Duration) {
    loop {
        tokio::time::sleep(bulk_window).await;
        if client.closed.load(Ordering::Acquire) {
            client.drop_outbound().await;
            return;
        }
        client.flush().await;
    }
}
