//! The engine's single source of truth: the retained ring and the registry
//! of connected clients.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use logdy_protocol::{ClientStats, Message, Stats};
use logdy_ring::RingBuffer;
use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::client::Client;
pub use crate::client::CursorState;
use crate::now_ms;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("unknown client {0}")]
    UnknownClient(String),
}

fn random_client_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

/// Owns the ring buffer and the registry of connected clients; the only
/// thing that ever mutates the ring is [`ClientsHub::run`].
pub struct ClientsHub {
    ring: RwLock<RingBuffer<Message>>,
    stats: RwLock<Stats>,
    clients: Mutex<HashMap<String, Arc<Client>>>,
    bulk_window: Duration,
}

impl ClientsHub {
    pub fn new(capacity: usize, bulk_window: Duration) -> Arc<Self> {
        Arc::new(Self {
            ring: RwLock::new(RingBuffer::new(capacity)),
            stats: RwLock::new(Stats {
                max_count: capacity as u64,
                ..Stats::default()
            }),
            clients: Mutex::new(HashMap::new()),
            bulk_window,
        })
    }

    /// Drains the ingest channel forever: appends each message to the ring,
    /// updates global stats, then fans it out (non-force) to every
    /// registered client.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<Message>) {
        while let Some(message) = rx.recv().await {
            let now = now_ms();
            {
                let mut ring = self.ring.write().await;
                ring.push(message.clone());
            }
            {
                let mut stats = self.stats.write().await;
                if stats.first_message_at == 0 {
                    stats.first_message_at = now;
                }
                stats.msg_count = (stats.msg_count + 1).min(stats.max_count.max(1));
                stats.last_message_at = now;
            }
            let targets: Vec<Arc<Client>> = {
                let clients = self.clients.lock().await;
                clients.values().cloned().collect()
            };
            for client in targets {
                client.handle_message(message.clone(), false).await;
            }
        }
    }

    /// Register a new client, force-delivering the last `tail_len` retained
    /// messages. Returns the client id and the receiving end of its
    /// outbound bulk-delivery channel.
    pub async fn join(&self, tail_len: usize, should_follow: bool) -> (String, mpsc::Receiver<Vec<Message>>) {
        let id = random_client_id();
        let channel_capacity = (25 * self.bulk_window.as_millis().max(1)) as usize;
        let (client, rx) = Client::spawn(id.clone(), channel_capacity, self.bulk_window);

        let tail = {
            let ring = self.ring.read().await;
            let start = ring.size().saturating_sub(tail_len);
            ring.peek_slice(start).unwrap_or_default()
        };
        client.enqueue_tail(tail).await;
        if should_follow {
            client.set_following().await;
        }

        self.clients.lock().await.insert(id.clone(), client);
        (id, rx)
    }

    /// Unregister a client and let its flush loop wind down. Idempotent.
    pub async fn close(&self, id: &str) {
        if let Some(client) = self.clients.lock().await.remove(id) {
            client.close();
        }
    }

    async fn get_client(&self, id: &str) -> Result<Arc<Client>, HubError> {
        self.clients
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| HubError::UnknownClient(id.to_owned()))
    }

    /// Stop following and wait for any in-flight deliveries to drain.
    pub async fn pause_following(&self, id: &str) -> Result<(), HubError> {
        let client = self.get_client(id).await?;
        client.set_stopped().await;
        client.wait_for_drain().await;
        Ok(())
    }

    /// Resume following. If `from_cursor`, first replays every retained
    /// message strictly newer than the client's last delivered id.
    pub async fn resume_following(&self, id: &str, from_cursor: bool) -> Result<(), HubError> {
        let client = self.get_client(id).await?;
        if from_cursor {
            let cursor = client.cursor_position().await;
            let ring = self.ring.read().await;
            let mut seen = false;
            let mut replay = Vec::new();
            ring.scan(|m, _i| {
                if m.id == cursor {
                    seen = true;
                    return false;
                }
                if !seen {
                    return false;
                }
                replay.push(m.clone());
                false
            });
            drop(ring);
            client.resume_with_replay(replay).await;
        } else {
            client.set_following().await;
        }
        Ok(())
    }

    /// Force-deliver a window of retained messages, anchored at the
    /// 1-based `start_count`, flushing synchronously. Does not change
    /// the client's cursor state.
    pub async fn load(&self, id: &str, start_count: usize, count: usize, include_start: bool) -> Result<(), HubError> {
        self.pause_following(id).await?;
        let client = self.get_client(id).await?;

        let ring = self.ring.read().await;
        let mut seen = false;
        let mut sent = 0usize;
        let mut replay = Vec::new();
        ring.scan(|m, i| {
            let one_based = i + 1;
            if one_based == start_count {
                seen = true;
                if !include_start {
                    return false;
                }
            }
            if !seen {
                return false;
            }
            replay.push(m.clone());
            sent += 1;
            count > 0 && sent >= count
        });
        drop(ring);

        client.load_replay(replay).await;
        Ok(())
    }

    /// Fetch retained messages by logical ring index, skipping any index
    /// that is out of range. Order follows `idxs`, not ring order.
    pub async fn peek_log(&self, idxs: &[i64]) -> Vec<Message> {
        let ring = self.ring.read().await;
        idxs.iter()
            .filter(|&&idx| idx >= 0)
            .filter_map(|&idx| ring.peek_idx(idx as usize).ok())
            .collect()
    }

    /// A client's delivery progress relative to the tail of the ring.
    pub async fn client_stats(&self, id: &str) -> Result<ClientStats, HubError> {
        let client = self.get_client(id).await?;
        let last_id = client.cursor_position().await;
        let ring = self.ring.read().await;
        let mut idx_found: i64 = -1;
        ring.scan(|m, i| {
            if m.id == last_id {
                idx_found = i as i64;
                true
            } else {
                false
            }
        });
        let msg_count = self.stats.read().await.msg_count as i64;
        drop(ring);
        Ok(ClientStats {
            last_delivered_id: last_id,
            last_delivered_id_idx: idx_found,
            count_to_tail: msg_count - idx_found,
        })
    }

    pub async fn stats(&self) -> Stats {
        self.stats.read().await.clone()
    }

    /// Whether a client is currently following or stopped. Used by a
    /// session's status ticker to decide whether to emit an idle heartbeat.
    pub async fn cursor_state(&self, id: &str) -> Result<CursorState, HubError> {
        let client = self.get_client(id).await?;
        Ok(client.cursor_state().await)
    }
}
