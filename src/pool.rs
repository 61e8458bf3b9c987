//! Connected-client pool
//!
//! Bounded set of client connections with stable numeric ids. Generic over
//! the stream type so tests can drive it with in-memory sinks instead of
//! real sockets.

use std::io::Write;

/// Maximum simultaneous client connections
pub const MAX_CLIENTS: usize = 10;

/// Stable identifier assigned at accept time
pub type ClientId = u32;

/// Fixed-capacity pool of client streams
pub struct ClientPool<S> {
    clients: Vec<(ClientId, S)>,
    next_id: ClientId,
}

impl<S> ClientPool<S> {
    pub fn new() -> Self {
        ClientPool {
            clients: Vec::with_capacity(MAX_CLIENTS),
            next_id: 0,
        }
    }

    /// Admit a new client stream
    ///
    /// Returns the assigned id, or hands the stream back when the pool is
    /// full so the caller can close it.
    pub fn add(&mut self, stream: S) -> Result<ClientId, S> {
        if self.clients.len() >= MAX_CLIENTS {
            return Err(stream);
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.clients.push((id, stream));
        Ok(id)
    }

    /// Remove a client, returning its stream for closing
    pub fn remove(&mut self, id: ClientId) -> Option<S> {
        let pos = self.clients.iter().position(|(cid, _)| *cid == id)?;
        Some(self.clients.remove(pos).1)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut S> {
        self.clients
            .iter_mut()
            .find(|(cid, _)| *cid == id)
            .map(|(_, s)| s)
    }

    /// Snapshot of current ids, in accept order
    pub fn ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl<S: Write> ClientPool<S> {
    /// Send one message to every connected client
    ///
    /// Per-client write failures are logged and skipped; a slow or broken
    /// client never blocks delivery to the others.
    pub fn broadcast(&mut self, bytes: &[u8]) {
        for (id, stream) in &mut self.clients {
            if let Err(e) = stream.write_all(bytes).and_then(|_| stream.flush()) {
                log::warn!("broadcast to client {} failed: {}", id, e);
            }
        }
    }
}

impl<S> Default for ClientPool<S> {
    fn default() -> Self {
        Self::new()
    }
}
