use std::collections::VecDeque;

use lumberjack_client::{LumberjackError, Result, Transport};

/// One transport call, in the order the client made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Sent(Vec<u8>),
    Read(usize),
}

/// In-memory transport that records every call and serves reads from a
/// pre-loaded byte queue.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub events: Vec<Event>,
    inbound: VecDeque<u8>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes the "collector" will send.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Sent(bytes) => Some(bytes.clone()),
                Event::Read(_) => None,
            })
            .collect()
    }

    pub fn read_calls(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Read(_)))
            .count()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl Transport for ScriptedTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        self.events.push(Event::Sent(bytes.to_vec()));
        Ok(bytes.len())
    }

    async fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.inbound.len() < buf.len() {
            return Err(LumberjackError::ConnectionClosed);
        }
        for slot in buf.iter_mut() {
            *slot = self.inbound.pop_front().unwrap_or_default();
        }
        self.events.push(Event::Read(buf.len()));
        Ok(())
    }
}
