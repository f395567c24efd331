use crate::common::{UnreadSummary, UserId};

/// Server-confirmed unread counts per sender.
#[derive(Debug, Clone, Default)]
pub struct UnreadStore {
    summaries: Vec<UnreadSummary>,
}

impl UnreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, summaries: Vec<UnreadSummary>) {
        self.summaries = summaries;
    }

    /// Drops the entry for `peer_id` once the server acknowledged the read.
    pub fn mark_read(&mut self, peer_id: &UserId) {
        self.summaries.retain(|summary| &summary.sender_id != peer_id);
    }

    pub fn count_for(&self, peer_id: &UserId) -> u32 {
        self.summaries
            .iter()
            .find(|summary| &summary.sender_id == peer_id)
            .map_or(0, |summary| summary.count)
    }

    pub fn total(&self) -> u32 {
        self.summaries.iter().map(|summary| summary.count).sum()
    }

    /// Peers with a non-zero server count.
    pub fn senders(&self) -> impl Iterator<Item = &UserId> {
        self.summaries
            .iter()
            .filter(|summary| summary.count > 0)
            .map(|summary| &summary.sender_id)
    }

    pub fn clear(&mut self) {
        self.summaries.clear();
    }
}
