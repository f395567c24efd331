use std::collections::HashMap;

use crate::common::UserId;

/// Local "has unseen activity" flags, one per peer.
///
/// This is a presence signal only; counts come from the server-side unread
/// summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationStore {
    unseen: HashMap<UserId, bool>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&mut self, peer_id: UserId) {
        self.unseen.insert(peer_id, true);
    }

    pub fn clear(&mut self, peer_id: &UserId) {
        self.unseen.remove(peer_id);
    }

    pub fn is_flagged(&self, peer_id: &UserId) -> bool {
        self.unseen.get(peer_id).copied().unwrap_or(false)
    }

    pub fn flagged(&self) -> impl Iterator<Item = &UserId> {
        self.unseen
            .iter()
            .filter(|(_, unseen)| **unseen)
            .map(|(peer_id, _)| peer_id)
    }

    pub fn clear_all(&mut self) {
        self.unseen.clear();
    }
}
