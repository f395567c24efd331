use std::collections::HashSet;

use crate::common::UserId;

/// Peers currently online, as reported by realtime events or a snapshot.
#[derive(Debug, Clone, Default)]
pub struct PresenceStore {
    online: HashSet<UserId>,
}

impl PresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_online(&mut self, id: UserId) {
        self.online.insert(id);
    }

    pub fn mark_offline(&mut self, id: &UserId) {
        self.online.remove(id);
    }

    /// Replaces the whole set with a fresh snapshot.
    pub fn replace_all(&mut self, ids: impl IntoIterator<Item = UserId>) {
        self.online = ids.into_iter().collect();
    }

    pub fn is_online(&self, id: &UserId) -> bool {
        self.online.contains(id)
    }

    pub fn len(&self) -> usize {
        self.online.len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }

    pub fn clear(&mut self) {
        self.online.clear();
    }
}
