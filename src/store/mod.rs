//! Client-side state containers.
//!
//! [`AppStore`] owns every store and is handed to whoever needs it; nothing
//! here is global. Each store is mutated only through its own operations.

pub mod conversation;
pub mod directory;
pub mod notification;
pub mod presence;
pub mod session;
pub mod unread;

pub use conversation::{ConversationStore, FetchStatus};
pub use directory::{ConnectionList, FeedStore, RequestStore};
pub use notification::NotificationStore;
pub use presence::PresenceStore;
pub use session::SessionStore;
pub use unread::UnreadStore;

use crate::common::{ChatMessage, ConversationKey, UserId};

/// One-line message shown above the current screen until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

#[derive(Debug, Clone)]
pub struct AppStore {
    pub session: SessionStore,
    pub conversations: ConversationStore,
    pub presence: PresenceStore,
    pub notifications: NotificationStore,
    pub unread: UnreadStore,
    pub feed: FeedStore,
    pub requests: RequestStore,
    pub connections: ConnectionList,
    pub notice: Option<Notice>,
}

impl AppStore {
    pub fn new(max_messages_per_conversation: usize) -> Self {
        Self {
            session: SessionStore::default(),
            conversations: ConversationStore::new(max_messages_per_conversation),
            presence: PresenceStore::new(),
            notifications: NotificationStore::new(),
            unread: UnreadStore::new(),
            feed: FeedStore::default(),
            requests: RequestStore::default(),
            connections: ConnectionList::default(),
            notice: None,
        }
    }

    pub fn identity(&self) -> Option<&UserId> {
        self.session.identity()
    }

    pub fn conversation_key_with(&self, peer_id: &UserId) -> Option<ConversationKey> {
        self.identity()
            .map(|self_id| ConversationKey::new(self_id, peer_id))
    }

    pub fn messages_with(&self, peer_id: &UserId) -> &[ChatMessage] {
        match self.conversation_key_with(peer_id) {
            Some(key) => self.conversations.messages(&key),
            None => &[],
        }
    }

    pub fn history_status_with(&self, peer_id: &UserId) -> FetchStatus {
        self.conversation_key_with(peer_id)
            .map(|key| self.conversations.status(&key))
            .unwrap_or_default()
    }

    /// Either the local flag or a server-side count marks a peer as unread;
    /// the two may disagree for a while.
    pub fn has_unread(&self, peer_id: &UserId) -> bool {
        self.notifications.is_flagged(peer_id) || self.unread.count_for(peer_id) > 0
    }

    /// True when any peer passes [`AppStore::has_unread`].
    pub fn any_unread(&self) -> bool {
        self.notifications
            .flagged()
            .chain(self.unread.senders())
            .any(|peer_id| self.has_unread(peer_id))
    }

    /// Badge text for a peer: the server count (capped at `9+`), `!` for a
    /// local flag without a count, nothing otherwise.
    pub fn unread_badge(&self, peer_id: &UserId) -> Option<String> {
        match self.unread.count_for(peer_id) {
            0 if self.notifications.is_flagged(peer_id) => Some("!".to_string()),
            0 => None,
            count if count > 9 => Some("9+".to_string()),
            count => Some(count.to_string()),
        }
    }

    /// Drops everything tied to the session.
    pub fn reset(&mut self) {
        self.session.end();
        self.conversations.clear();
        self.presence.clear();
        self.notifications.clear_all();
        self.unread.clear();
        self.feed.clear();
        self.requests.clear();
        self.connections.clear();
        self.notice = None;
    }
}
