use std::collections::HashMap;

use crate::common::{ChatMessage, ConversationKey, UserId};

/// Progress of the history fetch for one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    NotStarted,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Default)]
struct Conversation {
    messages: Vec<ChatMessage>,
    status: FetchStatus,
}

impl Conversation {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|message| message.id == id)
    }

    /// Appends `message` unless its id is already present. A confirmed copy
    /// of one of our pending placeholders takes the placeholder's slot.
    fn insert(&mut self, message: ChatMessage, cap: usize) -> bool {
        if self.contains(&message.id) {
            return false;
        }

        if !message.pending {
            if let Some(placeholder) = self
                .messages
                .iter_mut()
                .find(|existing| existing.pending && same_content(existing, &message))
            {
                log::debug!("Confirmed placeholder {} as {}", placeholder.id, message.id);
                *placeholder = message;
                return true;
            }
        }

        self.messages.push(message);
        self.truncate_to(cap);
        true
    }

    /// Swaps in fetched history. Local messages the server did not return
    /// are kept after it, except pending placeholders whose confirmed copy
    /// is already in the fetched list.
    fn merge_history(&mut self, fetched: Vec<ChatMessage>) {
        let local = std::mem::replace(&mut self.messages, fetched);
        let fetched_len = self.messages.len();
        let mut claimed = vec![false; fetched_len];

        for message in local {
            if self.messages[..fetched_len]
                .iter()
                .any(|existing| existing.id == message.id)
            {
                continue;
            }

            if message.pending {
                let confirmed = (0..fetched_len).rev().find(|&index| {
                    let candidate = &self.messages[index];
                    !claimed[index] && !candidate.pending && same_content(candidate, &message)
                });
                if let Some(index) = confirmed {
                    claimed[index] = true;
                    log::debug!(
                        "Placeholder {} already confirmed as {}",
                        message.id,
                        self.messages[index].id
                    );
                    continue;
                }
            }

            self.messages.push(message);
        }
    }

    fn truncate_to(&mut self, cap: usize) {
        if cap > 0 && self.messages.len() > cap {
            let excess = self.messages.len() - cap;
            self.messages.drain(..excess);
        }
    }
}

fn same_content(a: &ChatMessage, b: &ChatMessage) -> bool {
    a.sender_id == b.sender_id && a.receiver_id == b.receiver_id && a.message == b.message
}

/// Per-conversation message lists and history fetch status.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    conversations: HashMap<ConversationKey, Conversation>,
    max_messages: usize,
}

impl ConversationStore {
    /// `max_messages` caps each conversation; zero keeps everything.
    pub fn new(max_messages: usize) -> Self {
        Self {
            conversations: HashMap::new(),
            max_messages,
        }
    }

    /// Marks the history as loading and returns the key to fetch, or `None`
    /// when a fetch is already in flight or done.
    pub fn request_history(
        &mut self,
        self_id: &UserId,
        peer_id: &UserId,
    ) -> Option<ConversationKey> {
        let key = ConversationKey::new(self_id, peer_id);
        let conversation = self.conversations.entry(key.clone()).or_default();
        match conversation.status {
            FetchStatus::Loading | FetchStatus::Loaded => None,
            FetchStatus::NotStarted | FetchStatus::Failed => {
                conversation.status = FetchStatus::Loading;
                Some(key)
            }
        }
    }

    /// Installs fetched history. Messages that arrived or were sent while the
    /// fetch was in flight are kept after it unless the server already
    /// returned them.
    pub fn history_loaded(&mut self, key: &ConversationKey, messages: Vec<ChatMessage>) {
        let cap = self.max_messages;
        let Some(conversation) = self.loading_conversation(key) else {
            log::debug!("Ignoring history for {key}: no fetch in flight");
            return;
        };

        conversation.merge_history(messages);
        conversation.truncate_to(cap);
        conversation.status = FetchStatus::Loaded;
    }

    pub fn history_failed(&mut self, key: &ConversationKey) {
        if let Some(conversation) = self.loading_conversation(key) {
            conversation.status = FetchStatus::Failed;
        }
    }

    fn loading_conversation(&mut self, key: &ConversationKey) -> Option<&mut Conversation> {
        self.conversations
            .get_mut(key)
            .filter(|conversation| conversation.status == FetchStatus::Loading)
    }

    /// Returns false when a message with the same id is already stored.
    pub fn append_message(&mut self, message: ChatMessage) -> bool {
        let key = message.conversation_key();
        let id = message.id.clone();
        let appended = self
            .conversations
            .entry(key.clone())
            .or_default()
            .insert(message, self.max_messages);

        if !appended {
            log::debug!("Message {id} already exists in conversation {key}");
        }
        appended
    }

    pub fn messages(&self, key: &ConversationKey) -> &[ChatMessage] {
        self.conversations
            .get(key)
            .map(Conversation::messages)
            .unwrap_or_default()
    }

    pub fn status(&self, key: &ConversationKey) -> FetchStatus {
        self.conversations
            .get(key)
            .map(Conversation::status)
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn message(id: &str, from: &str, to: &str, body: &str) -> ChatMessage {
        ChatMessage {
            pending: false,
            id: id.to_string(),
            ..ChatMessage::optimistic(from.into(), to.into(), body)
        }
    }

    fn key(a: &str, b: &str) -> ConversationKey {
        ConversationKey::new(&a.into(), &b.into())
    }

    fn ids(store: &ConversationStore, key: &ConversationKey) -> Vec<String> {
        store.messages(key).iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn duplicate_ids_are_appended_once() {
        let mut store = ConversationStore::new(0);
        assert!(store.append_message(message("m1", "u2", "u1", "hi")));
        assert!(!store.append_message(message("m1", "u2", "u1", "hi")));
        assert_eq!(store.messages(&key("u1", "u2")).len(), 1);
    }

    #[test]
    fn both_directions_share_one_conversation() {
        let mut store = ConversationStore::new(0);
        store.append_message(message("m1", "u1", "u2", "hi"));
        store.append_message(message("m2", "u2", "u1", "hello"));
        assert_eq!(ids(&store, &key("u2", "u1")), vec!["m1", "m2"]);
    }

    #[test]
    fn confirmed_copy_replaces_pending_placeholder() {
        let mut store = ConversationStore::new(0);
        let placeholder = ChatMessage::optimistic("u1".into(), "u2".into(), "hi");
        store.append_message(placeholder);
        store.append_message(message("srv-1", "u1", "u2", "hi"));

        let messages = store.messages(&key("u1", "u2"));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "srv-1");
        assert!(!messages[0].pending);
    }

    #[test]
    fn history_request_is_idempotent_while_loading_or_loaded() {
        let mut store = ConversationStore::new(0);
        let (me, peer) = (UserId::from("u1"), UserId::from("u2"));

        assert_eq!(store.request_history(&me, &peer), Some(key("u1", "u2")));
        assert_eq!(store.status(&key("u1", "u2")), FetchStatus::Loading);
        assert_eq!(store.request_history(&me, &peer), None);

        store.history_loaded(&key("u1", "u2"), vec![message("m1", "u2", "u1", "hi")]);
        assert_eq!(store.status(&key("u1", "u2")), FetchStatus::Loaded);
        assert_eq!(store.request_history(&me, &peer), None);
    }

    #[test]
    fn failed_history_can_be_requested_again() {
        let mut store = ConversationStore::new(0);
        let (me, peer) = (UserId::from("u1"), UserId::from("u2"));

        store.request_history(&me, &peer);
        store.history_failed(&key("u1", "u2"));
        assert_eq!(store.status(&key("u1", "u2")), FetchStatus::Failed);
        assert_eq!(store.request_history(&me, &peer), Some(key("u1", "u2")));
    }

    #[test]
    fn late_history_without_fetch_is_ignored() {
        let mut store = ConversationStore::new(0);
        store.history_loaded(&key("u1", "u2"), vec![message("m1", "u2", "u1", "hi")]);
        store.history_failed(&key("u1", "u2"));
        assert_eq!(store.status(&key("u1", "u2")), FetchStatus::NotStarted);
        assert!(store.messages(&key("u1", "u2")).is_empty());
    }

    #[test]
    fn history_keeps_messages_received_during_fetch() {
        let mut store = ConversationStore::new(0);
        store.request_history(&"u1".into(), &"u2".into());
        store.append_message(message("m2", "u2", "u1", "live"));
        store.append_message(message("m3", "u2", "u1", "newer"));

        store.history_loaded(
            &key("u1", "u2"),
            vec![
                message("m1", "u1", "u2", "old"),
                message("m2", "u2", "u1", "live"),
            ],
        );
        assert_eq!(ids(&store, &key("u1", "u2")), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn placeholder_sent_during_fetch_is_not_duplicated() {
        let mut store = ConversationStore::new(0);
        let key = store.request_history(&"u1".into(), &"u2".into()).unwrap();
        store.append_message(ChatMessage::optimistic("u1".into(), "u2".into(), "hello"));

        store.history_loaded(&key, vec![message("srv-1", "u1", "u2", "hello")]);
        assert_eq!(ids(&store, &key), vec!["srv-1"]);

        // The realtime echo of the same message arrives afterwards.
        assert!(!store.append_message(message("srv-1", "u1", "u2", "hello")));
        let messages = store.messages(&key);
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].pending);
    }

    #[test]
    fn unconfirmed_placeholders_survive_history() {
        let mut store = ConversationStore::new(0);
        let key = store.request_history(&"u1".into(), &"u2".into()).unwrap();
        store.append_message(ChatMessage::optimistic("u1".into(), "u2".into(), "hello"));
        store.append_message(ChatMessage::optimistic("u1".into(), "u2".into(), "hello"));

        // Only one of the two identical sends reached the server so far.
        store.history_loaded(&key, vec![message("srv-1", "u1", "u2", "hello")]);
        let messages = store.messages(&key);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "srv-1");
        assert!(messages[1].pending);

        store.append_message(message("srv-2", "u1", "u2", "hello"));
        assert_eq!(ids(&store, &key), vec!["srv-1", "srv-2"]);
    }

    #[test]
    fn oldest_messages_are_dropped_beyond_cap() {
        let mut store = ConversationStore::new(2);
        for id in ["m1", "m2", "m3"] {
            store.append_message(message(id, "u2", "u1", id));
        }
        assert_eq!(ids(&store, &key("u1", "u2")), vec!["m2", "m3"]);
    }

    #[test]
    fn clear_resets_status() {
        let mut store = ConversationStore::new(0);
        store.request_history(&"u1".into(), &"u2".into());
        store.clear();
        assert_eq!(store.status(&key("u1", "u2")), FetchStatus::NotStarted);
    }
}
