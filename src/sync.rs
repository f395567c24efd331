//! Glue between the realtime connection, the network client and the stores.
//!
//! The coordinator decides whether an inbound message becomes a visible
//! notification. That decision reads the foreground conversation at the time
//! the event is handled, not when the listener was attached.

use crate::common::{
    ChatMessage, NetworkCommand, NetworkEvent, RealtimeEvent, ReviewStatus, SwipeStatus, UserId,
    UserProfile,
};
use crate::network::{ConnectionId, ConnectionManager, OutboundEvent, Subscription};
use crate::store::{AppStore, Notice};

/// What happened to an inbound chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Our own message echoed back.
    SelfEcho,
    /// The conversation with the sender is on screen.
    Visible,
    /// The sender was flagged as having unseen activity.
    Notified,
}

struct ActiveSubscription {
    subscription: Subscription,
    foreground: Option<UserId>,
}

pub struct SyncCoordinator {
    store: AppStore,
    /// Peer of the chat window. Kept while the window is hidden so its state
    /// survives close and reopen.
    receiver: Option<UserProfile>,
    chat_open: bool,
    active: Option<ActiveSubscription>,
}

impl SyncCoordinator {
    pub fn new(store: AppStore) -> Self {
        Self {
            store,
            receiver: None,
            chat_open: false,
            active: None,
        }
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AppStore {
        &mut self.store
    }

    pub fn receiver(&self) -> Option<&UserProfile> {
        self.receiver.as_ref()
    }

    pub fn is_chat_open(&self) -> bool {
        self.chat_open
    }

    /// The peer whose conversation is visible, if any.
    pub fn foreground_peer(&self) -> Option<&UserId> {
        if self.chat_open {
            self.receiver.as_ref().map(|profile| &profile.id)
        } else {
            None
        }
    }

    pub fn subscribed_connection(&self) -> Option<ConnectionId> {
        self.active
            .as_ref()
            .map(|active| active.subscription.connection_id())
    }

    /// Keeps the listener in step with the connection instance and the
    /// foreground peer. A new connection gets a new listener, attached only
    /// after the previous one is drained and dropped. A foreground change on
    /// the same connection re-binds the existing listener, so its queue is
    /// never replaced and no event is lost or handled twice.
    pub fn sync_subscription(&mut self, connections: &mut ConnectionManager) {
        let connection = connections.connection_id();
        let foreground = self.foreground_peer().cloned();

        match self.active.as_mut() {
            Some(active) if Some(active.subscription.connection_id()) == connection => {
                if active.foreground != foreground {
                    log::debug!(
                        "Listener on {} now follows foreground {foreground:?}",
                        active.subscription.connection_id()
                    );
                    active.foreground = foreground;
                }
                return;
            }
            None if connection.is_none() => return,
            _ => {}
        }

        self.detach();
        if let Some(subscription) = connections.subscribe() {
            log::debug!(
                "Listening on connection {} (foreground: {foreground:?})",
                subscription.connection_id()
            );
            self.active = Some(ActiveSubscription {
                subscription,
                foreground,
            });
        }
    }

    /// Drops the listener after handling whatever it had already buffered.
    pub fn detach(&mut self) {
        if let Some(mut active) = self.active.take() {
            for event in active.subscription.drain() {
                self.handle_realtime(event);
            }
        }
    }

    /// Handles every event buffered on the current listener.
    pub fn pump(&mut self) -> usize {
        let events = match self.active.as_mut() {
            Some(active) => active.subscription.drain(),
            None => return 0,
        };
        let count = events.len();
        for event in events {
            self.handle_realtime(event);
        }
        count
    }

    pub fn handle_realtime(&mut self, event: RealtimeEvent) {
        match event {
            RealtimeEvent::MessageReceived(message) => {
                self.handle_message(message);
            }
            RealtimeEvent::UserOnline(id) => self.store.presence.mark_online(id),
            RealtimeEvent::UserOffline(id) => self.store.presence.mark_offline(&id),
        }
    }

    pub fn handle_message(&mut self, message: ChatMessage) -> Delivery {
        let sender = message.sender_id.clone();
        self.store.conversations.append_message(message);

        if self.store.identity() == Some(&sender) {
            Delivery::SelfEcho
        } else if self.foreground_peer() == Some(&sender) {
            Delivery::Visible
        } else {
            self.store.notifications.flag(sender);
            Delivery::Notified
        }
    }

    /// Brings the conversation with `peer` to the foreground and returns the
    /// requests it needs: a history fetch on first open or after a failure,
    /// and a read receipt when the server reports unread messages.
    pub fn open_conversation(&mut self, peer: UserProfile) -> Vec<NetworkCommand> {
        let peer_id = peer.id.clone();
        self.receiver = Some(peer);
        self.chat_open = true;
        self.store.notifications.clear(&peer_id);

        let mut commands = Vec::new();
        let Some(self_id) = self.store.identity().cloned() else {
            return commands;
        };

        if let Some(key) = self.store.conversations.request_history(&self_id, &peer_id) {
            commands.push(NetworkCommand::FetchHistory {
                key,
                peer_id: peer_id.clone(),
            });
        }
        if self.store.unread.count_for(&peer_id) > 0 {
            commands.push(NetworkCommand::MarkRead(peer_id));
        }
        commands
    }

    pub fn close_conversation(&mut self) {
        self.chat_open = false;
    }

    /// Appends an optimistic copy of `body` to the foreground conversation
    /// and returns the frame to emit.
    pub fn compose(&mut self, body: &str) -> Option<OutboundEvent> {
        let body = body.trim();
        if body.is_empty() {
            return None;
        }
        let sender = self.store.identity()?.clone();
        let receiver = self.foreground_peer()?.clone();

        let message = ChatMessage::optimistic(sender, receiver, body);
        let outbound = OutboundEvent::from(&message);
        self.store.conversations.append_message(message);
        Some(outbound)
    }

    /// Applies a network result to the stores and returns follow-up requests.
    pub fn handle_network_event(&mut self, event: NetworkEvent) -> Vec<NetworkCommand> {
        match event {
            NetworkEvent::SessionStarted(profile) => {
                if self.store.identity() != Some(&profile.id) {
                    self.reset();
                }
                self.store.session.start(profile);
                return vec![
                    NetworkCommand::FetchOnlineUsers,
                    NetworkCommand::FetchUnread,
                    NetworkCommand::FetchConnections,
                    NetworkCommand::FetchFeed,
                    NetworkCommand::FetchRequests,
                ];
            }
            NetworkEvent::SessionEnded => self.reset(),
            NetworkEvent::LoginFailed(error) => self.store.notice = Some(Notice::Error(error)),
            NetworkEvent::SignedUp => {
                self.notify("Account created. Log in to continue.");
            }
            NetworkEvent::ProfileUpdated(profile) => {
                if self.store.session.refresh(profile) {
                    self.notify("Profile saved.");
                }
            }
            NetworkEvent::ResetTokenSent => {
                self.notify("Check your inbox for the reset token.");
            }
            NetworkEvent::PasswordChanged => {
                self.notify("Password changed. Log in with the new password.");
            }
            NetworkEvent::AccountDeleted => {
                self.reset();
                self.notify("Your account was deleted.");
            }
            NetworkEvent::HistoryLoaded { key, messages } => {
                self.store.conversations.history_loaded(&key, messages);
            }
            NetworkEvent::HistoryFailed { key, error } => {
                log::warn!("History for {key} unavailable: {error}");
                self.store.conversations.history_failed(&key);
            }
            NetworkEvent::UnreadLoaded(summaries) => {
                self.store.unread.replace(summaries);
                // The open conversation is already read.
                if let Some(peer_id) = self.foreground_peer().cloned() {
                    if self.store.unread.count_for(&peer_id) > 0 {
                        return vec![NetworkCommand::MarkRead(peer_id)];
                    }
                }
            }
            NetworkEvent::MarkedRead(peer_id) => self.store.unread.mark_read(&peer_id),
            NetworkEvent::OnlineUsersLoaded(ids) => self.store.presence.replace_all(ids),
            NetworkEvent::FeedLoaded(profiles) => self.store.feed.replace(profiles),
            NetworkEvent::ConnectionsLoaded(profiles) => self.store.connections.replace(profiles),
            NetworkEvent::RequestsLoaded(requests) => self.store.requests.replace(requests),
            NetworkEvent::RequestReviewed(request_id) => {
                self.store.requests.remove(&request_id);
                return vec![NetworkCommand::FetchConnections];
            }
            NetworkEvent::RequestSent(user_id) => {
                log::debug!("Request to {user_id} recorded");
            }
            NetworkEvent::Failed { operation, error } => {
                self.store.notice = Some(Notice::Error(format!("{operation}: {error}")));
            }
        }
        Vec::new()
    }

    fn notify(&mut self, text: &str) {
        self.store.notice = Some(Notice::Info(text.to_string()));
    }

    /// Records a feed decision, removing the candidate right away.
    pub fn decide_on_candidate(&mut self, user_id: UserId, status: SwipeStatus) -> NetworkCommand {
        self.store.feed.remove(&user_id);
        NetworkCommand::SendRequest { status, user_id }
    }

    /// The request leaves the list once the server confirms the review.
    pub fn review_request(&self, request_id: String, status: ReviewStatus) -> NetworkCommand {
        NetworkCommand::ReviewRequest { status, request_id }
    }

    /// Session teardown: stops listening, hides the chat and clears the
    /// stores. Results that arrive later find nothing to update.
    pub fn reset(&mut self) {
        self.active = None;
        self.receiver = None;
        self.chat_open = false;
        self.store.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::runtime::Handle;

    use super::*;
    use crate::common::{ConversationKey, UnreadSummary};
    use crate::store::FetchStatus;

    fn profile(id: &str) -> UserProfile {
        serde_json::from_value(serde_json::json!({ "_id": id, "firstName": id })).unwrap()
    }

    fn inbound(id: &str, from: &str, to: &str, body: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            pending: false,
            ..ChatMessage::optimistic(from.into(), to.into(), body)
        }
    }

    fn coordinator_for(self_id: &str) -> SyncCoordinator {
        let mut store = AppStore::new(0);
        store.session.start(profile(self_id));
        SyncCoordinator::new(store)
    }

    fn flagged(coordinator: &SyncCoordinator) -> Vec<(String, bool)> {
        let mut entries: Vec<_> = coordinator
            .store()
            .notifications
            .flagged()
            .map(|id| (id.to_string(), true))
            .collect();
        entries.sort();
        entries
    }

    fn manager() -> ConnectionManager {
        ConnectionManager::new(
            "ws://127.0.0.1:9",
            Duration::from_secs(60),
            Handle::current(),
        )
        .unwrap()
    }

    #[test]
    fn background_message_flags_sender() {
        let mut coordinator = coordinator_for("u1");
        let delivery = coordinator.handle_message(inbound("m1", "u2", "u1", "hi"));

        assert_eq!(delivery, Delivery::Notified);
        let key = ConversationKey::new(&"u1".into(), &"u2".into());
        assert_eq!(key.as_str(), "u1_u2");
        assert_eq!(coordinator.store().conversations.messages(&key).len(), 1);
        assert_eq!(flagged(&coordinator), vec![("u2".to_string(), true)]);
    }

    #[test]
    fn foreground_message_is_not_flagged() {
        let mut coordinator = coordinator_for("u1");
        coordinator.open_conversation(profile("u2"));

        let delivery = coordinator.handle_message(inbound("m1", "u2", "u1", "hi"));
        assert_eq!(delivery, Delivery::Visible);
        assert!(flagged(&coordinator).is_empty());
    }

    #[test]
    fn other_peer_is_flagged_while_chatting() {
        let mut coordinator = coordinator_for("u1");
        coordinator.open_conversation(profile("u2"));

        coordinator.handle_message(inbound("m1", "u3", "u1", "psst"));
        assert_eq!(flagged(&coordinator), vec![("u3".to_string(), true)]);
    }

    #[test]
    fn closed_window_no_longer_counts_as_foreground() {
        let mut coordinator = coordinator_for("u1");
        coordinator.open_conversation(profile("u2"));
        coordinator.close_conversation();

        assert_eq!(coordinator.receiver().map(|p| p.id.as_str()), Some("u2"));
        assert_eq!(
            coordinator.handle_message(inbound("m1", "u2", "u1", "hi")),
            Delivery::Notified
        );
    }

    #[test]
    fn self_echo_never_notifies() {
        let mut coordinator = coordinator_for("u1");
        let delivery = coordinator.handle_message(inbound("m1", "u1", "u2", "mine"));
        assert_eq!(delivery, Delivery::SelfEcho);
        assert!(flagged(&coordinator).is_empty());
    }

    #[test]
    fn opening_clears_flag_and_requests_history_once() {
        let mut coordinator = coordinator_for("u1");
        coordinator.handle_message(inbound("m1", "u2", "u1", "hi"));
        coordinator
            .store_mut()
            .unread
            .replace(vec![UnreadSummary {
                sender_id: "u2".into(),
                count: 1,
            }]);

        let key = ConversationKey::new(&"u1".into(), &"u2".into());
        let commands = coordinator.open_conversation(profile("u2"));
        assert_eq!(
            commands,
            vec![
                NetworkCommand::FetchHistory {
                    key: key.clone(),
                    peer_id: "u2".into(),
                },
                NetworkCommand::MarkRead("u2".into()),
            ]
        );
        assert!(flagged(&coordinator).is_empty());

        coordinator.close_conversation();
        coordinator.handle_network_event(NetworkEvent::MarkedRead("u2".into()));
        assert!(coordinator.open_conversation(profile("u2")).is_empty());
        assert_eq!(
            coordinator.store().conversations.status(&key),
            FetchStatus::Loading
        );
    }

    #[test]
    fn compose_appends_pending_message_for_foreground_peer() {
        let mut coordinator = coordinator_for("u1");
        assert!(coordinator.compose("hello").is_none());

        coordinator.open_conversation(profile("u2"));
        assert!(coordinator.compose("   ").is_none());

        let outbound = coordinator.compose(" hello ").unwrap();
        let OutboundEvent::SendMessage(frame) = outbound;
        assert_eq!(frame.message, "hello");
        assert_eq!(frame.receiver_id, UserId::from("u2"));

        let messages = coordinator.store().messages_with(&"u2".into());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].pending);

        // The server echo confirms the placeholder instead of duplicating it.
        coordinator.handle_message(inbound("srv-1", "u1", "u2", "hello"));
        let messages = coordinator.store().messages_with(&"u2".into());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "srv-1");
    }

    #[test]
    fn presence_events_do_not_notify() {
        let mut coordinator = coordinator_for("u1");
        coordinator.handle_realtime(RealtimeEvent::UserOnline("u2".into()));
        assert!(coordinator.store().presence.is_online(&"u2".into()));
        coordinator.handle_realtime(RealtimeEvent::UserOffline("u2".into()));
        assert!(!coordinator.store().presence.is_online(&"u2".into()));
        assert!(flagged(&coordinator).is_empty());
    }

    #[test]
    fn session_start_requests_initial_data_and_end_resets() {
        let mut coordinator = SyncCoordinator::new(AppStore::new(0));
        let commands =
            coordinator.handle_network_event(NetworkEvent::SessionStarted(profile("u1")));
        assert!(commands.contains(&NetworkCommand::FetchOnlineUsers));
        assert!(commands.contains(&NetworkCommand::FetchUnread));
        assert_eq!(coordinator.store().identity(), Some(&"u1".into()));

        coordinator.open_conversation(profile("u2"));
        coordinator.handle_message(inbound("m1", "u3", "u1", "hi"));
        coordinator.handle_network_event(NetworkEvent::SessionEnded);

        assert!(coordinator.store().identity().is_none());
        assert!(coordinator.receiver().is_none());
        assert!(flagged(&coordinator).is_empty());
    }

    #[test]
    fn account_results_update_session_and_notice() {
        let mut coordinator = coordinator_for("u1");

        let mut renamed = profile("u1");
        renamed.first_name = "Augusta".to_string();
        coordinator.handle_network_event(NetworkEvent::ProfileUpdated(renamed));
        let session = coordinator.store().session.profile().unwrap();
        assert_eq!(session.first_name, "Augusta");
        assert!(!coordinator.store().notice.as_ref().unwrap().is_error());

        coordinator.handle_network_event(NetworkEvent::Failed {
            operation: "profile update",
            error: "Invalid edit request".to_string(),
        });
        assert_eq!(
            coordinator.store().notice,
            Some(Notice::Error("profile update: Invalid edit request".to_string()))
        );

        coordinator.open_conversation(profile("u2"));
        coordinator.handle_message(inbound("m1", "u3", "u1", "hi"));
        coordinator.handle_network_event(NetworkEvent::AccountDeleted);
        assert!(coordinator.store().identity().is_none());
        assert!(coordinator.receiver().is_none());
        assert!(flagged(&coordinator).is_empty());
        assert_eq!(
            coordinator.store().notice,
            Some(Notice::Info("Your account was deleted.".to_string()))
        );
    }

    #[test]
    fn signup_and_recovery_leave_the_session_alone() {
        let mut coordinator = SyncCoordinator::new(AppStore::new(0));
        for event in [
            NetworkEvent::SignedUp,
            NetworkEvent::ResetTokenSent,
            NetworkEvent::PasswordChanged,
        ] {
            assert!(coordinator.handle_network_event(event).is_empty());
            assert!(coordinator.store().identity().is_none());
            assert!(matches!(coordinator.store().notice, Some(Notice::Info(_))));
        }
    }

    #[test]
    fn late_history_after_logout_is_ignored() {
        let mut coordinator = coordinator_for("u1");
        let commands = coordinator.open_conversation(profile("u2"));
        let Some(NetworkCommand::FetchHistory { key, .. }) = commands.into_iter().next() else {
            panic!("expected a history fetch");
        };

        coordinator.reset();
        coordinator.handle_network_event(NetworkEvent::HistoryLoaded {
            key: key.clone(),
            messages: vec![inbound("m1", "u2", "u1", "late")],
        });
        assert!(coordinator.store().conversations.messages(&key).is_empty());
    }

    #[test]
    fn reviewed_request_is_removed_and_connections_refreshed() {
        let mut coordinator = coordinator_for("u1");
        coordinator.handle_network_event(NetworkEvent::RequestsLoaded(vec![
            crate::common::ConnectionRequest {
                id: "r1".to_string(),
                from_user_id: profile("u5"),
            },
        ]));
        let commands = coordinator.handle_network_event(NetworkEvent::RequestReviewed("r1".into()));
        assert!(coordinator.store().requests.received().is_empty());
        assert_eq!(commands, vec![NetworkCommand::FetchConnections]);
    }

    #[test]
    fn feed_decision_is_optimistic() {
        let mut coordinator = coordinator_for("u1");
        coordinator.handle_network_event(NetworkEvent::FeedLoaded(vec![
            profile("u7"),
            profile("u8"),
        ]));

        let command = coordinator.decide_on_candidate("u7".into(), SwipeStatus::Interested);
        assert_eq!(
            command,
            NetworkCommand::SendRequest {
                status: SwipeStatus::Interested,
                user_id: "u7".into(),
            }
        );
        assert_eq!(
            coordinator.store().feed.current().map(|p| p.id.as_str()),
            Some("u8")
        );
    }

    #[tokio::test]
    async fn listener_follows_foreground_and_connection_changes() {
        let mut connections = manager();
        let mut coordinator = coordinator_for("u1");

        coordinator.sync_subscription(&mut connections);
        assert!(coordinator.subscribed_connection().is_none());

        connections.set_identity(Some(&"u1".into()));
        coordinator.sync_subscription(&mut connections);
        let first = coordinator.subscribed_connection();
        assert!(first.is_some());

        // A foreground switch keeps the listener and its queue.
        connections.deliver(RealtimeEvent::MessageReceived(inbound("m1", "u2", "u1", "hi")));
        coordinator.open_conversation(profile("u3"));
        coordinator.sync_subscription(&mut connections);
        assert_eq!(coordinator.subscribed_connection(), first);
        assert_eq!(coordinator.pump(), 1);
        assert_eq!(coordinator.store().messages_with(&"u2".into()).len(), 1);
        assert_eq!(flagged(&coordinator), vec![("u2".to_string(), true)]);

        // The rule reads the foreground recorded at handling time.
        connections.deliver(RealtimeEvent::MessageReceived(inbound("m2", "u3", "u1", "hey")));
        assert_eq!(coordinator.pump(), 1);
        assert_eq!(flagged(&coordinator), vec![("u2".to_string(), true)]);

        // Events still queued on the old connection are handled before the swap.
        connections.deliver(RealtimeEvent::MessageReceived(inbound("m3", "u4", "u1", "yo")));
        connections.set_identity(Some(&"u9".into()));
        coordinator.sync_subscription(&mut connections);
        assert_ne!(coordinator.subscribed_connection(), first);
        assert_eq!(coordinator.store().messages_with(&"u4".into()).len(), 1);

        connections.disconnect();
        coordinator.sync_subscription(&mut connections);
        assert!(coordinator.subscribed_connection().is_none());
    }

    #[tokio::test]
    async fn no_event_is_lost_while_the_foreground_flips() {
        const TOTAL: usize = 5000;

        let mut connections = manager();
        let mut coordinator = coordinator_for("u1");
        connections.set_identity(Some(&"u1".into()));
        coordinator.sync_subscription(&mut connections);
        let connection = coordinator.subscribed_connection();

        let sink = connections.event_sink().unwrap();
        let producer = std::thread::spawn(move || {
            for index in 0..TOTAL {
                let message = inbound(&format!("m{index}"), "u2", "u1", "tick");
                if sink.send(RealtimeEvent::MessageReceived(message)).is_err() {
                    break;
                }
            }
        });

        let mut flips = 0usize;
        while !producer.is_finished() {
            let peer = if flips % 2 == 0 { "u3" } else { "u4" };
            coordinator.open_conversation(profile(peer));
            coordinator.sync_subscription(&mut connections);
            coordinator.pump();
            flips += 1;
        }
        producer.join().unwrap();
        coordinator.sync_subscription(&mut connections);
        coordinator.pump();

        assert_eq!(coordinator.subscribed_connection(), connection);
        assert_eq!(coordinator.store().messages_with(&"u2".into()).len(), TOTAL);
        assert_eq!(flagged(&coordinator), vec![("u2".to_string(), true)]);
    }
}
