use super::types::{
    ChatMessage, ConnectionRequest, ConversationKey, UnreadSummary, UserId, UserProfile,
};

/// Inbound events on the realtime connection.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    MessageReceived(ChatMessage),
    UserOnline(UserId),
    UserOffline(UserId),
}

/// Results reported by the network client back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    SessionStarted(UserProfile),
    /// Logged out, or the session could not be restored.
    SessionEnded,
    LoginFailed(String),
    /// The account exists; the user still has to log in.
    SignedUp,
    ProfileUpdated(UserProfile),
    ResetTokenSent,
    PasswordChanged,
    AccountDeleted,
    HistoryLoaded {
        key: ConversationKey,
        messages: Vec<ChatMessage>,
    },
    HistoryFailed {
        key: ConversationKey,
        error: String,
    },
    UnreadLoaded(Vec<UnreadSummary>),
    MarkedRead(UserId),
    OnlineUsersLoaded(Vec<UserId>),
    FeedLoaded(Vec<UserProfile>),
    ConnectionsLoaded(Vec<UserProfile>),
    RequestsLoaded(Vec<ConnectionRequest>),
    RequestReviewed(String),
    RequestSent(UserId),
    Failed {
        operation: &'static str,
        error: String,
    },
}
