use super::forms::{PasswordReset, ProfileUpdate, SignupRequest};
use super::types::{ConversationKey, ReviewStatus, SwipeStatus, UserId};

/// Requests from the UI to the network client.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkCommand {
    Login {
        email: String,
        password: String,
    },
    Logout,
    Signup(SignupRequest),
    /// Restore the session from the cookie jar.
    FetchProfile,
    UpdateProfile(ProfileUpdate),
    /// Ask the server to mail a reset token.
    ForgotPassword {
        email: String,
    },
    ResetPassword(PasswordReset),
    DeleteAccount {
        email: String,
    },
    FetchHistory {
        key: ConversationKey,
        peer_id: UserId,
    },
    FetchUnread,
    MarkRead(UserId),
    FetchOnlineUsers,
    FetchConnections,
    FetchRequests,
    ReviewRequest {
        status: ReviewStatus,
        request_id: String,
    },
    FetchFeed,
    SendRequest {
        status: SwipeStatus,
        user_id: UserId,
    },
}

impl NetworkCommand {
    /// Log-safe tag (never includes a password).
    pub fn tag(&self) -> &'static str {
        match self {
            NetworkCommand::Login { .. } => "Login",
            NetworkCommand::Logout => "Logout",
            NetworkCommand::Signup(_) => "Signup",
            NetworkCommand::FetchProfile => "FetchProfile",
            NetworkCommand::UpdateProfile(_) => "UpdateProfile",
            NetworkCommand::ForgotPassword { .. } => "ForgotPassword",
            NetworkCommand::ResetPassword(_) => "ResetPassword",
            NetworkCommand::DeleteAccount { .. } => "DeleteAccount",
            NetworkCommand::FetchHistory { .. } => "FetchHistory",
            NetworkCommand::FetchUnread => "FetchUnread",
            NetworkCommand::MarkRead(_) => "MarkRead",
            NetworkCommand::FetchOnlineUsers => "FetchOnlineUsers",
            NetworkCommand::FetchConnections => "FetchConnections",
            NetworkCommand::FetchRequests => "FetchRequests",
            NetworkCommand::ReviewRequest { .. } => "ReviewRequest",
            NetworkCommand::FetchFeed => "FetchFeed",
            NetworkCommand::SendRequest { .. } => "SendRequest",
        }
    }
}
