pub mod commands;
pub mod events;
pub mod forms;
pub mod types;

pub use commands::NetworkCommand;
pub use events::{NetworkEvent, RealtimeEvent};
pub use forms::{
    FormErrors, PasswordReset, PasswordResetDraft, ProfileDraft, ProfileUpdate, SignupDraft,
    SignupRequest,
};
pub use types::{
    ChatMessage, ConnectionRequest, ConversationKey, ReviewStatus, SwipeStatus, UnreadSummary,
    UserId, UserProfile,
};
