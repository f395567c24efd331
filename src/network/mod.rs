pub mod api;
pub mod client;
pub mod frame;
pub mod socket;

pub use api::{ApiClient, ApiError};
pub use client::NetworkClient;
pub use frame::OutboundEvent;
pub use socket::{ConnectionId, ConnectionManager, SocketError, Subscription};
