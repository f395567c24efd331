//! Typed client for the DevConnect REST API.
//!
//! The backend authenticates with a session cookie, so one client (and its
//! cookie jar) is shared by every request of a session.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::common::{
    ChatMessage, ConnectionRequest, PasswordReset, ProfileUpdate, ReviewStatus, SignupRequest,
    SwipeStatus, UnreadSummary, UserId, UserProfile,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The server's own explanation when it sent one, for showing to the user.
    pub fn reason(&self) -> String {
        match self {
            ApiError::Status { status, body } => {
                server_reason(body).unwrap_or_else(|| status.to_string())
            }
            other => other.to_string(),
        }
    }
}

/// Error bodies are plain text, `{"message": ..}` or a validation list
/// `{"errors": [{"message": ..}]}`.
fn server_reason(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorBody {
        List { errors: Vec<Detail> },
        Single { message: String },
    }

    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let reason = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::List { errors }) => errors
            .into_iter()
            .map(|detail| detail.message)
            .collect::<Vec<_>>()
            .join(", "),
        Ok(ErrorBody::Single { message }) => message,
        Err(_) => body.to_string(),
    };
    Some(reason)
}

/// List endpoints and profile edits wrap their payload as `{"data": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let body = Self::send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        Ok(body)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let request = self
            .http
            .post(self.url("/login"))
            .json(&json!({ "emailId": email, "password": password }));
        Self::fetch(request).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        Self::send(self.http.post(self.url("/logout"))).await?;
        Ok(())
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError> {
        Self::send(self.http.post(self.url("/signup")).json(request)).await?;
        Ok(())
    }

    pub async fn view_profile(&self) -> Result<UserProfile, ApiError> {
        Self::fetch(self.http.get(self.url("/profile/view"))).await
    }

    /// Returns the profile as stored after the edit.
    pub async fn edit_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let request = self.http.patch(self.url("/profile/edit")).json(update);
        let envelope: Envelope<UserProfile> = Self::fetch(request).await?;
        Ok(envelope.data)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.url("/forgot-password"))
            .json(&json!({ "emailId": email }));
        Self::send(request).await?;
        Ok(())
    }

    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<(), ApiError> {
        Self::send(self.http.patch(self.url("/reset-password")).json(reset)).await?;
        Ok(())
    }

    /// Deletes the session user's account. The server expects the email as a
    /// confirmation.
    pub async fn delete_account(&self, email: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url("/delete"))
            .json(&json!({ "emailId": email }));
        Self::send(request).await?;
        Ok(())
    }

    pub async fn messages(&self, peer_id: &UserId) -> Result<Vec<ChatMessage>, ApiError> {
        Self::fetch(self.http.get(self.url(&format!("/messages/{peer_id}")))).await
    }

    pub async fn unread_messages(&self) -> Result<Vec<UnreadSummary>, ApiError> {
        Self::fetch(self.http.get(self.url("/unread-messages"))).await
    }

    pub async fn mark_read(&self, peer_id: &UserId) -> Result<(), ApiError> {
        Self::send(self.http.put(self.url(&format!("/mark-read/{peer_id}")))).await?;
        Ok(())
    }

    pub async fn online_users(&self) -> Result<Vec<UserId>, ApiError> {
        let envelope: Envelope<Vec<UserId>> =
            Self::fetch(self.http.get(self.url("/user/online-users"))).await?;
        Ok(envelope.data)
    }

    pub async fn connections(&self) -> Result<Vec<UserProfile>, ApiError> {
        let envelope: Envelope<Vec<UserProfile>> =
            Self::fetch(self.http.get(self.url("/user/connections"))).await?;
        Ok(envelope.data)
    }

    pub async fn received_requests(&self) -> Result<Vec<ConnectionRequest>, ApiError> {
        let envelope: Envelope<Vec<ConnectionRequest>> =
            Self::fetch(self.http.get(self.url("/user/requests/received"))).await?;
        Ok(envelope.data)
    }

    pub async fn review_request(
        &self,
        status: ReviewStatus,
        request_id: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/request/review/{}/{request_id}", status.as_str());
        Self::send(self.http.post(self.url(&path))).await?;
        Ok(())
    }

    pub async fn feed(&self) -> Result<Vec<UserProfile>, ApiError> {
        let envelope: Envelope<Vec<UserProfile>> =
            Self::fetch(self.http.get(self.url("/user/feed"))).await?;
        Ok(envelope.data)
    }

    pub async fn send_request(
        &self,
        status: SwipeStatus,
        user_id: &UserId,
    ) -> Result<(), ApiError> {
        let path = format!("/request/send/{}/{user_id}", status.as_str());
        Self::send(self.http.post(self.url(&path))).await?;
        Ok(())
    }
}
