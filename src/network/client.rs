use tokio::sync::mpsc;

use crate::common::{NetworkCommand, NetworkEvent};

use super::api::{ApiClient, ApiError};

/// Runs UI commands against the REST API and reports the results.
pub struct NetworkClient {
    api: ApiClient,
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
}

impl NetworkClient {
    pub fn new(
        api: ApiClient,
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        Self {
            api,
            event_sender,
            command_receiver,
        }
    }

    /// Serves commands until the UI drops its sender. Each command runs on
    /// its own task so a slow request does not hold up the others.
    pub async fn run(mut self) {
        log::info!("Network client started against {}", self.api.base_url());

        while let Some(command) = self.command_receiver.recv().await {
            log::debug!("Handling command {}", command.tag());
            let api = self.api.clone();
            let event_sender = self.event_sender.clone();
            tokio::spawn(async move {
                let event = handle_command(&api, command).await;
                if let Err(err) = event_sender.send(event).await {
                    log::warn!("Failed to notify UI: {err}");
                }
            });
        }

        log::info!("Command channel closed; network client stopped");
    }
}

fn failed(operation: &'static str, err: ApiError) -> NetworkEvent {
    log::warn!("{operation} failed: {err}");
    NetworkEvent::Failed {
        operation,
        error: err.reason(),
    }
}

pub async fn handle_command(api: &ApiClient, command: NetworkCommand) -> NetworkEvent {
    match command {
        NetworkCommand::Login { email, password } => match api.login(&email, &password).await {
            Ok(profile) => NetworkEvent::SessionStarted(profile),
            Err(err) => {
                log::warn!("Login failed: {err}");
                NetworkEvent::LoginFailed(err.reason())
            }
        },
        NetworkCommand::Logout => match api.logout().await {
            Ok(()) => NetworkEvent::SessionEnded,
            Err(err) => failed("logout", err),
        },
        NetworkCommand::Signup(request) => match api.signup(&request).await {
            Ok(()) => {
                log::info!("Account created for {}", request.email_id);
                NetworkEvent::SignedUp
            }
            Err(err) => failed("signup", err),
        },
        NetworkCommand::FetchProfile => match api.view_profile().await {
            Ok(profile) => NetworkEvent::SessionStarted(profile),
            Err(err) => {
                log::info!("No session restored: {err}");
                NetworkEvent::SessionEnded
            }
        },
        NetworkCommand::UpdateProfile(update) => match api.edit_profile(&update).await {
            Ok(profile) => NetworkEvent::ProfileUpdated(profile),
            Err(err) => failed("profile update", err),
        },
        NetworkCommand::ForgotPassword { email } => match api.forgot_password(&email).await {
            Ok(()) => NetworkEvent::ResetTokenSent,
            Err(err) => failed("password recovery", err),
        },
        NetworkCommand::ResetPassword(reset) => match api.reset_password(&reset).await {
            Ok(()) => NetworkEvent::PasswordChanged,
            Err(err) => failed("password reset", err),
        },
        NetworkCommand::DeleteAccount { email } => match api.delete_account(&email).await {
            Ok(()) => NetworkEvent::AccountDeleted,
            Err(err) => failed("delete account", err),
        },
        NetworkCommand::FetchHistory { key, peer_id } => match api.messages(&peer_id).await {
            Ok(messages) => NetworkEvent::HistoryLoaded { key, messages },
            Err(err) => {
                log::warn!("History fetch for {key} failed: {err}");
                NetworkEvent::HistoryFailed {
                    key,
                    error: err.to_string(),
                }
            }
        },
        NetworkCommand::FetchUnread => match api.unread_messages().await {
            Ok(summaries) => NetworkEvent::UnreadLoaded(summaries),
            Err(err) => failed("unread messages", err),
        },
        NetworkCommand::MarkRead(peer_id) => match api.mark_read(&peer_id).await {
            Ok(()) => NetworkEvent::MarkedRead(peer_id),
            Err(err) => failed("mark read", err),
        },
        NetworkCommand::FetchOnlineUsers => match api.online_users().await {
            Ok(ids) => NetworkEvent::OnlineUsersLoaded(ids),
            Err(err) => failed("online users", err),
        },
        NetworkCommand::FetchConnections => match api.connections().await {
            Ok(profiles) => NetworkEvent::ConnectionsLoaded(profiles),
            Err(err) => failed("connections", err),
        },
        NetworkCommand::FetchRequests => match api.received_requests().await {
            Ok(requests) => NetworkEvent::RequestsLoaded(requests),
            Err(err) => failed("requests", err),
        },
        NetworkCommand::ReviewRequest { status, request_id } => {
            match api.review_request(status, &request_id).await {
                Ok(()) => NetworkEvent::RequestReviewed(request_id),
                Err(err) => failed("review request", err),
            }
        }
        NetworkCommand::FetchFeed => match api.feed().await {
            Ok(profiles) => NetworkEvent::FeedLoaded(profiles),
            Err(err) => failed("feed", err),
        },
        NetworkCommand::SendRequest { status, user_id } => {
            match api.send_request(status, &user_id).await {
                Ok(()) => NetworkEvent::RequestSent(user_id),
                Err(err) => failed("send request", err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::common::{ConversationKey, PasswordReset, ProfileDraft, SignupDraft, UserId};

    fn api(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn failed_profile_fetch_ends_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile/view"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let event = handle_command(&api(&server), NetworkCommand::FetchProfile).await;
        assert_eq!(event, NetworkEvent::SessionEnded);
    }

    #[tokio::test]
    async fn history_failure_carries_the_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages/u2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let key = ConversationKey::new(&"u1".into(), &"u2".into());
        let event = handle_command(
            &api(&server),
            NetworkCommand::FetchHistory {
                key: key.clone(),
                peer_id: "u2".into(),
            },
        )
        .await;
        assert!(matches!(event, NetworkEvent::HistoryFailed { key: got, .. } if got == key));
    }

    #[tokio::test]
    async fn rejected_signup_reports_server_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signup"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("Email already registered"),
            )
            .mount(&server)
            .await;

        let request = SignupDraft {
            email: "ada@example.dev".to_string(),
            password: "Str0ng!pass".to_string(),
            profile: ProfileDraft {
                first_name: "Ada".to_string(),
                age: "36".to_string(),
                gender: "female".to_string(),
                skills: "rust".to_string(),
                ..ProfileDraft::default()
            },
        }
        .validate()
        .unwrap();

        let event = handle_command(&api(&server), NetworkCommand::Signup(request)).await;
        assert_eq!(
            event,
            NetworkEvent::Failed {
                operation: "signup",
                error: "Email already registered".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn account_commands_map_to_events() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/profile/edit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "_id": "u1", "firstName": "Ada" }
            })))
            .mount(&server)
            .await;
        for (verb, route) in [
            ("POST", "/forgot-password"),
            ("PATCH", "/reset-password"),
            ("DELETE", "/delete"),
        ] {
            Mock::given(method(verb))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;
        }

        let api = api(&server);
        let update = ProfileDraft {
            first_name: "Ada".to_string(),
            age: "36".to_string(),
            gender: "female".to_string(),
            skills: "rust".to_string(),
            ..ProfileDraft::default()
        }
        .validate()
        .unwrap();
        let event = handle_command(&api, NetworkCommand::UpdateProfile(update)).await;
        assert!(matches!(
            event,
            NetworkEvent::ProfileUpdated(profile) if profile.first_name == "Ada"
        ));

        let email = "ada@example.dev".to_string();
        let command = NetworkCommand::ForgotPassword {
            email: email.clone(),
        };
        let event = handle_command(&api, command).await;
        assert_eq!(event, NetworkEvent::ResetTokenSent);

        let reset = PasswordReset {
            reset_token: "tok-1".to_string(),
            new_password: "N3w!secret".to_string(),
        };
        let event = handle_command(&api, NetworkCommand::ResetPassword(reset)).await;
        assert_eq!(event, NetworkEvent::PasswordChanged);

        let event = handle_command(&api, NetworkCommand::DeleteAccount { email }).await;
        assert_eq!(event, NetworkEvent::AccountDeleted);
    }

    #[tokio::test]
    async fn run_loop_reports_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/online-users"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": ["u2"] })),
            )
            .mount(&server)
            .await;

        let (command_tx, command_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(4);
        let handle = tokio::spawn(NetworkClient::new(api(&server), event_tx, command_rx).run());

        command_tx.send(NetworkCommand::FetchOnlineUsers).await.unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
            .await
            .unwrap();
        assert_eq!(
            event,
            Some(NetworkEvent::OnlineUsersLoaded(vec![UserId::from("u2")]))
        );

        drop(command_tx);
        handle.await.unwrap();
    }
}
