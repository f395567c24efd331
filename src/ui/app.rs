use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{NetworkCommand, NetworkEvent};
use crate::network::ConnectionManager;
use crate::sync::SyncCoordinator;

use super::components::chat_window::{self, ChatAction};
use super::components::feed::FeedAction;
use super::components::profile::{self, ProfileAction};
use super::components::sidebar::{self, SidebarAction};
use super::components::{connections, feed, login, notice_banner, password, requests, signup};
use super::state::{AuthScreen, Screen, ViewState};

/// Realtime events arrive off the UI thread, so the frame loop polls.
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct ChatApp {
    coordinator: SyncCoordinator,
    connections: ConnectionManager,
    view: ViewState,
    command_sender: mpsc::Sender<NetworkCommand>,
    event_receiver: mpsc::Receiver<NetworkEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        coordinator: SyncCoordinator,
        connections: ConnectionManager,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
    ) -> Self {
        Self {
            coordinator,
            connections,
            view: ViewState::new(),
            command_sender,
            event_receiver,
        }
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.view.on_network_event(&event);
            let follow_ups = self.coordinator.handle_network_event(event);
            self.send_commands(follow_ups);
        }
    }

    /// Keeps the realtime connection and its listener in step with the
    /// session and the open chat.
    fn sync_realtime(&mut self) {
        self.connections.set_identity(self.coordinator.store().identity());
        self.coordinator.sync_subscription(&mut self.connections);
        self.coordinator.pump();
    }

    /// Sends a form submission. Any stale notice goes away with it.
    fn submit(&mut self, command: NetworkCommand) {
        self.coordinator.store_mut().notice = None;
        self.send_command(command);
    }

    fn render_notice(&mut self, ui: &mut egui::Ui) {
        if let Some(notice) = &self.coordinator.store().notice {
            if notice_banner(ui, notice) {
                self.coordinator.store_mut().notice = None;
            }
        }
    }

    fn send_command(&mut self, command: NetworkCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to network: {err}");
        }
    }

    fn send_commands(&mut self, commands: Vec<NetworkCommand>) {
        for command in commands {
            self.send_command(command);
        }
    }

    fn send_chat_message(&mut self, body: &str) {
        let Some(outbound) = self.coordinator.compose(body) else {
            return;
        };
        // The optimistic copy stays pending until the server echoes it back.
        if let Err(err) = self.connections.emit(outbound) {
            log::warn!("Message not sent: {err}");
        }
    }

    fn render_auth(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_notice(ui);

            let command = match self.view.auth {
                AuthScreen::Login => login::render(ui, &mut self.view)
                    .map(|(email, password)| NetworkCommand::Login { email, password }),
                AuthScreen::Signup => {
                    signup::render(ui, &mut self.view).map(NetworkCommand::Signup)
                }
                AuthScreen::ForgotPassword => password::render_forgot(ui, &mut self.view)
                    .map(|email| NetworkCommand::ForgotPassword { email }),
                AuthScreen::ResetPassword => {
                    password::render_reset(ui, &mut self.view).map(NetworkCommand::ResetPassword)
                }
            };
            if let Some(command) = command {
                self.submit(command);
            }
        });
    }

    fn render_session(&mut self, ctx: &egui::Context) {
        let sidebar_action = egui::SidePanel::left("nav_sidebar")
            .resizable(false)
            .default_width(180.0)
            .show(ctx, |ui| {
                sidebar::render(ui, self.coordinator.store(), &mut self.view.screen)
            })
            .inner;

        if let Some(SidebarAction::Logout) = sidebar_action {
            self.send_command(NetworkCommand::Logout);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_notice(ui);

            match self.view.screen {
                Screen::Feed => match feed::render(ui, &self.coordinator.store().feed) {
                    Some(FeedAction::Decide(user_id, status)) => {
                        let command = self.coordinator.decide_on_candidate(user_id, status);
                        self.send_command(command);
                    }
                    Some(FeedAction::Refresh) => self.send_command(NetworkCommand::FetchFeed),
                    None => {}
                },
                Screen::Connections => {
                    if let Some(profile) = connections::render(ui, self.coordinator.store()) {
                        let commands = self.coordinator.open_conversation(profile);
                        self.send_commands(commands);
                    }
                }
                Screen::Requests => {
                    if let Some((request_id, status)) =
                        requests::render(ui, &self.coordinator.store().requests)
                    {
                        let command = self.coordinator.review_request(request_id, status);
                        self.send_command(command);
                    }
                }
                Screen::Profile => {
                    let Some(me) = self.coordinator.store().session.profile().cloned() else {
                        return;
                    };
                    match profile::render(ui, &mut self.view, &me) {
                        Some(ProfileAction::Save(update)) => {
                            self.submit(NetworkCommand::UpdateProfile(update));
                        }
                        Some(ProfileAction::Delete(email)) => {
                            self.submit(NetworkCommand::DeleteAccount { email });
                        }
                        None => {}
                    }
                }
            }
        });

        let connected = self.connections.connection_id().is_some();
        match chat_window::render(ctx, &self.coordinator, &mut self.view.chat_input, connected) {
            Some(ChatAction::Send(body)) => self.send_chat_message(&body),
            Some(ChatAction::Retry(profile)) => {
                let commands = self.coordinator.open_conversation(profile);
                self.send_commands(commands);
            }
            Some(ChatAction::Close) => self.coordinator.close_conversation(),
            None => {}
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();
        self.sync_realtime();

        if self.coordinator.store().session.is_authenticated() {
            self.render_session(ctx);
        } else {
            self.render_auth(ctx);
        }

        // Events handled during rendering may have changed the foreground.
        self.sync_realtime();
        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
