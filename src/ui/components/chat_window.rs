use chrono::Local;
use eframe::egui;

use crate::common::{ChatMessage, UserId, UserProfile};
use crate::store::FetchStatus;
use crate::sync::SyncCoordinator;

use super::input_bar;

/// Room kept below the history for the input bar.
const INPUT_HEIGHT: f32 = 36.0;

pub enum ChatAction {
    Send(String),
    Retry(UserProfile),
    Close,
}

/// Floating chat with the coordinator's receiver. Draws nothing while the
/// chat is closed.
pub fn render(
    ctx: &egui::Context,
    coordinator: &SyncCoordinator,
    chat_input: &mut String,
    connected: bool,
) -> Option<ChatAction> {
    if !coordinator.is_chat_open() {
        return None;
    }
    let peer = coordinator.receiver()?;
    let store = coordinator.store();
    let self_id = store.identity()?;

    let mut open = true;
    let mut action = None;

    egui::Window::new(format!("Chat with {}", peer.display_name()))
        .id(egui::Id::new("chat_window"))
        .open(&mut open)
        .default_size([360.0, 420.0])
        .resizable(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if store.presence.is_online(&peer.id) {
                    ui.colored_label(egui::Color32::GREEN, "● online");
                } else {
                    ui.label(egui::RichText::new("offline").weak());
                }
                if !connected {
                    ui.colored_label(egui::Color32::YELLOW, "reconnecting");
                }
            });
            ui.separator();

            match store.history_status_with(&peer.id) {
                FetchStatus::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading messages");
                    });
                }
                FetchStatus::Failed => {
                    ui.horizontal(|ui| {
                        ui.colored_label(egui::Color32::LIGHT_RED, "Could not load messages");
                        if ui.button("Retry").clicked() {
                            action = Some(ChatAction::Retry(peer.clone()));
                        }
                    });
                }
                FetchStatus::NotStarted | FetchStatus::Loaded => {}
            }

            egui::ScrollArea::vertical()
                .max_height(history_height(ui.available_height()))
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for message in store.messages_with(&peer.id) {
                        message_row(ui, message, self_id, peer);
                    }
                });

            ui.separator();
            if let Some(body) = input_bar::render(ui, chat_input, true) {
                action = Some(ChatAction::Send(body));
            }
        });

    if !open {
        return Some(ChatAction::Close);
    }
    action
}

/// Never negative, even when the window is shorter than the input bar.
fn history_height(available: f32) -> f32 {
    (available - INPUT_HEIGHT).max(0.0)
}

fn message_row(ui: &mut egui::Ui, message: &ChatMessage, self_id: &UserId, peer: &UserProfile) {
    let mine = &message.sender_id == self_id;
    let author = if mine {
        "You".to_string()
    } else {
        peer.display_name()
    };
    let time = message.created_at.with_timezone(&Local).format("%H:%M");

    ui.horizontal_wrapped(|ui| {
        ui.label(egui::RichText::new(time.to_string()).weak().small());
        let author = egui::RichText::new(author).strong();
        if mine {
            ui.label(author.color(egui::Color32::LIGHT_BLUE));
        } else {
            ui.label(author);
        }
        ui.label(&message.message);
        if message.pending {
            ui.label(egui::RichText::new("sending").weak().italics());
        }
    });
}
