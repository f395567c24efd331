use eframe::egui;

use crate::common::UserProfile;
use crate::store::AppStore;

/// Lists accepted connections with presence and unread badges. Returns the
/// profile whose chat should be opened.
pub fn render(ui: &mut egui::Ui, store: &AppStore) -> Option<UserProfile> {
    ui.heading("Connections");
    ui.separator();

    if store.connections.all().is_empty() {
        ui.label("No connections yet");
        return None;
    }

    let mut open = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        for profile in store.connections.all() {
            ui.horizontal(|ui| {
                if store.presence.is_online(&profile.id) {
                    ui.colored_label(egui::Color32::GREEN, "●");
                } else {
                    ui.colored_label(egui::Color32::GRAY, "○");
                }

                let name = egui::RichText::new(profile.display_name());
                if store.has_unread(&profile.id) {
                    ui.label(name.strong());
                } else {
                    ui.label(name);
                }
                if let Some(about) = &profile.about {
                    ui.label(egui::RichText::new(about).weak().small());
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Message").clicked() {
                        open = Some(profile.clone());
                    }
                    if let Some(badge) = store.unread_badge(&profile.id) {
                        ui.colored_label(egui::Color32::LIGHT_RED, badge);
                    }
                });
            });
        }
    });
    open
}
