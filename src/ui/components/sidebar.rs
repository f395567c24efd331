use eframe::egui;

use crate::store::AppStore;
use crate::ui::state::Screen;

pub enum SidebarAction {
    Logout,
}

pub fn render(ui: &mut egui::Ui, store: &AppStore, screen: &mut Screen) -> Option<SidebarAction> {
    if let Some(profile) = store.session.profile() {
        ui.heading(profile.display_name());
    }
    ui.separator();

    for candidate in Screen::ALL {
        ui.horizontal(|ui| {
            if ui
                .selectable_label(*screen == candidate, candidate.title())
                .clicked()
            {
                *screen = candidate;
            }

            match candidate {
                Screen::Connections if store.any_unread() => {
                    ui.colored_label(egui::Color32::LIGHT_RED, "●");
                }
                Screen::Requests if !store.requests.received().is_empty() => {
                    let pending = store.requests.received().len().to_string();
                    ui.label(egui::RichText::new(pending).weak());
                }
                _ => {}
            }
        });
    }

    ui.separator();
    ui.label(
        egui::RichText::new(format!("{} online", store.presence.len()))
            .small()
            .weak(),
    );

    let mut action = None;
    ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
        if ui.button("Log out").clicked() {
            action = Some(SidebarAction::Logout);
        }
    });
    action
}
