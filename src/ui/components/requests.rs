use eframe::egui;

use crate::common::ReviewStatus;
use crate::store::RequestStore;

use super::profile_card;

/// Returns the request id and the reviewer's decision.
pub fn render(ui: &mut egui::Ui, requests: &RequestStore) -> Option<(String, ReviewStatus)> {
    ui.heading("Connection requests");
    ui.separator();

    if requests.received().is_empty() {
        ui.label("No pending requests");
        return None;
    }

    let mut decision = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        for request in requests.received() {
            ui.group(|ui| {
                profile_card(ui, &request.from_user_id);
                ui.horizontal(|ui| {
                    if ui.button("Reject").clicked() {
                        decision = Some((request.id.clone(), ReviewStatus::Rejected));
                    }
                    if ui.button("Accept").clicked() {
                        decision = Some((request.id.clone(), ReviewStatus::Accepted));
                    }
                });
            });
        }
    });
    decision
}
