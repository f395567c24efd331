use eframe::egui;

use crate::common::{SwipeStatus, UserId};
use crate::store::FeedStore;

use super::profile_card;

pub enum FeedAction {
    Decide(UserId, SwipeStatus),
    Refresh,
}

pub fn render(ui: &mut egui::Ui, feed: &FeedStore) -> Option<FeedAction> {
    let mut refresh = false;
    ui.horizontal(|ui| {
        ui.heading("Feed");
        refresh = ui.small_button("Refresh").clicked();
    });
    ui.separator();
    if refresh {
        return Some(FeedAction::Refresh);
    }

    let Some(candidate) = feed.current() else {
        ui.label("No new developers to show right now.");
        return None;
    };

    profile_card(ui, candidate);
    ui.add_space(8.0);

    let mut decision = None;
    ui.horizontal(|ui| {
        if ui.button("Ignore").clicked() {
            decision = Some(SwipeStatus::Ignored);
        }
        if ui.button("Interested").clicked() {
            decision = Some(SwipeStatus::Interested);
        }
        ui.label(egui::RichText::new(format!("{} left", feed.len())).weak());
    });

    decision.map(|status| FeedAction::Decide(candidate.id.clone(), status))
}
