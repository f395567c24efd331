use eframe::egui;

use crate::common::{ProfileUpdate, UserProfile};
use crate::ui::state::ViewState;

use super::{form_field, form_summary, profile_card, profile_fields};

pub enum ProfileAction {
    Save(ProfileUpdate),
    /// Delete the account registered under this email.
    Delete(String),
}

/// Preview and edit form for the session user's profile, with account
/// deletion at the bottom.
pub fn render(
    ui: &mut egui::Ui,
    view: &mut ViewState,
    profile: &UserProfile,
) -> Option<ProfileAction> {
    view.profile_draft(profile);
    let submitting = view.submitting;
    let mut save = false;
    let mut delete = false;

    ui.heading("Your profile");
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        profile_card(ui, profile);
        if let Some(email) = &profile.email_id {
            ui.label(egui::RichText::new(email).weak());
        }
        ui.separator();

        let errors = &view.form_errors;
        if let Some(draft) = view.profile.as_mut() {
            profile_fields(ui, draft, errors);
        }
        form_summary(ui, errors);
        ui.horizontal(|ui| {
            ui.add_enabled_ui(!submitting, |ui| {
                save = ui.button("Save profile").clicked();
            });
            if submitting {
                ui.spinner();
            }
        });

        ui.add_space(16.0);
        ui.collapsing("Delete account", |ui| {
            ui.label("This cannot be undone. Type your email to confirm.");
            form_field(
                ui,
                "Email",
                &mut view.delete_confirmation,
                errors.get("deleteConfirmation"),
            );
            let button = egui::RichText::new("Delete my account").color(egui::Color32::LIGHT_RED);
            ui.add_enabled_ui(!submitting && profile.email_id.is_some(), |ui| {
                delete = ui.button(button).clicked();
            });
        });
    });

    if submitting {
        return None;
    }
    if save {
        return view.submit_profile().map(ProfileAction::Save);
    }
    if delete {
        return view
            .confirm_delete(profile.email_id.as_deref())
            .map(ProfileAction::Delete);
    }
    None
}
