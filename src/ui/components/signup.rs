use eframe::egui;

use crate::common::SignupRequest;
use crate::ui::state::{AuthScreen, ViewState};

use super::{form_field, form_summary, profile_fields, secret_field};

/// Returns the validated request when the form is submitted.
pub fn render(ui: &mut egui::Ui, view: &mut ViewState) -> Option<SignupRequest> {
    let submitting = view.submitting;
    let mut submit = false;
    let mut back = false;

    ui.heading("Create your account");
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        let errors = &view.form_errors;
        let draft = &mut view.signup;
        form_field(ui, "Email", &mut draft.email, errors.get("emailId"));
        secret_field(ui, "Password", &mut draft.password, errors.get("password"));
        profile_fields(ui, &mut draft.profile, errors);
        form_summary(ui, errors);

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!submitting, |ui| {
                submit = ui.button("Sign up").clicked();
            });
            if submitting {
                ui.spinner();
            }
            back = ui.link("Back to login").clicked();
        });
    });

    if back {
        view.show_auth(AuthScreen::Login);
        return None;
    }
    if submit && !submitting {
        view.submit_signup()
    } else {
        None
    }
}
