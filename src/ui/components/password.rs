//! Password recovery: request a reset token, then set a new password with it.

use eframe::egui;

use crate::common::PasswordReset;
use crate::ui::state::{AuthScreen, ViewState};

use super::{form_field, form_summary, secret_field};

/// Returns the email to send a reset token to.
pub fn render_forgot(ui: &mut egui::Ui, view: &mut ViewState) -> Option<String> {
    let submitting = view.submitting;
    let mut submit = false;
    let mut switch_to = None;

    ui.heading("Forgot password");
    ui.label("We will email you a token to reset your password.");
    ui.separator();

    form_field(
        ui,
        "Email",
        &mut view.recovery_email,
        view.form_errors.get("emailId"),
    );
    ui.horizontal(|ui| {
        ui.add_enabled_ui(!submitting, |ui| {
            submit = ui.button("Send reset token").clicked();
        });
        if ui.link("I already have a token").clicked() {
            switch_to = Some(AuthScreen::ResetPassword);
        }
        if ui.link("Back to login").clicked() {
            switch_to = Some(AuthScreen::Login);
        }
    });

    if let Some(screen) = switch_to {
        view.show_auth(screen);
        return None;
    }
    if submit && !submitting {
        view.submit_recovery()
    } else {
        None
    }
}

pub fn render_reset(ui: &mut egui::Ui, view: &mut ViewState) -> Option<PasswordReset> {
    let submitting = view.submitting;
    let mut submit = false;
    let mut back = false;

    ui.heading("Reset password");
    ui.separator();

    let errors = &view.form_errors;
    let draft = &mut view.reset;
    form_field(
        ui,
        "Reset token",
        &mut draft.token,
        errors.get("resetToken"),
    );
    secret_field(
        ui,
        "New password",
        &mut draft.password,
        errors.get("newPassword"),
    );
    secret_field(
        ui,
        "Confirm password",
        &mut draft.confirm,
        errors.get("confirmPassword"),
    );
    form_summary(ui, errors);

    ui.horizontal(|ui| {
        ui.add_enabled_ui(!submitting, |ui| {
            submit = ui.button("Change password").clicked();
        });
        back = ui.link("Back to login").clicked();
    });

    if back {
        view.show_auth(AuthScreen::Login);
        return None;
    }
    if submit && !submitting {
        view.submit_reset()
    } else {
        None
    }
}
