use eframe::egui;

use crate::ui::state::{AuthScreen, ViewState};

/// Returns `(email, password)` when the user submits the form.
pub fn render(ui: &mut egui::Ui, view: &mut ViewState) -> Option<(String, String)> {
    let mut submit = false;
    let mut switch_to = None;

    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.heading("DevConnect");
        ui.add_space(16.0);

        ui.add(egui::TextEdit::singleline(&mut view.email).hint_text("Email"));
        let password = ui.add(
            egui::TextEdit::singleline(&mut view.password)
                .password(true)
                .hint_text("Password"),
        );
        if password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = true;
        }

        ui.add_space(8.0);
        ui.add_enabled_ui(!view.logging_in, |ui| {
            if ui.button("Log in").clicked() {
                submit = true;
            }
        });
        if view.logging_in {
            ui.spinner();
        }

        ui.add_space(12.0);
        if ui.link("New here? Create an account").clicked() {
            switch_to = Some(AuthScreen::Signup);
        }
        if ui.link("Forgot password?").clicked() {
            switch_to = Some(AuthScreen::ForgotPassword);
        }
    });

    if let Some(screen) = switch_to {
        view.show_auth(screen);
        return None;
    }
    if submit && !view.logging_in {
        view.take_credentials()
    } else {
        None
    }
}
