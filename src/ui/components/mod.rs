pub mod chat_window;
pub mod connections;
pub mod feed;
pub mod input_bar;
pub mod login;
pub mod password;
pub mod profile;
pub mod requests;
pub mod sidebar;
pub mod signup;

use eframe::egui;

use crate::common::forms::GENDERS;
use crate::common::{FormErrors, ProfileDraft, UserProfile};
use crate::store::Notice;

const FIELD_WIDTH: f32 = 280.0;

/// Name, age, about and skills of a developer.
pub fn profile_card(ui: &mut egui::Ui, profile: &UserProfile) {
    ui.label(egui::RichText::new(profile.display_name()).strong().size(18.0));

    let details: Vec<String> = [
        profile.age.map(|age| age.to_string()),
        profile.gender.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        ui.label(egui::RichText::new(details.join(", ")).weak());
    }

    if let Some(about) = &profile.about {
        ui.label(about);
    }
    if !profile.skills.is_empty() {
        ui.label(format!("Skills: {}", profile.skills.join(", ")));
    }
}

/// Shows the notice with a dismiss button. Returns true once dismissed.
pub fn notice_banner(ui: &mut egui::Ui, notice: &Notice) -> bool {
    let color = if notice.is_error() {
        egui::Color32::LIGHT_RED
    } else {
        egui::Color32::LIGHT_GREEN
    };

    let mut dismissed = false;
    ui.horizontal(|ui| {
        ui.colored_label(color, notice.text());
        dismissed = ui.small_button("Dismiss").clicked();
    });
    ui.separator();
    dismissed
}

pub fn form_field(ui: &mut egui::Ui, label: &str, value: &mut String, error: Option<&str>) {
    labelled_input(ui, label, egui::TextEdit::singleline(value), error);
}

pub fn secret_field(ui: &mut egui::Ui, label: &str, value: &mut String, error: Option<&str>) {
    let input = egui::TextEdit::singleline(value).password(true);
    labelled_input(ui, label, input, error);
}

fn labelled_input(ui: &mut egui::Ui, label: &str, input: egui::TextEdit<'_>, error: Option<&str>) {
    ui.label(label);
    ui.add(input.desired_width(FIELD_WIDTH));
    if let Some(error) = error {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }
    ui.add_space(4.0);
}

/// Inputs shared by signup and profile editing.
pub fn profile_fields(ui: &mut egui::Ui, draft: &mut ProfileDraft, errors: &FormErrors) {
    form_field(
        ui,
        "First name",
        &mut draft.first_name,
        errors.get("firstName"),
    );
    form_field(
        ui,
        "Last name",
        &mut draft.last_name,
        errors.get("lastName"),
    );
    form_field(ui, "Age", &mut draft.age, errors.get("age"));

    ui.label("Gender");
    let selected = if draft.gender.is_empty() {
        "Select"
    } else {
        draft.gender.as_str()
    };
    egui::ComboBox::from_id_salt("gender")
        .selected_text(selected.to_string())
        .show_ui(ui, |ui| {
            for gender in GENDERS {
                ui.selectable_value(&mut draft.gender, gender.to_string(), gender);
            }
        });
    if let Some(error) = errors.get("gender") {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }
    ui.add_space(4.0);

    form_field(
        ui,
        "Photo URL",
        &mut draft.photo_url,
        errors.get("photoUrl"),
    );

    ui.label("About");
    ui.add(egui::TextEdit::multiline(&mut draft.about).desired_width(FIELD_WIDTH));
    if let Some(error) = errors.get("about") {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }
    ui.add_space(4.0);

    form_field(
        ui,
        "Skills (comma separated)",
        &mut draft.skills,
        errors.get("skills"),
    );
}

pub fn form_summary(ui: &mut egui::Ui, errors: &FormErrors) {
    let text = match errors.len() {
        0 => return,
        1 => "Please fix the highlighted field.".to_string(),
        count => format!("Please fix the {count} highlighted fields."),
    };
    ui.colored_label(egui::Color32::LIGHT_RED, text);
}
