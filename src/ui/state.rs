use crate::common::forms::validate_email;
use crate::common::{
    FormErrors, NetworkEvent, PasswordReset, PasswordResetDraft, ProfileDraft, ProfileUpdate,
    SignupDraft, SignupRequest, UserProfile,
};

/// Sections reachable from the sidebar once logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Feed,
    Connections,
    Requests,
    Profile,
}

impl Screen {
    pub const ALL: [Screen; 4] = [
        Screen::Feed,
        Screen::Connections,
        Screen::Requests,
        Screen::Profile,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Feed => "Feed",
            Screen::Connections => "Connections",
            Screen::Requests => "Requests",
            Screen::Profile => "Profile",
        }
    }
}

/// Forms shown while logged out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScreen {
    #[default]
    Login,
    Signup,
    ForgotPassword,
    ResetPassword,
}

/// Widget-local state. Anything the server knows about lives in the stores.
#[derive(Debug, Default)]
pub struct ViewState {
    pub screen: Screen,
    pub auth: AuthScreen,
    pub email: String,
    pub password: String,
    pub chat_input: String,
    /// A login request is in flight.
    pub logging_in: bool,
    /// An account form request is in flight.
    pub submitting: bool,
    pub signup: SignupDraft,
    pub recovery_email: String,
    pub reset: PasswordResetDraft,
    /// Seeded from the session profile when the profile screen opens.
    pub profile: Option<ProfileDraft>,
    /// Email typed to confirm account deletion.
    pub delete_confirmation: String,
    pub form_errors: FormErrors,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the credentials for a login attempt, keeping the email.
    pub fn take_credentials(&mut self) -> Option<(String, String)> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return None;
        }
        self.logging_in = true;
        Some((email.to_string(), std::mem::take(&mut self.password)))
    }

    pub fn show_auth(&mut self, screen: AuthScreen) {
        self.auth = screen;
        self.form_errors = FormErrors::default();
    }

    pub fn submit_signup(&mut self) -> Option<SignupRequest> {
        let result = self.signup.validate();
        self.accept(result)
    }

    pub fn submit_recovery(&mut self) -> Option<String> {
        let email = self.recovery_email.trim().to_string();
        match validate_email(&email) {
            Ok(()) => self.accept(Ok(email)),
            Err(message) => {
                self.form_errors = FormErrors::single("emailId", message);
                None
            }
        }
    }

    pub fn submit_reset(&mut self) -> Option<PasswordReset> {
        let result = self.reset.validate();
        self.accept(result)
    }

    /// The profile draft, seeded from `profile` the first time.
    pub fn profile_draft(&mut self, profile: &UserProfile) -> &mut ProfileDraft {
        self.profile.get_or_insert_with(|| ProfileDraft::from_profile(profile))
    }

    pub fn submit_profile(&mut self) -> Option<ProfileUpdate> {
        let result = self.profile.as_ref()?.validate();
        self.accept(result)
    }

    /// Returns the email to delete once the typed confirmation matches it.
    pub fn confirm_delete(&mut self, email: Option<&str>) -> Option<String> {
        let email = email?;
        if self.delete_confirmation.trim() != email {
            self.form_errors =
                FormErrors::single("deleteConfirmation", "Type your email to confirm.");
            return None;
        }
        self.accept(Ok(email.to_string()))
    }

    fn accept<T>(&mut self, result: Result<T, FormErrors>) -> Option<T> {
        match result {
            Ok(value) => {
                self.form_errors = FormErrors::default();
                self.submitting = true;
                Some(value)
            }
            Err(errors) => {
                self.form_errors = errors;
                None
            }
        }
    }

    /// Moves between forms as network results come in.
    pub fn on_network_event(&mut self, event: &NetworkEvent) {
        match event {
            NetworkEvent::SessionStarted(_) | NetworkEvent::LoginFailed(_) => {
                self.logging_in = false;
            }
            NetworkEvent::SessionEnded | NetworkEvent::AccountDeleted => self.reset(),
            NetworkEvent::SignedUp => {
                self.email = std::mem::take(&mut self.signup.email);
                self.signup = SignupDraft::default();
                self.show_auth(AuthScreen::Login);
            }
            NetworkEvent::ResetTokenSent => self.show_auth(AuthScreen::ResetPassword),
            NetworkEvent::PasswordChanged => {
                self.reset = PasswordResetDraft::default();
                self.show_auth(AuthScreen::Login);
            }
            NetworkEvent::ProfileUpdated(profile) => {
                self.profile = Some(ProfileDraft::from_profile(profile));
            }
            _ => {}
        }

        if matches!(
            event,
            NetworkEvent::SignedUp
                | NetworkEvent::ResetTokenSent
                | NetworkEvent::PasswordChanged
                | NetworkEvent::ProfileUpdated(_)
                | NetworkEvent::Failed { .. }
        ) {
            self.submitting = false;
        }
    }

    pub fn reset(&mut self) {
        let email = std::mem::take(&mut self.email);
        *self = Self {
            email,
            ..Self::default()
        };
    }
}
