use crate::common::{UserId, UserProfile};

/// The logged-in user, present only while authenticated.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    profile: Option<UserProfile>,
}

impl SessionStore {
    pub fn start(&mut self, profile: UserProfile) {
        log::info!("Session started for {}", profile.id);
        self.profile = Some(profile);
    }

    /// Swaps in a fresher copy of the session user's profile. Ignored when
    /// it belongs to someone else.
    pub fn refresh(&mut self, profile: UserProfile) -> bool {
        match &mut self.profile {
            Some(current) if current.id == profile.id => {
                *current = profile;
                true
            }
            _ => {
                log::warn!("Ignoring profile {} outside its session", profile.id);
                false
            }
        }
    }

    pub fn end(&mut self) {
        if let Some(profile) = self.profile.take() {
            log::info!("Session ended for {}", profile.id);
        }
    }

    pub fn identity(&self) -> Option<&UserId> {
        self.profile.as_ref().map(|profile| &profile.id)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }
}
