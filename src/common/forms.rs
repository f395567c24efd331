//! Account forms: editable drafts and the validated requests built from them.
//!
//! Drafts hold raw widget text. `validate` either yields the request body
//! the backend expects or every field error at once, so a form can flag all
//! of its problems in one pass.

use reqwest::Url;
use serde::Serialize;

use super::types::UserProfile;

pub const GENDERS: [&str; 3] = ["male", "female", "others"];

const MAX_SKILLS: usize = 10;

const WEAK_PASSWORD: &str = "Password must be at least 8 characters and include uppercase, \
                             lowercase, number, and special character.";

/// Field name and message pairs, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(Vec<(&'static str, String)>);

impl FormErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self(vec![(field, message.into())])
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    fn check(&mut self, field: &'static str, result: Result<(), String>) {
        if let Err(message) = result {
            self.push(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Body of `PATCH /profile/edit`, also embedded in the signup request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    pub skills: Vec<String>,
}

/// Editable profile fields. Skills are typed as one comma separated line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDraft {
    pub first_name: String,
    pub last_name: String,
    pub age: String,
    pub gender: String,
    pub photo_url: String,
    pub about: String,
    pub skills: String,
}

impl ProfileDraft {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            age: profile.age.map(|age| age.to_string()).unwrap_or_default(),
            gender: profile.gender.clone().unwrap_or_default(),
            photo_url: profile.photo_url.clone().unwrap_or_default(),
            about: profile.about.clone().unwrap_or_default(),
            skills: profile.skills.join(", "),
        }
    }

    pub fn validate(&self) -> Result<ProfileUpdate, FormErrors> {
        let mut errors = FormErrors::default();
        let update = self.collect(&mut errors);
        errors.into_result(update)
    }

    fn collect(&self, errors: &mut FormErrors) -> ProfileUpdate {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.push("firstName", "First name is required.");
        } else {
            errors.check("firstName", length_between("First name", first_name, 3, 50));
        }

        let last_name = self.last_name.trim();
        if !last_name.is_empty() {
            errors.check("lastName", length_between("Last name", last_name, 4, 50));
        }

        let age = match self.age.trim() {
            "" => {
                errors.push("age", "Age is required.");
                0
            }
            raw => match raw.parse::<u32>() {
                Ok(age) if (18..=120).contains(&age) => age,
                _ => {
                    errors.push("age", "Age must be between 18 and 120.");
                    0
                }
            },
        };

        let gender = self.gender.trim().to_lowercase();
        if !GENDERS.contains(&gender.as_str()) {
            errors.push("gender", "Gender must be either male, female, or others.");
        }

        let photo_url = optional(&self.photo_url);
        if let Some(url) = &photo_url {
            errors.check("photoUrl", web_url(url));
        }

        let about = optional(&self.about);
        if let Some(about) = &about {
            errors.check("about", length_between("About", about, 20, 200));
        }

        let skills = split_skills(&self.skills);
        if skills.is_empty() {
            errors.push("skills", "At least one skill is required.");
        } else if skills.len() > MAX_SKILLS {
            errors.push("skills", "You cannot add more than 10 skills.");
        }

        ProfileUpdate {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
            gender,
            photo_url,
            about,
            skills,
        }
    }
}

/// Body of `POST /signup`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email_id: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignupDraft {
    pub email: String,
    pub password: String,
    pub profile: ProfileDraft,
}

impl SignupDraft {
    pub fn validate(&self) -> Result<SignupRequest, FormErrors> {
        let mut errors = FormErrors::default();
        let email = self.email.trim();
        errors.check("emailId", validate_email(email));
        errors.check("password", strong_password(&self.password));
        let profile = self.profile.collect(&mut errors);

        errors.into_result(SignupRequest {
            email_id: email.to_string(),
            password: self.password.clone(),
            profile,
        })
    }
}

/// Body of `PATCH /reset-password`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub reset_token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswordResetDraft {
    /// Token from the reset email.
    pub token: String,
    pub password: String,
    pub confirm: String,
}

impl PasswordResetDraft {
    pub fn validate(&self) -> Result<PasswordReset, FormErrors> {
        let mut errors = FormErrors::default();
        let token = self.token.trim();
        if token.is_empty() {
            errors.push("resetToken", "Reset token is required.");
        }
        errors.check("newPassword", strong_password(&self.password));
        if self.password != self.confirm {
            errors.push("confirmPassword", "Passwords do not match.");
        }

        errors.into_result(PasswordReset {
            reset_token: token.to_string(),
            new_password: self.password.clone(),
        })
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || Err("Please enter a valid email address.".to_string());
    if email.is_empty() {
        return Err("Email is required.".to_string());
    }
    if email.chars().any(char::is_whitespace) {
        return invalid();
    }

    let Some((local, domain)) = email.split_once('@') else {
        return invalid();
    };
    let dotted = domain
        .char_indices()
        .any(|(index, c)| c == '.' && index > 0 && index + 1 < domain.len());
    if local.is_empty() || domain.contains('@') || !dotted {
        return invalid();
    }
    Ok(())
}

fn strong_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required.".to_string());
    }

    let strong = password.chars().count() >= 8
        && password.chars().any(char::is_lowercase)
        && password.chars().any(char::is_uppercase)
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric());
    if !strong {
        return Err(WEAK_PASSWORD.to_string());
    }
    Ok(())
}

fn length_between(label: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let length = value.chars().count();
    if length < min || length > max {
        return Err(format!("{label} must be between {min} and {max} characters."));
    }
    Ok(())
}

fn web_url(raw: &str) -> Result<(), String> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(()),
        _ => Err("Please enter a valid URL.".to_string()),
    }
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn draft() -> ProfileDraft {
        ProfileDraft {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            age: "36".to_string(),
            gender: " Female ".to_string(),
            photo_url: String::new(),
            about: String::new(),
            skills: "rust, c,, math ".to_string(),
        }
    }

    #[test]
    fn valid_profile_is_normalised() {
        let update = draft().validate().unwrap();
        assert_eq!(update.gender, "female");
        assert_eq!(update.skills, vec!["rust", "c", "math"]);
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "age": 36,
                "gender": "female",
                "skills": ["rust", "c", "math"]
            })
        );
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let errors = ProfileDraft {
            first_name: "Al".to_string(),
            last_name: "Li".to_string(),
            age: "17".to_string(),
            gender: "robot".to_string(),
            photo_url: "not a url".to_string(),
            about: "too short".to_string(),
            skills: " , ".to_string(),
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.len(), 7);
        assert_eq!(
            errors.get("firstName"),
            Some("First name must be between 3 and 50 characters.")
        );
        assert_eq!(errors.get("age"), Some("Age must be between 18 and 120."));
        assert_eq!(errors.get("skills"), Some("At least one skill is required."));
    }

    #[test]
    fn optional_fields_may_be_blank_but_not_malformed() {
        let mut profile = draft();
        profile.last_name.clear();
        profile.photo_url = "https://example.dev/ada.png".to_string();
        assert!(profile.validate().is_ok());

        profile.photo_url = "ftp://example.dev/ada.png".to_string();
        assert_eq!(
            profile.validate().unwrap_err().get("photoUrl"),
            Some("Please enter a valid URL.")
        );

        profile.photo_url.clear();
        profile.skills = (0..11).map(|n| format!("s{n}")).collect::<Vec<_>>().join(",");
        assert!(profile.validate().unwrap_err().get("skills").is_some());
    }

    #[test]
    fn profile_draft_round_trips_a_profile() {
        let profile: UserProfile = serde_json::from_value(json!({
            "_id": "u1",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "age": 36,
            "gender": "female",
            "skills": ["rust", "c"]
        }))
        .unwrap();
        let draft = ProfileDraft::from_profile(&profile);
        assert_eq!(draft.skills, "rust, c");
        assert_eq!(draft.validate().unwrap().age, 36);
    }

    #[test]
    fn signup_flattens_profile_next_to_credentials() {
        let signup = SignupDraft {
            email: " ada@example.dev ".to_string(),
            password: "Str0ng!pass".to_string(),
            profile: draft(),
        };
        let body = serde_json::to_value(signup.validate().unwrap()).unwrap();
        assert_eq!(body["emailId"], "ada@example.dev");
        assert_eq!(body["password"], "Str0ng!pass");
        assert_eq!(body["firstName"], "Ada");
        assert_eq!(body["skills"], json!(["rust", "c", "math"]));
    }

    #[test]
    fn signup_rejects_weak_password_and_bad_email() {
        let errors = SignupDraft {
            email: "ada@example".to_string(),
            password: "password1".to_string(),
            profile: draft(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            errors.get("emailId"),
            Some("Please enter a valid email address.")
        );
        assert!(errors.get("password").is_some());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("ada@example.dev").is_ok());
        assert!(validate_email("a.b+c@mail.example.dev").is_ok());
        assert_eq!(validate_email(""), Err("Email is required.".to_string()));
        for bad in ["ada", "@example.dev", "ada@.dev", "ada@dev.", "a@b@c.dev", "a da@x.dev"] {
            assert!(validate_email(bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn reset_needs_token_matching_confirmation_and_strength() {
        let mut reset = PasswordResetDraft {
            token: " tok-1 ".to_string(),
            password: "N3w!secret".to_string(),
            confirm: "N3w!secret".to_string(),
        };
        assert_eq!(
            reset.validate().unwrap(),
            PasswordReset {
                reset_token: "tok-1".to_string(),
                new_password: "N3w!secret".to_string(),
            }
        );

        reset.confirm = "N3w!secreT".to_string();
        reset.token.clear();
        let errors = reset.validate().unwrap_err();
        assert!(errors.get("resetToken").is_some());
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match."));
        assert!(errors.get("newPassword").is_none());
    }
}
