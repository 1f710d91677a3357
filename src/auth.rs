//! Login validation and the session object
//!
//! The session holds the token/user pair in memory and mirrors every change
//! into an injected [`KeyValueStore`]. Storage failures are logged and never
//! stop the app.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::constants::{TOKEN_KEY, USER_KEY};
use crate::error::ValidationError;
use crate::models::{ApprovalForm, Credential};
use crate::storage::KeyValueStore;

pub const MIN_PASSWORD_LEN: usize = 6;

fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(email))
}

/// Check login fields before anything is sent.
///
/// Returns every failing field, email first, so the form can show them all.
pub fn validate_credential(cred: &Credential) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let email = cred.email.trim();
    if email.is_empty() {
        errors.push(ValidationError::EmailRequired);
    } else if !is_valid_email(email) {
        errors.push(ValidationError::EmailInvalid);
    }

    if cred.password.is_empty() {
        errors.push(ValidationError::PasswordRequired);
    } else if cred.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Name and description are required to approve an image
pub fn validate_approval(form: &ApprovalForm) -> Result<(), ValidationError> {
    if form.name.trim().is_empty() || form.description.trim().is_empty() {
        return Err(ValidationError::MissingFields);
    }
    Ok(())
}

/// Authenticated user state, passed explicitly to whoever needs it
pub struct Session {
    store: Arc<dyn KeyValueStore>,
    token: Option<String>,
    user: Option<serde_json::Value>,
}

impl Session {
    /// Restore the session from the store
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let token = match store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load token");
                None
            }
        };
        let user = match store.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored user is not valid JSON");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load user");
                None
            }
        };

        Session { store, token, user }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&serde_json::Value> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Best-effort display name from the opaque user object
    pub fn display_name(&self) -> Option<String> {
        let user = self.user.as_ref()?;
        ["name", "username", "email"]
            .iter()
            .find_map(|k| user.get(*k).and_then(|v| v.as_str()))
            .map(str::to_string)
    }

    pub fn save_token(&mut self, token: &str) {
        if let Err(e) = self.store.set(TOKEN_KEY, token) {
            tracing::error!(error = %e, "Failed to save token");
            return;
        }
        self.token = Some(token.to_string());
    }

    pub fn save_user(&mut self, user: serde_json::Value) {
        let result = serde_json::to_string(&user)
            .map_err(|e| e.to_string())
            .and_then(|raw| self.store.set(USER_KEY, &raw).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to save user");
            return;
        }
        self.user = Some(user);
    }

    pub fn logout(&mut self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::error!(error = %e, key, "Failed to log out");
                return;
            }
        }
        self.token = None;
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_valid_credential() {
        assert!(validate_credential(&Credential::new("ana@example.com", "secret1")).is_ok());
    }

    #[test]
    fn test_empty_fields_are_required() {
        let errors = validate_credential(&Credential::new("", "")).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::EmailRequired, ValidationError::PasswordRequired]
        );
    }

    #[test]
    fn test_bad_email_and_short_password() {
        let errors = validate_credential(&Credential::new("not-an-email", "12345")).unwrap_err();
        assert_eq!(errors[0].to_string(), "Please enter a valid email");
        assert_eq!(errors[1].to_string(), "Password must be at least 6 characters");
    }

    #[test]
    fn test_approval_form_requires_name_and_description() {
        let mut form = ApprovalForm {
            name: "Ana".into(),
            description: " ".into(),
            relation: None,
        };
        assert_eq!(validate_approval(&form), Err(ValidationError::MissingFields));
        form.description = "Neighbour".into();
        assert!(validate_approval(&form).is_ok());
    }

    #[test]
    fn test_session_persists_through_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.yaml");

        let mut session = Session::load(Arc::new(FileStore::new(&path)));
        assert!(!session.is_authenticated());
        session.save_token("tok-1");
        session.save_user(json!({"name": "Ana", "id": 1}));

        let restored = Session::load(Arc::new(FileStore::new(&path)));
        assert_eq!(restored.token(), Some("tok-1"));
        assert_eq!(restored.display_name().as_deref(), Some("Ana"));
    }

    #[test]
    fn test_logout_clears_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut session = Session::load(store.clone());
        session.save_token("tok");
        session.save_user(json!({"email": "a@b.co"}));
        assert_eq!(session.display_name().as_deref(), Some("a@b.co"));

        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_user_is_ignored() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "tok").unwrap();
        store.set(USER_KEY, "{not json").unwrap();
        let session = Session::load(store);
        assert!(session.is_authenticated());
        assert!(session.user().is_none());
    }
}
