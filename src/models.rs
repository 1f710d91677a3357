use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Locator for a single displayable item (image or frame).
///
/// Never mutated; a newer fetch produces a new reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactReference {
    pub locator: String,
    pub fetched_at: DateTime<Utc>,
}

impl ArtifactReference {
    pub fn new(locator: impl Into<String>) -> Self {
        ArtifactReference {
            locator: locator.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// Result of a single poll fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A new artifact is available
    Success(String),
    /// The server said there is nothing yet
    Empty,
    /// Network error, non-2xx status or malformed body
    Failure(String),
}

/// Login form values. Dropped once the request completes.
#[derive(Clone, Serialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credential {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Successful `/api/login` body
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: serde_json::Value,
}

/// Error body returned on non-2xx responses
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// `/api/get-image`
#[derive(Clone, Debug, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub image_url: Option<String>,
}

/// `/api/get-frames`
#[derive(Clone, Debug, Deserialize)]
pub struct FramesResponse {
    #[serde(default)]
    pub frames: Vec<String>,
}

/// `/api/stream`
#[derive(Clone, Debug, Deserialize)]
pub struct StreamResponse {
    #[serde(default)]
    pub image_path: Option<String>,
}

/// Fields entered when approving a pending image
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApprovalForm {
    pub name: String,
    pub description: String,
    pub relation: Option<String>,
}

/// `/api/approve` request body
#[derive(Clone, Debug, Serialize)]
pub struct ApproveBody<'a> {
    pub name: &'a str,
    pub description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<&'a str>,
    #[serde(rename = "imageUrl")]
    pub image_url: &'a str,
}

/// `/api/deny` request body
#[derive(Clone, Debug, Serialize)]
pub struct DenyBody {
    pub action: &'static str,
}

impl Default for DenyBody {
    fn default() -> Self {
        DenyBody { action: "deny" }
    }
}

/// Outcome of resolving a pending approval
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Denied => "denied",
        }
    }
}

/// Dashboard record as sent by the backend
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPerson {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub images: Option<Vec<serde_json::Value>>,
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A known person, cleaned up for display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub images: Vec<String>,
    pub name: String,
    pub relation: String,
    pub description: String,
}

pub const UNKNOWN: &str = "Unknown";
pub const NO_DESCRIPTION: &str = "No description available";

impl Person {
    /// Normalize a raw record; `index` is used when the record has no id
    pub fn from_raw(raw: RawPerson, index: usize) -> Self {
        let id = match raw.id {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            Some(serde_json::Value::Number(n)) if n.as_u64() != Some(0) => n.to_string(),
            _ => index.to_string(),
        };

        let mut sources: Vec<String> = raw
            .images
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
        if let Some(url) = raw.image_url {
            sources.push(url);
        }

        Person {
            id,
            images: clean_image_urls(&sources),
            name: trimmed_or(raw.name, UNKNOWN),
            relation: trimmed_or(raw.relation, UNKNOWN),
            description: trimmed_or(raw.description, NO_DESCRIPTION),
        }
    }

    pub fn has_relation(&self) -> bool {
        self.relation != UNKNOWN
    }
}

fn trimmed_or(value: Option<String>, fallback: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Split, repair and deduplicate image URLs.
///
/// Backend entries may hold several URLs glued together, separated by newlines
/// or nothing at all.
pub fn clean_image_urls(entries: &[String]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    for entry in entries {
        let cleaned = entry.replace('\n', "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            continue;
        }
        for piece in cleaned.split("http").filter(|p| !p.is_empty()) {
            let url = if piece.starts_with("://") || piece.starts_with("s://") {
                format!("http{}", piece)
            } else {
                format!("http://{}", piece)
            };
            let url = url.trim().to_string();
            if (url.starts_with("http://") || url.starts_with("https://")) && !urls.contains(&url) {
                urls.push(url);
            }
        }
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawPerson {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_person_defaults() {
        let person = Person::from_raw(raw(r#"{"name": "  Ana  "}"#), 3);
        assert_eq!(person.id, "3");
        assert_eq!(person.name, "Ana");
        assert_eq!(person.relation, UNKNOWN);
        assert_eq!(person.description, NO_DESCRIPTION);
        assert!(person.images.is_empty());
        assert!(!person.has_relation());
    }

    #[test]
    fn test_person_keeps_explicit_id() {
        let person = Person::from_raw(raw(r#"{"id": 42, "name": "Bo", "relation": "son"}"#), 0);
        assert_eq!(person.id, "42");
        assert!(person.has_relation());

        let person = Person::from_raw(raw(r#"{"id": "65a1f", "name": "Cy"}"#), 9);
        assert_eq!(person.id, "65a1f");
    }

    #[test]
    fn test_glued_image_urls_are_split_and_deduped() {
        let entries = vec![
            "http://a.com/1.jpg\nhttp://a.com/2.jpg\n".to_string(),
            "https://b.com/3.jpghttp://a.com/1.jpg".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(
            clean_image_urls(&entries),
            vec![
                "http://a.com/1.jpg".to_string(),
                "http://a.com/2.jpg".to_string(),
                "https://b.com/3.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn test_image_url_field_and_non_string_images() {
        let person = Person::from_raw(
            raw(r#"{"images": [7, "http://x/a.png"], "imageUrl": "http://x/b.png"}"#),
            0,
        );
        assert_eq!(person.images, vec!["http://x/a.png", "http://x/b.png"]);
    }

    #[test]
    fn test_approve_body_shape() {
        let body = ApproveBody {
            name: "Ana",
            description: "Neighbour",
            relation: None,
            image_url: "http://x/a.jpg",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Ana", "description": "Neighbour", "imageUrl": "http://x/a.jpg"})
        );
        assert_eq!(
            serde_json::to_value(DenyBody::default()).unwrap(),
            serde_json::json!({"action": "deny"})
        );
    }

    #[test]
    fn test_credential_debug_hides_password() {
        let cred = Credential::new("a@b.co", "hunter22");
        assert!(!format!("{:?}", cred).contains("hunter22"));
    }
}
