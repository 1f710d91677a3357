//! Error types shared by the network, auth and storage layers

/// Errors produced by backend requests.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request was rejected before being sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ClientError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Validation(err) => err.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Transport("request timed out".to_string())
        } else if err.is_connect() {
            ClientError::Transport(format!("connection failed: {}", err))
        } else if err.is_decode() {
            ClientError::Malformed(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Client-side validation failures. These block submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Please enter a valid email")]
    EmailInvalid,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("No image is waiting for a decision")]
    NothingPending,
}

/// Key-value store failures
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage format error: {0}")]
    Format(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = ClientError::Status {
            status: 401,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[test]
    fn test_user_message_falls_back_to_display() {
        let err = ClientError::Status {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "server returned status 500: ");
        let err = ClientError::from(ValidationError::MissingFields);
        assert_eq!(err.user_message(), "Please fill in all fields");
    }
}
