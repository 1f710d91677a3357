//! Network messages - communication between App and Network layers

use crate::models::{ApprovalForm, ArtifactReference, Credential, Decision, Person};

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Exchange credentials for a token
    Login { id: u64, credential: Credential },
    /// One-shot dashboard fetch
    FetchPeople { id: u64 },

    // Approval gate
    /// Approval screen became active
    StartApproval,
    /// Approval screen went away; a held image stays held
    StopApproval,
    Approve { id: u64, form: ApprovalForm },
    Deny { id: u64 },

    // Live feed
    /// Live screen became active
    StartLive,
    /// Live screen went away
    StopLive,
    /// Pause button: close the socket or pause the poller
    PauseLive,
    /// Resume button: reopen the socket or resume the poller
    ResumeLive,

    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    LoginSucceeded {
        id: u64,
        token: String,
        user: serde_json::Value,
    },
    LoginFailed {
        id: u64,
        message: String,
    },
    People {
        id: u64,
        people: Vec<Person>,
        time_ms: u64,
    },
    PeopleFailed {
        id: u64,
        message: String,
    },

    /// A new image is waiting for a decision
    ApprovalPending {
        artifact: ArtifactReference,
    },
    ApprovalResolved {
        id: u64,
        decision: Decision,
    },
    ApprovalFailed {
        id: u64,
        message: String,
    },

    /// Newest live frame, from the socket or a poller
    LiveFrame {
        artifact: ArtifactReference,
    },
    LiveConnected {
        id: u64,
    },
    LiveClosed {
        id: u64,
    },
    LiveError {
        id: u64,
        error: String,
    },
}

impl NetworkResponse {
    /// Request or connection id, when the response answers one
    pub fn id(&self) -> Option<u64> {
        match self {
            NetworkResponse::LoginSucceeded { id, .. }
            | NetworkResponse::LoginFailed { id, .. }
            | NetworkResponse::People { id, .. }
            | NetworkResponse::PeopleFailed { id, .. }
            | NetworkResponse::ApprovalResolved { id, .. }
            | NetworkResponse::ApprovalFailed { id, .. }
            | NetworkResponse::LiveConnected { id }
            | NetworkResponse::LiveClosed { id }
            | NetworkResponse::LiveError { id, .. } => Some(*id),
            NetworkResponse::ApprovalPending { .. } | NetworkResponse::LiveFrame { .. } => None,
        }
    }
}
