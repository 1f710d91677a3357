//! Render state - data structure sent from App layer to UI for rendering

use crate::messages::ui_events::{AppTab, ApprovalField, InputMode, LoginField};
use crate::models::{ArtifactReference, Person};

/// Connection state of the live feed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LiveStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Polling,
    Paused,
    Disconnected,
    Error(String),
}

impl LiveStatus {
    pub fn label(&self) -> String {
        match self {
            LiveStatus::Idle => "idle".to_string(),
            LiveStatus::Connecting => "connecting".to_string(),
            LiveStatus::Connected => "connected".to_string(),
            LiveStatus::Polling => "polling".to_string(),
            LiveStatus::Paused => "paused".to_string(),
            LiveStatus::Disconnected => "disconnected (r to reconnect)".to_string(),
            LiveStatus::Error(e) => format!("error: {} (r to reconnect)", e),
        }
    }
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Navigation
    pub active_tab: AppTab,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub show_help: bool,
    /// Status-bar alert, replaced by the next one
    pub notice: Option<String>,

    // Login
    pub show_login: bool,
    pub login_email: String,
    /// Masked
    pub login_password: String,
    pub login_field: LoginField,
    pub login_errors: Vec<String>,
    pub login_loading: bool,

    // Profile
    pub user_name: Option<String>,
    pub user_json: Option<String>,

    // Dashboard
    pub people: Vec<Person>,
    pub people_loading: bool,
    pub people_error: Option<String>,
    pub selected_person: usize,
    pub people_time_ms: u64,

    // Approval
    pub pending_image: Option<ArtifactReference>,
    pub approval_form_open: bool,
    pub approval_name: String,
    pub approval_description: String,
    pub approval_relation: String,
    pub approval_field: ApprovalField,
    pub approval_busy: bool,

    // Live
    pub live_frame: Option<ArtifactReference>,
    pub live_status: LiveStatus,
    pub live_paused: bool,
    pub live_mode: String,
    pub frames_received: u64,
}
