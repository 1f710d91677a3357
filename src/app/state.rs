//! App state - pure data structure with no I/O logic

use crate::auth::Session;
use crate::config::LiveMode;
use crate::messages::render::LiveStatus;
use crate::messages::ui_events::{AppTab, ApprovalField, InputMode, LoginField};
use crate::messages::RenderState;
use crate::models::{ArtifactReference, Person};

/// Login form contents
#[derive(Clone, Debug, Default)]
pub struct LoginState {
    pub email: String,
    pub password: String,
    pub field: LoginField,
    pub errors: Vec<String>,
    pub pending_id: Option<u64>,
}

/// People list shown on the dashboard
#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    pub people: Vec<Person>,
    pub selected: usize,
    pub error: Option<String>,
    pub time_ms: u64,
    pub pending_id: Option<u64>,
}

/// Held image plus the approve form
#[derive(Clone, Debug, Default)]
pub struct ApprovalState {
    pub pending: Option<ArtifactReference>,
    pub form_open: bool,
    pub name: String,
    pub description: String,
    pub relation: String,
    pub field: ApprovalField,
    /// Decision request in flight
    pub decision_id: Option<u64>,
}

/// Live feed state (persists across tab switches)
#[derive(Clone, Debug)]
pub struct LiveState {
    pub mode: LiveMode,
    pub frame: Option<ArtifactReference>,
    pub status: LiveStatus,
    pub paused: bool,
    pub connection_id: Option<u64>,
    pub frames_received: u64,
}

impl LiveState {
    pub fn new(mode: LiveMode) -> Self {
        LiveState {
            mode,
            frame: None,
            status: LiveStatus::Idle,
            paused: false,
            connection_id: None,
            frames_received: 0,
        }
    }

    /// Status shown while waiting for the first message
    pub fn starting_status(&self) -> LiveStatus {
        match self.mode {
            LiveMode::Socket => LiveStatus::Connecting,
            LiveMode::Frames | LiveMode::Stream => LiveStatus::Polling,
        }
    }
}

/// Main application state - pure data, no I/O
pub struct AppState {
    // Tab navigation
    pub active_tab: AppTab,
    pub input_mode: InputMode,
    pub cursor_position: usize,

    // Popups and alerts
    pub show_help: bool,
    pub notice: Option<String>,

    // Authenticated user
    pub session: Session,
    pub login: LoginState,

    pub dashboard: DashboardState,
    pub approval: ApprovalState,
    pub live: LiveState,

    pub next_request_id: u64,
}

impl AppState {
    pub fn new(session: Session, live_mode: LiveMode) -> Self {
        AppState {
            active_tab: AppTab::Home,
            input_mode: InputMode::Normal,
            cursor_position: 0,
            show_help: false,
            notice: None,
            session,
            login: LoginState::default(),
            dashboard: DashboardState::default(),
            approval: ApprovalState::default(),
            live: LiveState::new(live_mode),
            next_request_id: 1,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// The login screen replaces the tabs until a token is stored
    pub fn show_login(&self) -> bool {
        !self.session.is_authenticated()
    }

    /// Get the current input field content
    pub fn current_input(&self) -> &str {
        if self.show_login() {
            return match self.login.field {
                LoginField::Email => &self.login.email,
                LoginField::Password => &self.login.password,
            };
        }
        if self.active_tab == AppTab::Approval && self.approval.form_open {
            return match self.approval.field {
                ApprovalField::Name => &self.approval.name,
                ApprovalField::Description => &self.approval.description,
                ApprovalField::Relation => &self.approval.relation,
            };
        }
        ""
    }

    /// Get mutable reference to current input field, if one is focused
    pub fn current_input_mut(&mut self) -> Option<&mut String> {
        if self.show_login() {
            return Some(match self.login.field {
                LoginField::Email => &mut self.login.email,
                LoginField::Password => &mut self.login.password,
            });
        }
        if self.active_tab == AppTab::Approval && self.approval.form_open {
            return Some(match self.approval.field {
                ApprovalField::Name => &mut self.approval.name,
                ApprovalField::Description => &mut self.approval.description,
                ApprovalField::Relation => &mut self.approval.relation,
            });
        }
        None
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let input = self.current_input();
        let cursor = self.cursor_position.min(input.len());
        // the UI positions the cursor in columns, not bytes
        let cursor_column = input.get(..cursor).map_or(0, |s| s.chars().count());

        RenderState {
            active_tab: self.active_tab,
            input_mode: self.input_mode,
            cursor_position: cursor_column,
            show_help: self.show_help,
            notice: self.notice.clone(),

            show_login: self.show_login(),
            login_email: self.login.email.clone(),
            login_password: "•".repeat(self.login.password.chars().count()),
            login_field: self.login.field,
            login_errors: self.login.errors.clone(),
            login_loading: self.login.pending_id.is_some(),

            user_name: self.session.display_name(),
            user_json: self
                .session
                .user()
                .and_then(|u| serde_json::to_string_pretty(u).ok()),

            people: self.dashboard.people.clone(),
            people_loading: self.dashboard.pending_id.is_some(),
            people_error: self.dashboard.error.clone(),
            selected_person: self.dashboard.selected,
            people_time_ms: self.dashboard.time_ms,

            pending_image: self.approval.pending.clone(),
            approval_form_open: self.approval.form_open,
            approval_name: self.approval.name.clone(),
            approval_description: self.approval.description.clone(),
            approval_relation: self.approval.relation.clone(),
            approval_field: self.approval.field,
            approval_busy: self.approval.decision_id.is_some(),

            live_frame: self.live.frame.clone(),
            live_status: self.live.status.clone(),
            live_paused: self.live.paused,
            live_mode: self.live.mode.as_str().to_string(),
            frames_received: self.live.frames_received,
        }
    }
}
