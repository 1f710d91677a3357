//! Command handlers - business logic for processing UI events

use crate::app::AppState;
use crate::auth::{validate_approval, validate_credential};
use crate::messages::render::LiveStatus;
use crate::messages::ui_events::{AppTab, InputMode};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{ApprovalForm, Credential, Decision};

impl AppState {
    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        if self.current_input_mut().is_none() {
            return;
        }
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.current_input().len();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn next_field(&mut self) {
        if self.show_login() {
            self.login.field = self.login.field.next();
        } else if self.active_tab == AppTab::Approval && self.approval.form_open {
            self.approval.field = self.approval.field.next();
        } else {
            return;
        }
        self.cursor_position = self.current_input().len();
    }

    pub fn move_cursor_left(&mut self) {
        let input = self.current_input();
        let mut new_pos = clamp_cursor(input, self.cursor_position);
        if new_pos > 0 {
            new_pos = input[..new_pos]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
        self.cursor_position = new_pos;
    }

    pub fn move_cursor_right(&mut self) {
        let input = self.current_input();
        let cursor = clamp_cursor(input, self.cursor_position);
        let new_pos = if cursor < input.len() {
            input[cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| cursor + i)
                .unwrap_or(input.len())
        } else {
            cursor
        };
        self.cursor_position = new_pos;
    }

    pub fn enter_char(&mut self, c: char) {
        let cursor_pos = clamp_cursor(self.current_input(), self.cursor_position);
        if let Some(input) = self.current_input_mut() {
            if cursor_pos <= input.len() {
                input.insert(cursor_pos, c);
                self.cursor_position = cursor_pos + c.len_utf8();
            }
        }
    }

    pub fn delete_char(&mut self) {
        let cursor_pos = clamp_cursor(self.current_input(), self.cursor_position);
        if cursor_pos == 0 {
            self.cursor_position = 0;
            return;
        }
        if let Some(input) = self.current_input_mut() {
            let prev_pos = input[..cursor_pos]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            input.remove(prev_pos);
            self.cursor_position = prev_pos;
        }
    }

    // ========================
    // Popups
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    // ========================
    // Tab navigation
    // ========================

    /// Switch tabs, starting and stopping the background work tied to each tab
    pub fn switch_tab(&mut self, tab: AppTab) -> Vec<NetworkCommand> {
        let mut commands = Vec::new();
        if self.show_login() {
            return commands;
        }

        self.input_mode = InputMode::Normal;
        if self.active_tab == tab {
            return commands;
        }

        match self.active_tab {
            AppTab::Approval => commands.push(NetworkCommand::StopApproval),
            AppTab::Live => {
                commands.push(NetworkCommand::StopLive);
                self.live.status = LiveStatus::Idle;
                self.live.connection_id = None;
            }
            _ => {}
        }

        self.active_tab = tab;

        match tab {
            AppTab::Dashboard => commands.extend(self.refresh_people()),
            AppTab::Approval => commands.push(NetworkCommand::StartApproval),
            AppTab::Live => {
                self.live.status = if self.live.paused {
                    LiveStatus::Paused
                } else {
                    self.live.starting_status()
                };
                commands.push(NetworkCommand::StartLive);
            }
            AppTab::Home | AppTab::Profile => {}
        }

        commands
    }

    // ========================
    // Login
    // ========================

    pub fn submit_login(&mut self) -> Option<NetworkCommand> {
        self.stop_editing();
        if self.login.pending_id.is_some() {
            return None;
        }

        let credential = Credential::new(self.login.email.trim(), self.login.password.clone());
        if let Err(errors) = validate_credential(&credential) {
            self.login.errors = errors.iter().map(|e| e.to_string()).collect();
            return None;
        }

        self.login.errors.clear();
        let id = self.next_id();
        self.login.pending_id = Some(id);
        Some(NetworkCommand::Login { id, credential })
    }

    /// Drop the session and return to the login screen
    pub fn logout(&mut self) -> Vec<NetworkCommand> {
        let commands = self.switch_tab(AppTab::Home);
        self.session.logout();
        self.login = Default::default();
        self.dashboard = Default::default();
        self.approval = Default::default();
        self.live.frame = None;
        self.live.frames_received = 0;
        self.notice = None;
        commands
    }

    // ========================
    // Dashboard
    // ========================

    pub fn refresh_people(&mut self) -> Option<NetworkCommand> {
        if self.dashboard.pending_id.is_some() {
            return None;
        }
        let id = self.next_id();
        self.dashboard.pending_id = Some(id);
        self.dashboard.error = None;
        Some(NetworkCommand::FetchPeople { id })
    }

    pub fn next_person(&mut self) {
        if !self.dashboard.people.is_empty() {
            self.dashboard.selected = (self.dashboard.selected + 1) % self.dashboard.people.len();
        }
    }

    pub fn prev_person(&mut self) {
        if !self.dashboard.people.is_empty() {
            self.dashboard.selected = self
                .dashboard
                .selected
                .checked_sub(1)
                .unwrap_or(self.dashboard.people.len() - 1);
        }
    }

    // ========================
    // Approval
    // ========================

    pub fn begin_approve(&mut self) {
        if self.approval.pending.is_none() || self.approval.decision_id.is_some() {
            return;
        }
        self.approval.form_open = true;
        self.approval.field = Default::default();
        self.start_editing();
    }

    pub fn cancel_approval(&mut self) {
        self.stop_editing();
        self.approval.form_open = false;
    }

    pub fn submit_approval(&mut self) -> Option<NetworkCommand> {
        self.stop_editing();
        if self.approval.pending.is_none() || self.approval.decision_id.is_some() {
            return None;
        }

        let relation = self.approval.relation.trim();
        let form = ApprovalForm {
            name: self.approval.name.clone(),
            description: self.approval.description.clone(),
            relation: (!relation.is_empty()).then(|| relation.to_string()),
        };
        if let Err(e) = validate_approval(&form) {
            self.notice = Some(e.to_string());
            return None;
        }

        let id = self.next_id();
        self.approval.decision_id = Some(id);
        self.notice = None;
        Some(NetworkCommand::Approve { id, form })
    }

    pub fn deny(&mut self) -> Option<NetworkCommand> {
        if self.approval.pending.is_none() || self.approval.decision_id.is_some() {
            return None;
        }
        let id = self.next_id();
        self.approval.decision_id = Some(id);
        self.notice = None;
        Some(NetworkCommand::Deny { id })
    }

    // ========================
    // Live feed
    // ========================

    pub fn toggle_live_pause(&mut self) -> Option<NetworkCommand> {
        if self.active_tab != AppTab::Live {
            return None;
        }
        self.live.paused = !self.live.paused;
        if self.live.paused {
            self.live.status = LiveStatus::Paused;
            Some(NetworkCommand::PauseLive)
        } else {
            self.live.status = self.live.starting_status();
            Some(NetworkCommand::ResumeLive)
        }
    }

    /// Reopen the feed after the socket closed or failed
    pub fn reconnect_live(&mut self) -> Option<NetworkCommand> {
        if self.active_tab != AppTab::Live || self.live.paused {
            return None;
        }
        match self.live.status {
            LiveStatus::Connected | LiveStatus::Connecting => None,
            _ => {
                self.live.status = self.live.starting_status();
                Some(NetworkCommand::StartLive)
            }
        }
    }

    // ========================
    // Response handling
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) {
        match response {
            NetworkResponse::LoginSucceeded { id, token, user } => {
                if self.login.pending_id == Some(id) {
                    self.session.save_token(&token);
                    self.session.save_user(user);
                    self.login = Default::default();
                    self.active_tab = AppTab::Home;
                    self.input_mode = InputMode::Normal;
                    self.cursor_position = 0;
                    self.notice = self
                        .session
                        .display_name()
                        .map(|name| format!("Welcome, {}", name));
                }
            }
            NetworkResponse::LoginFailed { id, message } => {
                if self.login.pending_id == Some(id) {
                    self.login.pending_id = None;
                    self.login.errors = vec![message];
                }
            }

            NetworkResponse::People { id, people, time_ms } => {
                if self.dashboard.pending_id == Some(id) {
                    self.dashboard.pending_id = None;
                    self.dashboard.people = people;
                    self.dashboard.time_ms = time_ms;
                    if self.dashboard.selected >= self.dashboard.people.len() {
                        self.dashboard.selected = 0;
                    }
                }
            }
            NetworkResponse::PeopleFailed { id, message } => {
                if self.dashboard.pending_id == Some(id) {
                    self.dashboard.pending_id = None;
                    self.dashboard.error = Some(message);
                }
            }

            NetworkResponse::ApprovalPending { artifact } => {
                self.approval.pending = Some(artifact);
            }
            NetworkResponse::ApprovalResolved { id, decision } => {
                if self.approval.decision_id == Some(id) {
                    self.approval = Default::default();
                    if self.active_tab == AppTab::Approval {
                        self.input_mode = InputMode::Normal;
                    }
                    self.notice = Some(match decision {
                        Decision::Approved => "Image approved".to_string(),
                        Decision::Denied => "Image denied".to_string(),
                    });
                }
            }
            NetworkResponse::ApprovalFailed { id, message } => {
                if self.approval.decision_id == Some(id) {
                    // the image stays held so the user can retry
                    self.approval.decision_id = None;
                    self.notice = Some(message);
                }
            }

            NetworkResponse::LiveFrame { artifact } => {
                if self.active_tab != AppTab::Live {
                    return;
                }
                self.live.frame = Some(artifact);
                self.live.frames_received += 1;
            }
            NetworkResponse::LiveConnected { id } => {
                self.live.connection_id = Some(id);
                if !self.live.paused {
                    self.live.status = LiveStatus::Connected;
                }
            }
            NetworkResponse::LiveClosed { id } => {
                if self.is_current_connection(id) {
                    self.live.connection_id = None;
                    if self.active_tab == AppTab::Live && !self.live.paused {
                        self.live.status = LiveStatus::Disconnected;
                    }
                }
            }
            NetworkResponse::LiveError { id, error } => {
                if self.is_current_connection(id) {
                    self.live.connection_id = None;
                    if self.active_tab == AppTab::Live && !self.live.paused {
                        self.live.status = LiveStatus::Error(error);
                    }
                }
            }
        }
    }

    /// A stale socket's close must not clobber the status of its replacement
    fn is_current_connection(&self, id: u64) -> bool {
        self.live.connection_id.map_or(true, |current| current == id)
    }
}

/// Keep a cursor inside `input` and on a character boundary
fn clamp_cursor(input: &str, pos: usize) -> usize {
    let mut pos = pos.min(input.len());
    while !input.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::config::LiveMode;
    use crate::models::ArtifactReference;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn logged_in() -> AppState {
        let store = Arc::new(MemoryStore::new());
        store.set("token", "abc").unwrap();
        AppState::new(Session::load(store), LiveMode::Socket)
    }

    fn logged_out() -> AppState {
        AppState::new(Session::load(Arc::new(MemoryStore::new())), LiveMode::Socket)
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            state.enter_char(c);
        }
    }

    #[test]
    fn test_login_validation_blocks_submit() {
        let mut state = logged_out();
        state.start_editing();
        type_text(&mut state, "not-an-email");
        state.next_field();
        type_text(&mut state, "123");

        assert!(state.submit_login().is_none());
        assert_eq!(
            state.login.errors,
            vec![
                "Please enter a valid email".to_string(),
                "Password must be at least 6 characters".to_string()
            ]
        );
    }

    #[test]
    fn test_login_success_stores_session() {
        let mut state = logged_out();
        state.login.email = "ana@example.com".to_string();
        state.login.password = "secret1".to_string();

        let Some(NetworkCommand::Login { id, credential }) = state.submit_login() else {
            panic!("expected a login command");
        };
        assert_eq!(credential.email, "ana@example.com");
        assert!(state.to_render_state().login_loading);

        state.handle_response(NetworkResponse::LoginSucceeded {
            id,
            token: "tok".to_string(),
            user: serde_json::json!({"name": "Ana"}),
        });
        assert!(!state.show_login());
        assert_eq!(state.session.token(), Some("tok"));
        assert_eq!(state.notice.as_deref(), Some("Welcome, Ana"));
        assert!(state.login.password.is_empty());
    }

    #[test]
    fn test_stale_login_response_ignored() {
        let mut state = logged_out();
        state.handle_response(NetworkResponse::LoginFailed {
            id: 42,
            message: "nope".to_string(),
        });
        assert!(state.login.errors.is_empty());
    }

    #[test]
    fn test_tab_switch_drives_background_work() {
        let mut state = logged_in();
        let cmds = state.switch_tab(AppTab::Approval);
        assert!(matches!(cmds.as_slice(), [NetworkCommand::StartApproval]));

        let cmds = state.switch_tab(AppTab::Live);
        assert!(matches!(
            cmds.as_slice(),
            [NetworkCommand::StopApproval, NetworkCommand::StartLive]
        ));
        assert_eq!(state.live.status, LiveStatus::Connecting);

        let cmds = state.switch_tab(AppTab::Dashboard);
        assert!(matches!(
            cmds.as_slice(),
            [NetworkCommand::StopLive, NetworkCommand::FetchPeople { .. }]
        ));
        assert!(state.switch_tab(AppTab::Dashboard).is_empty());
    }

    #[test]
    fn test_tabs_locked_while_logged_out() {
        let mut state = logged_out();
        assert!(state.switch_tab(AppTab::Live).is_empty());
        assert_eq!(state.active_tab, AppTab::Home);
    }

    #[test]
    fn test_approval_requires_name_and_description() {
        let mut state = logged_in();
        state.switch_tab(AppTab::Approval);
        state.handle_response(NetworkResponse::ApprovalPending {
            artifact: ArtifactReference::new("http://x/a.jpg"),
        });

        state.begin_approve();
        assert_eq!(state.input_mode, InputMode::Editing);
        type_text(&mut state, "Ana");
        assert!(state.submit_approval().is_none());
        assert_eq!(state.notice.as_deref(), Some("Please fill in all fields"));

        state.next_field();
        state.start_editing();
        type_text(&mut state, "Sister");
        let Some(NetworkCommand::Approve { id, form }) = state.submit_approval() else {
            panic!("expected an approve command");
        };
        assert_eq!(form.name, "Ana");
        assert_eq!(form.relation, None);

        state.handle_response(NetworkResponse::ApprovalResolved {
            id,
            decision: Decision::Approved,
        });
        assert!(state.approval.pending.is_none());
        assert!(!state.approval.form_open);
    }

    #[test]
    fn test_failed_deny_keeps_image() {
        let mut state = logged_in();
        assert!(state.deny().is_none());

        state.handle_response(NetworkResponse::ApprovalPending {
            artifact: ArtifactReference::new("http://x/a.jpg"),
        });
        let Some(NetworkCommand::Deny { id }) = state.deny() else {
            panic!("expected a deny command");
        };
        // one decision at a time
        assert!(state.deny().is_none());

        state.handle_response(NetworkResponse::ApprovalFailed {
            id,
            message: "Server error".to_string(),
        });
        assert!(state.approval.pending.is_some());
        assert!(state.deny().is_some());
    }

    #[test]
    fn test_live_pause_and_reconnect() {
        let mut state = logged_in();
        state.switch_tab(AppTab::Live);
        state.handle_response(NetworkResponse::LiveConnected { id: 1 });
        assert_eq!(state.live.status, LiveStatus::Connected);
        assert!(state.reconnect_live().is_none());

        state.handle_response(NetworkResponse::LiveClosed { id: 1 });
        assert_eq!(state.live.status, LiveStatus::Disconnected);
        assert!(matches!(state.reconnect_live(), Some(NetworkCommand::StartLive)));

        assert!(matches!(state.toggle_live_pause(), Some(NetworkCommand::PauseLive)));
        state.handle_response(NetworkResponse::LiveError {
            id: 2,
            error: "reset".to_string(),
        });
        assert_eq!(state.live.status, LiveStatus::Paused);
        assert!(matches!(state.toggle_live_pause(), Some(NetworkCommand::ResumeLive)));
    }

    #[test]
    fn test_stale_socket_close_ignored() {
        let mut state = logged_in();
        state.switch_tab(AppTab::Live);
        state.handle_response(NetworkResponse::LiveConnected { id: 2 });
        state.handle_response(NetworkResponse::LiveClosed { id: 1 });
        assert_eq!(state.live.status, LiveStatus::Connected);
    }

    #[test]
    fn test_logout_returns_to_login() {
        let mut state = logged_in();
        state.switch_tab(AppTab::Live);
        let cmds = state.logout();
        assert!(matches!(cmds.as_slice(), [NetworkCommand::StopLive]));
        assert!(state.show_login());
        assert!(state.to_render_state().show_login);
    }

    #[test]
    fn test_render_masks_password_and_counts_columns() {
        let mut state = logged_out();
        state.next_field();
        state.start_editing();
        type_text(&mut state, "pässword");
        state.move_cursor_left();

        let render = state.to_render_state();
        assert_eq!(render.login_password, "••••••••");
        assert_eq!(render.cursor_position, 7);
    }

    #[test]
    fn test_editing_after_login_completes() {
        let mut state = logged_out();
        state.login.email = "ana@example.com".to_string();
        state.login.password = "secret1".to_string();
        let Some(NetworkCommand::Login { id, .. }) = state.submit_login() else {
            panic!("expected a login command");
        };

        // user starts editing again while the request is in flight
        state.start_editing();
        assert_eq!(state.cursor_position, 15);

        state.handle_response(NetworkResponse::LoginSucceeded {
            id,
            token: "tok".to_string(),
            user: serde_json::json!({}),
        });
        assert_eq!(state.input_mode, InputMode::Normal);
        assert_eq!(state.cursor_position, 0);

        state.move_cursor_left();
        state.move_cursor_right();
        state.delete_char();
        assert_eq!(state.cursor_position, 0);
    }

    #[test]
    fn test_stale_cursor_is_clamped() {
        let mut state = logged_out();
        state.login.email = "añ".to_string();
        state.cursor_position = 40;
        state.move_cursor_left();
        assert_eq!(state.cursor_position, 1);

        state.cursor_position = 2;
        state.delete_char();
        assert_eq!(state.login.email, "ñ");
        assert_eq!(state.cursor_position, 0);
    }
}
