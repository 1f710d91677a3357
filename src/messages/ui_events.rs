//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Application tabs, in tab-bar order
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AppTab {
    #[default]
    Home,
    Dashboard,
    Approval,
    Live,
    Profile,
}

impl AppTab {
    pub const ALL: [AppTab; 5] = [
        AppTab::Home,
        AppTab::Dashboard,
        AppTab::Approval,
        AppTab::Live,
        AppTab::Profile,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AppTab::Home => "Home",
            AppTab::Dashboard => "Dashboard",
            AppTab::Approval => "Approval",
            AppTab::Live => "Live",
            AppTab::Profile => "Profile",
        }
    }

    pub fn index(&self) -> usize {
        AppTab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> AppTab {
        AppTab::ALL[(self.index() + 1) % AppTab::ALL.len()]
    }

    pub fn prev(&self) -> AppTab {
        AppTab::ALL[(self.index() + AppTab::ALL.len() - 1) % AppTab::ALL.len()]
    }
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Tab navigation
    SwitchTab(AppTab),
    NextTab,
    PrevTab,

    // Input editing
    StartEditing,
    StopEditing,
    NextField,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,

    // Login
    SubmitLogin,

    // Dashboard
    RefreshPeople,
    NextPerson,
    PrevPerson,

    // Approval
    BeginApprove,
    Deny,
    SubmitApproval,
    CancelApproval,

    // Live
    ToggleLivePause,
    ReconnectLive,

    // Profile
    Logout,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Login form field
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LoginField {
    #[default]
    Email,
    Password,
}

impl LoginField {
    pub fn next(&self) -> LoginField {
        match self {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        }
    }
}

/// Approval form field
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ApprovalField {
    #[default]
    Name,
    Description,
    Relation,
}

impl ApprovalField {
    pub fn next(&self) -> ApprovalField {
        match self {
            ApprovalField::Name => ApprovalField::Description,
            ApprovalField::Description => ApprovalField::Relation,
            ApprovalField::Relation => ApprovalField::Name,
        }
    }
}

/// What the UI is showing, needed for context-aware key mapping
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyContext {
    pub active_tab: AppTab,
    pub input_mode: InputMode,
    pub show_help: bool,
    pub show_login: bool,
    pub approval_form_open: bool,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(key: KeyEvent, ctx: KeyContext) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UiEvent::Quit);
    }

    if ctx.show_help {
        return Some(UiEvent::CloseHelp);
    }

    if ctx.input_mode == InputMode::Editing {
        return handle_editing_keys(key, ctx);
    }

    if ctx.show_login {
        return handle_login_keys(key);
    }

    // Tab switching: number keys, Tab / Shift-Tab
    match key.code {
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            return Some(UiEvent::SwitchTab(AppTab::ALL[index]));
        }
        KeyCode::Tab if !ctx.approval_form_open || ctx.active_tab != AppTab::Approval => {
            return Some(UiEvent::NextTab)
        }
        KeyCode::BackTab => return Some(UiEvent::PrevTab),
        KeyCode::Char('q') => return Some(UiEvent::Quit),
        KeyCode::Char('?') => return Some(UiEvent::ToggleHelp),
        _ => {}
    }

    match ctx.active_tab {
        AppTab::Home => None,
        AppTab::Dashboard => match key.code {
            KeyCode::Char('r') => Some(UiEvent::RefreshPeople),
            KeyCode::Up | KeyCode::Left => Some(UiEvent::PrevPerson),
            KeyCode::Down | KeyCode::Right => Some(UiEvent::NextPerson),
            _ => None,
        },
        AppTab::Approval => handle_approval_keys(key, ctx.approval_form_open),
        AppTab::Live => match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') => Some(UiEvent::ToggleLivePause),
            KeyCode::Char('r') => Some(UiEvent::ReconnectLive),
            _ => None,
        },
        AppTab::Profile => match key.code {
            KeyCode::Char('l') => Some(UiEvent::Logout),
            _ => None,
        },
    }
}

fn handle_login_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => Some(UiEvent::NextField),
        KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
        KeyCode::Char('s') => Some(UiEvent::SubmitLogin),
        _ => None,
    }
}

fn handle_approval_keys(key: KeyEvent, form_open: bool) -> Option<UiEvent> {
    if form_open {
        match key.code {
            KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
            KeyCode::Tab | KeyCode::Down => Some(UiEvent::NextField),
            KeyCode::Char('s') => Some(UiEvent::SubmitApproval),
            KeyCode::Esc => Some(UiEvent::CancelApproval),
            _ => None,
        }
    } else {
        match key.code {
            KeyCode::Char('a') => Some(UiEvent::BeginApprove),
            KeyCode::Char('d') => Some(UiEvent::Deny),
            _ => None,
        }
    }
}

fn handle_editing_keys(key: KeyEvent, ctx: KeyContext) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc => Some(UiEvent::StopEditing),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Tab => Some(UiEvent::NextField),
        KeyCode::Enter if ctx.show_login => Some(UiEvent::SubmitLogin),
        KeyCode::Enter => Some(UiEvent::StopEditing),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        _ => None,
    }
}
