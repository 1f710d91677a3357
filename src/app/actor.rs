//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::ui_events::InputMode;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        state: AppState,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    self.state.handle_response(response);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    fn send(&self, cmd: Option<NetworkCommand>) {
        if let Some(cmd) = cmd {
            let _ = self.network_tx.send(cmd);
        }
    }

    fn send_all(&self, cmds: Vec<NetworkCommand>) {
        for cmd in cmds {
            let _ = self.network_tx.send(cmd);
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Tab switching
            UiEvent::SwitchTab(tab) => {
                let cmds = self.state.switch_tab(tab);
                self.send_all(cmds);
            }
            UiEvent::NextTab => {
                let cmds = self.state.switch_tab(self.state.active_tab.next());
                self.send_all(cmds);
            }
            UiEvent::PrevTab => {
                let cmds = self.state.switch_tab(self.state.active_tab.prev());
                self.send_all(cmds);
            }

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::NextField => self.state.next_field(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Login
            UiEvent::SubmitLogin => {
                let cmd = self.state.submit_login();
                self.send(cmd);
            }

            // Dashboard
            UiEvent::RefreshPeople => {
                let cmd = self.state.refresh_people();
                self.send(cmd);
            }
            UiEvent::NextPerson => self.state.next_person(),
            UiEvent::PrevPerson => self.state.prev_person(),

            // Approval
            UiEvent::BeginApprove => self.state.begin_approve(),
            UiEvent::Deny => {
                let cmd = self.state.deny();
                self.send(cmd);
            }
            UiEvent::SubmitApproval => {
                if self.state.input_mode == InputMode::Editing {
                    self.state.stop_editing();
                }
                let cmd = self.state.submit_approval();
                self.send(cmd);
            }
            UiEvent::CancelApproval => self.state.cancel_approval(),

            // Live
            UiEvent::ToggleLivePause => {
                let cmd = self.state.toggle_live_pause();
                self.send(cmd);
            }
            UiEvent::ReconnectLive => {
                let cmd = self.state.reconnect_live();
                self.send(cmd);
            }

            // Profile
            UiEvent::Logout => {
                let cmds = self.state.logout();
                self.send_all(cmds);
            }

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}
