//! Network actor - runs requests, the approval gate and the live feed in the Tokio runtime

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::config::{Config, LiveMode};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{Credential, Decision};
use crate::network::client::ApiClient;
use crate::network::websocket::{socket_url, subscribe_frames};
use crate::poller::{ApprovalGate, PollTarget, Poller};

/// Tracks the open live socket for cancellation
struct ActiveSocket {
    id: u64,
    cancel_tx: oneshot::Sender<()>,
}

impl ActiveSocket {
    /// The subscription task drops its receiver when it ends
    fn is_open(&self) -> bool {
        !self.cancel_tx.is_closed()
    }
}

/// Network actor that processes commands from the app layer
pub struct NetworkActor {
    client: ApiClient,
    config: Config,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
    gate: Arc<ApprovalGate<ApiClient>>,
    live_poller: Option<Poller<ApiClient>>,
    live_socket: Option<ActiveSocket>,
    live_paused: bool,
    next_socket_id: u64,
}

impl NetworkActor {
    pub fn new(config: Config, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        let client = ApiClient::new(&config);

        let gate = Arc::new(ApprovalGate::new(client.clone(), config.approval_interval()));
        let tx = response_tx.clone();
        gate.on_pending(move |artifact| {
            let _ = tx.send(NetworkResponse::ApprovalPending {
                artifact: artifact.clone(),
            });
        });

        NetworkActor {
            client,
            config,
            response_tx,
            active_requests: JoinSet::new(),
            gate,
            live_poller: None,
            live_socket: None,
            live_paused: false,
            next_socket_id: 1,
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Shutdown) | None => {
                            self.shutdown();
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd),
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }
    }

    fn handle_command(&mut self, cmd: NetworkCommand) {
        match cmd {
            NetworkCommand::Login { id, credential } => self.login(id, credential),
            NetworkCommand::FetchPeople { id } => self.fetch_people(id),

            NetworkCommand::StartApproval => {
                self.gate.start();
                // re-announce an image that is still waiting
                if let Some(artifact) = self.gate.pending() {
                    let _ = self.response_tx.send(NetworkResponse::ApprovalPending { artifact });
                }
            }
            NetworkCommand::StopApproval => self.gate.stop(),
            NetworkCommand::Approve { id, form } => {
                let gate = self.gate.clone();
                let response_tx = self.response_tx.clone();
                self.active_requests.spawn(async move {
                    let result = gate.approve(&form).await;
                    let _ = response_tx.send(resolution(id, Decision::Approved, result));
                });
            }
            NetworkCommand::Deny { id } => {
                let gate = self.gate.clone();
                let response_tx = self.response_tx.clone();
                self.active_requests.spawn(async move {
                    let result = gate.deny().await;
                    let _ = response_tx.send(resolution(id, Decision::Denied, result));
                });
            }

            NetworkCommand::StartLive => self.start_live(),
            NetworkCommand::StopLive => self.stop_live(),
            NetworkCommand::PauseLive => {
                self.live_paused = true;
                match self.config.live.mode {
                    LiveMode::Socket => self.close_socket(),
                    LiveMode::Frames | LiveMode::Stream => {
                        if let Some(poller) = &self.live_poller {
                            poller.pause();
                        }
                    }
                }
            }
            NetworkCommand::ResumeLive => {
                self.live_paused = false;
                match self.config.live.mode {
                    LiveMode::Socket => self.open_socket(),
                    LiveMode::Frames | LiveMode::Stream => {
                        if let Some(poller) = &self.live_poller {
                            poller.resume();
                        }
                    }
                }
            }

            NetworkCommand::Shutdown => self.shutdown(),
        }
    }

    fn login(&mut self, id: u64, credential: Credential) {
        let client = self.client.clone();
        let response_tx = self.response_tx.clone();
        self.active_requests.spawn(async move {
            let response = match client.login(&credential).await {
                Ok(resp) => {
                    tracing::info!(id, "Login succeeded");
                    NetworkResponse::LoginSucceeded {
                        id,
                        token: resp.token,
                        user: resp.user,
                    }
                }
                Err(e) => {
                    tracing::warn!(id, error = %e, "Login failed");
                    NetworkResponse::LoginFailed {
                        id,
                        message: e.user_message(),
                    }
                }
            };
            let _ = response_tx.send(response);
        });
    }

    fn fetch_people(&mut self, id: u64) {
        let client = self.client.clone();
        let response_tx = self.response_tx.clone();
        self.active_requests.spawn(async move {
            let start = Instant::now();
            let response = match client.fetch_people().await {
                Ok(people) => {
                    tracing::info!(id, count = people.len(), "Fetched people");
                    NetworkResponse::People {
                        id,
                        people,
                        time_ms: start.elapsed().as_millis() as u64,
                    }
                }
                Err(e) => {
                    tracing::warn!(id, error = %e, "Failed to fetch people");
                    NetworkResponse::PeopleFailed {
                        id,
                        message: e.user_message(),
                    }
                }
            };
            let _ = response_tx.send(response);
        });
    }

    fn start_live(&mut self) {
        let target = match self.config.live.mode {
            LiveMode::Socket => {
                if !self.live_paused {
                    self.open_socket();
                }
                return;
            }
            LiveMode::Frames => PollTarget::Frames,
            LiveMode::Stream => PollTarget::Stream,
        };
        let Some(interval) = self.config.live.interval() else {
            return;
        };

        let poller = self.live_poller.get_or_insert_with(|| {
            let poller = Poller::new(self.client.clone());
            let tx = self.response_tx.clone();
            poller.on_update(move |artifact| {
                let _ = tx.send(NetworkResponse::LiveFrame {
                    artifact: artifact.clone(),
                });
            });
            poller
        });
        poller.start(target, interval);
    }

    fn stop_live(&mut self) {
        self.close_socket();
        if let Some(poller) = &self.live_poller {
            poller.stop();
        }
    }

    fn open_socket(&mut self) {
        if self.live_socket.as_ref().map_or(false, ActiveSocket::is_open) {
            tracing::debug!("Live socket already open");
            return;
        }

        let id = self.next_socket_id;
        self.next_socket_id += 1;
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.live_socket = Some(ActiveSocket { id, cancel_tx });

        let url = socket_url(&self.config.base_url);
        let frame_dir = self.config.frame_dir();
        let response_tx = self.response_tx.clone();
        self.active_requests.spawn(async move {
            subscribe_frames(id, url, frame_dir, response_tx, cancel_rx).await;
        });
    }

    fn close_socket(&mut self) {
        if let Some(socket) = self.live_socket.take() {
            tracing::info!(id = socket.id, "Closing live socket");
            let _ = socket.cancel_tx.send(());
        }
    }

    fn shutdown(&mut self) {
        self.gate.stop();
        self.stop_live();
        self.active_requests.abort_all();
    }
}

fn resolution(
    id: u64,
    decision: Decision,
    result: Result<(), crate::error::ClientError>,
) -> NetworkResponse {
    match result {
        Ok(()) => NetworkResponse::ApprovalResolved { id, decision },
        Err(e) => {
            tracing::warn!(id, decision = decision.as_str(), error = %e, "Approval request failed");
            NetworkResponse::ApprovalFailed {
                id,
                message: e.user_message(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::client::test_server::serve;
    use std::time::Duration;

    fn config(base_url: String) -> Config {
        let mut config = Config::default();
        config.base_url = base_url;
        config.approval_interval_ms = 60_000;
        config
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<NetworkResponse>) -> NetworkResponse {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_approval_flow_through_actor() {
        let (base, seen) = serve(vec![
            (200, r#"{"image_url": "http://x/a.jpg"}"#),
            (200, "{}"),
            (204, ""),
        ])
        .await;
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(NetworkActor::new(config(base), resp_tx).run(cmd_rx));

        cmd_tx.send(NetworkCommand::StartApproval).unwrap();
        match next(&mut resp_rx).await {
            NetworkResponse::ApprovalPending { artifact } => {
                assert_eq!(artifact.locator, "http://x/a.jpg")
            }
            other => panic!("unexpected response: {:?}", other),
        }

        cmd_tx.send(NetworkCommand::Deny { id: 9 }).unwrap();
        assert!(matches!(
            next(&mut resp_rx).await,
            NetworkResponse::ApprovalResolved {
                id: 9,
                decision: Decision::Denied
            }
        ));

        // the immediate refetch after a decision
        tokio::time::sleep(Duration::from_millis(200)).await;
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].line, "POST /api/deny HTTP/1.1");
        assert_eq!(seen[2].line, "GET /api/get-image HTTP/1.1");
        drop(seen);

        cmd_tx.send(NetworkCommand::Shutdown).unwrap();
    }

    #[tokio::test]
    async fn test_login_failure_carries_server_message() {
        let (base, _) = serve(vec![(401, r#"{"message": "Invalid credentials"}"#)]).await;
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(NetworkActor::new(config(base), resp_tx).run(cmd_rx));

        cmd_tx
            .send(NetworkCommand::Login {
                id: 1,
                credential: Credential::new("ana@example.com", "secret1"),
            })
            .unwrap();
        match next(&mut resp_rx).await {
            NetworkResponse::LoginFailed { id, message } => {
                assert_eq!(id, 1);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_polled_live_feed() {
        let (base, _) = serve(vec![(200, r#"{"frames": ["f1.jpg"]}"#)]).await;
        let mut cfg = config(base);
        cfg.live.mode = LiveMode::Frames;
        cfg.live.frames_interval_ms = 60_000;
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(NetworkActor::new(cfg, resp_tx).run(cmd_rx));

        cmd_tx.send(NetworkCommand::StartLive).unwrap();
        match next(&mut resp_rx).await {
            NetworkResponse::LiveFrame { artifact } => assert_eq!(artifact.locator, "f1.jpg"),
            other => panic!("unexpected response: {:?}", other),
        }
        cmd_tx.send(NetworkCommand::StopLive).unwrap();
        cmd_tx.send(NetworkCommand::Shutdown).unwrap();
    }
}
