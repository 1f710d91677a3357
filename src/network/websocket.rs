//! Live-frame socket - one push subscription, no automatic reconnect
//!
//! On open the client asks for a frame once; every message the server pushes
//! afterwards becomes the newest frame. Binary payloads are written to
//! `latest.jpg` in the frame directory and the file path is the locator. When
//! the channel closes or errors the task ends and stays ended until the user
//! asks for a new subscription.

use std::path::{Path, PathBuf};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::constants::{LATEST_FRAME_FILE, REQUEST_FRAME_MESSAGE};
use crate::messages::NetworkResponse;
use crate::models::ArtifactReference;

/// Socket address for a backend base URL (`http` → `ws`, `https` → `wss`)
pub fn socket_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    }
}

async fn store_frame(frame_dir: &Path, data: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(frame_dir).await?;
    let path = frame_dir.join(LATEST_FRAME_FILE);
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

/// Subscribe to pushed frames until cancelled, closed, or failed
pub async fn subscribe_frames(
    id: u64,
    url: String,
    frame_dir: PathBuf,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    tracing::info!(id, %url, "Opening live socket");

    let ws_stream = tokio::select! {
        biased;

        _ = &mut cancel_rx => {
            let _ = response_tx.send(NetworkResponse::LiveClosed { id });
            return;
        }
        connected = connect_async(url.as_str()) => match connected {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::warn!(id, error = %e, "Live socket connection failed");
                let _ = response_tx.send(NetworkResponse::LiveError {
                    id,
                    error: format!("Connection failed: {}", e),
                });
                return;
            }
        }
    };

    let (mut write, mut read) = ws_stream.split();

    if let Err(e) = write.send(Message::Text(REQUEST_FRAME_MESSAGE.to_string())).await {
        let _ = response_tx.send(NetworkResponse::LiveError {
            id,
            error: format!("Send failed: {}", e),
        });
        return;
    }
    let _ = response_tx.send(NetworkResponse::LiveConnected { id });

    loop {
        tokio::select! {
            biased;

            _ = &mut cancel_rx => {
                let _ = write.close().await;
                tracing::info!(id, "Live socket closed by user");
                let _ = response_tx.send(NetworkResponse::LiveClosed { id });
                return;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        match store_frame(&frame_dir, &data).await {
                            Ok(path) => {
                                let _ = response_tx.send(NetworkResponse::LiveFrame {
                                    artifact: ArtifactReference::new(path.display().to_string()),
                                });
                            }
                            Err(e) => {
                                tracing::warn!(id, error = %e, bytes = data.len(), "Could not store frame");
                            }
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        let locator = text.trim();
                        if !locator.is_empty() {
                            let _ = response_tx.send(NetworkResponse::LiveFrame {
                                artifact: ArtifactReference::new(locator),
                            });
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| format!("{}: {}", f.code, f.reason))
                            .unwrap_or_else(|| "Connection closed".to_string());
                        tracing::info!(id, %reason, "Live socket closed by server");
                        let _ = response_tx.send(NetworkResponse::LiveClosed { id });
                        return;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(id, error = %e, "Live socket error");
                        let _ = response_tx.send(NetworkResponse::LiveError {
                            id,
                            error: format!("Receive error: {}", e),
                        });
                        return;
                    }
                    None => {
                        let _ = response_tx.send(NetworkResponse::LiveClosed { id });
                        return;
                    }
                }
            }
        }
    }
}
