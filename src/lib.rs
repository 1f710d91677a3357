//! # MemoryMate TUI
//!
//! A terminal client for the MemoryMate face-logging service.
//!
//! ## Features
//! - Login with client-side validation and a persisted session
//! - People dashboard
//! - Approve/deny gate for newly detected faces
//! - Live camera feed over a socket or by polling
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime), owning the pollers and the frame socket

pub mod app;
pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod messages;
pub mod models;
pub mod network;
pub mod poller;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState};
pub use auth::Session;
pub use config::{Config, LiveMode};
pub use error::{ClientError, StorageError, ValidationError};
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{ApprovalForm, ArtifactReference, Credential, FetchOutcome, Person};
pub use network::{ApiClient, NetworkActor};
pub use poller::{ApprovalGate, ArtifactSource, PollState, PollTarget, Poller};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
