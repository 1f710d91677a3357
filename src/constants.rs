//! Application constants
//!
//! Centralized location for endpoint paths, storage keys and configuration defaults.

use std::time::Duration;

/// Default backend address
pub const DEFAULT_BASE_URL: &str = "http://10.0.0.98:5000";

/// Pending approval image
pub const GET_IMAGE_PATH: &str = "/api/get-image";
/// Approve the pending image
pub const APPROVE_PATH: &str = "/api/approve";
/// Deny the pending image
pub const DENY_PATH: &str = "/api/deny";
/// Recently captured frames, newest last
pub const GET_FRAMES_PATH: &str = "/api/get-frames";
/// Latest processed frame on disk
pub const STREAM_PATH: &str = "/api/stream";
/// Credential exchange
pub const LOGIN_PATH: &str = "/api/login";
/// Known people, shown on the dashboard
pub const DEFAULT_PEOPLE_PATH: &str = "/api/get-images";

/// Message sent once when the live socket opens
pub const REQUEST_FRAME_MESSAGE: &str = r#"{"type":"request_frame"}"#;

/// Approval screen retries every 5 seconds
pub const DEFAULT_APPROVAL_INTERVAL: Duration = Duration::from_millis(5000);
/// Live feed over `/api/get-frames`
pub const DEFAULT_FRAMES_INTERVAL: Duration = Duration::from_millis(1000);
/// Live feed over `/api/stream`
pub const DEFAULT_STREAM_INTERVAL: Duration = Duration::from_millis(100);

/// HTTP request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Session store keys
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Per-user directory under the home directory
pub const CONFIG_DIR_NAME: &str = ".memorymate";
pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const SESSION_FILE_NAME: &str = "session.yaml";
/// Latest socket frame is written here, inside the frame directory
pub const LATEST_FRAME_FILE: &str = "latest.jpg";

/// Log file, inside the per-user directory
pub const LOG_FILE_NAME: &str = "memorymate.log";

/// Application name
pub const APP_NAME: &str = "MemoryMate";
