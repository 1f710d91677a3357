//! Network layer - HTTP requests, pollers and the live frame socket
//!
//! The Network actor receives commands from the app layer and sends back
//! responses, including updates pushed by the pollers and the socket.

pub mod actor;
pub mod client;
pub mod websocket;

pub use actor::NetworkActor;
pub use client::ApiClient;
