//! Messages exchanged between layers.
//!
//! Key presses become [`UiEvent`]s, the app turns them into
//! [`NetworkCommand`]s, the network actor answers with [`NetworkResponse`]s
//! (including poller and socket updates), and every state change is
//! published to the UI as a [`RenderState`].

pub mod network;
pub mod render;
pub mod ui_events;

pub use network::{NetworkCommand, NetworkResponse};
pub use render::RenderState;
pub use ui_events::UiEvent;
