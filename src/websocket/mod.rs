//! WebSocket Live Updates
//!
//! Pushes notification changes and push-channel status to open dashboards.
//! Connections must carry a session token; each one only hears about its
//! user's notifications and the shared push-channel ones.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: active connections and their subscriptions
//! - **Handler**: upgrade and per-connection message loop
//! - **Relay**: notification store and push status → hub
//! - **Messages**: client and server message formats
//!
//! ## Topics
//!
//! - `notifications.*` - every notification change
//! - `notifications.call` / `notifications.reminder` / `notifications.system`
//! - `notifications.read` / `notifications.cleared`
//! - `push` - push channel connected/disconnected
//! - `system` - server events
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket(`ws://localhost:8082/ws?access_token=${session.access_token}`);
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['notifications.*']}));
//! };
//! ws.onmessage = (event) => console.log(JSON.parse(event.data));
//! ```

mod handler;
mod hub;
mod messages;
mod relay;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubChime, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage, WsEvent, CALL_SOUND};
pub use relay::spawn_relay;
