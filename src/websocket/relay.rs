//! Forwards notification list changes and push channel status to open
//! dashboards.

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::hub::ConnectionHub;
use super::messages::WsEvent;
use crate::notifications::NotificationStore;

pub fn spawn_relay(
    hub: ConnectionHub,
    notifications: &NotificationStore,
    mut push_connected: Option<watch::Receiver<bool>>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut events = notifications.subscribe();

    tokio::spawn(async move {
        loop {
            let push_changed = async {
                match push_connected.as_mut() {
                    Some(rx) => rx.changed().await.map(|_| *rx.borrow_and_update()),
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => {
                        hub.broadcast(&WsEvent::from_notification_event(event)).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Dashboard relay lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                status = push_changed => match status {
                    Ok(connected) => {
                        hub.broadcast(&WsEvent::push_status(connected)).await;
                    }
                    // Push client is gone; keep relaying notifications.
                    Err(_) => push_connected = None,
                },
            }
        }
        tracing::debug!("Dashboard relay stopped");
    })
}
