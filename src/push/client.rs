//! Reconnecting push-channel client
//!
//! [`PushHandle::connect`] spawns one task that owns the connection. The
//! task reconnects after a fixed delay, a bounded number of times in a row,
//! and resets the count whenever a connection opens. Dropping the handle
//! (or calling [`PushHandle::disconnect`]) cancels the task together with
//! any pending reconnect timer.

use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::transport::{Connector, Transport};
use super::PushError;

/// Reconnect policy and target
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub url: String,
    /// Fixed delay between attempts
    pub reconnect_interval: Duration,
    /// Retries after a drop or failed connect before giving up
    pub reconnect_attempts: u32,
    /// Capacity of the frame broadcast
    pub frame_buffer: usize,
}

impl PushConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_interval: Duration::from_secs(5),
            reconnect_attempts: 10,
            frame_buffer: 256,
        }
    }
}

/// Snapshot of the client for status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct PushStatus {
    pub url: String,
    pub connected: bool,
    /// Connects tried since the handle was created
    pub attempts: u32,
    /// False once the client gave up or was disconnected
    pub running: bool,
    pub last_message: Option<String>,
}

struct Shared {
    connected: watch::Sender<bool>,
    last_message: watch::Sender<Option<String>>,
    frames: broadcast::Sender<String>,
    attempts: AtomicU32,
    /// Cancelled once the connection task has ended for good
    stopped: CancellationToken,
}

/// Owner of a running push-channel connection
pub struct PushHandle {
    url: String,
    shared: Arc<Shared>,
    outgoing: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PushHandle {
    /// Start connecting in the background
    pub fn connect(config: PushConfig, connector: Arc<dyn Connector>) -> Self {
        let (connected, _) = watch::channel(false);
        let (last_message, _) = watch::channel(None);
        let (frames, _) = broadcast::channel(config.frame_buffer.max(1));
        let shared = Arc::new(Shared {
            connected,
            last_message,
            frames,
            attempts: AtomicU32::new(0),
            stopped: CancellationToken::new(),
        });

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let url = config.url.clone();

        let task = tokio::spawn(run(
            config,
            connector,
            shared.clone(),
            outgoing_rx,
            cancel.clone(),
        ));

        Self {
            url,
            shared,
            outgoing,
            cancel,
            task: Some(task),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        *self.shared.connected.borrow()
    }

    /// Most recent frame; later frames overwrite earlier ones
    pub fn last_message(&self) -> Option<String> {
        self.shared.last_message.borrow().clone()
    }

    /// Every frame received from now on
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.shared.frames.subscribe()
    }

    /// Connection state changes
    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.shared.connected.subscribe()
    }

    /// Queue a text frame; `false` (and nothing sent) while disconnected
    pub fn send(&self, text: impl Into<String>) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.outgoing.send(text.into()).is_ok()
    }

    pub fn is_running(&self) -> bool {
        !self.shared.stopped.is_cancelled()
    }

    /// Resolves once the client gave up or was disconnected
    pub async fn stopped(&self) {
        self.shared.stopped.cancelled().await
    }

    pub fn status(&self) -> PushStatus {
        PushStatus {
            url: self.url.clone(),
            connected: self.is_connected(),
            attempts: self.shared.attempts.load(Ordering::SeqCst),
            running: self.is_running(),
            last_message: self.last_message(),
        }
    }

    /// Close the connection and wait for the task to stop
    pub async fn disconnect(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Push task ended abnormally");
            }
        }
    }
}

impl Drop for PushHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum SessionEnd {
    Cancelled,
    Closed,
    Failed(PushError),
}

async fn run(
    config: PushConfig,
    connector: Arc<dyn Connector>,
    shared: Arc<Shared>,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let mut retries: u32 = 0;

    loop {
        shared.attempts.fetch_add(1, Ordering::SeqCst);

        let attempt = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connector.connect(&config.url) => result,
        };

        match attempt {
            Ok(mut transport) => {
                retries = 0;
                shared.connected.send_replace(true);
                tracing::info!(url = %config.url, "Push channel connected");

                let end = session(transport.as_mut(), &shared, &mut outgoing, &cancel).await;
                shared.connected.send_replace(false);

                match end {
                    SessionEnd::Cancelled => {
                        transport.close().await;
                        break;
                    }
                    SessionEnd::Closed => {
                        tracing::info!(url = %config.url, "Push channel closed by peer");
                    }
                    SessionEnd::Failed(e) => {
                        tracing::warn!(url = %config.url, error = %e, "Push channel dropped");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(url = %config.url, error = %e, "Push channel connect failed");
            }
        }

        if retries >= config.reconnect_attempts {
            tracing::warn!(
                url = %config.url,
                attempts = config.reconnect_attempts,
                "Push channel giving up after repeated failures"
            );
            break;
        }
        retries += 1;

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.reconnect_interval) => {}
        }
        tracing::debug!(url = %config.url, retry = retries, "Reconnecting push channel");
    }

    shared.connected.send_replace(false);
    shared.stopped.cancel();
}

async fn session(
    transport: &mut dyn Transport,
    shared: &Shared,
    outgoing: &mut mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
) -> SessionEnd {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            frame = transport.recv() => match frame {
                Some(Ok(text)) => {
                    shared.last_message.send_replace(Some(text.clone()));
                    // No subscribers is fine; the last message is still kept.
                    let _ = shared.frames.send(text);
                }
                Some(Err(e)) => return SessionEnd::Failed(e),
                None => return SessionEnd::Closed,
            },
            Some(text) = outgoing.recv() => {
                if let Err(e) = transport.send(text).await {
                    return SessionEnd::Failed(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Mutex;

    /// Refuses every connect
    #[derive(Default)]
    struct Unreachable {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Connector for Unreachable {
        async fn connect(&self, _url: &str) -> Result<Box<dyn Transport>, PushError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PushError::Connect("connection refused".to_string()))
        }
    }

    /// Server side of a scripted connection
    struct Peer {
        to_client: mpsc::UnboundedSender<String>,
        from_client: mpsc::UnboundedReceiver<String>,
    }

    struct ChannelTransport {
        incoming: mpsc::UnboundedReceiver<String>,
        outgoing: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl Transport for ChannelTransport {
        async fn recv(&mut self) -> Option<Result<String, PushError>> {
            self.incoming.recv().await.map(Ok)
        }

        async fn send(&mut self, text: String) -> Result<(), PushError> {
            self.outgoing
                .send(text)
                .map_err(|e| PushError::Transport(e.to_string()))
        }

        async fn close(&mut self) {}
    }

    /// Accepts every connect and hands the peer end to the test
    #[derive(Default)]
    struct Scripted {
        calls: AtomicUsize,
        peers: Mutex<Vec<Peer>>,
    }

    #[async_trait]
    impl Connector for Scripted {
        async fn connect(&self, _url: &str) -> Result<Box<dyn Transport>, PushError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (to_client, incoming) = mpsc::unbounded_channel();
            let (outgoing, from_client) = mpsc::unbounded_channel();
            self.peers.lock().await.push(Peer {
                to_client,
                from_client,
            });
            Ok(Box::new(ChannelTransport { incoming, outgoing }))
        }
    }

    async fn wait_connected(handle: &PushHandle, expected: bool) {
        let mut rx = handle.watch_connected();
        while *rx.borrow_and_update() != expected {
            rx.changed().await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_ten_retries() {
        let connector = Arc::new(Unreachable::default());
        let handle = PushHandle::connect(PushConfig::new("ws://gateway:8081"), connector.clone());

        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(connector.calls.load(Ordering::SeqCst), 11);
        assert!(!handle.is_connected());
        assert!(!handle.is_running());
        assert_eq!(handle.status().attempts, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_resolves_when_giving_up() {
        let connector = Arc::new(Unreachable::default());
        let handle = PushHandle::connect(PushConfig::new("ws://gateway:8081"), connector.clone());
        assert!(handle.is_running());

        tokio::time::timeout(Duration::from_secs(120), handle.stopped())
            .await
            .unwrap();

        // Stopped is only signalled after the last attempt
        assert_eq!(connector.calls.load(Ordering::SeqCst), 11);
        assert!(!handle.is_running());
        assert!(!handle.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_not_signalled_while_reconnecting() {
        let connector = Arc::new(Scripted::default());
        let handle = PushHandle::connect(PushConfig::new("ws://gateway:8081"), connector.clone());

        wait_connected(&handle, true).await;
        drop(connector.peers.lock().await.remove(0));
        wait_connected(&handle, false).await;

        // Down but still retrying: not stopped
        let waited = tokio::time::timeout(Duration::from_secs(1), handle.stopped()).await;
        assert!(waited.is_err());
        assert!(handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_use_fixed_interval() {
        let connector = Arc::new(Unreachable::default());
        let _handle = PushHandle::connect(PushConfig::new("ws://gateway:8081"), connector.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(connector.calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(connector.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_noop() {
        let handle = PushHandle::connect(
            PushConfig::new("ws://gateway:8081"),
            Arc::new(Unreachable::default()),
        );
        assert!(!handle.send("hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_and_send() {
        let connector = Arc::new(Scripted::default());
        let handle = PushHandle::connect(PushConfig::new("ws://gateway:8081"), connector.clone());
        let mut frames = handle.subscribe();

        wait_connected(&handle, true).await;
        let mut peer = connector.peers.lock().await.remove(0);

        peer.to_client.send(r#"{"type":"call"}"#.to_string()).unwrap();
        peer.to_client.send(r#"{"type":"reminder"}"#.to_string()).unwrap();

        assert_eq!(frames.recv().await.unwrap(), r#"{"type":"call"}"#);
        assert_eq!(frames.recv().await.unwrap(), r#"{"type":"reminder"}"#);
        assert_eq!(handle.last_message().as_deref(), Some(r#"{"type":"reminder"}"#));

        assert!(handle.send("ping"));
        assert_eq!(peer.from_client.recv().await.as_deref(), Some("ping"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_peer_close() {
        let connector = Arc::new(Scripted::default());
        let handle = PushHandle::connect(PushConfig::new("ws://gateway:8081"), connector.clone());

        wait_connected(&handle, true).await;
        let peer = connector.peers.lock().await.remove(0);
        drop(peer);

        wait_connected(&handle, false).await;
        wait_connected(&handle, true).await;
        assert_eq!(connector.calls.load(Ordering::SeqCst), 2);
        assert!(handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_retry() {
        let connector = Arc::new(Unreachable::default());
        let handle = PushHandle::connect(PushConfig::new("ws://gateway:8081"), connector.clone());

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.disconnect().await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    }
}
