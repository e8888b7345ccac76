// Weblog Tail - app/connection.rs
//
// Connection manager: owns the single streaming socket.
//
// Architecture:
//   - `ConnectionManager` lives on the UI thread; `run_connection_worker` runs
//     on a background thread and exclusively owns the socket.
//   - The worker reports lifecycle changes and inbound frames as
//     `ConnectionEvent`s over an mpsc channel. The UI drains it once per frame,
//     so frames are handled strictly in transport order by a single consumer.
//   - Outbound sends and close requests travel the other way over a command
//     channel. The socket read uses a short timeout so commands are picked up
//     within SOCKET_READ_TIMEOUT_MS.
//   - The socket itself is behind the `Transport`/`Connector` traits; the
//     production implementation is tungstenite, tests use an in-memory fake.
//
// Failure handling:
//   - Handshake, read, and write errors emit `Error` followed by
//     `Closed { reason: Failed }`; a backend close emits `Closed { Remote }`.
//     Both end in the Disconnected state.
//   - With reconnection disabled (the default) the worker exits after the
//     first close. With it enabled the worker waits out an exponential
//     backoff and retries; a close request during the wait stops it.

use crate::core::model::{CloseReason, ConnectionEvent, ConnectionState};
use crate::core::protocol;
use crate::util::constants::{
    DEFAULT_RECONNECT_INITIAL_MS, DEFAULT_RECONNECT_MAX_MS, SOCKET_READ_TIMEOUT_MS,
};
use crate::util::error::{ConnectionError, WeblogError};
use std::net::TcpStream;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use url::Url;

// =============================================================================
// Transport seam
// =============================================================================

/// Outcome of one bounded read from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Text(String),
    /// Nothing arrived within the read timeout.
    Idle,
    /// The peer closed the connection.
    Closed,
}

/// An open, bidirectional text-frame connection.
pub trait Transport: Send {
    fn send_text(&mut self, text: String) -> Result<(), ConnectionError>;

    /// Wait a bounded time for the next frame.
    fn receive(&mut self) -> Result<Incoming, ConnectionError>;

    /// Best-effort orderly shutdown.
    fn close(&mut self);
}

/// Opens transports to an endpoint.
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &Url) -> Result<Box<dyn Transport>, ConnectionError>;
}

// =============================================================================
// tungstenite implementation
// =============================================================================

/// Production connector: WebSocket over TCP, TLS for `wss`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    read_timeout: Duration,
}

impl WsConnector {
    pub fn new() -> Self {
        Self {
            read_timeout: Duration::from_millis(SOCKET_READ_TIMEOUT_MS),
        }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for WsConnector {
    fn connect(&self, endpoint: &Url) -> Result<Box<dyn Transport>, ConnectionError> {
        let (socket, response) =
            tungstenite::connect(endpoint.as_str()).map_err(|source| ConnectionError::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;
        tracing::debug!(
            endpoint = %endpoint,
            status = %response.status(),
            "WebSocket handshake complete"
        );
        set_read_timeout(socket.get_ref(), self.read_timeout).map_err(|source| {
            ConnectionError::Io {
                operation: "set socket read timeout",
                source,
            }
        })?;
        Ok(Box::new(WsTransport { socket }))
    }
}

fn set_read_timeout(
    stream: &MaybeTlsStream<TcpStream>,
    timeout: Duration,
) -> std::io::Result<()> {
    match stream {
        MaybeTlsStream::Plain(s) => s.set_read_timeout(Some(timeout)),
        MaybeTlsStream::Rustls(s) => s.get_ref().set_read_timeout(Some(timeout)),
        _ => Ok(()),
    }
}

struct WsTransport {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) -> Result<(), ConnectionError> {
        self.socket
            .send(Message::Text(text))
            .map_err(|source| ConnectionError::Send { source })
    }

    fn receive(&mut self) -> Result<Incoming, ConnectionError> {
        match self.socket.read() {
            Ok(Message::Text(text)) => Ok(Incoming::Text(text)),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => Ok(Incoming::Text(text)),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping non-UTF-8 binary frame");
                    Ok(Incoming::Idle)
                }
            },
            Ok(Message::Close(frame)) => {
                tracing::debug!(frame = ?frame, "Close frame received");
                Ok(Incoming::Closed)
            }
            // Ping replies are queued by tungstenite and flushed on the next I/O.
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => Ok(Incoming::Idle),
            Err(tungstenite::Error::Io(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                Ok(Incoming::Idle)
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(Incoming::Closed)
            }
            Err(source) => Err(ConnectionError::Receive { source }),
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.socket.close(None) {
            tracing::debug!(error = %e, "Close handshake not sent");
        }
        let _ = self.socket.flush();
    }
}

// =============================================================================
// Reconnect policy
// =============================================================================

/// Whether and how the worker reconnects after the socket goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl ReconnectPolicy {
    /// Stay disconnected until `connect()` is called again.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::with_backoff(
                Duration::from_millis(DEFAULT_RECONNECT_INITIAL_MS),
                Duration::from_millis(DEFAULT_RECONNECT_MAX_MS),
            )
        }
    }

    /// Reconnect automatically, doubling the delay from `initial` up to `max`.
    pub fn with_backoff(initial: Duration, max: Duration) -> Self {
        Self {
            enabled: true,
            initial_backoff: initial,
            max_backoff: max.max(initial),
        }
    }

    pub fn next_backoff(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_backoff)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

// =============================================================================
// ConnectionManager
// =============================================================================

enum Command {
    Send(String),
    Close,
}

/// Cloneable handle that closes the connection from anywhere (window
/// teardown, signal handlers, other threads).
#[derive(Clone)]
pub struct ShutdownHook {
    commands: mpsc::Sender<Command>,
}

impl ShutdownHook {
    /// Ask the worker to close the socket. The close is reported back as an
    /// ordinary `Closed { reason: Local }` event. No-op if the worker is gone.
    pub fn fire(&self) {
        if self.commands.send(Command::Close).is_err() {
            tracing::debug!("Shutdown hook fired after the worker exited");
        }
    }
}

/// Supervises the single socket on a background thread.
pub struct ConnectionManager {
    endpoint: Url,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    state: ConnectionState,
    events_rx: Option<mpsc::Receiver<ConnectionEvent>>,
    commands_tx: Option<mpsc::Sender<Command>>,
}

impl ConnectionManager {
    pub fn new(endpoint: Url, connector: Arc<dyn Connector>, policy: ReconnectPolicy) -> Self {
        Self {
            endpoint,
            connector,
            policy,
            state: ConnectionState::Disconnected,
            events_rx: None,
            commands_tx: None,
        }
    }

    /// Open the socket on a fresh worker thread.
    ///
    /// If a worker is already running it is closed first and its pending
    /// events are discarded.
    pub fn connect(&mut self) {
        self.shutdown_worker();

        let (events_tx, events_rx) = mpsc::channel();
        let (commands_tx, commands_rx) = mpsc::channel();
        self.events_rx = Some(events_rx);
        self.commands_tx = Some(commands_tx);
        self.state = ConnectionState::Connecting;

        let connector = Arc::clone(&self.connector);
        let endpoint = self.endpoint.clone();
        let policy = self.policy;
        std::thread::spawn(move || {
            run_connection_worker(connector, endpoint, policy, events_tx, commands_rx);
        });

        tracing::info!(endpoint = %self.endpoint, reconnect = self.policy.enabled, "Connecting");
    }

    /// Send a `selector` envelope carrying `selector` verbatim.
    ///
    /// Fails with `NotConnected` unless the socket is open. Nothing is queued
    /// for later delivery.
    pub fn send_query(&self, selector: &str) -> Result<(), WeblogError> {
        if self.state != ConnectionState::Connected {
            return Err(ConnectionError::NotConnected {
                state: self.state.label(),
            }
            .into());
        }
        let frame = protocol::selector_envelope(selector)?;
        let commands = self.commands_tx.as_ref().ok_or(ConnectionError::WorkerGone)?;
        commands
            .send(Command::Send(frame))
            .map_err(|_| ConnectionError::WorkerGone)?;
        tracing::debug!(selector, "Selector sent");
        Ok(())
    }

    /// Terminate the socket. State becomes Disconnected immediately and
    /// frames still in flight are dropped.
    pub fn close(&mut self) {
        if self.shutdown_worker() {
            tracing::info!(endpoint = %self.endpoint, "Connection closed locally");
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Handle for closing the connection from outside the UI thread.
    /// `None` before the first `connect()` or after `close()`.
    pub fn shutdown_hook(&self) -> Option<ShutdownHook> {
        self.commands_tx.as_ref().map(|commands| ShutdownHook {
            commands: commands.clone(),
        })
    }

    /// Drain up to `budget` pending worker events without blocking, applying
    /// each one's state transition before returning them in arrival order.
    pub fn poll_events(&mut self, budget: usize) -> Vec<ConnectionEvent> {
        let events = self.drain_events(budget);
        for event in &events {
            self.apply_event(event);
        }
        events
    }

    /// Drain up to `budget` pending worker events without applying them.
    /// The caller must pass each one to `apply_event`, in order.
    pub fn drain_events(&mut self, budget: usize) -> Vec<ConnectionEvent> {
        let mut events = Vec::new();
        if let Some(ref rx) = self.events_rx {
            while events.len() < budget {
                match rx.try_recv() {
                    Ok(event) => events.push(event),
                    Err(_) => break,
                }
            }
        }
        events
    }

    /// Apply the state transition implied by `event`.
    pub fn apply_event(&mut self, event: &ConnectionEvent) {
        let next = match event {
            ConnectionEvent::Connecting { .. } => ConnectionState::Connecting,
            ConnectionEvent::Opened => ConnectionState::Connected,
            ConnectionEvent::Error { .. } | ConnectionEvent::Closed { .. } => {
                ConnectionState::Disconnected
            }
            ConnectionEvent::Frame { .. } => return,
        };
        if next != self.state {
            tracing::info!(from = %self.state, to = %next, "Connection state changed");
            self.state = next;
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns `true` while a worker thread is attached.
    pub fn is_active(&self) -> bool {
        self.commands_tx.is_some()
    }

    /// Returns `true` if a worker was attached.
    fn shutdown_worker(&mut self) -> bool {
        let had_worker = self.commands_tx.is_some();
        if let Some(commands) = self.commands_tx.take() {
            let _ = commands.send(Command::Close);
        }
        self.events_rx = None;
        had_worker
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown_worker();
    }
}

// =============================================================================
// Background worker
// =============================================================================

/// Connect, pump frames until the socket goes away, and reconnect if the
/// policy allows.
fn run_connection_worker(
    connector: Arc<dyn Connector>,
    endpoint: Url,
    policy: ReconnectPolicy,
    tx: mpsc::Sender<ConnectionEvent>,
    commands: mpsc::Receiver<Command>,
) {
    macro_rules! send {
        ($msg:expr) => {
            if tx.send($msg).is_err() {
                // UI side dropped the receiver: nobody is listening.
                return;
            }
        };
    }

    let mut attempt: u32 = 0;
    let mut backoff = policy.initial_backoff;

    loop {
        attempt += 1;
        send!(ConnectionEvent::Connecting { attempt });

        let reason = match connector.connect(&endpoint) {
            Ok(transport) => {
                tracing::info!(endpoint = %endpoint, attempt, "WebSocket opened");
                attempt = 0;
                backoff = policy.initial_backoff;
                send!(ConnectionEvent::Opened);
                pump_transport(transport, &tx, &commands)
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, attempt, error = %e, "Connect failed");
                send!(ConnectionEvent::Error {
                    message: e.to_string(),
                });
                CloseReason::Failed
            }
        };

        send!(ConnectionEvent::Closed { reason });

        if reason == CloseReason::Local || !policy.enabled {
            tracing::debug!(?reason, "Connection worker exiting");
            return;
        }

        tracing::info!(delay_ms = backoff.as_millis() as u64, "Reconnecting after delay");
        if !wait_backoff(backoff, &commands) {
            send!(ConnectionEvent::Closed {
                reason: CloseReason::Local,
            });
            return;
        }
        backoff = policy.next_backoff(backoff);
    }
}

/// Forward frames and commands until the socket goes away.
fn pump_transport(
    mut transport: Box<dyn Transport>,
    tx: &mpsc::Sender<ConnectionEvent>,
    commands: &mpsc::Receiver<Command>,
) -> CloseReason {
    loop {
        loop {
            match commands.try_recv() {
                Ok(Command::Send(text)) => {
                    if let Err(e) = transport.send_text(text) {
                        tracing::warn!(error = %e, "Send failed");
                        let _ = tx.send(ConnectionEvent::Error {
                            message: e.to_string(),
                        });
                        transport.close();
                        return CloseReason::Failed;
                    }
                }
                Ok(Command::Close) | Err(TryRecvError::Disconnected) => {
                    transport.close();
                    return CloseReason::Local;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match transport.receive() {
            Ok(Incoming::Text(text)) => {
                if tx.send(ConnectionEvent::Frame { text }).is_err() {
                    transport.close();
                    return CloseReason::Local;
                }
            }
            Ok(Incoming::Idle) => {}
            Ok(Incoming::Closed) => {
                tracing::info!("Backend closed the socket");
                return CloseReason::Remote;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Receive failed");
                let _ = tx.send(ConnectionEvent::Error {
                    message: e.to_string(),
                });
                transport.close();
                return CloseReason::Failed;
            }
        }
    }
}

/// Sleep for `delay` while listening for commands. Returns `false` if a close
/// was requested (or the manager went away) before the delay elapsed.
fn wait_backoff(delay: Duration, commands: &mpsc::Receiver<Command>) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return true;
        }
        match commands.recv_timeout(remaining) {
            Ok(Command::Send(_)) => {
                tracing::debug!("Dropping send while disconnected");
            }
            Ok(Command::Close) | Err(RecvTimeoutError::Disconnected) => return false,
            Err(RecvTimeoutError::Timeout) => return true,
        }
    }
}

// =============================================================================
// Unit tests
// =============================================================================
