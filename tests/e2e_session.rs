// Weblog Tail - tests/e2e_session.rs
//
// End-to-end tests for the session pipeline: connection worker thread,
// event channel, frame decoding, and the rendered log table.
//
// The socket is replaced by an in-memory transport driven from the test
// thread; everything else (worker, channels, reconnect loop, dispatch) is
// the production code path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use url::Url;
use weblog_tail::app::connection::{
    ConnectionManager, Connector, Incoming, ReconnectPolicy, Transport,
};
use weblog_tail::app::session::Session;
use weblog_tail::core::model::ConnectionState;
use weblog_tail::util::error::ConnectionError;

// =============================================================================
// In-memory transport
// =============================================================================

/// Backend side of one fake socket.
struct Backend {
    to_client: mpsc::Sender<Incoming>,
    from_client: mpsc::Receiver<String>,
}

impl Backend {
    fn send(&self, frame: &str) {
        self.to_client
            .send(Incoming::Text(frame.to_string()))
            .expect("client transport dropped");
    }

    fn close(&self) {
        let _ = self.to_client.send(Incoming::Closed);
    }

    fn expect_frame(&self) -> serde_json::Value {
        let text = self
            .from_client
            .recv_timeout(Duration::from_secs(2))
            .expect("no frame from client");
        serde_json::from_str(&text).expect("client sent invalid JSON")
    }
}

struct MemoryTransport {
    inbound: mpsc::Receiver<Incoming>,
    outbound: mpsc::Sender<String>,
}

impl Transport for MemoryTransport {
    fn send_text(&mut self, text: String) -> Result<(), ConnectionError> {
        self.outbound
            .send(text)
            .map_err(|_| ConnectionError::WorkerGone)
    }

    fn receive(&mut self) -> Result<Incoming, ConnectionError> {
        match self.inbound.recv_timeout(Duration::from_millis(10)) {
            Ok(incoming) => Ok(incoming),
            Err(RecvTimeoutError::Timeout) => Ok(Incoming::Idle),
            Err(RecvTimeoutError::Disconnected) => Ok(Incoming::Closed),
        }
    }

    fn close(&mut self) {}
}

/// Hands out queued transports in order; refuses once the queue is empty.
#[derive(Default)]
struct MemoryConnector {
    pending: Mutex<VecDeque<MemoryTransport>>,
    attempts: AtomicUsize,
}

impl MemoryConnector {
    fn accept_next(&self) -> Backend {
        let (to_client, inbound) = mpsc::channel();
        let (outbound, from_client) = mpsc::channel();
        self.pending
            .lock()
            .unwrap()
            .push_back(MemoryTransport { inbound, outbound });
        Backend {
            to_client,
            from_client,
        }
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, endpoint: &Url) -> Result<Box<dyn Transport>, ConnectionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.pending.lock().unwrap().pop_front() {
            Some(t) => Ok(Box::new(t)),
            None => Err(ConnectionError::Io {
                operation: "connect",
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("{endpoint} refused"),
                ),
            }),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn new_session(connector: Arc<MemoryConnector>, policy: ReconnectPolicy) -> Session {
    let endpoint = Url::parse("ws://127.0.0.1:8080/weblog/socket").unwrap();
    Session::new(ConnectionManager::new(endpoint, connector, policy), 0)
}

/// Pump the session until `done` holds or two seconds pass.
fn pump_until(session: &mut Session, what: &str, mut done: impl FnMut(&Session) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        session.pump(usize::MAX);
        if done(session) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn connected(s: &Session) -> bool {
    s.state() == ConnectionState::Connected
}

fn disconnected(s: &Session) -> bool {
    s.state() == ConnectionState::Disconnected
}

fn log_frame(time: &str, level: &str, message: &str) -> String {
    format!(r#"{{"type":"log","log":{{"time":"{time}","level":"{level}","message":"{message}"}}}}"#)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn e2e_basetime_and_log_render_expected_row() {
    let connector = Arc::new(MemoryConnector::default());
    let backend = connector.accept_next();
    let mut session = new_session(connector, ReconnectPolicy::disabled());

    session.connect();
    pump_until(&mut session, "open", connected);

    backend.send(r#"{"hello":"world"}"#);
    backend.send(r#"{"type":"basetime","basetime":"2024-01-01T00:00:00Z"}"#);
    backend.send(&log_frame("2024-01-01T00:00:05Z", "info", "hello"));
    pump_until(&mut session, "one row", |s| s.table().len() == 1);

    let row = session.table().get(0).unwrap();
    assert_eq!(row.offset_label(), "[5]");
    assert_eq!(row.level, "info");
    assert_eq!(row.prefix.text(), "[none]");
    assert!(row.prefix.is_missing());
    assert_eq!(row.message, "hello");
    // The untyped greeting frame is skipped without counting as dropped.
    assert_eq!(session.protocol_errors(), 0);
}

#[test]
fn e2e_epoch_millisecond_frames_from_backend() {
    let connector = Arc::new(MemoryConnector::default());
    let backend = connector.accept_next();
    let mut session = new_session(connector, ReconnectPolicy::disabled());
    session.connect();
    pump_until(&mut session, "open", connected);

    backend.send(r#"{"type":"basetime","basetime":1704067200000}"#);
    backend.send(
        r#"{"type":"log","log":{"time":1704067212500,"level":"warning","fields":{"prefix":"http"},"message":"slow\n"}}"#,
    );
    pump_until(&mut session, "one row", |s| s.table().len() == 1);

    let row = session.table().get(0).unwrap();
    assert_eq!(row.offset_secs, 13);
    assert_eq!(row.prefix.text(), "http");
    assert_eq!(row.message, "slow");
}

#[test]
fn e2e_rows_newest_first_and_clear_empties_table() {
    let connector = Arc::new(MemoryConnector::default());
    let backend = connector.accept_next();
    let mut session = new_session(connector, ReconnectPolicy::disabled());
    session.connect();
    pump_until(&mut session, "open", connected);

    backend.send(&log_frame("2024-01-01T00:00:09Z", "info", "A"));
    backend.send(&log_frame("2024-01-01T00:00:01Z", "error", "B"));
    pump_until(&mut session, "two rows", |s| s.table().len() == 2);
    let order: Vec<_> = session.table().rows().map(|r| r.message.clone()).collect();
    assert_eq!(order, vec!["B", "A"]);

    backend.send(r#"{"type":"clear"}"#);
    pump_until(&mut session, "empty table", |s| s.table().is_empty());
    assert_eq!(session.table().total_received(), 2);
}

#[test]
fn e2e_selector_reaches_backend_verbatim() {
    let connector = Arc::new(MemoryConnector::default());
    let backend = connector.accept_next();
    let mut session = new_session(connector, ReconnectPolicy::disabled());
    session.connect();
    pump_until(&mut session, "open", connected);

    let selector = "level = \"error\" && path ~ \"C:\\\\logs\" && prefix = \"日本\"";
    session.submit_query(selector).unwrap();

    let frame = backend.expect_frame();
    assert_eq!(frame["type"], "selector");
    assert_eq!(frame["selector"], selector);
    assert_eq!(session.last_query(), Some(selector));
}

#[test]
fn e2e_unknown_types_are_ignored() {
    let connector = Arc::new(MemoryConnector::default());
    let backend = connector.accept_next();
    let mut session = new_session(connector, ReconnectPolicy::disabled());
    session.connect();
    pump_until(&mut session, "open", connected);

    backend.send(r#"{"type":"ping"}"#);
    backend.send("not json at all");
    pump_until(&mut session, "two dropped frames", |s| s.protocol_errors() == 2);

    assert!(session.table().is_empty());
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[test]
fn e2e_server_error_is_reported_without_row() {
    let connector = Arc::new(MemoryConnector::default());
    let backend = connector.accept_next();
    let mut session = new_session(connector, ReconnectPolicy::disabled());
    session.connect();
    pump_until(&mut session, "open", connected);

    backend.send(r#"{"type":"error","message":"unable to parse selector","error":"unexpected EOF"}"#);
    pump_until(&mut session, "server error", |s| s.last_server_error().is_some());
    assert!(session.table().is_empty());
    assert_eq!(
        session.last_server_error(),
        Some("unable to parse selector: unexpected EOF")
    );
}

#[test]
fn e2e_remote_close_stays_disconnected_until_connect() {
    let connector = Arc::new(MemoryConnector::default());
    let first = connector.accept_next();
    let mut session = new_session(connector.clone(), ReconnectPolicy::disabled());
    session.connect();
    pump_until(&mut session, "open", connected);
    session.submit_query("level = \"warning\"").unwrap();
    first.expect_frame();

    first.close();
    pump_until(&mut session, "close", disconnected);

    std::thread::sleep(Duration::from_millis(100));
    session.pump(usize::MAX);
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
    assert!(session.submit_query("anything").is_err());

    // Manual reconnect resumes the remembered selector.
    let second = connector.accept_next();
    session.connect();
    pump_until(&mut session, "reopen", connected);
    assert_eq!(second.expect_frame()["selector"], "level = \"warning\"");
}

#[test]
fn e2e_reconnect_policy_resends_selector() {
    let connector = Arc::new(MemoryConnector::default());
    let first = connector.accept_next();
    let second = connector.accept_next();
    let policy =
        ReconnectPolicy::with_backoff(Duration::from_millis(10), Duration::from_millis(40));
    let mut session = new_session(connector.clone(), policy);

    session.queue_query("prefix = \"db\"");
    session.connect();
    pump_until(&mut session, "open", connected);
    assert_eq!(first.expect_frame()["selector"], "prefix = \"db\"");

    first.close();
    // The selector is re-sent when the session sees the second open.
    pump_until(&mut session, "reopen", |s| {
        connector.attempts.load(Ordering::SeqCst) == 2 && connected(s)
    });
    let frame = second.expect_frame();
    assert_eq!(frame["type"], "selector");
    assert_eq!(frame["selector"], "prefix = \"db\"");

    session.close();
}

#[test]
fn e2e_shutdown_hook_closes_from_another_thread() {
    let connector = Arc::new(MemoryConnector::default());
    let _backend = connector.accept_next();
    let policy =
        ReconnectPolicy::with_backoff(Duration::from_millis(10), Duration::from_millis(40));
    let mut session = new_session(connector.clone(), policy);
    session.connect();
    pump_until(&mut session, "open", connected);

    let hook = session.shutdown_hook().expect("hook available while connected");
    std::thread::spawn(move || hook.fire()).join().unwrap();
    pump_until(&mut session, "close", disconnected);

    // A local close never triggers the reconnect loop.
    std::thread::sleep(Duration::from_millis(100));
    session.pump(usize::MAX);
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn e2e_shutdown_hook_during_backoff_cancels_reconnect() {
    // No transports queued: every attempt is refused.
    let connector = Arc::new(MemoryConnector::default());
    let policy =
        ReconnectPolicy::with_backoff(Duration::from_millis(300), Duration::from_millis(300));
    let mut session = new_session(connector.clone(), policy);
    session.connect();
    pump_until(&mut session, "first failure", disconnected);
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);

    let hook = session.shutdown_hook().expect("hook available while backing off");
    hook.fire();

    std::thread::sleep(Duration::from_millis(600));
    session.pump(usize::MAX);
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn e2e_close_during_backoff_cancels_reconnect() {
    let connector = Arc::new(MemoryConnector::default());
    let policy =
        ReconnectPolicy::with_backoff(Duration::from_millis(300), Duration::from_millis(300));
    let mut session = new_session(connector.clone(), policy);
    session.connect();
    pump_until(&mut session, "first failure", disconnected);

    session.close();
    assert!(session.shutdown_hook().is_none());

    std::thread::sleep(Duration::from_millis(600));
    session.pump(usize::MAX);
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn e2e_refused_connection_shows_disconnected() {
    let connector = Arc::new(MemoryConnector::default());
    let mut session = new_session(connector, ReconnectPolicy::disabled());
    session.connect();
    assert_eq!(session.state(), ConnectionState::Connecting);
    pump_until(&mut session, "failure", disconnected);
    let reason = session.last_transport_error().expect("error recorded");
    assert!(reason.contains("refused"), "unexpected reason: {reason}");
}

#[test]
fn e2e_close_drops_in_flight_frames() {
    let connector = Arc::new(MemoryConnector::default());
    let backend = connector.accept_next();
    let mut session = new_session(connector, ReconnectPolicy::disabled());
    session.connect();
    pump_until(&mut session, "open", connected);

    backend.send(&log_frame("2024-01-01T00:00:00Z", "info", "late"));
    session.close();
    std::thread::sleep(Duration::from_millis(50));
    session.pump(usize::MAX);
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(session.table().is_empty());
}
