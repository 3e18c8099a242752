//! TCP control-channel session.
//!
//! Owns one socket, one reader task, and (once authenticated) one
//! keepalive task. The protocol has no request ids — at most one
//! handshake and one `set` can be in flight, so correlation is a pair of
//! single-slot channels rather than a request-id map.
//!
//! # Example
//!
//! ```rust,ignore
//! use intesis_api::session::{ControlSession, SessionConfig};
//!
//! let mut session = ControlSession::connect("212.36.84.207:5210", SessionConfig::default()).await?;
//! session.authenticate(token).await?;
//! session.send_command(127934703953, 1, 1).await?;
//! session.close().await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::Error;
use crate::frame::FrameCodec;
use crate::wire::{
    AUTH_OK, CMD_CONNECT_RSP, CMD_RSSI, CMD_SET_ACK, CMD_STATUS, CommandRequest, CommandResponse,
};

// Telemetry pushes arrive unsolicited; a lagging subscriber only loses
// old pushes, never blocks the reader.
const TELEMETRY_CHANNEL_CAPACITY: usize = 64;

// ── SessionConfig ────────────────────────────────────────────────────

/// Timeouts and keepalive tuning for a control session.
///
/// Defaults match the observed behavior of the real endpoint.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long `authenticate` waits for the connect acknowledgement.
    /// Default: 6s.
    pub auth_timeout: Duration,

    /// How long `send_command` waits for the set acknowledgement.
    /// Default: 15s.
    pub set_timeout: Duration,

    /// Interval between keepalive `get` requests once the session is
    /// ready. Default: 30s.
    pub keepalive_interval: Duration,

    /// Device id echoed on keepalive requests. The server ignores it;
    /// the request exists only to keep the socket warm.
    pub keepalive_device: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_timeout: Duration::from_secs(6),
            set_timeout: Duration::from_secs(15),
            keepalive_interval: Duration::from_secs(30),
            keepalive_device: 0,
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("auth_timeout", self.auth_timeout),
            ("set_timeout", self.set_timeout),
            ("keepalive_interval", self.keepalive_interval),
        ] {
            if value.is_zero() {
                return Err(Error::Config {
                    message: format!("{name} must be non-zero"),
                });
            }
        }
        Ok(())
    }
}

// ── SessionState ─────────────────────────────────────────────────────

/// Lifecycle state of a [`ControlSession`].
///
/// Moves monotonically `Unconnected → Connected → Authenticating →
/// Ready → Closed`; a closed session is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Authenticating,
    Ready,
    Closed,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            Self::Unconnected => "unconnected",
            Self::Connected => "connected",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Terminal failures ────────────────────────────────────────────────

/// Why the reader (or keepalive) terminated the session. Kept separate
/// from [`Error`] so it can be cloned into every late observer.
#[derive(Debug, Clone)]
enum Failure {
    Io(String),
    Decode(String),
}

impl Failure {
    fn into_error(self) -> Error {
        match self {
            Self::Io(message) => Error::Io(message),
            Self::Decode(message) => Error::Decode { message },
        }
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────

/// Routes decoded responses to the right waiter.
///
/// `connect_rsp` and `set_ack` go to their single-slot channels;
/// `status`/`rssi` fan out on the telemetry broadcast without blocking;
/// anything else goes to whichever waiter is pending (the caller treats
/// a stray reply as an auth/protocol failure) or is dropped with a
/// diagnostic.
#[derive(Debug)]
struct Dispatcher {
    auth_tx: mpsc::Sender<CommandResponse>,
    set_tx: mpsc::Sender<CommandResponse>,
    telemetry_tx: broadcast::Sender<Arc<CommandResponse>>,
    auth_pending: AtomicBool,
    set_pending: AtomicBool,
}

impl Dispatcher {
    fn route(&self, resp: CommandResponse) {
        match resp.command.as_str() {
            CMD_CONNECT_RSP => {
                if self.auth_tx.try_send(resp).is_err() {
                    debug!("dropping connect acknowledgement with no waiter");
                }
            }
            CMD_SET_ACK => {
                if self.set_tx.try_send(resp).is_err() {
                    debug!("dropping set acknowledgement with no waiter");
                }
            }
            CMD_STATUS | CMD_RSSI => {
                trace!(
                    command = %resp.command,
                    device = resp.data.device_id,
                    uid = resp.data.uid,
                    value = resp.data.value,
                    "telemetry push"
                );
                let _ = self.telemetry_tx.send(Arc::new(resp));
            }
            _ => {
                if self.auth_pending.load(Ordering::SeqCst) {
                    let _ = self.auth_tx.try_send(resp);
                } else if self.set_pending.load(Ordering::SeqCst) {
                    let _ = self.set_tx.try_send(resp);
                } else {
                    debug!(command = %resp.command, "dropping unrecognized command");
                }
            }
        }
    }
}

// ── CloseHandle ──────────────────────────────────────────────────────

/// A cheap handle that can close the session from another task.
///
/// Closing unblocks any in-flight `authenticate`/`send_command` with
/// [`Error::Closed`] instead of letting it run out its timeout.
#[derive(Clone)]
pub struct CloseHandle {
    cancel: CancellationToken,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl CloseHandle {
    pub async fn close(&self) {
        self.cancel.cancel();
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

// ── ControlSession ───────────────────────────────────────────────────

/// One authenticated TCP control connection.
///
/// Exclusive owner of its socket. Created per `set` transaction or per
/// long-lived listener; torn down with [`close`](Self::close). The
/// `&mut self` receivers on `authenticate`/`send_command` enforce the
/// one-outstanding-operation rule at compile time.
#[derive(Debug)]
pub struct ControlSession {
    state: SessionState,
    config: SessionConfig,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    auth_rx: mpsc::Receiver<CommandResponse>,
    set_rx: mpsc::Receiver<CommandResponse>,
    dispatch: Arc<Dispatcher>,
    failure_tx: watch::Sender<Option<Failure>>,
    failure_rx: watch::Receiver<Option<Failure>>,
    cancel: CancellationToken,
    reader: Option<JoinHandle<()>>,
    keepalive: Option<JoinHandle<()>>,
}

impl ControlSession {
    /// Dial the control endpoint and start the reader task.
    ///
    /// The returned session is `Connected`; call
    /// [`authenticate`](Self::authenticate) next.
    pub async fn connect(addr: &str, config: SessionConfig) -> Result<Self, Error> {
        config.validate()?;

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::Connection(format!("{addr}: {e}")))?;
        let (read_half, write_half) = stream.into_split();

        let (auth_tx, auth_rx) = mpsc::channel(1);
        let (set_tx, set_rx) = mpsc::channel(1);
        let (telemetry_tx, _) = broadcast::channel(TELEMETRY_CHANNEL_CAPACITY);
        let (failure_tx, failure_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let dispatch = Arc::new(Dispatcher {
            auth_tx,
            set_tx,
            telemetry_tx,
            auth_pending: AtomicBool::new(false),
            set_pending: AtomicBool::new(false),
        });

        let reader = tokio::spawn(reader_loop(
            read_half,
            Arc::clone(&dispatch),
            failure_tx.clone(),
            cancel.clone(),
        ));

        info!(peer = %addr, "control channel connected");

        Ok(Self {
            state: SessionState::Connected,
            config,
            writer: Arc::new(Mutex::new(write_half)),
            auth_rx,
            set_rx,
            dispatch,
            failure_tx,
            failure_rx,
            cancel,
            reader: Some(reader),
            keepalive: None,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Subscribe to passive `status`/`rssi` pushes.
    pub fn telemetry(&self) -> broadcast::Receiver<Arc<CommandResponse>> {
        self.dispatch.telemetry_tx.subscribe()
    }

    /// A handle for closing the session from another task.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            cancel: self.cancel.clone(),
            writer: Arc::clone(&self.writer),
        }
    }

    /// The error that terminated the session, for late observers.
    pub fn session_error(&self) -> Option<Error> {
        self.failure_rx.borrow().clone().map(Failure::into_error)
    }

    /// Perform the auth handshake. Valid exactly once, from `Connected`.
    ///
    /// The token is consumed here and never stored — it is single-use,
    /// and a new one must be minted (via the cloud bootstrap) for any
    /// future connection. On a rejected or malformed reply the session
    /// closes; on timeout it stays `Connected` but the server will not
    /// accept a retried handshake on the same socket.
    pub async fn authenticate(&mut self, token: i64) -> Result<(), Error> {
        self.ensure_live()?;
        if self.state != SessionState::Connected {
            return Err(Error::InvalidState {
                state: self.state.name(),
                expected: SessionState::Connected.name(),
            });
        }
        self.state = SessionState::Authenticating;

        // Discard a stale acknowledgement left behind by an earlier
        // timed-out handshake.
        while self.auth_rx.try_recv().is_ok() {}
        self.dispatch.auth_pending.store(true, Ordering::SeqCst);

        let frame = CommandRequest::connect(token).encode()?;
        if let Err(e) = write_frame(&self.writer, &frame).await {
            self.dispatch.auth_pending.store(false, Ordering::SeqCst);
            self.shutdown().await;
            return Err(e);
        }
        debug!("authenticating");

        let timeout = self.config.auth_timeout;
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(self.closed_error()),
            resp = self.auth_rx.recv() => Ok(resp),
            _ = tokio::time::sleep(timeout) => Err(Error::Timeout {
                operation: "authentication",
                timeout_secs: timeout.as_secs(),
            }),
        };
        self.dispatch.auth_pending.store(false, Ordering::SeqCst);

        let resp = match outcome {
            Ok(Some(resp)) => resp,
            Ok(None) => {
                self.state = SessionState::Closed;
                return Err(self.closed_error());
            }
            Err(e @ Error::Timeout { .. }) => {
                // The caller must treat the session as unusable, but the
                // socket stays up so telemetry observers keep working.
                self.state = SessionState::Connected;
                return Err(e);
            }
            Err(e) => {
                self.state = SessionState::Closed;
                return Err(e);
            }
        };

        if resp.command != CMD_CONNECT_RSP {
            warn!(command = %resp.command, "unexpected reply to auth handshake");
            self.shutdown().await;
            return Err(Error::AuthUnexpected {
                command: resp.command,
            });
        }
        if resp.data.status != AUTH_OK {
            warn!(status = %resp.data.status, "authentication rejected");
            self.shutdown().await;
            return Err(Error::AuthRejected {
                status: resp.data.status,
            });
        }

        info!("authentication successful");
        self.state = SessionState::Ready;
        self.spawn_keepalive();
        Ok(())
    }

    /// Send a `set` command and wait for its acknowledgement.
    ///
    /// Valid from `Ready`, one at a time. A timeout or a mismatched
    /// acknowledgement leaves the session open — the real server drops
    /// malformed commands silently rather than erroring, so the caller
    /// may retry.
    pub async fn send_command(&mut self, device_id: i64, uid: i32, value: i32) -> Result<(), Error> {
        self.ensure_live()?;
        if self.state != SessionState::Ready {
            return Err(Error::InvalidState {
                state: self.state.name(),
                expected: SessionState::Ready.name(),
            });
        }

        // Discard a stale acknowledgement left behind by an earlier
        // timed-out attempt.
        while self.set_rx.try_recv().is_ok() {}
        self.dispatch.set_pending.store(true, Ordering::SeqCst);

        let frame = CommandRequest::set(device_id, uid, value).encode()?;
        if let Err(e) = write_frame(&self.writer, &frame).await {
            self.dispatch.set_pending.store(false, Ordering::SeqCst);
            self.shutdown().await;
            return Err(e);
        }
        debug!(device = device_id, uid, value, "sent set command");

        let timeout = self.config.set_timeout;
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(self.closed_error()),
            resp = self.set_rx.recv() => Ok(resp),
            _ = tokio::time::sleep(timeout) => Err(Error::Timeout {
                operation: "set acknowledgement",
                timeout_secs: timeout.as_secs(),
            }),
        };
        self.dispatch.set_pending.store(false, Ordering::SeqCst);

        let resp = match outcome {
            Ok(Some(resp)) => resp,
            Ok(None) => {
                self.state = SessionState::Closed;
                return Err(self.closed_error());
            }
            // Session stays Ready; the caller may retry.
            Err(e @ Error::Timeout { .. }) => return Err(e),
            Err(e) => {
                self.state = SessionState::Closed;
                return Err(e);
            }
        };

        if resp.command != CMD_SET_ACK {
            warn!(command = %resp.command, "unexpected reply to set command");
            return Err(Error::ProtocolMismatch {
                expected: CMD_SET_ACK,
                got: resp.command,
            });
        }

        debug!(
            device = resp.data.device_id,
            seq_no = resp.data.seq_no,
            rssi = resp.data.rssi,
            "set acknowledged"
        );
        Ok(())
    }

    /// Tear the session down: stop both tasks, shut the socket, `Closed`.
    ///
    /// Idempotent, and safe even if authentication never completed.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.shutdown().await;
        debug!("session closed");
    }

    // ── Internals ────────────────────────────────────────────────────

    fn ensure_live(&self) -> Result<(), Error> {
        if self.state == SessionState::Closed {
            return Err(Error::Closed);
        }
        if self.cancel.is_cancelled() {
            return Err(self.closed_error());
        }
        Ok(())
    }

    /// The most specific error available for an unblocked waiter: the
    /// reader's terminal failure if one was recorded, plain `Closed`
    /// otherwise.
    fn closed_error(&self) -> Error {
        self.failure_rx
            .borrow()
            .clone()
            .map_or(Error::Closed, Failure::into_error)
    }

    fn spawn_keepalive(&mut self) {
        self.keepalive = Some(tokio::spawn(keepalive_loop(
            Arc::clone(&self.writer),
            self.config.keepalive_device,
            self.config.keepalive_interval,
            self.failure_tx.clone(),
            self.cancel.clone(),
        )));
    }

    async fn shutdown(&mut self) {
        self.state = SessionState::Closed;
        self.cancel.cancel();
        {
            let mut writer = self.writer.lock().await;
            let _ = writer.shutdown().await;
        }
        if let Some(handle) = self.reader.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.keepalive.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ControlSession {
    fn drop(&mut self) {
        // Tasks select on the token; a dropped session must not leak them.
        self.cancel.cancel();
    }
}

// ── Shared write path ────────────────────────────────────────────────

/// Write one frame through the shared writer.
///
/// The mutex serializes the command path against the keepalive task so
/// frames never interleave. A short write is an error, never a silent
/// truncation.
async fn write_frame<W: AsyncWrite + Unpin>(writer: &Mutex<W>, frame: &[u8]) -> Result<(), Error> {
    let mut writer = writer.lock().await;
    let written = writer.write(frame).await?;
    if written != frame.len() {
        return Err(Error::WriteLength {
            written,
            expected: frame.len(),
        });
    }
    writer.flush().await?;
    Ok(())
}

// ── Reader loop ──────────────────────────────────────────────────────

/// Read → frame → decode → dispatch, for the life of the connection.
///
/// Any read or decode failure (including EOF) is terminal: it is
/// recorded for late observers and the cancel token fires so blocked
/// waiters unblock immediately.
async fn reader_loop(
    read_half: OwnedReadHalf,
    dispatch: Arc<Dispatcher>,
    failure_tx: watch::Sender<Option<Failure>>,
    cancel: CancellationToken,
) {
    let mut frames = FramedRead::new(read_half, FrameCodec::new());

    let failure = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break None,
            frame = frames.next() => match frame {
                Some(Ok(frame)) => {
                    trace!(len = frame.len(), "frame received");
                    match CommandResponse::decode(&frame) {
                        Ok(resp) => dispatch.route(resp),
                        Err(e) => {
                            warn!(
                                error = %e,
                                raw = %String::from_utf8_lossy(&frame),
                                "undecodable frame"
                            );
                            break Some(Failure::Decode(e.to_string()));
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "read error");
                    break Some(Failure::Io(e.to_string()));
                }
                None => {
                    debug!("server closed the connection");
                    break Some(Failure::Io("connection closed by server".into()));
                }
            }
        }
    };

    if let Some(failure) = failure {
        let _ = failure_tx.send(Some(failure));
        cancel.cancel();
    }
    debug!("reader loop exiting");
}

// ── Keepalive loop ───────────────────────────────────────────────────

/// Emit a lightweight `get` on a fixed timer once the session is ready.
///
/// A write failure here is fatal to the session: the socket is already
/// broken, so the failure is recorded and the session cancelled.
async fn keepalive_loop(
    writer: Arc<Mutex<OwnedWriteHalf>>,
    device: i64,
    interval: Duration,
    failure_tx: watch::Sender<Option<Failure>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                trace!("sending keepalive");
                let frame = match CommandRequest::keepalive(device).encode() {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, "keepalive encode failed");
                        break;
                    }
                };
                if let Err(e) = write_frame(&writer, &frame).await {
                    warn!(error = %e, "keepalive write failed, terminating session");
                    let _ = failure_tx.send(Some(Failure::Io(e.to_string())));
                    cancel.cancel();
                    break;
                }
            }
        }
    }
    debug!("keepalive loop exiting");
}

// ── Tests ────────────────────────────────────────────────────────────
