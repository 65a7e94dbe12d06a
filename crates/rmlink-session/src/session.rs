use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rmlink_frame::{Command, Frame, FrameCodec, FrameKind, Response};
use rmlink_transport::Endpoint;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::dispatcher::{Dispatcher, FrameSink};
use crate::error::{ProtocolAnomaly, Result, SessionError};
use crate::telemetry::Telemetry;

/// Command that switches the robot into SDK mode.
pub const HANDSHAKE_COMMAND: &str = "command";

/// Command that leaves SDK mode.
pub const QUIT_COMMAND: &str = "quit";

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

type Writer = FramedWrite<OwnedWriteHalf, FrameCodec>;

/// An open control connection to one robot.
///
/// One background task reads the connection: replies go to the command that
/// is waiting on their key, pushes go to the [`Telemetry`] feeds. Writes are
/// serialized. Dropping the session cancels every waiter and ends every feed.
pub struct Session {
    shared: Arc<Shared>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    endpoint: Endpoint,
    config: SessionConfig,
    writer: tokio::sync::Mutex<Option<Writer>>,
    dispatcher: Dispatcher,
    telemetry: Telemetry,
    state: watch::Sender<SessionState>,
    cancel: CancellationToken,
    anomalies: AtomicU64,
}

impl Session {
    /// Connect to `endpoint` and perform the SDK handshake.
    pub async fn connect(endpoint: Endpoint, config: SessionConfig) -> Result<Self> {
        debug!(%endpoint, "connecting");
        let stream = rmlink_transport::connect(&endpoint, config.connect_timeout).await?;
        let (read_half, write_half) = stream.into_split();

        let codec = FrameCodec::with_config(config.frame.clone());
        let (state, _) = watch::channel(SessionState::Connecting);
        let shared = Arc::new(Shared {
            endpoint,
            writer: tokio::sync::Mutex::new(Some(FramedWrite::new(write_half, codec.clone()))),
            config,
            dispatcher: Dispatcher::new(),
            telemetry: Telemetry::new(),
            state,
            cancel: CancellationToken::new(),
            anomalies: AtomicU64::new(0),
        });

        let reader = FramedRead::new(read_half, codec);
        let task = tokio::spawn(read_loop(Arc::clone(&shared), reader));
        let session = Self {
            shared,
            reader: Mutex::new(Some(task)),
        };

        if let Err(err) = session.handshake().await {
            session.teardown(false).await;
            return Err(err);
        }

        session.shared.state.send_replace(SessionState::Open);
        info!(endpoint = %session.shared.endpoint, "session open");
        Ok(session)
    }

    /// Connect with [`SessionConfig::default`].
    pub async fn connect_default(endpoint: Endpoint) -> Result<Self> {
        Self::connect(endpoint, SessionConfig::default()).await
    }

    async fn handshake(&self) -> Result<()> {
        let timeout = self.shared.config.handshake_timeout;
        let reply = self
            .shared
            .dispatcher
            .issue(&*self.shared, &Command::new(HANDSHAKE_COMMAND), timeout)
            .await
            .map_err(|err| match err {
                SessionError::Timeout { .. } => {
                    SessionError::Connection(format!("no handshake reply within {timeout:?}"))
                }
                SessionError::Device { message, .. } => {
                    SessionError::Connection(format!("robot refused SDK mode: {message}"))
                }
                SessionError::SessionClosed => {
                    SessionError::Connection("connection closed during handshake".to_string())
                }
                other => other,
            })?;

        if !reply.is_ok() {
            return Err(SessionError::Connection(format!(
                "unexpected handshake reply '{}'",
                reply.text()
            )));
        }
        Ok(())
    }

    /// Issue a command and wait for its reply using the configured timeout.
    pub async fn issue(&self, command: &Command) -> Result<Response> {
        self.issue_with_timeout(command, self.shared.config.command_timeout)
            .await
    }

    /// Issue a command and wait at most `timeout` for its reply.
    ///
    /// A reply only means the robot accepted the command. Motion commands
    /// keep running after it arrives.
    pub async fn issue_with_timeout(&self, command: &Command, timeout: Duration) -> Result<Response> {
        self.shared
            .dispatcher
            .issue(&*self.shared, command, timeout)
            .await
    }

    /// Write one raw frame. Completion means the bytes are on the wire.
    pub async fn send(&self, frame: Frame) -> Result<()> {
        self.shared.send_frame(frame).await
    }

    /// Sensor feeds fed by this session.
    pub fn telemetry(&self) -> &Telemetry {
        &self.shared.telemetry
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Watch lifecycle changes.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Count of unexpected inbound frames and bytes seen so far.
    pub fn protocol_anomalies(&self) -> u64 {
        self.shared.anomalies.load(Ordering::Relaxed)
    }

    /// Commands currently awaiting a reply.
    pub fn pending_commands(&self) -> usize {
        self.shared.dispatcher.pending()
    }

    /// Leave SDK mode and release the connection.
    ///
    /// Pending commands fail with [`SessionError::SessionClosed`] and every
    /// telemetry feed is terminated. Calling it again does nothing.
    pub async fn close(&self) {
        self.teardown(true).await;
    }

    async fn teardown(&self, polite: bool) {
        let started = self.shared.state.send_if_modified(|state| match state {
            SessionState::Closing | SessionState::Closed => false,
            SessionState::Connecting | SessionState::Open => {
                *state = SessionState::Closing;
                true
            }
        });
        if !started {
            return;
        }

        if polite && !self.shared.cancel.is_cancelled() {
            let timeout = self.shared.config.close_timeout;
            if let Err(err) = self
                .shared
                .dispatcher
                .issue(&*self.shared, &Command::new(QUIT_COMMAND), timeout)
                .await
            {
                debug!(error = %err, "quit not acknowledged");
            }
        }

        self.shared.shutdown().await;

        let task = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(error = %err, "reader task failed");
            }
        }
        info!(endpoint = %self.shared.endpoint, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.shutdown_now();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.shared.endpoint)
            .field("state", &self.state())
            .field("pending", &self.shared.dispatcher.pending())
            .finish()
    }
}

impl FrameSink for Shared {
    async fn send_frame(&self, frame: Frame) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            return Err(SessionError::SessionClosed);
        };
        if let Err(err) = sink.send(frame).await {
            warn!(error = %err, "write failed; closing session");
            writer.take();
            self.cancel.cancel();
            return Err(err.into());
        }
        Ok(())
    }
}

impl Shared {
    fn route(&self, frame: Frame) {
        match frame.kind {
            FrameKind::Reply | FrameKind::Fault => {
                let (kind, key) = (frame.kind, frame.key);
                if !self.dispatcher.resolve(frame) {
                    self.anomaly(ProtocolAnomaly::UnknownKey { kind, key });
                }
            }
            FrameKind::Push => {
                if let Err(anomaly) = self.telemetry.route(frame.key, &frame.payload) {
                    self.anomaly(anomaly);
                }
            }
            FrameKind::Command => self.anomaly(ProtocolAnomaly::UnexpectedKind(frame.kind)),
        }
    }

    fn anomaly(&self, anomaly: ProtocolAnomaly) {
        let total = self.anomalies.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(%anomaly, total, "protocol anomaly");
    }

    /// Cleanup that needs no await: stop the reader, fail waiters, end feeds.
    fn shutdown_now(&self) {
        self.cancel.cancel();
        self.dispatcher.fail_all();
        self.telemetry.terminate_all();
        self.state.send_replace(SessionState::Closed);
    }

    async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(err) = writer.close().await {
                debug!(error = %err, "closing write half failed");
            }
        }
        self.shutdown_now();
    }
}

async fn read_loop(shared: Arc<Shared>, mut reader: FramedRead<OwnedReadHalf, FrameCodec>) {
    loop {
        let next = tokio::select! {
            _ = shared.cancel.cancelled() => break,
            next = reader.next() => next,
        };
        match next {
            Some(Ok(Ok(frame))) => shared.route(frame),
            Some(Ok(Err(malformed))) => shared.anomaly(ProtocolAnomaly::Malformed(malformed)),
            Some(Err(err)) => {
                warn!(error = %err, "read failed; closing session");
                break;
            }
            None => {
                debug!("robot closed the connection");
                break;
            }
        }
    }
    shared.shutdown().await;
}
