//! In-process scripted robot for tests and demos.
//!
//! [`FakeRobot`] listens on a loopback port, accepts one session and answers
//! each command through a responder function. Telemetry pushes and raw bytes
//! can be injected at any time.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use rmlink_frame::{Frame, FrameCodec, FrameKind};
use rmlink_transport::Endpoint;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, trace};

/// How the fake answers one command.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeReply {
    /// Reply `ok`.
    Ok,
    /// Reply with this text.
    Text(String),
    /// Answer with a Fault frame carrying this message.
    Fault(String),
    /// Reply with this text after a delay, without blocking other commands.
    Delayed(Duration, String),
    /// Never answer.
    Silent,
    /// Drop the connection.
    Hangup,
}

/// Default answers for the command catalogue.
pub fn default_reply(command: &str) -> FakeReply {
    let text = |s: &str| FakeReply::Text(s.to_string());
    match command {
        "version ?" => text("00.00.00.60"),
        "robot mode ?" => text("free"),
        "chassis speed ?" => text("0 0 0 0 0 0 0"),
        "chassis position ?" => text("0 0 0"),
        "chassis attitude ?" => text("0 0 0"),
        "chassis status ?" => text("1 0 0 0 0 0 0 0 0 0 0"),
        "robotic_arm position ?" => text("120 40"),
        "robotic_gripper status ?" => text("0"),
        cmd if cmd.starts_with("ir_distance_sensor distance") => text("500"),
        _ => FakeReply::Ok,
    }
}

type Responder = dyn Fn(&str) -> FakeReply + Send + Sync;

enum Outbound {
    Frame(Frame),
    Raw(Bytes),
    Disconnect,
}

/// A scripted robot on a loopback socket.
pub struct FakeRobot {
    addr: SocketAddr,
    outbound: mpsc::UnboundedSender<Outbound>,
    received: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl FakeRobot {
    /// Start with [`default_reply`] answers.
    pub async fn spawn() -> std::io::Result<Self> {
        Self::with_responder(default_reply).await
    }

    /// Start with a custom responder.
    pub async fn with_responder<F>(responder: F) -> std::io::Result<Self>
    where
        F: Fn(&str) -> FakeReply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (outbound, rx) = mpsc::unbounded_channel();
        let received = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(serve(
            listener,
            Arc::new(responder),
            outbound.clone(),
            rx,
            Arc::clone(&received),
        ));
        debug!(%addr, "fake robot listening");
        Ok(Self {
            addr,
            outbound,
            received,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Endpoint a session can connect to.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::networked(self.addr.ip().to_string()).with_port(self.addr.port())
    }

    /// Command texts received so far, in arrival order.
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Push a telemetry payload on `channel`.
    pub fn push(&self, channel: u16, payload: impl Into<Bytes>) {
        let _ = self
            .outbound
            .send(Outbound::Frame(Frame::push(channel, payload)));
    }

    /// Send any frame, e.g. a reply for a key nobody is waiting on.
    pub fn send_frame(&self, frame: Frame) {
        let _ = self.outbound.send(Outbound::Frame(frame));
    }

    /// Write bytes as-is, bypassing the encoder.
    pub fn send_raw(&self, bytes: impl Into<Bytes>) {
        let _ = self.outbound.send(Outbound::Raw(bytes.into()));
    }

    /// Close the connection from the robot side.
    pub fn disconnect(&self) {
        let _ = self.outbound.send(Outbound::Disconnect);
    }
}

impl Drop for FakeRobot {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    listener: TcpListener,
    responder: Arc<Responder>,
    loopback: mpsc::UnboundedSender<Outbound>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    received: Arc<Mutex<Vec<String>>>,
) {
    let Ok((stream, peer)) = listener.accept().await else {
        return;
    };
    debug!(%peer, "fake robot accepted session");
    let (read_half, write_half) = stream.into_split();
    let mut reader = FramedRead::new(read_half, FrameCodec::new());
    let mut writer = FramedWrite::new(write_half, FrameCodec::new());

    loop {
        tokio::select! {
            inbound = reader.next() => {
                let frame = match inbound {
                    Some(Ok(Ok(frame))) if frame.kind == FrameKind::Command => frame,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) | None => break,
                };
                let text = String::from_utf8_lossy(&frame.payload).into_owned();
                trace!(key = frame.key, command = %text, "fake robot received");
                received
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(text.clone());

                let reply = match responder(&text) {
                    FakeReply::Ok => Frame::reply(frame.key, "ok"),
                    FakeReply::Text(body) => Frame::reply(frame.key, body),
                    FakeReply::Fault(message) => Frame::fault(frame.key, message),
                    FakeReply::Delayed(delay, body) => {
                        let loopback = loopback.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            let _ = loopback.send(Outbound::Frame(Frame::reply(frame.key, body)));
                        });
                        continue;
                    }
                    FakeReply::Silent => continue,
                    FakeReply::Hangup => break,
                };
                if writer.send(reply).await.is_err() {
                    break;
                }
            }
            out = outbound.recv() => {
                let written = match out {
                    Some(Outbound::Frame(frame)) => writer.send(frame).await.is_ok(),
                    Some(Outbound::Raw(bytes)) => writer.get_mut().write_all(&bytes).await.is_ok(),
                    Some(Outbound::Disconnect) | None => break,
                };
                if !written {
                    break;
                }
            }
        }
    }
    debug!("fake robot connection ended");
}
