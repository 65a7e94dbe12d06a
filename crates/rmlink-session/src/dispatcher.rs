//! Request/reply correlation.
//!
//! Every command gets a fresh 16-bit key. The reply (or fault) carrying the
//! same key resolves it, regardless of the order commands were issued in.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rmlink_frame::{Command, Frame, FrameKind, Response};
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::error::{Result, SessionError};

/// Where encoded command frames go.
pub trait FrameSink {
    /// Write one frame. Completion means the bytes were handed to the
    /// transport, not that the robot acted on them.
    fn send_frame(&self, frame: Frame) -> impl Future<Output = Result<()>> + Send;
}

enum Outcome {
    Answered(Frame),
    Closed,
}

struct Waiter {
    command: String,
    tx: oneshot::Sender<Outcome>,
}

struct Pending {
    next_key: u16,
    closed: bool,
    waiters: HashMap<u16, Waiter>,
}

/// Table of commands awaiting their reply.
pub struct Dispatcher {
    pending: Mutex<Pending>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Pending {
                next_key: 1,
                closed: false,
                waiters: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send `command` through `sink` and wait for its reply.
    ///
    /// The deadline covers both the write and the wait. On timeout the
    /// pending entry is removed; a late reply is then reported as an unknown
    /// key. Dropping the returned future also removes the entry.
    pub async fn issue<S>(&self, sink: &S, command: &Command, timeout: Duration) -> Result<Response>
    where
        S: FrameSink + ?Sized,
    {
        let text = command.to_text();
        let (key, rx) = self.register(&text)?;
        let _guard = PendingGuard {
            dispatcher: self,
            key,
        };
        trace!(key, command = %text, "issuing command");

        let exchange = async {
            sink.send_frame(command.encode(key)).await?;
            rx.await.map_err(|_| SessionError::SessionClosed)
        };

        let outcome = match tokio::time::timeout(timeout, exchange).await {
            Ok(outcome) => outcome?,
            Err(_) => {
                debug!(key, command = %text, ?timeout, "command timed out");
                return Err(SessionError::Timeout {
                    command: text,
                    timeout,
                });
            }
        };

        match outcome {
            Outcome::Answered(frame) if frame.kind == FrameKind::Fault => {
                let message = String::from_utf8_lossy(&frame.payload)
                    .trim()
                    .trim_end_matches(';')
                    .to_string();
                Err(SessionError::Device {
                    command: text,
                    message,
                })
            }
            Outcome::Answered(frame) => Ok(Response::parse(&frame.payload)?),
            Outcome::Closed => Err(SessionError::SessionClosed),
        }
    }

    fn register(&self, command: &str) -> Result<(u16, oneshot::Receiver<Outcome>)> {
        let mut pending = self.lock();
        if pending.closed {
            return Err(SessionError::SessionClosed);
        }
        let key = pending.allocate_key().ok_or(SessionError::KeysExhausted)?;
        let (tx, rx) = oneshot::channel();
        pending.waiters.insert(
            key,
            Waiter {
                command: command.to_string(),
                tx,
            },
        );
        Ok((key, rx))
    }

    /// Hand a Reply or Fault frame to the command waiting on its key.
    ///
    /// Returns `false` if no command is pending under that key.
    pub fn resolve(&self, frame: Frame) -> bool {
        let Some(waiter) = self.lock().waiters.remove(&frame.key) else {
            return false;
        };
        trace!(key = frame.key, command = %waiter.command, "reply matched");
        if waiter.tx.send(Outcome::Answered(frame)).is_err() {
            debug!(command = %waiter.command, "reply arrived after caller gave up");
        }
        true
    }

    /// Fail every pending command with `SessionClosed` and refuse new ones.
    pub fn fail_all(&self) {
        let waiters: Vec<Waiter> = {
            let mut pending = self.lock();
            pending.closed = true;
            pending.waiters.drain().map(|(_, waiter)| waiter).collect()
        };
        if !waiters.is_empty() {
            debug!(count = waiters.len(), "failing pending commands");
        }
        for waiter in waiters {
            let _ = waiter.tx.send(Outcome::Closed);
        }
    }

    /// Number of commands awaiting a reply.
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.lock();
        f.debug_struct("Dispatcher")
            .field("pending", &pending.waiters.len())
            .field("closed", &pending.closed)
            .finish()
    }
}

impl Pending {
    /// Next key that is neither 0 nor still pending.
    fn allocate_key(&mut self) -> Option<u16> {
        for _ in 0..=u16::MAX {
            let key = self.next_key;
            self.next_key = self.next_key.wrapping_add(1);
            if key != 0 && !self.waiters.contains_key(&key) {
                return Some(key);
            }
        }
        None
    }
}

/// Removes the pending entry when the issuing future finishes or is dropped.
struct PendingGuard<'a> {
    dispatcher: &'a Dispatcher,
    key: u16,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.dispatcher.lock().waiters.remove(&self.key);
    }
}
