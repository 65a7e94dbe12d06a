use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::trace;

use crate::error::{FeedError, Result};
use crate::stream::FeedStream;

/// Observable consumption state of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No consumer is waiting.
    Idle,
    /// A consumer is suspended waiting for a value.
    AwaitingValue,
    /// The producer has terminated the feed. Queued values may remain.
    Terminated,
}

/// An ordered, push-driven, single-consumer sequence.
///
/// Producers call [`produce`](Feed::produce) from any task without blocking.
/// One consumer at a time pulls values with [`next_value`](Feed::next_value)
/// in exactly the order they were produced. Cloning yields another handle to
/// the same queue.
pub struct Feed<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

struct State<T> {
    queue: VecDeque<T>,
    terminated: bool,
    consumer_active: bool,
    // Set while a DroppingFeed owns the feed: the queue holds at most the
    // newest value.
    latest_only: bool,
}

impl<T> Feed<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    terminated: false,
                    consumer_active: false,
                    latest_only: false,
                }),
                notify: Notify::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a value and wake the waiting consumer, if any.
    ///
    /// Returns `false` and drops the value if the feed was terminated.
    pub fn produce(&self, value: T) -> bool {
        {
            let mut state = self.lock();
            if state.terminated {
                trace!("value produced after termination dropped");
                return false;
            }
            if state.latest_only && !state.queue.is_empty() {
                trace!("unconsumed value superseded");
                state.queue.clear();
            }
            state.queue.push_back(value);
        }
        self.shared.notify.notify_one();
        true
    }

    /// Mark the end of the sequence.
    ///
    /// Values already queued are still delivered; afterwards every call to
    /// [`next_value`](Feed::next_value) returns `Ok(None)`. Idempotent.
    pub fn terminate(&self) {
        {
            let mut state = self.lock();
            if state.terminated {
                return;
            }
            state.terminated = true;
        }
        self.shared.notify.notify_one();
    }

    /// Wait for the next value.
    ///
    /// Returns `Ok(None)` once the feed is terminated and drained, and
    /// [`FeedError::ConcurrentConsumption`] if another call is already
    /// waiting. Cancel-safe: dropping the future loses no value.
    pub async fn next_value(&self) -> Result<Option<T>> {
        let _claim = self.claim()?;
        loop {
            let notified = self.shared.notify.notified();
            {
                let mut state = self.lock();
                if let Some(value) = state.queue.pop_front() {
                    return Ok(Some(value));
                }
                if state.terminated {
                    return Ok(None);
                }
            }
            notified.await;
        }
    }

    /// Take the next queued value without waiting.
    pub fn try_next_value(&self) -> Result<Option<T>> {
        let mut state = self.lock();
        if state.consumer_active {
            return Err(FeedError::ConcurrentConsumption);
        }
        Ok(state.queue.pop_front())
    }

    /// Switch to latest-only mode and hold the consumer claim until
    /// [`detach_latest`](Feed::detach_latest). Values already queued
    /// collapse to the newest.
    pub(crate) fn attach_latest(&self) -> Result<()> {
        let mut state = self.lock();
        if state.consumer_active {
            return Err(FeedError::ConcurrentConsumption);
        }
        state.consumer_active = true;
        state.latest_only = true;
        let newest = state.queue.pop_back();
        state.queue.clear();
        state.queue.extend(newest);
        Ok(())
    }

    pub(crate) fn detach_latest(&self) {
        let mut state = self.lock();
        state.consumer_active = false;
        state.latest_only = false;
    }

    /// Wait for the newest queued value, bypassing the consumer claim.
    ///
    /// Only the attached [`DroppingFeed`](crate::DroppingFeed) calls this.
    pub(crate) async fn next_latest(&self) -> Option<T> {
        loop {
            let notified = self.shared.notify.notified();
            {
                let mut state = self.lock();
                if let Some(value) = state.queue.pop_back() {
                    state.queue.clear();
                    return Some(value);
                }
                if state.terminated {
                    return None;
                }
            }
            notified.await;
        }
    }

    fn claim(&self) -> Result<Claim<'_, T>> {
        let mut state = self.lock();
        if state.consumer_active {
            return Err(FeedError::ConcurrentConsumption);
        }
        state.consumer_active = true;
        Ok(Claim { feed: self })
    }

    /// Number of values produced but not yet consumed.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.lock().terminated
    }

    /// True once terminated and every queued value has been consumed.
    pub fn is_finished(&self) -> bool {
        let state = self.lock();
        state.terminated && state.queue.is_empty()
    }

    pub fn state(&self) -> FeedState {
        let state = self.lock();
        if state.terminated {
            FeedState::Terminated
        } else if state.consumer_active {
            FeedState::AwaitingValue
        } else {
            FeedState::Idle
        }
    }
}

impl<T: Send + 'static> Feed<T> {
    /// Consume the feed as an async [`Stream`](futures_core::Stream).
    pub fn into_stream(self) -> FeedStream<T> {
        FeedStream::new(self)
    }
}

/// Marks the feed as having an active consumer until dropped.
struct Claim<'a, T> {
    feed: &'a Feed<T>,
}

impl<T> Drop for Claim<'_, T> {
    fn drop(&mut self) {
        self.feed.lock().consumer_active = false;
    }
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Feed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Feed")
            .field("queued", &state.queue.len())
            .field("terminated", &state.terminated)
            .field("consumer_active", &state.consumer_active)
            .field("latest_only", &state.latest_only)
            .finish()
    }
}
