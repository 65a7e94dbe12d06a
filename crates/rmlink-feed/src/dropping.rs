use std::fmt;
use std::future::poll_fn;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_core::Stream;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{FeedError, Result};
use crate::feed::{Feed, FeedState};
use crate::stream::LatestStream;

/// Latest-value-only view over an ordered source.
///
/// While attached, the source keeps at most one queued value: each
/// [`produce`](Feed::produce) replaces whatever the consumer has not taken
/// yet. [`get_most_recent`](DroppingFeed::get_most_recent) therefore returns
/// the newest value produced since its previous call and never an older one.
///
/// The source stays claimed until the `DroppingFeed` is dropped; other
/// consumers of it get [`FeedError::ConcurrentConsumption`].
pub struct DroppingFeed<T> {
    source: Feed<T>,
    attached: bool,
    consumer_active: AtomicBool,
    pump: Option<JoinHandle<()>>,
}

impl<T> DroppingFeed<T> {
    /// Layer latest-only consumption over `source`.
    ///
    /// If the source already has a consumer, every
    /// [`get_most_recent`](DroppingFeed::get_most_recent) call fails with
    /// [`FeedError::ConcurrentConsumption`].
    pub fn new(source: Feed<T>) -> Self {
        let attached = match source.attach_latest() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "dropping feed cannot consume its source");
                false
            }
        };
        Self {
            source,
            attached,
            consumer_active: AtomicBool::new(false),
            pump: None,
        }
    }

    /// Wait for the newest value.
    ///
    /// Returns immediately if a value arrived since the previous call, waits
    /// for the first one otherwise, and returns `Ok(None)` once the source is
    /// terminated with nothing pending.
    pub async fn get_most_recent(&self) -> Result<Option<T>> {
        if !self.attached {
            return Err(FeedError::ConcurrentConsumption);
        }
        let _claim = self.claim()?;
        Ok(self.source.next_latest().await)
    }

    fn claim(&self) -> Result<Claim<'_>> {
        self.consumer_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FeedError::ConcurrentConsumption)?;
        Ok(Claim {
            active: &self.consumer_active,
        })
    }

    /// True if a value is waiting to be taken.
    pub fn has_value(&self) -> bool {
        self.attached && !self.source.is_empty()
    }

    pub fn state(&self) -> FeedState {
        if self.source.is_terminated() {
            FeedState::Terminated
        } else if self.consumer_active.load(Ordering::Acquire) {
            FeedState::AwaitingValue
        } else {
            FeedState::Idle
        }
    }
}

impl<T: Send + 'static> DroppingFeed<T> {
    /// Layer latest-only consumption over any ordered stream.
    ///
    /// A task moves stream items into an internal feed, so this must be
    /// called inside a Tokio runtime. The feed terminates when the stream
    /// ends.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        let mut feed = Self::new(Feed::new());
        let sink = feed.source.clone();
        feed.pump = Some(tokio::spawn(async move {
            let mut stream = Box::pin(stream);
            while let Some(value) = poll_fn(|cx| stream.as_mut().poll_next(cx)).await {
                sink.produce(value);
            }
            sink.terminate();
        }));
        feed
    }

    /// Latest-only async iteration.
    pub fn into_stream(self) -> LatestStream<T> {
        LatestStream::new(self)
    }
}

struct Claim<'a> {
    active: &'a AtomicBool,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

impl<T> Drop for DroppingFeed<T> {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if self.attached {
            self.source.detach_latest();
        }
    }
}

impl<T> fmt::Debug for DroppingFeed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DroppingFeed")
            .field("attached", &self.attached)
            .field("has_value", &self.has_value())
            .field("terminated", &self.source.is_terminated())
            .finish()
    }
}
