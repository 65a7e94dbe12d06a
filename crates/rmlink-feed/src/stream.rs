use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::Stream;
use tokio_util::sync::ReusableBoxFuture;

use crate::dropping::DroppingFeed;
use crate::error::{FeedError, Result};
use crate::feed::Feed;

/// A [`Stream`] over every value of a [`Feed`], in order.
///
/// Yields `Err(FeedError::ConcurrentConsumption)` if another consumer holds
/// the feed, and ends once the feed is terminated and drained.
pub struct FeedStream<T> {
    inner: ReusableBoxFuture<'static, (Result<Option<T>>, Feed<T>)>,
}

async fn next_from_feed<T: Send + 'static>(feed: Feed<T>) -> (Result<Option<T>>, Feed<T>) {
    let result = feed.next_value().await;
    (result, feed)
}

impl<T: Send + 'static> FeedStream<T> {
    pub fn new(feed: Feed<T>) -> Self {
        Self {
            inner: ReusableBoxFuture::new(next_from_feed(feed)),
        }
    }
}

impl<T: Send + 'static> Stream for FeedStream<T> {
    type Item = std::result::Result<T, FeedError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let (result, feed) = ready!(self.inner.poll(cx));
        self.inner.set(next_from_feed(feed));
        Poll::Ready(result.transpose())
    }
}

impl<T> fmt::Debug for FeedStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedStream").finish()
    }
}

/// A [`Stream`] yielding only the most recent value of a [`DroppingFeed`]
/// each time it is polled.
pub struct LatestStream<T> {
    inner: ReusableBoxFuture<'static, (Result<Option<T>>, DroppingFeed<T>)>,
}

async fn next_latest<T: Send + 'static>(
    feed: DroppingFeed<T>,
) -> (Result<Option<T>>, DroppingFeed<T>) {
    let result = feed.get_most_recent().await;
    (result, feed)
}

impl<T: Send + 'static> LatestStream<T> {
    pub fn new(feed: DroppingFeed<T>) -> Self {
        Self {
            inner: ReusableBoxFuture::new(next_latest(feed)),
        }
    }
}

impl<T: Send + 'static> Stream for LatestStream<T> {
    type Item = std::result::Result<T, FeedError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let (result, feed) = ready!(self.inner.poll(cx));
        self.inner.set(next_latest(feed));
        Poll::Ready(result.transpose())
    }
}

impl<T> fmt::Debug for LatestStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatestStream").finish()
    }
}
