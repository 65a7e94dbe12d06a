//! Push-driven telemetry feeds.
//!
//! A [`Feed`] is an unbounded, ordered, single-consumer queue: producers
//! never block, the consumer suspends until a value arrives, and every value
//! is delivered exactly once in production order.
//!
//! A [`DroppingFeed`] sits on top of a feed (or any stream) for consumers
//! that only care about the current reading. It keeps one slot holding the
//! newest value and discards anything older.

pub mod dropping;
pub mod error;
pub mod feed;
pub mod stream;

pub use dropping::DroppingFeed;
pub use error::{FeedError, Result};
pub use feed::{Feed, FeedState};
pub use stream::{FeedStream, LatestStream};
