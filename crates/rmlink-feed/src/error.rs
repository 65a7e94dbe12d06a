/// Errors raised by feed consumers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// Another call is already waiting on this feed.
    #[error("feed already has an active consumer")]
    ConcurrentConsumption,
}

pub type Result<T> = std::result::Result<T, FeedError>;
