use std::time::Duration;

use futures_util::StreamExt;
use rmlink_feed::{DroppingFeed, Feed, FeedError, FeedState};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_producer_preserves_order() {
    let feed = Feed::new();
    let producer = feed.clone();
    let task = tokio::spawn(async move {
        for i in 0..1_000u32 {
            producer.produce(i);
            if i % 100 == 0 {
                tokio::task::yield_now().await;
            }
        }
        producer.terminate();
    });

    let mut received = Vec::new();
    while let Some(value) = feed.next_value().await.unwrap() {
        received.push(value);
    }
    task.await.unwrap();

    assert_eq!(received, (0..1_000).collect::<Vec<_>>());
}

#[tokio::test]
async fn slow_consumer_sees_only_current_reading() {
    let source = Feed::new();
    let latest = DroppingFeed::new(source.clone());

    for reading in 0..50 {
        source.produce(reading);
    }
    assert_eq!(latest.get_most_recent().await.unwrap(), Some(49));

    source.produce(50);
    source.produce(51);
    assert_eq!(latest.get_most_recent().await.unwrap(), Some(51));
    assert!(source.is_empty(), "newest value was taken from the source");
}

#[tokio::test]
async fn newest_value_wins_after_earlier_one_was_seen() {
    let source = Feed::new();
    let latest = DroppingFeed::new(source.clone());

    source.produce(1);
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    source.produce(2);
    source.produce(3);

    assert_eq!(latest.get_most_recent().await.unwrap(), Some(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn newest_value_wins_across_threads() {
    let source = Feed::new();
    let latest = DroppingFeed::new(source.clone());

    source.produce(1);
    tokio::time::sleep(Duration::from_millis(20)).await;
    source.produce(2);
    source.produce(3);

    assert_eq!(latest.get_most_recent().await.unwrap(), Some(3));
}

#[tokio::test(start_paused = true)]
async fn values_between_calls_collapse_to_newest() {
    let source = Feed::new();
    let latest = DroppingFeed::new(source.clone());

    source.produce(0);
    assert_eq!(latest.get_most_recent().await.unwrap(), Some(0));

    for value in 1..=10 {
        source.produce(value);
    }
    assert_eq!(latest.get_most_recent().await.unwrap(), Some(10));

    let pending = tokio::time::timeout(Duration::from_secs(1), latest.get_most_recent()).await;
    assert!(pending.is_err(), "no value arrived since the last call");

    source.produce(11);
    assert_eq!(latest.get_most_recent().await.unwrap(), Some(11));
}

#[tokio::test]
async fn stream_backed_dropping_feed_returns_newest() {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let items = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|value| (value, rx))
    });
    let latest = DroppingFeed::from_stream(items);

    tx.send(1).unwrap();
    assert_eq!(latest.get_most_recent().await.unwrap(), Some(1));

    tx.send(2).unwrap();
    tx.send(3).unwrap();
    drop(tx);
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(latest.get_most_recent().await.unwrap(), Some(3));
    assert_eq!(latest.get_most_recent().await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn dropping_feed_wakes_on_late_value() {
    let source = Feed::new();
    let latest = DroppingFeed::new(source.clone());

    let producer = source.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        producer.produce("late");
    });

    let started = tokio::time::Instant::now();
    assert_eq!(latest.get_most_recent().await.unwrap(), Some("late"));
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn source_is_claimed_by_dropping_feed() {
    let source: Feed<u8> = Feed::new();
    let _latest = DroppingFeed::new(source.clone());
    tokio::task::yield_now().await;

    assert_eq!(source.state(), FeedState::AwaitingValue);
    assert_eq!(
        source.next_value().await.unwrap_err(),
        FeedError::ConcurrentConsumption
    );
}

#[tokio::test]
async fn dropping_the_feed_releases_the_source() {
    let source: Feed<u8> = Feed::new();
    let latest = DroppingFeed::new(source.clone());
    tokio::task::yield_now().await;
    drop(latest);
    tokio::time::sleep(Duration::from_millis(10)).await;

    source.produce(9);
    assert_eq!(source.next_value().await.unwrap(), Some(9));
}

#[tokio::test]
async fn stream_adapter_is_sequential() {
    let feed = Feed::new();
    let mut stream = feed.clone().into_stream();
    feed.produce('x');
    feed.produce('y');
    assert_eq!(stream.next().await, Some(Ok('x')));
    assert_eq!(stream.next().await, Some(Ok('y')));
    feed.terminate();
    assert_eq!(stream.next().await, None);
}
