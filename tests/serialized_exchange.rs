//! Serialization property: clients sharing one lock never interleave
//! exchanges, which negotiated authentication depends on.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use ews_client::transport::{Exchange, ExchangeRequest, ExchangeResponse};
use ews_client::{Error, EwsClient, SharedLock};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

/// Fake transport that records when each exchange ran.
struct SlowExchange {
    intervals: Arc<Mutex<Vec<(Instant, Instant)>>>,
}

#[async_trait]
impl Exchange for SlowExchange {
    async fn execute(&self, _request: &ExchangeRequest) -> ews_client::Result<ExchangeResponse> {
        let start = Instant::now();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let end = Instant::now();
        self.intervals.lock().unwrap().push((start, end));
        Ok(ExchangeResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"<ok/>"),
        })
    }
}

struct FailingExchange;

#[async_trait]
impl Exchange for FailingExchange {
    async fn execute(&self, _request: &ExchangeRequest) -> ews_client::Result<ExchangeResponse> {
        Err(Error::Negotiation("wire dropped".into()))
    }
}

fn slow_client(lock: SharedLock, intervals: Arc<Mutex<Vec<(Instant, Instant)>>>) -> EwsClient {
    EwsClient::builder("https://mail.example.com/EWS/Exchange.asmx")
        .credentials("user@example.com", "secret")
        .shared_lock(lock)
        .exchange_override(Box::new(SlowExchange { intervals }))
        .build()
        .unwrap()
}

#[tokio::test]
async fn exchanges_sharing_a_lock_never_overlap() {
    let lock: SharedLock = Arc::default();
    let intervals = Arc::new(Mutex::new(Vec::new()));

    let first = slow_client(lock.clone(), intervals.clone());
    let second = slow_client(lock.clone(), intervals.clone());

    let (a, b) = tokio::join!(
        first.send_and_receive(b"<a/>"),
        second.send_and_receive(b"<b/>")
    );
    a.unwrap();
    b.unwrap();

    let mut intervals = intervals.lock().unwrap().clone();
    intervals.sort_by_key(|(start, _)| *start);
    assert_eq!(intervals.len(), 2);
    let (_, first_end) = intervals[0];
    let (second_start, _) = intervals[1];
    assert!(
        first_end <= second_start,
        "exchanges overlapped: {first_end:?} > {second_start:?}"
    );
}

#[tokio::test]
async fn unsynchronized_clients_may_interleave() {
    // Without a shared lock the same two exchanges run concurrently; this
    // pins down that serialization comes from the lock, not the client.
    let intervals = Arc::new(Mutex::new(Vec::new()));
    let build = |intervals: Arc<Mutex<Vec<(Instant, Instant)>>>| {
        EwsClient::builder("https://mail.example.com/EWS/Exchange.asmx")
            .credentials("user@example.com", "secret")
            .exchange_override(Box::new(SlowExchange { intervals }))
            .build()
            .unwrap()
    };
    let first = build(intervals.clone());
    let second = build(intervals.clone());

    let (a, b) = tokio::join!(
        first.send_and_receive(b"<a/>"),
        second.send_and_receive(b"<b/>")
    );
    a.unwrap();
    b.unwrap();

    let intervals = intervals.lock().unwrap().clone();
    let starts_max = intervals.iter().map(|(s, _)| *s).max().unwrap();
    let ends_min = intervals.iter().map(|(_, e)| *e).min().unwrap();
    assert!(ends_min > starts_max, "exchanges unexpectedly serialized");
}

#[tokio::test]
async fn negotiated_client_serializes_even_without_a_shared_lock() {
    let intervals = Arc::new(Mutex::new(Vec::new()));
    let client = EwsClient::builder("https://mail.example.com/EWS/Exchange.asmx")
        .credentials("CONTOSO\\alice", "secret")
        .negotiated_auth(true)
        .exchange_override(Box::new(SlowExchange {
            intervals: intervals.clone(),
        }))
        .build()
        .unwrap();

    let (a, b) = tokio::join!(
        client.send_and_receive(b"<a/>"),
        client.send_and_receive(b"<b/>")
    );
    a.unwrap();
    b.unwrap();

    let mut intervals = intervals.lock().unwrap().clone();
    intervals.sort_by_key(|(start, _)| *start);
    let (_, first_end) = intervals[0];
    let (second_start, _) = intervals[1];
    assert!(first_end <= second_start, "negotiated exchanges overlapped");
}

#[tokio::test]
async fn lock_is_released_when_the_exchange_fails() {
    let lock: SharedLock = Arc::default();
    let client = EwsClient::builder("https://mail.example.com/EWS/Exchange.asmx")
        .credentials("user@example.com", "secret")
        .shared_lock(lock.clone())
        .exchange_override(Box::new(FailingExchange))
        .build()
        .unwrap();

    let error = client.send_and_receive(b"<x/>").await.unwrap_err();
    assert!(matches!(error, Error::Negotiation(_)));
    assert!(lock.try_lock().is_ok(), "lock leaked after a failed exchange");
}
