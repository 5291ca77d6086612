//! Dedup and admission-ceiling behaviour of the request pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use huginn::{
    ApiClient, ApiError, Exchange, Method, ProgressFn, RequestDescriptor, RequestOptions,
    RequestQueue, RequestSignature, ResponseBody, Result, UploadPayload,
};
use serde_json::{Value, json};
use tokio::sync::Semaphore;

/// Stub transport that parks every exchange until the test releases it,
/// tracking call and concurrency counts.
struct GatedExchange {
    gate: Semaphore,
    fail: AtomicBool,
    calls: AtomicU32,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl GatedExchange {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            fail: AtomicBool::new(false),
            calls: AtomicU32::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        let stub = Self::new();
        stub.fail.store(true, Ordering::SeqCst);
        stub
    }

    fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Exchange for GatedExchange {
    async fn exchange(&self, descriptor: &RequestDescriptor) -> Result<ResponseBody> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Server {
                status: 500,
                message: "boom".into(),
            });
        }
        Ok(ResponseBody::Json(json!({ "path": descriptor.path })))
    }

    async fn upload(
        &self,
        _path: &str,
        _payload: UploadPayload,
        _on_progress: Option<ProgressFn>,
    ) -> Result<ResponseBody> {
        Err(ApiError::Network("upload not supported by stub".into()))
    }
}

fn client_with(transport: Arc<GatedExchange>, admission_limit: usize) -> ApiClient {
    ApiClient::builder()
        .transport(transport)
        .admission_limit(admission_limit)
        .build()
        .expect("client builds")
}

// ============================================================================
// Dedup
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_identical_requests_share_one_exchange() {
    let transport = GatedExchange::new();
    let client = Arc::new(client_with(transport.clone(), 5));

    let a = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get::<Value>("/users/42", RequestOptions::default()).await }
    });
    let b = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get::<Value>("/users/42", RequestOptions::default()).await }
    });

    // let both reach the queue before releasing the exchange
    tokio::time::sleep(Duration::from_millis(50)).await;
    transport.release(1);

    let first = a.await.unwrap().unwrap();
    let second = b.await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn attached_callers_share_the_failure() {
    let transport = GatedExchange::failing();
    let client = Arc::new(client_with(transport.clone(), 5));

    let options = || RequestOptions::new().retry(false);
    let a = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get::<Value>("/matches", options()).await }
    });
    let b = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get::<Value>("/matches", options()).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    transport.release(1);

    let first = a.await.unwrap().unwrap_err();
    let second = b.await.unwrap().unwrap_err();
    assert_eq!(first.status_code(), Some(500));
    assert_eq!(second.status_code(), Some(500));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn same_path_different_bodies_are_not_merged() {
    let transport = GatedExchange::new();
    let client = Arc::new(client_with(transport.clone(), 5));

    let a = tokio::spawn({
        let client = Arc::clone(&client);
        async move {
            client
                .post::<Value>(
                    "/messages",
                    json!({ "text": "first" }),
                    RequestOptions::default(),
                )
                .await
        }
    });
    let b = tokio::spawn({
        let client = Arc::clone(&client);
        async move {
            client
                .post::<Value>(
                    "/messages",
                    json!({ "text": "second" }),
                    RequestOptions::default(),
                )
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    transport.release(2);

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn body_field_order_does_not_defeat_dedup() {
    let transport = GatedExchange::new();
    let client = Arc::new(client_with(transport.clone(), 5));

    let a = tokio::spawn({
        let client = Arc::clone(&client);
        async move {
            client
                .post::<Value>(
                    "/messages",
                    json!({ "to": 7, "text": "hi" }),
                    RequestOptions::default(),
                )
                .await
        }
    });
    let b = tokio::spawn({
        let client = Arc::clone(&client);
        async move {
            client
                .post::<Value>(
                    "/messages",
                    json!({ "text": "hi", "to": 7 }),
                    RequestOptions::default(),
                )
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    transport.release(1);

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();
    assert_eq!(transport.calls(), 1);
}

// ============================================================================
// Admission ceiling
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn admission_ceiling_bounds_concurrent_exchanges() {
    let transport = GatedExchange::new();
    let client = Arc::new(client_with(transport.clone(), 3));

    let mut handles = Vec::new();
    for i in 0..6 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            client
                .get::<Value>(&format!("/sessions/{i}"), RequestOptions::default())
                .await
        }));
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.max_in_flight(), 3);

    transport.release(6);
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(transport.calls(), 6);
    assert_eq!(transport.max_in_flight(), 3);
}

// ============================================================================
// Queue internals
// ============================================================================

#[tokio::test]
async fn slot_is_removed_after_settlement() {
    let queue = RequestQueue::new(2);
    let signature = RequestSignature::compute(Method::Get, "/ping", None);

    let result = queue
        .admit(&signature, async { Ok(ResponseBody::Json(json!(1))) })
        .await
        .unwrap();

    assert_eq!(result, ResponseBody::Json(json!(1)));
    assert_eq!(queue.live_slots(), 0);
}

#[tokio::test]
async fn failed_slot_is_removed_too() {
    let queue = RequestQueue::new(2);
    let signature = RequestSignature::compute(Method::Get, "/ping", None);

    let result = queue
        .admit(&signature, async {
            Err(ApiError::Network("down".into()))
        })
        .await;

    assert!(result.is_err());
    assert_eq!(queue.live_slots(), 0);
}
