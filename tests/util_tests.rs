//! Tests for utility modules (retry, timeout).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use studio_llm::error::LlmError;
use studio_llm::util::retry::RetryPolicy;
use studio_llm::util::timeout::with_timeout;

#[tokio::test(start_paused = true)]
async fn retry_policy_retries_transport_errors_until_success() {
    let policy = RetryPolicy {
        max_attempts: 4,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(100),
        multiplier: 2.0,
    };
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_task = attempts.clone();

    let task = tokio::spawn(async move {
        policy
            .execute(|| {
                let attempts = attempts_for_task.clone();
                async move {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(LlmError::Connection("connection refused".into()))
                    } else {
                        Ok::<_, LlmError>("ok")
                    }
                }
            })
            .await
    });

    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    let result = task.await.unwrap();

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retry_policy_stops_immediately_for_upstream_errors() {
    let policy = RetryPolicy {
        max_attempts: 5,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
        multiplier: 2.0,
    };
    let attempts = Arc::new(AtomicUsize::new(0));

    let result = policy
        .execute(|| {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(LlmError::Upstream("disk full".into()))
            }
        })
        .await;

    assert!(matches!(result, Err(LlmError::Upstream(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_policy_gives_up_after_max_attempts() {
    let policy = RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(10),
        multiplier: 1.0,
    };
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let task = tokio::spawn(async move {
        policy
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(LlmError::api(503, "busy"))
                }
            })
            .await
    });

    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    let result = task.await.unwrap();

    assert!(matches!(result, Err(LlmError::Api { status: 503, .. })));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn with_timeout_maps_elapsed_to_timeout_error() {
    let result = with_timeout(Duration::from_millis(50), async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok::<_, LlmError>(())
    })
    .await;

    assert!(matches!(result, Err(LlmError::Timeout(50))));
}

#[tokio::test]
async fn with_timeout_passes_through_results() {
    let ok = with_timeout(Duration::from_secs(1), async { Ok::<_, LlmError>(7) }).await;
    assert_eq!(ok.unwrap(), 7);

    let err = with_timeout(Duration::from_secs(1), async {
        Err::<(), _>(LlmError::Cancelled)
    })
    .await;
    assert!(matches!(err, Err(LlmError::Cancelled)));
}
