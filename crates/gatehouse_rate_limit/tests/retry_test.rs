//! Tests for retry, backoff and per-attempt deadlines.

use gatehouse_error::{GatewayError, GatewayErrorKind};
use gatehouse_rate_limit::{RetryOrchestrator, RetryPolicy};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

fn orchestrator(max_retries: u32, base_secs: u64, max_secs: u64) -> RetryOrchestrator {
    RetryOrchestrator::new(RetryPolicy::new(
        max_retries,
        Duration::from_secs(base_secs),
        Duration::from_secs(max_secs),
    ))
}

fn transient() -> GatewayError {
    GatewayError::new(GatewayErrorKind::Backend("503 from upstream".to_string()))
}

#[tokio::test(start_paused = true)]
async fn three_transient_failures_then_success_takes_four_attempts() {
    let retry = orchestrator(3, 1, 30);
    let calls = Arc::new(AtomicU32::new(0));

    let outcome = retry
        .run(Duration::from_secs(5), |index| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if index < 3 { Err(transient()) } else { Ok("done") }
            }
        })
        .await;

    assert_eq!(*outcome.result.as_ref().expect("fourth attempt succeeds"), "done");
    assert_eq!(outcome.attempts, 4);
    assert_eq!(outcome.retries(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_wrap_last_failure_with_bounded_delays() {
    let retry = orchestrator(3, 1, 3);
    let stamps = Arc::new(Mutex::new(Vec::new()));

    let outcome: gatehouse_rate_limit::RetryOutcome<()> = retry
        .run(Duration::from_secs(5), |_| {
            let stamps = stamps.clone();
            async move {
                stamps.lock().push(Instant::now());
                Err(transient())
            }
        })
        .await;

    assert_eq!(outcome.attempts, 4);
    let err = outcome.result.expect_err("always fails");
    match err.kind() {
        GatewayErrorKind::MaxRetriesExceeded { attempts, last } => {
            assert_eq!(*attempts, 4);
            assert!(matches!(**last, GatewayErrorKind::Backend(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    let stamps = stamps.lock();
    let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(gaps.len(), 3);
    assert!(gaps.windows(2).all(|w| w[0] <= w[1]), "non-decreasing: {gaps:?}");
    assert!(gaps.iter().all(|gap| *gap <= Duration::from_secs(3)));
    assert_eq!(gaps[0], Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn terminal_failure_makes_exactly_one_attempt() {
    let retry = orchestrator(3, 1, 30);

    for kind in [
        GatewayErrorKind::Validation("bad".to_string()),
        GatewayErrorKind::BudgetExceeded("over".to_string()),
        GatewayErrorKind::BackendRejected("401".to_string()),
    ] {
        let calls = Arc::new(AtomicU32::new(0));
        let outcome: gatehouse_rate_limit::RetryOutcome<()> = retry
            .run(Duration::from_secs(5), |_| {
                let calls = calls.clone();
                let kind = kind.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(GatewayError::new(kind))
                }
            })
            .await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.result.expect_err("terminal").kind(), &kind);
    }
}

#[tokio::test(start_paused = true)]
async fn overrun_is_a_retried_timeout_and_cancels_the_attempt() {
    struct DropFlag(Arc<AtomicBool>);
    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let retry = orchestrator(1, 1, 1);
    let cancelled = Arc::new(AtomicBool::new(false));

    let outcome: gatehouse_rate_limit::RetryOutcome<()> = retry
        .run(Duration::from_millis(500), |_| {
            let flag = DropFlag(cancelled.clone());
            async move {
                let _flag = flag;
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        })
        .await;

    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.timeouts, 2);
    assert!(cancelled.load(Ordering::SeqCst));
    match outcome.result.expect_err("every attempt overruns").kind() {
        GatewayErrorKind::MaxRetriesExceeded { last, .. } => {
            assert_eq!(**last, GatewayErrorKind::Timeout(500));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn cancelling_during_backoff_stops_further_attempts() {
    let retry = orchestrator(5, 1, 30);
    let calls = Arc::new(AtomicU32::new(0));

    let run = retry.run(Duration::from_secs(5), |_| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(transient())
        }
    });
    let cut_short = tokio::time::timeout(Duration::from_millis(1500), run).await;
    assert!(cut_short.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_retries_means_single_attempt() {
    let retry = orchestrator(0, 1, 1);
    let outcome: gatehouse_rate_limit::RetryOutcome<()> = retry
        .run(Duration::from_secs(1), |_| async { Err(transient()) })
        .await;

    assert_eq!(outcome.attempts, 1);
    assert!(matches!(
        outcome.result.expect_err("fails").kind(),
        GatewayErrorKind::MaxRetriesExceeded { attempts: 1, .. }
    ));
}

#[test]
fn huge_retry_counts_do_not_overflow() {
    let policy = RetryPolicy::new(u32::MAX, Duration::from_secs(1), Duration::from_secs(30));
    assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(30));
    assert_eq!(policy.delay_for(1_000), Duration::from_secs(30));
    assert_eq!(policy.delays().take(3).count(), 3);
}

#[test]
fn jittered_delays_stay_below_ceiling() {
    let policy = RetryPolicy::new(10, Duration::from_millis(100), Duration::from_secs(2))
        .with_jitter(true);
    assert!(policy.delays().all(|delay| delay <= Duration::from_secs(2)));
}
