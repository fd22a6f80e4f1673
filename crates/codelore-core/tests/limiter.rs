//! Admission limiter behavior under real concurrency

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use codelore_core::Limiter;
use futures::future::join_all;
use parking_lot::Mutex;

#[tokio::test]
async fn test_never_exceeds_max_concurrent() {
    let limiter = Limiter::new(2);
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks = (0..5).map(|i| {
        let current = Arc::clone(&current);
        let peak = Arc::clone(&peak);
        limiter.run(move || async move {
            let now_active = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now_active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            current.fetch_sub(1, Ordering::SeqCst);
            i
        })
    });

    let results = join_all(tasks).await;
    assert_eq!(results, vec![0, 1, 2, 3, 4]);
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(peak.load(Ordering::SeqCst), 2);
    assert_eq!(limiter.active(), 0);
}

#[tokio::test]
async fn test_capacity_one_runs_in_submission_order() {
    let limiter = Limiter::new(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    // Later tasks are faster, so any reordering would show up
    let tasks = (0..5u64).map(|i| {
        let order = Arc::clone(&order);
        limiter.run(move || async move {
            order.lock().push(format!("start {}", i));
            tokio::time::sleep(Duration::from_millis(25 - i * 5)).await;
            order.lock().push(format!("end {}", i));
        })
    });
    join_all(tasks).await;

    let expected: Vec<String> = (0..5)
        .flat_map(|i| [format!("start {}", i), format!("end {}", i)])
        .collect();
    assert_eq!(*order.lock(), expected);
}

#[tokio::test]
async fn test_failing_task_does_not_block_next() {
    let limiter = Limiter::new(1);

    let failing = limiter.run(|| async { Err::<u32, String>("boom".to_string()) });
    let next = limiter.run(|| async { Ok::<u32, String>(42) });

    assert_eq!(failing.await, Err("boom".to_string()));
    assert_eq!(next.await, Ok(42));
    assert_eq!(limiter.active(), 0);
}

#[tokio::test]
async fn test_panicking_task_releases_slot() {
    let limiter = Limiter::new(1);

    let panicking = tokio::spawn(limiter.run(|| async {
        panic!("task exploded");
    }));
    let next = tokio::spawn(limiter.run(|| async { "still running" }));

    let err = panicking.await.unwrap_err();
    assert!(err.is_panic());
    assert_eq!(next.await.unwrap(), "still running");
    assert_eq!(limiter.active(), 0);
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let limiter = Limiter::new(2);

    let tasks = (0..6).map(|i| {
        limiter.run(move || async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            if i % 2 == 0 {
                Err(format!("task {} failed", i))
            } else {
                Ok(i)
            }
        })
    });

    let results = join_all(tasks).await;
    let ok: Vec<i32> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(ok, vec![1, 3, 5]);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 3);
}

#[tokio::test]
async fn test_task_panicking_before_returning_future_releases_slot() {
    let limiter = Limiter::new(1);

    let panicking = tokio::spawn(limiter.run(|| -> std::future::Ready<()> {
        panic!("task failed on invocation");
    }));
    let next = tokio::spawn(limiter.run(|| async { "next" }));

    let err = panicking.await.unwrap_err();
    assert!(err.is_panic());
    assert_eq!(next.await.unwrap(), "next");
    assert_eq!(limiter.active(), 0);
}

#[tokio::test]
async fn test_clones_share_capacity() {
    let limiter = Limiter::new(1);
    let other = limiter.clone();
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

    let first = tokio::spawn(limiter.run(move || async move {
        let _ = release_rx.await;
        1
    }));
    while other.active() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(other.active(), 1);

    let second = tokio::spawn(other.run(|| async { 2 }));
    let _ = release_tx.send(());

    assert_eq!(first.await.unwrap() + second.await.unwrap(), 3);
    assert_eq!(limiter.active(), 0);
}
