//! A single wrapped operation shared by concurrent callers

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

use common::{RecordingLog, TestError, transient_policy};
use rebound_engine::{wrap, wrap_async};

fn flaky(calls: Arc<AtomicU32>) -> Result<u32, TestError> {
    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
    if n < 3 { Err(TestError::Transient(n)) } else { Ok(n) }
}

#[test]
fn threads_share_one_wrapped_operation() {
    let log = RecordingLog::new();
    let policy = transient_policy(&log).max_attempts(2).build().unwrap();
    let wrapped = wrap(flaky, policy);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let wrapped = &wrapped;
                scope.spawn(move || wrapped.call((Arc::new(AtomicU32::new(0)),)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Each caller gets its own attempt budget and backoff baseline
    for result in results {
        assert_eq!(result.unwrap(), 3);
    }
    assert_eq!(log.records().len(), 16);
    assert!(log.attempts().iter().all(|a| *a == 1 || *a == 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tasks_share_one_wrapped_operation() {
    let log = RecordingLog::new();
    let policy = transient_policy(&log).max_attempts(2).build().unwrap();
    let wrapped = Arc::new(wrap_async(
        |calls: Arc<AtomicU32>| async move { flaky(calls) },
        policy,
    ));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let wrapped = Arc::clone(&wrapped);
            tokio::spawn(async move { wrapped.call((Arc::new(AtomicU32::new(0)),)).await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), 3);
    }
    assert_eq!(log.records().len(), 16);
}
