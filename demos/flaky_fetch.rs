//! Blocking retry of a service that fails a few times before answering
//!
//! Run with `RUST_LOG=rebound=warn cargo run --example flaky_fetch`.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rebound::{LogFacade, Retry, RetryCounters, RetryError};

fn main() {
    env_logger::init();

    let calls = AtomicU32::new(0);
    let counters = Arc::new(RetryCounters::new());
    let fetch = Retry::when(|e: &io::Error| {
        matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::ConnectionReset)
    })
    .max_attempts(4)
    .initial_delay(Duration::from_millis(200))
    .multiplier(2.0)
    .log_sink(Arc::new(LogFacade))
    .counters(Arc::clone(&counters))
    .named("fetch_profile")
    .wrap(|user: u64| {
        match calls.fetch_add(1, Ordering::SeqCst) {
            0 => Err(io::Error::new(io::ErrorKind::TimedOut, "upstream timed out")),
            1 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
            _ => Ok(format!("profile #{user}")),
        }
    });

    let fetch = match fetch {
        Ok(fetch) => fetch,
        Err(e) => {
            eprintln!("invalid retry policy: {e}");
            return;
        }
    };

    match fetch.call((42,)) {
        Ok(profile) => println!("got {profile} after {} calls", calls.load(Ordering::SeqCst)),
        Err(RetryError::Exhausted { limit, attempts, source, .. }) => {
            eprintln!("gave up after {attempts} attempts ({limit}): {source}");
        }
        Err(e) => eprintln!("fetch failed: {e}"),
    }

    let stats = counters.snapshot();
    println!(
        "calls={} retries={} successes={} failures={}",
        stats.calls,
        stats.retries,
        stats.successes,
        stats.failures()
    );
}
