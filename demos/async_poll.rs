//! Cooperative polling of a job that never becomes ready
//!
//! The poll stops on whichever comes first: the deadline or Ctrl-C.
//! Run with `RUST_LOG=rebound=info cargo run --example async_poll`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rebound::{CancelToken, Level, LogFacade, Retry, RetryError};

#[derive(Debug)]
enum JobError {
    Pending { job: &'static str, percent: u32 },
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Pending { job, percent } => write!(f, "{job} still running ({percent}% done)"),
        }
    }
}

static PROGRESS: AtomicU32 = AtomicU32::new(0);

async fn poll_job(job: &'static str) -> Result<String, JobError> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    let percent = (PROGRESS.fetch_add(9, Ordering::Relaxed) + 9).min(99);
    Err(JobError::Pending { job, percent })
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let token = CancelToken::new();
    let poll = Retry::when(|e: &JobError| matches!(e, JobError::Pending { .. }))
        .initial_delay(Duration::from_millis(250))
        .multiplier(1.5)
        .deadline(Duration::from_secs(5))
        .log_level(Level::INFO)
        .log_sink(Arc::new(LogFacade))
        .cancel_on(token.clone())
        .named("poll_job")
        .wrap_async(poll_job);

    let poll = match poll {
        Ok(poll) => poll,
        Err(e) => {
            eprintln!("invalid retry policy: {e}");
            return;
        }
    };

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    match poll.call(("export-7",)).await {
        Ok(result) => println!("job finished: {result}"),
        Err(RetryError::Exhausted { limit, attempts, elapsed, source }) => {
            println!("stopped after {attempts} polls in {elapsed:?} ({limit}): {source}");
        }
        Err(RetryError::Cancelled { last }) => match last {
            Some(e) => println!("cancelled, last poll said: {e}"),
            None => println!("cancelled before the first poll finished"),
        },
        Err(e) => eprintln!("poll failed: {e}"),
    }
}
