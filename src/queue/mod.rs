use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run `work(i)` once for every `i` in `0..count`, at most `limit` at a time.
///
/// Returns once every invocation has finished. Completion order is
/// unspecified, and no result flows back: work reports through its own
/// channel. A limit of 0 behaves as 1. A panicking invocation is logged and
/// does not stop the others.
pub async fn run_in_parallel<F, Fut>(count: usize, limit: usize, work: F)
where
    F: Fn(usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    if count == 0 {
        return;
    }

    let limit = limit.clamp(1, count);
    let work = Arc::new(work);
    // Semaphore enforces the concurrency limit
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut tasks = JoinSet::new();

    for index in 0..count {
        let work = Arc::clone(&work);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            // The semaphore is never closed
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            work(index).await;
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Worker task failed");
        }
    }
}
