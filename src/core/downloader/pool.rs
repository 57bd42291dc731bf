// ─── Worker Pool ───
// N workers drain one shared queue. The first error halts the pool:
// in-flight tasks finish, no new ones start, and that error is returned.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

/// Run `work` over `tasks` with at most `workers` in flight.
/// Returns the number of tasks that completed.
pub async fn run_pool<T, F, Fut>(tasks: Vec<T>, workers: usize, work: F) -> LauncherResult<usize>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = LauncherResult<()>>,
{
    let workers = workers.max(1).min(tasks.len().max(1));
    let queue = &Mutex::new(VecDeque::from(tasks));
    let halted = &AtomicBool::new(false);
    let completed = &AtomicUsize::new(0);
    let first_error: &Mutex<Option<LauncherError>> = &Mutex::new(None);
    let work = &work;

    let worker = move || async move {
        loop {
            if halted.load(Ordering::SeqCst) {
                break;
            }
            let Some(task) = queue.lock().await.pop_front() else {
                break;
            };
            match work(task).await {
                Ok(()) => {
                    completed.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    halted.store(true, Ordering::SeqCst);
                    let mut slot = first_error.lock().await;
                    if slot.is_none() {
                        warn!("Worker pool halted: {}", e);
                        *slot = Some(e);
                    }
                    break;
                }
            }
        }
    };

    join_all((0..workers).map(|_| worker())).await;

    let taken = first_error.lock().await.take();
    match taken {
        Some(e) => Err(e),
        None => Ok(completed.load(Ordering::SeqCst)),
    }
}
