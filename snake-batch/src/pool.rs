use rayon::{ScopeFifo, ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::any::Any;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker pool needs at least one thread")]
    NoThreads,
    #[error("failed to start worker threads: {0}")]
    Build(#[from] ThreadPoolBuildError),
}

/// Fixed set of worker threads draining one FIFO queue.
///
/// Two ways to use it: [`WorkerPool::schedule`] plus [`WorkerPool::wait`] for owned tasks, or
/// [`WorkerPool::round`] for tasks that borrow from the caller's stack.
pub struct WorkerPool {
    pool: ThreadPool,
    outstanding: Arc<Outstanding>,
}

#[derive(Default)]
struct Outstanding {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Outstanding {
    fn begin(&self) {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }
}

/// Marks a scheduled task finished when dropped, including during unwinding.
struct TaskGuard(Arc<Outstanding>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self, PoolError> {
        if threads == 0 {
            return Err(PoolError::NoThreads);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("snake-worker-{index}"))
            .panic_handler(|payload| {
                error!(panic = %panic_message(payload.as_ref()), "worker task panicked");
            })
            .build()?;
        Ok(Self {
            pool,
            outstanding: Arc::default(),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queues `task` behind everything scheduled before it.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.outstanding.begin();
        let guard = TaskGuard(Arc::clone(&self.outstanding));
        self.pool.spawn_fifo(move || {
            let _guard = guard;
            task();
        });
    }

    /// Blocks until every task passed to [`WorkerPool::schedule`] so far has finished.
    pub fn wait(&self) {
        let mut count = self
            .outstanding
            .count
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            count = self
                .outstanding
                .drained
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Runs one fan-out/fan-in round.
    ///
    /// Tasks scheduled on the [`Round`] may borrow anything that outlives this call; it returns
    /// only after all of them have completed. A panicking task is re-raised here once the
    /// round has drained.
    pub fn round<'scope, OP>(&self, op: OP)
    where
        OP: FnOnce(&Round<'_, 'scope>) + Send,
    {
        self.pool.scope_fifo(|scope| op(&Round { scope }));
    }
}

pub struct Round<'r, 'scope> {
    scope: &'r ScopeFifo<'scope>,
}

impl<'scope> Round<'_, 'scope> {
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        self.scope.spawn_fifo(move |_| task());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
