use super::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn zero_threads_is_rejected() {
    assert!(matches!(WorkerPool::new(0), Err(PoolError::NoThreads)));
}

#[test]
fn pool_runs_exactly_the_requested_threads() {
    let pool = WorkerPool::new(3).expect("pool");
    assert_eq!(pool.threads(), 3);

    let names = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..12 {
        let names = Arc::clone(&names);
        pool.schedule(move || {
            let name = std::thread::current().name().map(str::to_owned);
            names.lock().expect("names lock").push(name);
        });
    }
    pool.wait();

    let names = names.lock().expect("names lock");
    assert_eq!(names.len(), 12);
    assert!(names
        .iter()
        .all(|name| name.as_deref().is_some_and(|name| name.starts_with("snake-worker-"))));
}

#[test]
fn wait_blocks_until_every_scheduled_task_finished() {
    let pool = WorkerPool::new(2).expect("pool");
    let done = Arc::new(AtomicUsize::new(0));

    for round in 0..3 {
        for _ in 0..16 {
            let done = Arc::clone(&done);
            pool.schedule(move || {
                std::thread::sleep(Duration::from_millis(2));
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait();
        assert_eq!(done.load(Ordering::SeqCst), 16 * (round + 1));
    }
}

#[test]
fn wait_with_nothing_scheduled_returns() {
    let pool = WorkerPool::new(1).expect("pool");
    pool.wait();
}

#[test]
fn panicking_task_still_releases_the_barrier() {
    let pool = WorkerPool::new(2).expect("pool");
    let done = Arc::new(AtomicUsize::new(0));

    pool.schedule(|| panic!("task failure under test"));
    for _ in 0..4 {
        let done = Arc::clone(&done);
        pool.schedule(move || {
            done.fetch_add(1, Ordering::SeqCst);
        });
    }
    pool.wait();

    assert_eq!(done.load(Ordering::SeqCst), 4);
}

#[test]
fn round_tasks_fill_disjoint_borrowed_regions() {
    let pool = WorkerPool::new(4).expect("pool");
    let mut buffer = vec![0_u32; 64];

    pool.round(|round| {
        for (index, chunk) in buffer.chunks_mut(8).enumerate() {
            round.schedule(move || chunk.fill(index as u32 + 1));
        }
    });

    for (index, chunk) in buffer.chunks(8).enumerate() {
        assert!(chunk.iter().all(|&value| value == index as u32 + 1));
    }
}

#[test]
fn round_reraises_task_panics_after_draining() {
    let pool = WorkerPool::new(2).expect("pool");
    let done = AtomicUsize::new(0);

    let result = catch_unwind(AssertUnwindSafe(|| {
        pool.round(|round| {
            round.schedule(|| panic!("round failure under test"));
            for _ in 0..4 {
                round.schedule(|| {
                    done.fetch_add(1, Ordering::SeqCst);
                });
            }
        });
    }));

    assert!(result.is_err());
    assert_eq!(done.load(Ordering::SeqCst), 4);
}
