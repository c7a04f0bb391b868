//! Dependency-aware worker pool.
//!
//! [`PoolParty`] runs one batch of closures per cycle across a fixed set of
//! long-lived worker threads. Each item may name other items of the same batch
//! that must finish before it starts.
//!
//! # Cycle protocol
//!
//! 1. The coordinating thread builds a batch with [`add_work()`](PoolParty::add_work)
//!    and [`add_work_with_dependencies()`](PoolParty::add_work_with_dependencies).
//!    Ids are dense, in submission order, starting at 0.
//! 2. [`work()`](PoolParty::work) publishes the batch, wakes every worker and
//!    blocks until all of them report the batch drained.
//! 3. Each worker repeatedly takes the lock, scans the remaining items from the
//!    back for one whose dependencies are all complete, removes it, runs it with
//!    the lock released, then marks it complete and wakes every waiter. With
//!    nothing eligible it sleeps until another completion arrives.
//!
//! With zero workers (the state after [`PoolParty::new()`]) the batch is drained
//! on the calling thread with the same scan.
//!
//! # Failure
//!
//! Work items have no error channel. A panicking item aborts the process: a
//! half-rendered block is never handed on. Dependencies that can never be
//! satisfied (a cycle) are detected once no item is running and none is
//! eligible, and `work()` panics instead of hanging.

use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::{Error, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct WorkItem {
    job: Job,
    id: u32,
    /// Range into the batch's flat dependency id arena.
    deps: Range<usize>,
}

#[derive(Default)]
struct State {
    items: Vec<WorkItem>,
    dependency_ids: Vec<u32>,
    completed: Vec<bool>,
    /// Items taken off the list whose closure has not returned yet.
    running: usize,
    /// Workers that have not yet reported the current batch drained.
    active_workers: usize,
    generation: u64,
    stalled: bool,
    shutdown: bool,
}

impl State {
    fn next_eligible(&self) -> Option<usize> {
        self.items.iter().rposition(|item| {
            self.dependency_ids[item.deps.clone()]
                .iter()
                .all(|&dep| self.completed[dep as usize])
        })
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    /// New batch published or shutdown requested.
    start: Condvar,
    /// An item completed (or the batch stalled).
    progress: Condvar,
    /// Every worker has drained the batch.
    finished: Condvar,
}

/// Fixed-size worker pool executing dependency-tagged batches.
///
/// # Example
///
/// ```rust
/// use partita_core::PoolParty;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let mut pool = PoolParty::new();
/// pool.setup(2).unwrap();
///
/// let total = Arc::new(AtomicU32::new(0));
/// let t = Arc::clone(&total);
/// let a = pool.add_work(move || { t.fetch_add(1, Ordering::SeqCst); });
/// let t = Arc::clone(&total);
/// pool.add_work_with_dependencies(move || { t.fetch_add(10, Ordering::SeqCst); }, &[a]);
/// pool.work();
///
/// assert_eq!(total.load(Ordering::SeqCst), 11);
/// ```
pub struct PoolParty {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    /// Batch under construction.
    items: Vec<WorkItem>,
    dependency_ids: Vec<u32>,
}

impl PoolParty {
    /// Creates a pool with no worker threads. Batches run on the caller.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            workers: Vec::new(),
            items: Vec::new(),
            dependency_ids: Vec::new(),
        }
    }

    /// Stops any running workers and starts `worker_count` new ones.
    ///
    /// `setup(0)` tears the pool down and returns to inline execution. If a
    /// thread fails to spawn, the workers already started are stopped again and
    /// the pool is left with zero workers.
    pub fn setup(&mut self, worker_count: usize) -> Result<()> {
        self.stop_workers();

        let seen = self.shared.state.lock().generation;
        for index in 0..worker_count {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("partita-worker-{index}"))
                .spawn(move || worker_loop(&shared, seen));
            match spawned {
                Ok(handle) => self.workers.push(handle),
                Err(source) => {
                    self.stop_workers();
                    return Err(Error::SpawnWorker { index, source });
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(workers = worker_count, "worker pool started");

        Ok(())
    }

    /// Returns the number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Returns the number of items queued for the next [`work()`](Self::work).
    pub fn pending(&self) -> usize {
        self.items.len()
    }

    /// Queues an item with no dependencies and returns its id.
    pub fn add_work<F>(&mut self, job: F) -> u32
    where
        F: FnOnce() + Send + 'static,
    {
        self.add_work_with_dependencies(job, &[])
    }

    /// Queues an item that starts only after every id in `dependencies` has
    /// completed. Returns the new item's id.
    ///
    /// Dependencies must name items of this batch and must not form a cycle.
    pub fn add_work_with_dependencies<F>(&mut self, job: F, dependencies: &[u32]) -> u32
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.items.len() as u32;
        let start = self.dependency_ids.len();
        self.dependency_ids.extend_from_slice(dependencies);
        self.items.push(WorkItem {
            job: Box::new(job),
            id,
            deps: start..self.dependency_ids.len(),
        });
        id
    }

    /// Runs the queued batch to completion, then clears it.
    ///
    /// # Panics
    ///
    /// Panics if a dependency id is outside the batch or names its own item,
    /// or if the dependencies form a cycle.
    pub fn work(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.validate();

        let worker_count = self.workers.len();
        let mut state = self.shared.state.lock();
        std::mem::swap(&mut state.items, &mut self.items);
        std::mem::swap(&mut state.dependency_ids, &mut self.dependency_ids);
        let batch_len = state.items.len();
        state.completed.clear();
        state.completed.resize(batch_len, false);

        if worker_count == 0 {
            drain(&self.shared, &mut state);
        } else {
            state.active_workers = worker_count;
            state.generation = state.generation.wrapping_add(1);
            self.shared.start.notify_all();
            while state.active_workers > 0 {
                self.shared.finished.wait(&mut state);
            }
        }

        let stalled = std::mem::take(&mut state.stalled);
        let stranded = state.items.len();
        state.items.clear();
        // Hand the drained vectors back so their capacity serves the next batch.
        std::mem::swap(&mut state.items, &mut self.items);
        std::mem::swap(&mut state.dependency_ids, &mut self.dependency_ids);
        self.dependency_ids.clear();
        drop(state);

        assert!(
            !stalled,
            "work batch stalled: {stranded} of {batch_len} items wait on a dependency cycle"
        );
    }

    fn validate(&self) {
        let len = self.items.len();
        for item in &self.items {
            for &dep in &self.dependency_ids[item.deps.clone()] {
                assert!(
                    (dep as usize) < len,
                    "work item {} depends on id {dep}, batch has {len} items",
                    item.id
                );
                assert!(dep != item.id, "work item {dep} depends on itself");
            }
        }
    }

    fn stop_workers(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        self.shared.state.lock().shutdown = true;
        self.shared.start.notify_all();
        let count = self.workers.len();
        for handle in self.workers.drain(..) {
            // Workers never unwind: a panicking item aborts the process.
            let _ = handle.join();
        }
        self.shared.state.lock().shutdown = false;

        #[cfg(feature = "tracing")]
        tracing::debug!(workers = count, "worker pool stopped");
        #[cfg(not(feature = "tracing"))]
        let _ = count;
    }
}

impl Default for PoolParty {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PoolParty {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

impl std::fmt::Debug for PoolParty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolParty")
            .field("workers", &self.workers.len())
            .field("pending", &self.items.len())
            .finish()
    }
}

fn worker_loop(shared: &Shared, mut seen: u64) {
    let mut state = shared.state.lock();
    loop {
        while state.generation == seen && !state.shutdown {
            shared.start.wait(&mut state);
        }
        if state.shutdown {
            return;
        }
        seen = state.generation;

        drain(shared, &mut state);

        state.active_workers -= 1;
        if state.active_workers == 0 {
            shared.finished.notify_one();
        }
    }
}

/// Executes eligible items until the list is empty or the batch stalls.
fn drain(shared: &Shared, state: &mut MutexGuard<'_, State>) {
    while !state.items.is_empty() && !state.stalled {
        match state.next_eligible() {
            Some(index) => {
                let item = state.items.remove(index);
                let id = item.id as usize;
                state.running += 1;
                MutexGuard::unlocked(state, || run_job(item.job));
                state.running -= 1;
                state.completed[id] = true;
                shared.progress.notify_all();
            }
            None if state.running == 0 => {
                state.stalled = true;
                shared.progress.notify_all();
            }
            None => shared.progress.wait(state),
        }
    }
}

fn run_job(job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        #[cfg(feature = "tracing")]
        tracing::error!("work item panicked, aborting");
        std::process::abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn pool_with(workers: usize) -> PoolParty {
        let mut pool = PoolParty::new();
        pool.setup(workers).unwrap();
        pool
    }

    #[test]
    fn test_new_has_no_workers() {
        let pool = PoolParty::new();
        assert_eq!(pool.worker_count(), 0);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_empty_batch_returns() {
        for workers in 0..=4 {
            let mut pool = pool_with(workers);
            pool.work();
            pool.work();
        }
    }

    #[test]
    fn test_single_item() {
        for workers in 0..=4 {
            let mut pool = pool_with(workers);
            let hits = Arc::new(AtomicUsize::new(0));
            let h = Arc::clone(&hits);
            pool.add_work(move || {
                h.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(pool.pending(), 1);
            pool.work();
            assert_eq!(pool.pending(), 0);
            assert_eq!(hits.load(Ordering::SeqCst), 1, "workers = {workers}");
        }
    }

    #[test]
    fn test_ids_are_dense() {
        let mut pool = PoolParty::new();
        assert_eq!(pool.add_work(|| {}), 0);
        assert_eq!(pool.add_work(|| {}), 1);
        assert_eq!(pool.add_work_with_dependencies(|| {}, &[0, 1]), 2);
        pool.work();
        assert_eq!(pool.add_work(|| {}), 0);
        pool.work();
    }

    #[test]
    fn test_many_items_run_once_each() {
        for workers in 0..=4 {
            let mut pool = pool_with(workers);
            let counters: Arc<Vec<AtomicUsize>> =
                Arc::new((0..64).map(|_| AtomicUsize::new(0)).collect());
            for i in 0..64 {
                let c = Arc::clone(&counters);
                pool.add_work(move || {
                    c[i].fetch_add(1, Ordering::SeqCst);
                });
            }
            pool.work();
            for (i, c) in counters.iter().enumerate() {
                assert_eq!(c.load(Ordering::SeqCst), 1, "item {i}, workers {workers}");
            }
        }
    }

    #[test]
    fn test_dependent_item_starts_after_dependencies() {
        for workers in 1..=4 {
            let mut pool = pool_with(workers);
            let ends = Arc::new(Mutex::new(Vec::new()));
            let start_c = Arc::new(Mutex::new(None));

            let mut deps = Vec::new();
            for _ in 0..2 {
                let e = Arc::clone(&ends);
                deps.push(pool.add_work(move || {
                    thread::sleep(Duration::from_millis(5));
                    e.lock().push(Instant::now());
                }));
            }
            let s = Arc::clone(&start_c);
            pool.add_work_with_dependencies(
                move || {
                    *s.lock() = Some(Instant::now());
                },
                &deps,
            );
            pool.work();

            let ends = ends.lock();
            assert_eq!(ends.len(), 2);
            let started = *start_c.lock();
            let started = started.expect("dependent item ran");
            assert!(ends.iter().all(|&end| started >= end), "workers = {workers}");
        }
    }

    #[test]
    fn test_dependency_on_later_id() {
        for workers in 0..=3 {
            let mut pool = pool_with(workers);
            let order = Arc::new(Mutex::new(Vec::new()));
            let o = Arc::clone(&order);
            pool.add_work_with_dependencies(move || o.lock().push(0), &[1]);
            let o = Arc::clone(&order);
            pool.add_work(move || o.lock().push(1));
            pool.work();
            assert_eq!(*order.lock(), vec![1, 0]);
        }
    }

    #[test]
    fn test_chain_runs_in_order() {
        for workers in 0..=4 {
            let mut pool = pool_with(workers);
            let order = Arc::new(Mutex::new(Vec::new()));
            let mut previous: Option<u32> = None;
            for i in 0..16 {
                let o = Arc::clone(&order);
                let deps: Vec<u32> = previous.into_iter().collect();
                previous = Some(pool.add_work_with_dependencies(move || o.lock().push(i), &deps));
            }
            pool.work();
            assert_eq!(*order.lock(), (0..16).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_reused_across_batches() {
        let mut pool = pool_with(3);
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            for _ in 0..8 {
                let h = Arc::clone(&hits);
                pool.add_work(move || {
                    h.fetch_add(1, Ordering::Relaxed);
                });
            }
            pool.work();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 800);
    }

    #[test]
    fn test_setup_resizes() {
        let mut pool = pool_with(4);
        assert_eq!(pool.worker_count(), 4);
        pool.setup(2).unwrap();
        assert_eq!(pool.worker_count(), 2);
        pool.setup(0).unwrap();
        assert_eq!(pool.worker_count(), 0);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        pool.add_work(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        pool.work();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inline_runs_on_caller() {
        let mut pool = PoolParty::new();
        let caller = thread::current().id();
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        pool.add_work(move || *s.lock() = Some(thread::current().id()));
        pool.work();
        assert_eq!(*seen.lock(), Some(caller));
    }

    #[test]
    fn test_workers_are_named() {
        let mut pool = pool_with(1);
        let name = Arc::new(Mutex::new(String::new()));
        let n = Arc::clone(&name);
        pool.add_work(move || {
            *n.lock() = thread::current().name().unwrap_or_default().to_string();
        });
        pool.work();
        assert_eq!(*name.lock(), "partita-worker-0");
    }

    #[test]
    #[should_panic(expected = "batch has 1 items")]
    fn test_out_of_range_dependency_panics() {
        let mut pool = PoolParty::new();
        pool.add_work_with_dependencies(|| {}, &[3]);
        pool.work();
    }

    #[test]
    #[should_panic(expected = "depends on itself")]
    fn test_self_dependency_panics() {
        let mut pool = PoolParty::new();
        pool.add_work(|| {});
        pool.add_work_with_dependencies(|| {}, &[1]);
        pool.work();
    }

    #[test]
    #[should_panic(expected = "dependency cycle")]
    fn test_cycle_panics_instead_of_hanging() {
        let mut pool = pool_with(2);
        pool.add_work_with_dependencies(|| {}, &[1]);
        pool.add_work_with_dependencies(|| {}, &[0]);
        pool.work();
    }

    #[test]
    fn test_pool_usable_after_drop_of_previous() {
        {
            let _pool = pool_with(4);
        }
        let mut pool = pool_with(1);
        pool.add_work(|| {});
        pool.work();
    }
}
