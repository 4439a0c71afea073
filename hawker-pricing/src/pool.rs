//! Adaptive worker pool.
//!
//! A bounded work queue feeds a set of worker tasks whose population is
//! tuned by a controller from the p95 of observed task latencies. Resizing
//! never aborts a running task: scale-up spawns workers immediately, scale-
//! down lowers the target and lets workers retire after their current job.
//! Idle workers above the minimum retire on their own after the idle
//! timeout.

use crate::metrics::percentile;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub min_workers: usize,
    pub max_workers: usize,
    pub step: usize,
    /// Scale up when window p95 exceeds this (ms).
    pub target_up_ms: u64,
    /// Scale down when window p95 is below this (ms).
    pub target_down_ms: u64,
    /// Bounded latency sample FIFO size.
    pub latency_window: usize,
    /// Bounded work queue capacity.
    pub queue_capacity: usize,
    /// Idle workers above `min_workers` retire after this.
    pub idle_timeout: Duration,
    /// Minimum spacing between two resize actions.
    pub cooldown: Duration,
    /// Controller wake interval.
    pub tick: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_workers: 8,
            max_workers: 64,
            step: 8,
            target_up_ms: 250,
            target_down_ms: 200,
            latency_window: 2000,
            queue_capacity: 2048,
            idle_timeout: Duration::from_secs(60),
            cooldown: Duration::from_secs(20),
            tick: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("work queue full")]
    QueueFull,
    #[error("pool is shut down")]
    Closed,
}

struct Shared {
    cfg: PoolConfig,
    queue_tx: mpsc::Sender<Job>,
    queue_rx: tokio::sync::Mutex<mpsc::Receiver<Job>>,
    /// Size the controller currently wants.
    target: AtomicUsize,
    /// Workers currently alive.
    alive: AtomicUsize,
    /// Workers currently executing a job.
    active: AtomicUsize,
    latencies: Mutex<VecDeque<u64>>,
    last_scale: Mutex<Option<Instant>>,
}

/// Handle to the pool; cheap to clone.
#[derive(Clone)]
pub struct AdaptivePool {
    shared: Arc<Shared>,
}

impl AdaptivePool {
    pub fn new(cfg: PoolConfig) -> Self {
        assert!(cfg.min_workers >= 1, "pool needs at least one worker");
        assert!(cfg.min_workers <= cfg.max_workers, "min must not exceed max");

        let (queue_tx, queue_rx) = mpsc::channel(cfg.queue_capacity);
        let min = cfg.min_workers;
        let shared = Arc::new(Shared {
            cfg,
            queue_tx,
            queue_rx: tokio::sync::Mutex::new(queue_rx),
            target: AtomicUsize::new(min),
            alive: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            latencies: Mutex::new(VecDeque::new()),
            last_scale: Mutex::new(None),
        });

        let pool = Self { shared };
        for _ in 0..min {
            pool.shared.alive.fetch_add(1, Ordering::SeqCst);
            spawn_worker(pool.shared.clone());
        }
        tracing::info!(
            min = pool.shared.cfg.min_workers,
            max = pool.shared.cfg.max_workers,
            step = pool.shared.cfg.step,
            target_up_ms = pool.shared.cfg.target_up_ms,
            target_down_ms = pool.shared.cfg.target_down_ms,
            queue = pool.shared.cfg.queue_capacity,
            "adaptive pool initialized"
        );
        pool
    }

    /// Submit a task. Rejects synchronously when the queue is full.
    pub fn try_submit<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.shared
            .queue_tx
            .try_send(Box::pin(task))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => PoolError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => PoolError::Closed,
            })
    }

    /// Record one task latency into the bounded window.
    pub fn record_latency(&self, latency_ms: u64) {
        let mut window = self.shared.latencies.lock();
        window.push_back(latency_ms);
        while window.len() > self.shared.cfg.latency_window {
            window.pop_front();
        }
    }

    /// p95 over the current latency window; 0 when empty.
    pub fn p95(&self) -> u64 {
        let mut snapshot: Vec<u64> = self.shared.latencies.lock().iter().copied().collect();
        snapshot.sort_unstable();
        percentile(&snapshot, 0.95)
    }

    /// Current configured size (the controller's target).
    pub fn pool_size(&self) -> usize {
        self.shared.target.load(Ordering::SeqCst)
    }

    /// Workers alive right now (lags the target during lazy scale-down).
    pub fn alive_workers(&self) -> usize {
        self.shared.alive.load(Ordering::SeqCst)
    }

    /// Workers currently executing a job.
    pub fn active_workers(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Tasks accepted but not yet executing.
    pub fn queue_depth(&self) -> usize {
        self.shared.cfg.queue_capacity - self.shared.queue_tx.capacity()
    }

    /// Start the controller loop. The pool stops adapting when the returned
    /// handle is dropped or aborted.
    pub fn start_controller(&self) -> tokio::task::JoinHandle<()> {
        let pool = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(pool.shared.cfg.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of tokio's interval fires immediately; skip it
            // so the first evaluation sees a populated window.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                pool.controller_tick();
            }
        })
    }

    /// One controller evaluation: snapshot log plus at most one resize,
    /// subject to the cooldown. Ticks with an empty window are no-ops.
    pub fn controller_tick(&self) {
        let shared = &self.shared;
        if shared.latencies.lock().is_empty() {
            return;
        }

        let p95 = self.p95();
        let current = shared.target.load(Ordering::SeqCst);
        let active = shared.active.load(Ordering::SeqCst);
        let queue_depth = self.queue_depth();

        tracing::info!(
            p95_ms = p95,
            pool_size = current,
            max = shared.cfg.max_workers,
            active,
            queue_depth,
            "autoscaler snapshot"
        );

        let mut last_scale = shared.last_scale.lock();
        if let Some(at) = *last_scale {
            if at.elapsed() < shared.cfg.cooldown {
                return;
            }
        }

        if p95 > shared.cfg.target_up_ms && current < shared.cfg.max_workers {
            let new = (current + shared.cfg.step).min(shared.cfg.max_workers);
            shared.target.store(new, Ordering::SeqCst);
            let alive = shared.alive.load(Ordering::SeqCst);
            for _ in alive..new {
                shared.alive.fetch_add(1, Ordering::SeqCst);
                spawn_worker(shared.clone());
            }
            *last_scale = Some(Instant::now());
            tracing::info!(
                from = current,
                to = new,
                p95_ms = p95,
                target_ms = shared.cfg.target_up_ms,
                "scaling worker pool up"
            );
        } else if p95 < shared.cfg.target_down_ms
            && current > shared.cfg.min_workers
            && active < current * 7 / 10
        {
            let new = current
                .saturating_sub(shared.cfg.step)
                .max(shared.cfg.min_workers);
            shared.target.store(new, Ordering::SeqCst);
            *last_scale = Some(Instant::now());
            tracing::info!(
                from = current,
                to = new,
                p95_ms = p95,
                lower_ms = shared.cfg.target_down_ms,
                "scaling worker pool down"
            );
        }
    }
}

fn spawn_worker(shared: Arc<Shared>) {
    tokio::spawn(async move {
        loop {
            // Lazy downsize: leave once the controller wants fewer workers.
            let target = shared.target.load(Ordering::SeqCst);
            if try_retire(&shared, target) {
                return;
            }

            let job = {
                let recv = async {
                    let mut rx = shared.queue_rx.lock().await;
                    rx.recv().await
                };
                match tokio::time::timeout(shared.cfg.idle_timeout, recv).await {
                    Ok(Some(job)) => job,
                    Ok(None) => {
                        // Queue closed: pool dropped.
                        shared.alive.fetch_sub(1, Ordering::SeqCst);
                        return;
                    }
                    Err(_) => {
                        if try_retire(&shared, shared.cfg.min_workers) {
                            tracing::debug!("idle worker retired");
                            return;
                        }
                        continue;
                    }
                }
            };

            shared.active.fetch_add(1, Ordering::SeqCst);
            job.await;
            shared.active.fetch_sub(1, Ordering::SeqCst);
        }
    });
}

/// Decrement `alive` and report true iff it was above `floor`.
fn try_retire(shared: &Shared, floor: usize) -> bool {
    let mut alive = shared.alive.load(Ordering::SeqCst);
    while alive > floor {
        match shared
            .alive
            .compare_exchange(alive, alive - 1, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => return true,
            Err(current) => alive = current,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn small_cfg() -> PoolConfig {
        PoolConfig {
            min_workers: 2,
            max_workers: 8,
            step: 2,
            queue_capacity: 4,
            idle_timeout: Duration::from_millis(50),
            cooldown: Duration::from_millis(10),
            ..PoolConfig::default()
        }
    }

    #[tokio::test]
    async fn starts_at_min_and_executes_jobs() {
        let pool = AdaptivePool::new(small_cfg());
        assert_eq!(pool.pool_size(), 2);
        assert_eq!(pool.alive_workers(), 2);

        let counter = Arc::new(AtomicU32::new(0));
        for _ in 0..4 {
            // Queue capacity is 4, two workers drain it as we go.
            loop {
                let counter = counter.clone();
                let submitted = pool.try_submit(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
                match submitted {
                    Ok(()) => break,
                    Err(_) => tokio::time::sleep(Duration::from_millis(5)).await,
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn full_queue_rejects_synchronously() {
        let cfg = PoolConfig {
            min_workers: 1,
            max_workers: 1,
            queue_capacity: 2,
            ..small_cfg()
        };
        let pool = AdaptivePool::new(cfg);

        let gate = Arc::new(tokio::sync::Notify::new());
        {
            let gate = gate.clone();
            pool.try_submit(async move {
                gate.notified().await;
            })
            .unwrap();
        }
        // Let the single worker pull that job off the queue and park on it.
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Now fill the queue itself.
        for _ in 0..2 {
            let gate = gate.clone();
            pool.try_submit(async move {
                gate.notified().await;
            })
            .unwrap();
        }

        let err = pool.try_submit(async {}).unwrap_err();
        assert_eq!(err, PoolError::QueueFull);
        gate.notify_waiters();
    }

    #[tokio::test]
    async fn high_p95_scales_up_with_cooldown() {
        let mut cfg = small_cfg();
        cfg.cooldown = Duration::from_secs(60);
        let pool = AdaptivePool::new(cfg);

        for _ in 0..100 {
            pool.record_latency(400);
        }
        pool.controller_tick();
        assert_eq!(pool.pool_size(), 4);
        assert_eq!(pool.alive_workers(), 4);

        // Second tick lands inside the cooldown: no further resize.
        pool.controller_tick();
        assert_eq!(pool.pool_size(), 4);
    }

    #[tokio::test]
    async fn low_p95_scales_down_but_not_below_min() {
        let mut cfg = small_cfg();
        cfg.cooldown = Duration::from_millis(0);
        let pool = AdaptivePool::new(cfg);

        for _ in 0..100 {
            pool.record_latency(400);
        }
        pool.controller_tick();
        assert_eq!(pool.pool_size(), 4);

        {
            let mut window = pool.shared.latencies.lock();
            window.clear();
        }
        for _ in 0..100 {
            pool.record_latency(50);
        }
        pool.controller_tick();
        assert_eq!(pool.pool_size(), 2);
        pool.controller_tick();
        assert_eq!(pool.pool_size(), 2, "must not scale below min");
    }

    #[tokio::test]
    async fn empty_window_tick_is_a_noop() {
        let pool = AdaptivePool::new(small_cfg());
        pool.controller_tick();
        assert_eq!(pool.pool_size(), 2);
    }

    #[tokio::test]
    async fn idle_workers_above_min_retire() {
        let mut cfg = small_cfg();
        cfg.cooldown = Duration::from_millis(0);
        let pool = AdaptivePool::new(cfg);

        for _ in 0..100 {
            pool.record_latency(400);
        }
        pool.controller_tick();
        assert_eq!(pool.alive_workers(), 4);

        // Scale the target back down; idle workers drain to it.
        {
            let mut window = pool.shared.latencies.lock();
            window.clear();
        }
        for _ in 0..100 {
            pool.record_latency(50);
        }
        pool.controller_tick();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(pool.alive_workers(), 2);
    }

    #[tokio::test]
    async fn latency_window_is_bounded() {
        let mut cfg = small_cfg();
        cfg.latency_window = 10;
        let pool = AdaptivePool::new(cfg);
        for i in 0..100u64 {
            pool.record_latency(i);
        }
        assert_eq!(pool.shared.latencies.lock().len(), 10);
        // Only the newest samples (90..=99) survive.
        assert_eq!(pool.p95(), 99);
    }
}
