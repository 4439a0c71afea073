//! Traffic and system metrics feeding the autoscaler endpoint.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// One finished request observation.
#[derive(Debug, Clone, Copy)]
struct RequestSample {
    at: Instant,
    latency_ms: u64,
    success: bool,
}

/// Rolling request window with two bounds: sample age and sample count.
/// Eviction drops the oldest sample under either bound.
pub struct TrafficMetrics {
    window: Duration,
    max_samples: usize,
    samples: Mutex<VecDeque<RequestSample>>,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
}

/// Derived view over the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficSnapshot {
    pub rps: f64,
    pub error_rate: f64,
    pub p50_latency: u64,
    pub p95_latency: u64,
    pub p99_latency: u64,
}

impl TrafficMetrics {
    pub fn new(window: Duration, max_samples: usize) -> Self {
        Self {
            window,
            max_samples,
            samples: Mutex::new(VecDeque::with_capacity(max_samples)),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
        }
    }

    /// 60 s / 1000 samples, the autoscaler contract defaults.
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(60), 1000)
    }

    pub fn record(&self, latency_ms: u64, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }

        let now = Instant::now();
        let mut samples = self.samples.lock();
        samples.push_back(RequestSample {
            at: now,
            latency_ms,
            success,
        });
        while samples.len() > self.max_samples {
            samples.pop_front();
        }
        while let Some(front) = samples.front() {
            if now.duration_since(front.at) > self.window {
                samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn snapshot(&self) -> TrafficSnapshot {
        let now = Instant::now();
        let samples = self.samples.lock();
        let recent: Vec<RequestSample> = samples
            .iter()
            .filter(|s| now.duration_since(s.at) <= self.window)
            .copied()
            .collect();
        drop(samples);

        if recent.is_empty() {
            return TrafficSnapshot {
                rps: 0.0,
                error_rate: 0.0,
                p50_latency: 0,
                p95_latency: 0,
                p99_latency: 0,
            };
        }

        let failures = recent.iter().filter(|s| !s.success).count();
        let mut latencies: Vec<u64> = recent.iter().map(|s| s.latency_ms).collect();
        latencies.sort_unstable();

        TrafficSnapshot {
            rps: recent.len() as f64 / self.window.as_secs_f64(),
            error_rate: failures as f64 / recent.len() as f64 * 100.0,
            p50_latency: percentile(&latencies, 0.50),
            p95_latency: percentile(&latencies, 0.95),
            p99_latency: percentile(&latencies, 0.99),
        }
    }

    /// Monotonic process-lifetime counters: (requests, errors).
    pub fn totals(&self) -> (u64, u64) {
        (
            self.total_requests.load(Ordering::Relaxed),
            self.total_errors.load(Ordering::Relaxed),
        )
    }
}

/// Nearest-rank percentile over an already-sorted slice.
pub fn percentile(sorted: &[u64], q: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (sorted.len() as f64 * q).ceil() as usize;
    let idx = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}

/// Process CPU, memory, and host load average, read once per query.
pub struct SystemMetrics {
    sys: Mutex<sysinfo::System>,
    pid: sysinfo::Pid,
    cores: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SystemSample {
    /// Process CPU as a percentage of total machine capacity, 0-100.
    pub cpu_usage: f64,
    /// Process memory as a percentage of total machine memory, 0-100.
    pub memory_usage: f64,
    /// 1-minute load average.
    pub load_average: f64,
}

impl SystemMetrics {
    pub fn new() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            sys: Mutex::new(sysinfo::System::new()),
            pid: sysinfo::Pid::from_u32(std::process::id()),
            cores,
        }
    }

    pub fn sample(&self) -> SystemSample {
        let mut sys = self.sys.lock();
        sys.refresh_memory();
        sys.refresh_process(self.pid);

        let (cpu, process_memory) = sys
            .process(self.pid)
            .map(|p| (p.cpu_usage() as f64, p.memory()))
            .unwrap_or((0.0, 0));
        let total_memory = sys.total_memory();

        SystemSample {
            cpu_usage: cpu / self.cores as f64,
            memory_usage: if total_memory > 0 {
                process_memory as f64 / total_memory as f64 * 100.0
            } else {
                0.0
            },
            load_average: sysinfo::System::load_average().one,
        }
    }
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::new()
    }
}
