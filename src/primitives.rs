// ABOUTME: Shared building blocks used across the link, dispatcher and pipelines
// ABOUTME: A mutex-guarded single-slot cell, a frame-rate limiter/calculator, and a bandwidth monitor

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A single-slot typed holder behind a mutex.
///
/// Used for flags (`running`, `connected`) and for live-swappable strategy
/// objects. `get`/`set` acquire the mutex for the duration of one access;
/// `lock()` is available when a caller needs to hold it across a compound
/// read-modify-write without racing another accessor.
#[derive(Debug)]
pub struct MutexCell<T> {
    inner: Mutex<T>,
}

impl<T: Clone> MutexCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    pub fn get(&self) -> T {
        self.inner.lock().expect("MutexCell poisoned").clone()
    }

    pub fn set(&self, value: T) {
        *self.inner.lock().expect("MutexCell poisoned") = value;
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().expect("MutexCell poisoned")
    }
}

/// Paces a loop to a target frames-per-second rate.
///
/// `tick()` sleeps the remainder of `1/fps` since the previous tick. If the
/// prior iteration overran the period, no sleep occurs and the next tick
/// measures from the new start time.
#[derive(Debug)]
pub struct FrameRateLimiter {
    period: Duration,
    last_tick: Option<Instant>,
}

impl FrameRateLimiter {
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            period: Duration::from_secs_f64(1.0 / fps as f64),
            last_tick: None,
        }
    }

    pub fn set_fps(&mut self, fps: u32) {
        let fps = fps.max(1);
        self.period = Duration::from_secs_f64(1.0 / fps as f64);
    }

    /// Sleep until the next tick is due, then record the new tick time.
    pub async fn tick(&mut self) {
        if let Some(last) = self.last_tick {
            let elapsed = last.elapsed();
            if elapsed < self.period {
                tokio::time::sleep(self.period - elapsed).await;
            }
        }
        self.last_tick = Some(Instant::now());
    }
}

/// Sliding-window mean frames-per-second over the inter-tick durations of
/// the last `interval` seconds.
#[derive(Debug)]
pub struct FrameRateCalculator {
    interval: Duration,
    last_tick: Option<Instant>,
    samples: VecDeque<(Instant, Duration)>,
}

impl FrameRateCalculator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
            samples: VecDeque::new(),
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_tick {
            self.samples.push_back((now, now.duration_since(last)));
            self.evict_before(now);
        }
        self.last_tick = Some(now);
    }

    fn evict_before(&mut self, now: Instant) {
        while let Some((ts, _)) = self.samples.front() {
            if now.duration_since(*ts) > self.interval {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Mean rate in ticks/second over the retained window, or 0.0 if fewer
    /// than two ticks have been recorded.
    pub fn rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().map(|(_, d)| *d).sum();
        if total.is_zero() {
            return 0.0;
        }
        self.samples.len() as f64 / total.as_secs_f64()
    }
}

/// A sliding window of `(timestamp, bytes)` samples used to estimate
/// throughput over the trailing `window` duration.
#[derive(Debug)]
pub struct BandwidthMonitor {
    window: Duration,
    samples: VecDeque<(Instant, u64)>,
}

impl BandwidthMonitor {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn register(&mut self, bytes: u64) {
        let now = Instant::now();
        self.samples.push_back((now, bytes));
        while let Some((ts, _)) = self.samples.front() {
            if now.duration_since(*ts) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Bytes per second: `sum(bytes) / (latest - earliest)` when at least
    /// two samples are held, else `sum(bytes) / 1`.
    pub fn bandwidth(&self) -> u64 {
        let total: u64 = self.samples.iter().map(|(_, b)| *b).sum();
        if self.samples.len() < 2 {
            return total;
        }
        let earliest = self.samples.front().unwrap().0;
        let latest = self.samples.back().unwrap().0;
        let elapsed = latest.duration_since(earliest).as_secs_f64().max(1.0 / 1000.0);
        (total as f64 / elapsed) as u64
    }

    pub fn bandwidth_str(&self) -> String {
        BandwidthFormatter::format(self.bandwidth())
    }
}

/// Renders a bytes/second rate as a human-readable string. Diagnostics
/// only — never placed on the wire.
pub struct BandwidthFormatter;

impl BandwidthFormatter {
    pub fn format(bandwidth: u64) -> String {
        const KILO: u64 = 1_000;
        const MEGA: u64 = 1_000_000;
        const GIGA: u64 = 1_000_000_000;

        if bandwidth < KILO {
            format!("{bandwidth} Bps")
        } else if bandwidth < MEGA {
            format!("{:.0} Kbps", bandwidth as f64 / KILO as f64)
        } else if bandwidth < GIGA {
            format!("{:.0} Mbps", bandwidth as f64 / MEGA as f64)
        } else {
            format!("{:.0} Gbps", bandwidth as f64 / GIGA as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutex_cell_get_set() {
        let cell = MutexCell::new(false);
        assert!(!cell.get());
        cell.set(true);
        assert!(cell.get());
    }

    #[test]
    fn mutex_cell_scoped_guard_sees_compound_update() {
        let cell = MutexCell::new(0_i32);
        {
            let mut guard = cell.lock();
            *guard += 1;
            *guard += 1;
        }
        assert_eq!(cell.get(), 2);
    }

    #[tokio::test]
    async fn frame_rate_limiter_sleeps_remainder_of_period() {
        let mut limiter = FrameRateLimiter::new(100);
        let start = Instant::now();
        limiter.tick().await;
        limiter.tick().await;
        assert!(start.elapsed() >= Duration::from_millis(9));
    }

    #[test]
    fn bandwidth_monitor_single_sample_divides_by_one() {
        let mut monitor = BandwidthMonitor::new(Duration::from_secs(60));
        monitor.register(1000);
        assert_eq!(monitor.bandwidth(), 1000);
    }

    #[test]
    fn bandwidth_monitor_evicts_old_samples() {
        let mut monitor = BandwidthMonitor::new(Duration::from_millis(20));
        monitor.register(1000);
        std::thread::sleep(Duration::from_millis(30));
        monitor.register(2000);
        // the first sample should have aged out, leaving only the second
        assert_eq!(monitor.samples.len(), 1);
    }

    #[test]
    fn bandwidth_formatter_thresholds() {
        assert_eq!(BandwidthFormatter::format(500), "500 Bps");
        assert_eq!(BandwidthFormatter::format(1_500), "2 Kbps");
        assert_eq!(BandwidthFormatter::format(2_500_000), "3 Mbps");
        assert_eq!(BandwidthFormatter::format(4_000_000_000), "4 Gbps");
    }

    #[test]
    fn frame_rate_calculator_reports_zero_before_two_ticks() {
        let mut calc = FrameRateCalculator::new(Duration::from_secs(1));
        assert_eq!(calc.rate(), 0.0);
        calc.tick();
        assert_eq!(calc.rate(), 0.0);
    }
}
