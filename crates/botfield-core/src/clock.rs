//! Frame clock - real and scaled simulation time.
//!
//! The clock samples a monotonic [`TimeSource`] once per [`Clock::tick`] and
//! derives two timelines from it:
//!
//! - **real** time: wall-clock nanoseconds, never scaled or frozen
//! - **exact** (simulation) time: real time multiplied by the current speed,
//!   frozen while the simulation is suspended
//!
//! Both timelines are kept as "base + elapsed since base stamp". Changing the
//! speed, resuming, or resetting after a load moves the base so earlier
//! accumulated time is never rescaled.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic nanosecond source
pub trait TimeSource: Send + Sync {
    fn now_ns(&self) -> i64;
}

/// Wall clock backed by `std::time::Instant`
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ns(&self) -> i64 {
        self.origin.elapsed().as_nanos() as i64
    }
}

/// Hand-driven time source for tests and the headless harness.
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Arc<AtomicI64>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ns(&self, ns: i64) {
        self.now.fetch_add(ns.max(0), Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.advance_ns(ms * 1_000_000);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance_ns((secs * 1e9) as i64);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ns(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Times produced by one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTimes {
    pub real_rel_ns: i64,
    pub real_abs_ns: i64,
    pub exact_rel_ns: i64,
    pub exact_abs_ns: i64,
    /// Scaled relative time in seconds
    pub rel_time: f32,
    /// Scaled absolute time in seconds
    pub abs_time: f32,
}

/// Real/simulation time bookkeeping for the main loop
pub struct Clock {
    source: Box<dyn TimeSource>,

    // Stamps of the current and previous tick
    last_stamp: i64,
    cur_stamp: i64,

    real_base_stamp: i64,
    real_abs_base: i64,
    real_abs: i64,
    real_rel: i64,

    sim_base_stamp: i64,
    exact_abs_base: i64,
    exact_abs: i64,
    exact_rel: i64,

    speed: f32,
    suspended: bool,
}

impl Clock {
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        let now = source.now_ns();
        Self {
            source,
            last_stamp: now,
            cur_stamp: now,
            real_base_stamp: now,
            real_abs_base: 0,
            real_abs: 0,
            real_rel: 0,
            sim_base_stamp: now,
            exact_abs_base: 0,
            exact_abs: 0,
            exact_rel: 0,
            speed: 1.0,
            suspended: false,
        }
    }

    /// Clock driven by the system monotonic clock
    pub fn system() -> Self {
        Self::new(Box::new(SystemTimeSource::new()))
    }

    /// Samples the time source and updates both timelines
    pub fn tick(&mut self) -> FrameTimes {
        let now = self.source.now_ns().max(self.cur_stamp);
        self.last_stamp = self.cur_stamp;
        self.cur_stamp = now;

        self.real_rel = self.cur_stamp - self.last_stamp;
        self.real_abs = self.real_abs_base + (self.cur_stamp - self.real_base_stamp);

        if self.suspended {
            self.exact_rel = 0;
        } else {
            let elapsed = (self.cur_stamp - self.sim_base_stamp) as f64 * self.speed as f64;
            let abs = self.exact_abs_base + elapsed as i64;
            // Rounding after a rebase must never step backwards
            let abs = abs.max(self.exact_abs);
            self.exact_rel = abs - self.exact_abs;
            self.exact_abs = abs;
        }

        self.times()
    }

    /// Current times without sampling the source
    pub fn times(&self) -> FrameTimes {
        FrameTimes {
            real_rel_ns: self.real_rel,
            real_abs_ns: self.real_abs,
            exact_rel_ns: self.exact_rel,
            exact_abs_ns: self.exact_abs,
            rel_time: self.exact_rel as f32 / 1e9,
            abs_time: self.exact_abs as f32 / 1e9,
        }
    }

    /// Sets the simulation speed multiplier. Already accumulated simulation
    /// time is kept; only time after the last tick is scaled by the new value.
    pub fn set_speed(&mut self, speed: f32) {
        let speed = if speed.is_finite() { speed.max(0.0) } else { 1.0 };
        self.sim_base_stamp = self.cur_stamp;
        self.exact_abs_base = self.exact_abs;
        self.speed = speed;
        log::debug!("Simulation speed set to {:.2}", speed);
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Freezes simulation time. Real time keeps running.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Unfreezes simulation time without a jump
    pub fn resume(&mut self) {
        if !self.suspended {
            return;
        }
        self.suspended = false;
        self.sim_base_stamp = self.source.now_ns().max(self.cur_stamp);
        self.exact_abs_base = self.exact_abs;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Rebases both timelines so the first frame after a slow load does not
    /// see the load duration as elapsed time
    pub fn reset_time_after_loading(&mut self) {
        let now = self.source.now_ns().max(self.cur_stamp);
        self.last_stamp = now;
        self.cur_stamp = now;

        self.real_base_stamp = now;
        self.real_abs_base = self.real_abs;
        self.real_rel = 0;

        self.sim_base_stamp = now;
        self.exact_abs_base = self.exact_abs;
        self.exact_rel = 0;
    }

    pub fn real_abs_ns(&self) -> i64 {
        self.real_abs
    }

    pub fn real_rel_ns(&self) -> i64 {
        self.real_rel
    }

    pub fn exact_abs_ns(&self) -> i64 {
        self.exact_abs
    }

    pub fn exact_rel_ns(&self) -> i64 {
        self.exact_rel
    }

    pub fn abs_time(&self) -> f32 {
        self.exact_abs as f32 / 1e9
    }

    pub fn rel_time(&self) -> f32 {
        self.exact_rel as f32 / 1e9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_clock() -> (Clock, ManualTimeSource) {
        let source = ManualTimeSource::new();
        (Clock::new(Box::new(source.clone())), source)
    }

    #[test]
    fn test_tick_real_and_scaled() {
        let (mut clock, src) = manual_clock();
        src.advance_ms(100);
        let t = clock.tick();
        assert_eq!(t.real_rel_ns, 100_000_000);
        assert_eq!(t.exact_rel_ns, 100_000_000);
        assert!((t.rel_time - 0.1).abs() < 1e-6);

        clock.set_speed(2.0);
        src.advance_ms(100);
        let t = clock.tick();
        assert_eq!(t.real_abs_ns, 200_000_000);
        assert_eq!(t.exact_rel_ns, 200_000_000);
        assert_eq!(t.exact_abs_ns, 300_000_000);
    }

    #[test]
    fn test_speed_change_not_retroactive() {
        let (mut clock, src) = manual_clock();
        src.advance_secs(1.0);
        clock.tick();
        clock.set_speed(4.0);
        assert_eq!(clock.exact_abs_ns(), 1_000_000_000);
        src.advance_secs(0.5);
        clock.tick();
        assert_eq!(clock.exact_abs_ns(), 3_000_000_000);
    }

    #[test]
    fn test_suspend_freezes_simulation_only() {
        let (mut clock, src) = manual_clock();
        src.advance_ms(50);
        clock.tick();
        clock.suspend();
        src.advance_ms(500);
        let t = clock.tick();
        assert_eq!(t.exact_rel_ns, 0);
        assert_eq!(t.exact_abs_ns, 50_000_000);
        assert_eq!(t.real_abs_ns, 550_000_000);

        clock.resume();
        src.advance_ms(10);
        let t = clock.tick();
        assert_eq!(t.exact_rel_ns, 10_000_000);
        assert_eq!(t.exact_abs_ns, 60_000_000);
    }

    #[test]
    fn test_suspend_resume_without_tick_is_noop() {
        let (mut clock, src) = manual_clock();
        src.advance_ms(30);
        clock.tick();
        let before = clock.times();
        clock.suspend();
        clock.resume();
        assert_eq!(clock.times(), before);
    }

    #[test]
    fn test_reset_after_loading_hides_load_time() {
        let (mut clock, src) = manual_clock();
        src.advance_ms(20);
        clock.tick();
        // Slow load
        src.advance_secs(5.0);
        clock.reset_time_after_loading();
        src.advance_ms(16);
        let t = clock.tick();
        assert_eq!(t.exact_rel_ns, 16_000_000);
        assert_eq!(t.real_rel_ns, 16_000_000);
        assert_eq!(t.exact_abs_ns, 36_000_000);
        assert_eq!(t.real_abs_ns, 36_000_000);
    }

    #[test]
    fn test_negative_speed_clamped() {
        let (mut clock, src) = manual_clock();
        clock.set_speed(-3.0);
        assert_eq!(clock.speed(), 0.0);
        src.advance_ms(100);
        assert_eq!(clock.tick().exact_rel_ns, 0);
    }
}
