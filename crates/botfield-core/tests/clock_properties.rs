//! Property tests for the frame clock and the simulation/render gate.
//!
//! Random tick sequences come from a seeded `StdRng`, so failures replay.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use botfield_core::clock::{Clock, ManualTimeSource};
use botfield_core::frame_gate::{FrameGate, RenderSnapshot};
use botfield_core::graphics::{run_render_loop, HeadlessDevice};

// ── Helpers ────────────────────────────────────────────────────────────

fn manual_clock() -> (Clock, ManualTimeSource) {
    let source = ManualTimeSource::new();
    (Clock::new(Box::new(source.clone())), source)
}

// ── Monotonicity ───────────────────────────────────────────────────────

#[test]
fn absolute_times_never_decrease() {
    let (mut clock, source) = manual_clock();
    let mut rng = StdRng::seed_from_u64(42);
    let mut last_real = 0;
    let mut last_exact = 0;

    for _ in 0..2_000 {
        match rng.gen_range(0..10) {
            0 => clock.set_speed(rng.gen_range(0.0..8.0)),
            1 => clock.suspend(),
            2 => clock.resume(),
            _ => {}
        }
        source.advance_ns(rng.gen_range(0..50_000_000));
        let times = clock.tick();
        assert!(times.real_abs_ns >= last_real);
        assert!(times.exact_abs_ns >= last_exact);
        last_real = times.real_abs_ns;
        last_exact = times.exact_abs_ns;
    }
}

#[test]
fn scaled_time_integrates_speed() {
    let (mut clock, source) = manual_clock();
    let mut rng = StdRng::seed_from_u64(7);
    let mut expected = 0.0f64;

    for _ in 0..500 {
        let speed = rng.gen_range(0.0..4.0f32);
        clock.set_speed(speed);
        let step = rng.gen_range(1_000_000..20_000_000i64);
        source.advance_ns(step);
        clock.tick();
        expected += step as f64 * speed as f64;
    }
    let error = (clock.exact_abs_ns() as f64 - expected).abs();
    // One nanosecond of rounding per rebase at most
    assert!(error <= 500.0, "drift of {} ns", error);
}

// ── Suspend / resume ───────────────────────────────────────────────────

#[test]
fn suspend_resume_without_tick_changes_nothing() {
    let (mut clock, source) = manual_clock();
    source.advance_ms(250);
    clock.tick();
    let before = clock.times();

    clock.suspend();
    clock.resume();
    assert_eq!(clock.times(), before);

    source.advance_ms(100);
    let times = clock.tick();
    assert_eq!(times.exact_abs_ns, before.exact_abs_ns + 100_000_000);
}

#[test]
fn real_time_ignores_suspension() {
    let (mut clock, source) = manual_clock();
    clock.suspend();
    for _ in 0..10 {
        source.advance_ms(10);
        clock.tick();
    }
    assert_eq!(clock.real_abs_ns(), 100_000_000);
    assert_eq!(clock.exact_abs_ns(), 0);
}

#[test]
fn load_time_is_not_seen_as_a_frame() {
    let (mut clock, source) = manual_clock();
    source.advance_ms(20);
    clock.tick();
    source.advance_secs(5.0);
    clock.reset_time_after_loading();
    source.advance_ms(16);
    let times = clock.tick();
    assert_eq!(times.real_rel_ns, 16_000_000);
    assert_eq!(times.exact_rel_ns, 16_000_000);
}

// ── Frame gate ─────────────────────────────────────────────────────────

#[test]
fn render_thread_sees_every_requested_frame_in_order() {
    let gate = Arc::new(FrameGate::new());
    let render_gate = Arc::clone(&gate);
    let renderer = std::thread::spawn(move || {
        let mut device = HeadlessDevice::new();
        let frames = run_render_loop(&render_gate, &mut device);
        (frames, device.frames)
    });

    for _ in 0..20 {
        let frame = gate.request_frame(RenderSnapshot::default());
        assert!(gate.wait_finished_timeout(frame, Duration::from_secs(5)));
        assert_eq!(gate.last_rendered(), frame);
    }
    gate.close();
    let (served, drawn) = renderer.join().unwrap();
    assert_eq!(served, 20);
    assert_eq!(drawn, 20);
}
