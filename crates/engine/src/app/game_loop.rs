use std::time::{Duration, Instant};

use tracing::debug;

use super::engine::Engine;
use super::input::InputCollector;
use super::metrics::{FpsCounter, LoopMetricsSnapshot};
use super::rendering::Canvas;

/// Fixed-step gate for a host that calls back faster than the tick rate.
/// A callback is accepted only once strictly more than one interval has
/// passed; the overshoot is carried into the next interval.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last_accepted: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(target_tps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(target_tps.max(1))),
            last_accepted: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn accept(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_accepted else {
            self.last_accepted = Some(now);
            return true;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed <= self.interval {
            return false;
        }
        let interval_nanos = self.interval.as_nanos().max(1);
        let remainder = Duration::from_nanos((elapsed.as_nanos() % interval_nanos) as u64);
        self.last_accepted = Some(now.checked_sub(remainder).unwrap_or(now));
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Callback arrived before the next tick was due.
    Skipped,
    Updated,
    /// Window unfocused: nothing advanced, paused overlay drawn.
    Paused,
}

/// Drives an [`Engine`] from host callbacks: throttle, focus policy, update,
/// draw.
#[derive(Debug)]
pub struct GameLoop {
    engine: Engine,
    throttle: FrameThrottle,
    fps: FpsCounter,
    run_unfocused: bool,
    latest_metrics: Option<LoopMetricsSnapshot>,
}

impl GameLoop {
    pub fn new(engine: Engine, target_tps: u32, run_unfocused: bool, now: Instant) -> Self {
        Self {
            engine,
            throttle: FrameThrottle::new(target_tps),
            fps: FpsCounter::new(now, Duration::from_secs(1)),
            run_unfocused,
            latest_metrics: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn frame(
        &mut self,
        now: Instant,
        focused: bool,
        input: &mut InputCollector,
        canvas: &mut Canvas,
    ) -> FrameOutcome {
        self.fps.record_callback();
        if !self.throttle.accept(now) {
            return FrameOutcome::Skipped;
        }

        let started = Instant::now();
        let outcome = if focused || self.run_unfocused {
            self.engine.resume_audio();
            let snapshot = input.snapshot_for_tick();
            self.engine.tick(&snapshot);
            FrameOutcome::Updated
        } else {
            self.engine.suspend_audio();
            FrameOutcome::Paused
        };
        self.engine.draw(canvas, outcome == FrameOutcome::Paused);
        self.fps.record_tick(started.elapsed());

        if let Some(snapshot) = self.fps.maybe_snapshot(now) {
            debug!(fps = snapshot.fps, "fps_sampled");
            self.engine.set_fps(snapshot.fps);
            self.latest_metrics = Some(snapshot);
        }
        outcome
    }

    /// Metrics sampled since the last call, at most once per second.
    pub fn take_metrics(&mut self) -> Option<LoopMetricsSnapshot> {
        self.latest_metrics.take()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn first_callback_is_always_accepted() {
        let mut throttle = FrameThrottle::new(60);
        assert!(throttle.accept(Instant::now()));
    }

    #[test]
    fn callbacks_within_interval_are_skipped() {
        let base = Instant::now();
        let mut throttle = FrameThrottle::new(60);
        assert!(throttle.accept(base));
        assert!(!throttle.accept(base + Duration::from_millis(10)));
        assert!(!throttle.accept(base + throttle.interval()));
        assert!(throttle.accept(base + Duration::from_millis(17)));
    }

    #[test]
    fn fast_host_still_ticks_at_target_rate() {
        let base = Instant::now();
        let mut throttle = FrameThrottle::new(60);
        let step = Duration::from_micros(4167);
        let accepted = (0..240u32)
            .filter(|i| throttle.accept(base + step * *i))
            .count();
        assert!((59..=61).contains(&accepted), "accepted {accepted}");
    }

    #[test]
    fn remainder_is_carried_forward() {
        let base = Instant::now();
        let mut throttle = FrameThrottle::new(100);
        assert!(throttle.accept(base));
        assert!(throttle.accept(base + Duration::from_millis(15)));
        // Last accepted was pulled back to 10ms, so 20.5ms is due.
        assert!(throttle.accept(base + Duration::from_micros(20_500)));
    }

    #[test]
    fn unfocused_frames_pause_updates_but_still_draw() {
        let mut game_loop = GameLoop::new(Engine::headless(8, 8), 60, false, Instant::now());
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        game_loop
            .engine_mut()
            .delay(move |_: &mut Engine| flag.set(true), 0);

        let mut input = InputCollector::new();
        let mut canvas = Canvas::new(8, 8);
        let base = Instant::now();
        let step = Duration::from_millis(20);
        for i in 0..3u32 {
            let outcome = game_loop.frame(base + step * i, false, &mut input, &mut canvas);
            assert_eq!(outcome, FrameOutcome::Paused);
        }
        assert_eq!(game_loop.engine().tick_count(), 0);
        assert!(!fired.get());
        assert!(game_loop.engine().is_audio_suspended());
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));

        let outcome = game_loop.frame(base + step * 3, true, &mut input, &mut canvas);
        assert_eq!(outcome, FrameOutcome::Updated);
        assert_eq!(game_loop.engine().tick_count(), 1);
        assert!(fired.get());
        assert!(!game_loop.engine().is_audio_suspended());
    }

    #[test]
    fn run_unfocused_keeps_ticking() {
        let mut game_loop = GameLoop::new(Engine::headless(8, 8), 60, true, Instant::now());
        let mut input = InputCollector::new();
        let mut canvas = Canvas::new(8, 8);
        let outcome = game_loop.frame(Instant::now(), false, &mut input, &mut canvas);
        assert_eq!(outcome, FrameOutcome::Updated);
        assert_eq!(game_loop.engine().tick_count(), 1);
    }
}
