use super::engine::Engine;
use super::room::FadeConfig;
use crate::schedule::ScheduledTask;

pub const FADE_VISIBLE: f32 = 100.0;

/// Frame-exact fade curve. The pause is folded into a negative floor, so a
/// fade-out keeps falling below zero for `pause` extra ticks and a fade-in
/// starts that far below zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeRamp {
    length: u32,
    pause: u32,
}

impl FadeRamp {
    pub fn new(config: &FadeConfig) -> Self {
        Self {
            length: config.length_frames.max(1),
            pause: config.pause_frames,
        }
    }

    pub fn rate(&self) -> f32 {
        FADE_VISIBLE / self.length as f32
    }

    pub fn floor(&self) -> f32 {
        -(self.pause as f32) * self.rate()
    }

    pub fn total_frames(&self) -> u32 {
        self.length + self.pause
    }

    pub fn out_level(&self, elapsed: u32) -> f32 {
        if elapsed >= self.total_frames() {
            return self.floor();
        }
        (FADE_VISIBLE - elapsed as f32 * self.rate()).max(self.floor())
    }

    pub fn in_level(&self, elapsed: u32) -> f32 {
        if elapsed >= self.total_frames() {
            return FADE_VISIBLE;
        }
        (self.floor() + elapsed as f32 * self.rate()).min(FADE_VISIBLE)
    }
}

/// Overlay opacity for a fade level: 0 when fully visible, 1 at or below 0.
pub fn overlay_alpha(level: f32) -> f32 {
    (FADE_VISIBLE - level.clamp(0.0, FADE_VISIBLE)) / FADE_VISIBLE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

/// Per-tick fade driver registered with the scheduler.
#[derive(Debug)]
pub(crate) struct FadeTask {
    ramp: FadeRamp,
    direction: FadeDirection,
    elapsed: u32,
}

impl FadeTask {
    pub(crate) fn new(ramp: FadeRamp, direction: FadeDirection) -> Self {
        Self {
            ramp,
            direction,
            elapsed: 0,
        }
    }
}

impl ScheduledTask for FadeTask {
    fn run(&mut self, engine: &mut Engine) {
        self.elapsed += 1;
        engine.transition.fade_level = match self.direction {
            FadeDirection::In => self.ramp.in_level(self.elapsed),
            FadeDirection::Out => self.ramp.out_level(self.elapsed),
        };
        if self.elapsed >= self.ramp.total_frames() {
            engine.finish_fade(self.direction);
        }
    }
}
