use std::time::{Duration, Instant};

/// Per-frame callback. Registered once with a [`FrameScheduler`]; ticks never
/// overlap because the scheduler owns the target and takes `&mut self`.
pub trait FrameTick {
    fn tick(&mut self, dt: Duration);
}

/// Measures elapsed time between display refreshes.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_refresh: Option<Instant>,
    max_frame_delta: Duration,
}

impl FrameClock {
    pub fn new(max_frame_delta: Duration) -> Self {
        Self {
            last_refresh: None,
            max_frame_delta,
        }
    }

    /// Returns the clamped time since the previous call. The first call and a
    /// clock that went backwards both yield zero.
    pub fn advance(&mut self, now: Instant) -> Duration {
        let raw = match self.last_refresh {
            Some(previous) => now.saturating_duration_since(previous),
            None => Duration::ZERO,
        };
        if self.last_refresh.map_or(true, |previous| now >= previous) {
            self.last_refresh = Some(now);
        }
        clamp_frame_delta(raw, self.max_frame_delta)
    }
}

pub struct FrameScheduler<T: FrameTick> {
    clock: FrameClock,
    target: T,
}

impl<T: FrameTick> FrameScheduler<T> {
    pub fn new(target: T, max_frame_delta: Duration) -> Self {
        Self {
            clock: FrameClock::new(max_frame_delta),
            target,
        }
    }

    pub fn on_display_refresh(&mut self, now: Instant) -> Duration {
        let dt = self.clock.advance(now);
        self.target.tick(dt);
        dt
    }

    #[cfg(test)]
    pub(crate) fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }
}

pub(crate) fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}
