use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub snapshots_per_second: f32,
    /// Mean time spent interpolating and rendering one frame.
    pub frame_time_ms: f32,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    snapshots: u32,
    frame_work_sum: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            frames: 0,
            snapshots: 0,
            frame_work_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_work: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_work_sum = self.frame_work_sum.saturating_add(frame_work);
    }

    pub(crate) fn record_snapshots(&mut self, count: usize) {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.snapshots = self.snapshots.saturating_add(count);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_work_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            snapshots_per_second: self.snapshots as f32 / elapsed_seconds,
            frame_time_ms,
        };

        self.interval_start = now;
        self.frames = 0;
        self.snapshots = 0;
        self.frame_work_sum = Duration::ZERO;

        Some(snapshot)
    }
}
