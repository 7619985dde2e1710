use std::time::Duration;

use scenescript_events::PerformanceSample;

/// Ring buffer of recent frame durations.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; capacity.max(1)],
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.history.len();
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn recorded(&self) -> &[Duration] {
        if self.filled {
            &self.history
        } else {
            &self.history[..self.index]
        }
    }

    pub fn count(&self) -> usize {
        self.recorded().len()
    }

    pub fn average(&self) -> Duration {
        let recorded = self.recorded();
        if recorded.is_empty() {
            return Duration::ZERO;
        }
        recorded.iter().sum::<Duration>() / recorded.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.recorded()
            .iter()
            .copied()
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

/// Turns frame durations into a [`PerformanceSample`] every `interval` frames.
#[derive(Debug)]
pub struct PerformanceSampler {
    timer: FrameTimer,
    interval: u64,
    frames: u64,
}

impl PerformanceSampler {
    pub fn new(history: usize, interval: u32) -> Self {
        Self {
            timer: FrameTimer::new(history),
            interval: u64::from(interval),
            frames: 0,
        }
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Record one frame. Returns a sample when the interval elapses; an
    /// interval of zero never samples.
    pub fn record(&mut self, dt: Duration) -> Option<PerformanceSample> {
        self.timer.record(dt);
        self.frames += 1;
        if self.interval == 0 || self.frames % self.interval != 0 {
            return None;
        }
        let avg = self.timer.average().as_secs_f32();
        Some(PerformanceSample {
            frame: self.frames,
            fps: if avg > 0.0 { 1.0 / avg } else { 0.0 },
            avg_frame_ms: avg * 1000.0,
            max_frame_ms: self.timer.max().as_secs_f32() * 1000.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_timer_tracks_history() {
        let mut timer = FrameTimer::new(3);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.max(), Duration::from_millis(30));
    }

    #[test]
    fn frame_timer_wraps_around() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
    }

    #[test]
    fn empty_timer_reports_zero() {
        let timer = FrameTimer::new(0);
        assert_eq!(timer.count(), 0);
        assert_eq!(timer.average(), Duration::ZERO);
    }

    #[test]
    fn sampler_emits_on_interval() {
        let mut sampler = PerformanceSampler::new(8, 2);
        assert!(sampler.record(Duration::from_millis(20)).is_none());
        let sample = sampler.record(Duration::from_millis(20)).unwrap();
        assert_eq!(sample.frame, 2);
        assert!((sample.fps - 50.0).abs() < 0.01);
        assert!((sample.avg_frame_ms - 20.0).abs() < 0.01);
    }

    #[test]
    fn zero_interval_disables_sampling() {
        let mut sampler = PerformanceSampler::new(8, 0);
        for _ in 0..10 {
            assert!(sampler.record(Duration::from_millis(16)).is_none());
        }
        assert_eq!(sampler.timer().count(), 8);
    }
}
