//! Sampling schedule over a video's duration.

use vwatch_models::SampleOffset;

use crate::error::{PipelineError, PipelineResult};

/// Lazy, finite sequence of sample offsets `0, i, 2i, ...` below the duration.
///
/// The offset count is `ceil(duration / interval)`. Offsets are computed as
/// `index * interval` rather than by repeated addition so rounding error does
/// not accumulate.
#[derive(Debug, Clone)]
pub struct SampleSchedule {
    duration: f64,
    interval: f64,
    next_index: u64,
    count: u64,
}

impl SampleSchedule {
    /// Build a schedule, rejecting unknown or unusable durations up front.
    pub fn new(duration: Option<f64>, interval: f64) -> PipelineResult<Self> {
        let duration = match duration {
            Some(d) if d.is_finite() && d > 0.0 => d,
            other => return Err(PipelineError::InvalidDuration(other)),
        };
        if !(interval.is_finite() && interval > 0.0) {
            return Err(PipelineError::InvalidInterval(interval));
        }

        let mut count = (duration / interval).ceil() as u64;
        // d / i can land a hair above an integer
        while count > 1 && (count - 1) as f64 * interval >= duration {
            count -= 1;
        }

        Ok(Self {
            duration,
            interval,
            next_index: 0,
            count,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Total number of offsets in the schedule.
    pub fn total(&self) -> u64 {
        self.count
    }

    /// Progress fraction once `offset` has been handled.
    pub fn progress_after(&self, offset: SampleOffset) -> f64 {
        (offset.seconds() / self.duration).clamp(0.0, 1.0)
    }
}

impl Iterator for SampleSchedule {
    type Item = SampleOffset;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.count {
            return None;
        }
        let seconds = self.next_index as f64 * self.interval;
        if seconds >= self.duration {
            self.next_index = self.count;
            return None;
        }
        self.next_index += 1;
        Some(SampleOffset::new(seconds))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count.saturating_sub(self.next_index) as usize;
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(duration: f64, interval: f64) -> Vec<f64> {
        SampleSchedule::new(Some(duration), interval)
            .unwrap()
            .map(|o| o.seconds())
            .collect()
    }

    #[test]
    fn test_ten_seconds_every_three() {
        assert_eq!(offsets(10.0, 3.0), vec![0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn test_exact_multiple_excludes_duration() {
        assert_eq!(offsets(9.0, 3.0), vec![0.0, 3.0, 6.0]);
    }

    #[test]
    fn test_short_video_gets_one_sample() {
        assert_eq!(offsets(0.5, 3.0), vec![0.0]);
    }

    #[test]
    fn test_schedule_properties() {
        for (duration, interval) in [(10.0, 3.0), (61.7, 0.7), (3600.0, 3.0), (1.0, 0.1), (7.25, 2.5)] {
            let schedule = SampleSchedule::new(Some(duration), interval).unwrap();
            let total = schedule.total();
            let values: Vec<f64> = schedule.map(|o| o.seconds()).collect();

            assert_eq!(values[0], 0.0);
            assert!(values.windows(2).all(|w| w[0] < w[1]), "not increasing");
            assert!(*values.last().unwrap() < duration);
            assert_eq!(values.len() as u64, total);
            assert_eq!(values.len() as u64, (duration / interval).ceil() as u64);
        }
    }

    #[test]
    fn test_invalid_durations() {
        for duration in [None, Some(0.0), Some(-1.0), Some(f64::INFINITY), Some(f64::NAN)] {
            assert!(matches!(
                SampleSchedule::new(duration, 3.0),
                Err(PipelineError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn test_invalid_interval() {
        assert!(matches!(
            SampleSchedule::new(Some(10.0), 0.0),
            Err(PipelineError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_progress() {
        let schedule = SampleSchedule::new(Some(10.0), 3.0).unwrap();
        assert_eq!(schedule.progress_after(SampleOffset::new(0.0)), 0.0);
        assert!((schedule.progress_after(SampleOffset::new(9.0)) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_each_schedule_is_fresh() {
        let first: Vec<_> = SampleSchedule::new(Some(10.0), 3.0).unwrap().collect();
        let second: Vec<_> = SampleSchedule::new(Some(10.0), 3.0).unwrap().collect();
        assert_eq!(first, second);
    }
}
