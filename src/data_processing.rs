use crate::configuration::Settings;
use heapless::Vec;
use log::*;
use serde::Serialize;

/// Speed in tenths of the configured unit (123 = 12.3).
pub type SpeedSample = u16;

pub const DEFAULT_HISTORY_LEN: usize = 300;

/// Upper bound for exceeded ranges recorded in one evaluation.
pub const MAX_EXCEEDED_RANGES: usize = if cfg!(feature = "extended-ranges") {
    30
} else {
    15
};

#[inline(always)]
pub fn to_speed(sample: SpeedSample) -> f32 {
    f32::from(sample) / 10.0
}

// The history always holds exactly N samples, newest at index 0. Display,
// evaluation and export all index relative to "now", so a push shifts the
// whole buffer instead of moving a write index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryBuffer<const N: usize = DEFAULT_HISTORY_LEN> {
    samples: [SpeedSample; N],
}

impl<const N: usize> HistoryBuffer<N> {
    pub const fn new() -> Self {
        Self { samples: [0; N] }
    }

    /// Stores `sample` at index 0 and drops the oldest sample.
    pub fn push(&mut self, sample: SpeedSample) {
        if N == 0 {
            return;
        }
        self.samples.rotate_right(1);
        self.samples[0] = sample;
    }

    /// Sample `index` steps back in time.
    ///
    /// # Panics
    ///
    /// Panics if `index >= N`.
    pub fn get(&self, index: usize) -> SpeedSample {
        self.samples[index]
    }

    pub fn current(&self) -> SpeedSample {
        self.get(0)
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn as_slice(&self) -> &[SpeedSample] {
        &self.samples
    }

    /// The newest `len` samples, clamped to the capacity.
    pub fn window(&self, len: usize) -> &[SpeedSample] {
        &self.samples[..len.min(N)]
    }
}

impl<const N: usize> Default for HistoryBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExceededRange {
    /// Scan index at which the run reached the duration.
    pub start: usize,
    pub stop: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationResult {
    pub max_speed: f32,
    pub min_speed: f32,
    /// Truncated to tenths.
    pub average_speed: f32,
    pub exceeded_ranges: Vec<ExceededRange, MAX_EXCEEDED_RANGES>,
    /// More ranges were found than could be recorded.
    pub truncated: bool,
}

impl EvaluationResult {
    pub fn number_of_exceeded_ranges(&self) -> usize {
        self.exceeded_ranges.len()
    }
}

/// Scans the evaluation window from the oldest to the newest sample.
///
/// A sample outside `[lower, upper]` extends the current run, a sample
/// inside resets it. Once a run reaches `duration_range` samples it is
/// recorded and counting starts over, so a long excursion is reported as
/// several back to back ranges.
///
/// Inconsistent settings (empty window, zero duration, duration longer
/// than the window) produce a result without exceeded ranges.
pub fn evaluate<const N: usize>(
    history: &HistoryBuffer<N>,
    settings: &Settings,
) -> EvaluationResult {
    let window = history.window(usize::from(settings.evaluation_window));
    let mut result = EvaluationResult::default();

    if window.is_empty() {
        return result;
    }

    let lower = settings.lower_bound();
    let upper = settings.upper_bound();
    let duration = usize::from(settings.duration_range);

    let mut max: SpeedSample = 0;
    let mut min = SpeedSample::MAX;
    let mut sum: u64 = 0;
    let mut range_counter = 0usize;

    for (index, &sample) in window.iter().enumerate().rev() {
        max = max.max(sample);
        min = min.min(sample);
        sum += u64::from(sample);

        let value = u32::from(sample);
        if value < lower || value > upper {
            range_counter += 1;

            if range_counter == duration {
                range_counter = 0;
                let range = ExceededRange {
                    start: index,
                    stop: index + duration,
                };
                if result.exceeded_ranges.push(range).is_err() {
                    result.truncated = true;
                }
            }
        } else {
            range_counter = 0;
        }
    }

    result.max_speed = to_speed(max);
    result.min_speed = to_speed(min);
    // integer division first, the average is truncated to tenths
    let average = sum / window.len() as u64;
    result.average_speed = average as f32 / 10.0;

    if result.truncated {
        warn!(
            "more than {} exceeded ranges in evaluation window, dropping the rest",
            MAX_EXCEEDED_RANGES
        );
    }
    debug!(
        "evaluated {} samples: max {:.1} min {:.1} avg {:.1} ranges {}",
        window.len(),
        result.max_speed,
        result.min_speed,
        result.average_speed,
        result.number_of_exceeded_ranges()
    );

    result
}

/// Quick statistics over the whole history, for displays that do not
/// need a full evaluation.
pub trait WindStatistics {
    fn current_speed(&self) -> f32;

    fn avg_speed(&self) -> f32;

    fn max_speed(&self) -> f32;

    fn min_speed(&self) -> f32;
}

impl<const N: usize> WindStatistics for HistoryBuffer<N> {
    fn current_speed(&self) -> f32 {
        self.samples.first().copied().map(to_speed).unwrap_or(0.0)
    }

    fn avg_speed(&self) -> f32 {
        if N == 0 {
            return 0.0;
        }
        let sum = self.samples.iter().map(|&s| u64::from(s)).sum::<u64>();
        sum as f32 / N as f32 / 10.0
    }

    fn max_speed(&self) -> f32 {
        if let Some(max) = self.samples.iter().max() {
            to_speed(*max)
        } else {
            0.0
        }
    }

    fn min_speed(&self) -> f32 {
        self.samples.iter().min().copied().map(to_speed).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(window: u16, duration: u16, lower: u16, upper: u16) -> Settings {
        Settings {
            lower_threshold: lower,
            upper_threshold: upper,
            duration_range: duration,
            evaluation_window: window,
            windows_threshold: 1,
            calibration_factor: 1.0,
        }
    }

    fn history<const N: usize>(oldest_first: &[SpeedSample]) -> HistoryBuffer<N> {
        let mut history = HistoryBuffer::new();
        for &sample in oldest_first {
            history.push(sample);
        }
        history
    }

    #[test]
    fn push_keeps_length_and_order() {
        let mut history = HistoryBuffer::<5>::new();
        history.push(11);
        history.push(22);
        history.push(33);

        assert_eq!(history.len(), 5);
        assert_eq!(history.get(0), 33);
        assert_eq!(history.get(2), 11);
        assert_eq!(history.get(3), 0);
        assert_eq!(history.get(4), 0);
        assert_eq!(history.current(), 33);
    }

    #[test]
    fn push_evicts_oldest() {
        let history: HistoryBuffer<3> = history(&[1, 2, 3, 4]);

        assert_eq!(history.as_slice(), &[4, 3, 2]);
    }

    #[test]
    fn single_slot_history() {
        let history: HistoryBuffer<1> = history(&[7, 8]);

        assert_eq!(history.as_slice(), &[8]);
    }

    #[test]
    #[should_panic]
    fn get_out_of_range_panics() {
        HistoryBuffer::<4>::new().get(4);
    }

    #[test]
    fn all_zero_history_has_no_ranges() {
        let history = HistoryBuffer::<300>::new();

        let result = evaluate(&history, &settings(300, 20, 0, 8));

        assert_eq!(result.number_of_exceeded_ranges(), 0);
        assert_eq!(result.max_speed, 0.0);
        assert_eq!(result.min_speed, 0.0);
        assert_eq!(result.average_speed, 0.0);
    }

    #[test]
    fn single_run_of_duration() {
        // newest last: three calm samples, a run of four, three calm samples
        let history: HistoryBuffer<10> = history(&[10, 10, 10, 90, 90, 90, 90, 10, 10, 10]);

        let result = evaluate(&history, &settings(10, 4, 0, 8));

        assert_eq!(result.number_of_exceeded_ranges(), 1);
        assert_eq!(result.exceeded_ranges[0], ExceededRange { start: 3, stop: 7 });
        assert!(!result.truncated);
    }

    #[test]
    fn double_length_run_is_two_ranges() {
        let history: HistoryBuffer<10> = history(&[90, 90, 90, 90, 90, 90, 90, 90, 0, 0]);

        let result = evaluate(&history, &settings(10, 4, 0, 8));

        assert_eq!(result.number_of_exceeded_ranges(), 2);
        assert_eq!(result.exceeded_ranges[0], ExceededRange { start: 6, stop: 10 });
        assert_eq!(result.exceeded_ranges[1], ExceededRange { start: 2, stop: 6 });
    }

    #[test]
    fn interrupted_run_does_not_count() {
        let history: HistoryBuffer<10> = history(&[90, 90, 90, 50, 90, 90, 90, 0, 0, 0]);

        let result = evaluate(&history, &settings(10, 4, 0, 8));

        assert_eq!(result.number_of_exceeded_ranges(), 0);
    }

    #[test]
    fn band_boundaries_are_inside() {
        let history: HistoryBuffer<6> = history(&[20, 80, 20, 80, 20, 80]);

        let result = evaluate(&history, &settings(6, 2, 2, 8));

        assert_eq!(result.number_of_exceeded_ranges(), 0);
    }

    #[test]
    fn low_wind_below_lower_threshold_counts() {
        let history: HistoryBuffer<6> = history(&[30, 5, 5, 5, 30, 30]);

        let result = evaluate(&history, &settings(6, 3, 1, 8));

        assert_eq!(result.number_of_exceeded_ranges(), 1);
        assert_eq!(result.exceeded_ranges[0], ExceededRange { start: 2, stop: 5 });
    }

    #[test]
    fn statistics_over_window_only() {
        // the oldest sample lies outside the window of four
        let history: HistoryBuffer<5> = history(&[200, 10, 20, 30, 45]);

        let result = evaluate(&history, &settings(4, 3, 0, 8));

        assert_eq!(result.max_speed, 4.5);
        assert_eq!(result.min_speed, 1.0);
        // 105 / 4 = 26 (truncated)
        assert_eq!(result.average_speed, 2.6);
    }

    #[test]
    fn scenario_one_gust_episode() {
        let history: HistoryBuffer<10> = history(&[90, 90, 90, 90, 90, 0, 0, 0, 0, 0]);

        let result = evaluate(&history, &settings(10, 5, 0, 8));

        assert_eq!(result.number_of_exceeded_ranges(), 1);
        assert_eq!(result.exceeded_ranges[0], ExceededRange { start: 5, stop: 10 });
        assert_eq!(result.max_speed, 9.0);
        assert_eq!(result.min_speed, 0.0);
        assert_eq!(result.average_speed, 4.5);
    }

    #[test]
    fn ranges_beyond_capacity_are_dropped() {
        let mut history = HistoryBuffer::<300>::new();
        for _ in 0..300 {
            history.push(100);
        }

        let result = evaluate(&history, &settings(300, 1, 0, 8));

        assert_eq!(result.number_of_exceeded_ranges(), MAX_EXCEEDED_RANGES);
        assert!(result.truncated);
        assert_eq!(result.exceeded_ranges[0].start, 299);
    }

    #[test]
    fn inconsistent_settings_are_degenerate() {
        let history: HistoryBuffer<10> = history(&[90; 10]);

        assert_eq!(evaluate(&history, &settings(10, 0, 0, 8)).number_of_exceeded_ranges(), 0);
        assert_eq!(evaluate(&history, &settings(10, 11, 0, 8)).number_of_exceeded_ranges(), 0);

        let empty = evaluate(&history, &settings(0, 5, 0, 8));
        assert_eq!(empty, EvaluationResult::default());
    }

    #[test]
    fn window_larger_than_capacity_is_clamped() {
        let history: HistoryBuffer<4> = history(&[90; 4]);

        let result = evaluate(&history, &settings(300, 2, 0, 8));

        assert_eq!(result.number_of_exceeded_ranges(), 2);
        assert_eq!(result.average_speed, 9.0);
    }

    #[test]
    fn avg_speed_test() {
        let history: HistoryBuffer<240> = history(&[10; 240]);

        assert_eq!(history.avg_speed(), 1.0);
    }

    #[test]
    fn max_and_current_speed_test() {
        let history: HistoryBuffer<8> = history(&[10, 75, 20]);

        assert_eq!(history.max_speed(), 7.5);
        assert_eq!(history.min_speed(), 0.0);
        assert_eq!(history.current_speed(), 2.0);
    }
}
