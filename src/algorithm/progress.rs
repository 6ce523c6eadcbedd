//! Step-based progress reporting over a sub-range of an algorithm's run.

use super::cancel::CancelFlag;
use super::notification::{AlgorithmEvent, AlgorithmIdentity, Notification, NotificationCenter};
use parking_lot::Mutex;
use std::sync::Arc;

struct ProgressState {
    steps_done: usize,
    total_steps: usize,
}

/// Maps `steps_done / total_steps` onto `[start, end]` and emits a
/// `Progress` notification per report.
///
/// Reports may come from several threads at once. Emission happens under
/// the step lock, so observers see non-decreasing fractions.
pub struct Progress {
    algorithm: AlgorithmIdentity,
    center: Arc<NotificationCenter>,
    cancel: CancelFlag,
    start: f64,
    end: f64,
    state: Mutex<ProgressState>,
}

impl Progress {
    pub fn new(
        algorithm: AlgorithmIdentity,
        center: Arc<NotificationCenter>,
        cancel: CancelFlag,
        start: f64,
        end: f64,
        total_steps: usize,
    ) -> Self {
        let start = if start.is_nan() { 0.0 } else { start.clamp(0.0, 1.0) };
        let end = if end.is_nan() { 1.0 } else { end.clamp(start, 1.0) };
        Self {
            algorithm,
            center,
            cancel,
            start,
            end,
            state: Mutex::new(ProgressState {
                steps_done: 0,
                total_steps: total_steps.max(1),
            }),
        }
    }

    /// Advance one step.
    pub fn report(&self) -> f64 {
        self.report_increment(1, "")
    }

    /// Advance one step with a message.
    pub fn report_message(&self, message: &str) -> f64 {
        self.report_increment(1, message)
    }

    /// Advance `steps` steps; returns the emitted fraction.
    pub fn report_increment(&self, steps: usize, message: &str) -> f64 {
        let mut state = self.state.lock();
        state.steps_done = (state.steps_done + steps).min(state.total_steps);
        let fraction = self.fraction_of(&state);
        self.center.post(&Notification::new(
            self.algorithm,
            AlgorithmEvent::Progress {
                fraction,
                message: message.to_string(),
            },
        ));
        fraction
    }

    /// Change the step count, keeping the steps already done.
    pub fn set_num_steps(&self, total_steps: usize) {
        let mut state = self.state.lock();
        state.total_steps = total_steps.max(1);
        state.steps_done = state.steps_done.min(state.total_steps);
    }

    /// Fraction corresponding to the steps reported so far.
    pub fn fraction(&self) -> f64 {
        self.fraction_of(&self.state.lock())
    }

    pub fn steps_done(&self) -> usize {
        self.state.lock().steps_done
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn fraction_of(&self, state: &ProgressState) -> f64 {
        self.start + (self.end - self.start) * state.steps_done as f64 / state.total_steps as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::notification::{AlgorithmObserver, EventMask};

    fn observed_center() -> (Arc<NotificationCenter>, Arc<Mutex<Vec<f64>>>) {
        let center = Arc::new(NotificationCenter::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: Arc<dyn AlgorithmObserver> = Arc::new(move |n: &Notification| {
            if let AlgorithmEvent::Progress { fraction, .. } = n.event {
                sink.lock().push(fraction);
            }
        });
        center.add(observer, EventMask::PROGRESS);
        (center, seen)
    }

    #[test]
    fn test_linear_mapping() {
        let (center, seen) = observed_center();
        let progress = Progress::new(
            AlgorithmIdentity::new("P", 1),
            center,
            CancelFlag::new(),
            0.2,
            0.8,
            10,
        );

        for i in 1..=10 {
            let f = progress.report();
            assert!((f - (0.2 + 0.6 * i as f64 / 10.0)).abs() < 1e-12);
        }
        assert_eq!(seen.lock().len(), 10);
    }

    #[test]
    fn test_steps_are_clamped() {
        let (center, _) = observed_center();
        let progress = Progress::new(AlgorithmIdentity::new("P", 1), center, CancelFlag::new(), 0.0, 1.0, 2);

        progress.report();
        progress.report();
        assert_eq!(progress.report(), 1.0);
        assert_eq!(progress.steps_done(), 2);

        progress.set_num_steps(4);
        assert_eq!(progress.fraction(), 0.5);
    }

    #[test]
    fn test_zero_steps_does_not_divide_by_zero() {
        let (center, _) = observed_center();
        let progress = Progress::new(AlgorithmIdentity::new("P", 1), center, CancelFlag::new(), 0.0, 1.0, 0);
        assert_eq!(progress.report_message("done"), 1.0);
    }
}
