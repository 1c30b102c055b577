use std::{num::NonZeroUsize, ops::ControlFlow};

use log::{debug, info};
use ndarray::{Array2, ArrayView2};

use super::{EpochSummary, Schedule};

/// What a training step hands to the reporter after each window.
#[derive(Debug, Clone, Copy)]
pub struct WindowReport<'a> {
    pub epoch: usize,
    pub window: usize,
    pub loss: f32,
    pub accuracy: f32,
    /// Per time-step class probabilities, each shaped `(batch_size, num_classes)`.
    pub predictions: &'a [Array2<f32>],
    pub input: ArrayView2<'a, u8>,
    pub target: ArrayView2<'a, u8>,
    pub state_in: ArrayView2<'a, f32>,
    pub state_out: ArrayView2<'a, f32>,
}

/// Receives the metrics of the training loop, it decides how and how often to present them.
pub trait Reporter {
    /// Called after every window's optimizer step.
    ///
    /// # Returns
    /// `ControlFlow::Break` to stop training once this window is done.
    fn report(&mut self, report: &WindowReport<'_>) -> ControlFlow<()>;

    /// Called after the last window of every epoch.
    fn epoch_done(&mut self, _summary: &EpochSummary) {}
}

impl Reporter for () {
    fn report(&mut self, _report: &WindowReport<'_>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<P: Reporter + ?Sized> Reporter for &mut P {
    fn report(&mut self, report: &WindowReport<'_>) -> ControlFlow<()> {
        (**self).report(report)
    }

    fn epoch_done(&mut self, summary: &EpochSummary) {
        (**self).epoch_done(summary)
    }
}

impl<A: Reporter, B: Reporter> Reporter for (A, B) {
    fn report(&mut self, report: &WindowReport<'_>) -> ControlFlow<()> {
        let a = self.0.report(report);
        let b = self.1.report(report);

        if a.is_break() || b.is_break() {
            return ControlFlow::Break(());
        }

        ControlFlow::Continue(())
    }

    fn epoch_done(&mut self, summary: &EpochSummary) {
        self.0.epoch_done(summary);
        self.1.epoch_done(summary);
    }
}

/// Logs the loss of every scheduled window, and its bits at `debug` level.
#[derive(Debug, Clone)]
pub struct LogReporter {
    schedule: Schedule,
}

impl LogReporter {
    pub fn new(every: NonZeroUsize) -> Self {
        Self {
            schedule: Schedule::new(every),
        }
    }
}

impl Reporter for LogReporter {
    fn report(&mut self, report: &WindowReport<'_>) -> ControlFlow<()> {
        if self.schedule.should_report(report.window) {
            info!(
                "epoch {} step {}: loss {:.6}, accuracy {:.3}",
                report.epoch, report.window, report.loss, report.accuracy
            );

            if log::log_enabled!(log::Level::Debug) {
                let predicted: Vec<Vec<u8>> = report
                    .predictions
                    .iter()
                    .map(|probs| probs.rows().into_iter().map(|p| (p[0] < 0.5) as u8).collect())
                    .collect();

                debug!("input:  {:?}", report.input.rows().into_iter().collect::<Vec<_>>());
                debug!("target: {:?}", report.target.rows().into_iter().collect::<Vec<_>>());
                debug!("predicted (per step): {predicted:?}");
            }
        }

        ControlFlow::Continue(())
    }
}

/// Records the loss and accuracy of every window.
#[derive(Debug, Clone, Default)]
pub struct LossHistory {
    losses: Vec<f32>,
    accuracies: Vec<f32>,
    epochs: Vec<EpochSummary>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn losses(&self) -> &[f32] {
        &self.losses
    }

    pub fn accuracies(&self) -> &[f32] {
        &self.accuracies
    }

    pub fn epochs(&self) -> &[EpochSummary] {
        &self.epochs
    }

    /// The mean loss over the windows in `range`, given as fractions of the run.
    ///
    /// # Arguments
    /// * `from` - The start of the range, in `[0, 1]`.
    /// * `to` - The end of the range, in `[0, 1]`.
    ///
    /// # Returns
    /// The mean loss, or `None` if the range holds no windows.
    pub fn mean_loss(&self, from: f32, to: f32) -> Option<f32> {
        let len = self.losses.len() as f32;
        let start = (from * len) as usize;
        let end = ((to * len) as usize).min(self.losses.len());

        let slice = self.losses.get(start..end)?;
        if slice.is_empty() {
            return None;
        }

        Some(slice.iter().sum::<f32>() / slice.len() as f32)
    }
}

impl Reporter for LossHistory {
    fn report(&mut self, report: &WindowReport<'_>) -> ControlFlow<()> {
        self.losses.push(report.loss);
        self.accuracies.push(report.accuracy);
        ControlFlow::Continue(())
    }

    fn epoch_done(&mut self, summary: &EpochSummary) {
        self.epochs.push(*summary);
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;

    fn report(window: usize, loss: f32, empty: &Array2<u8>, state: &Array2<f32>) -> WindowReport<'static> {
        // Leaked so the views outlive the test helper.
        let empty: &'static Array2<u8> = Box::leak(Box::new(empty.clone()));
        let state: &'static Array2<f32> = Box::leak(Box::new(state.clone()));

        WindowReport {
            epoch: 0,
            window,
            loss,
            accuracy: 0.5,
            predictions: &[],
            input: empty.view(),
            target: empty.view(),
            state_in: state.view(),
            state_out: state.view(),
        }
    }

    struct StopAt(usize);

    impl Reporter for StopAt {
        fn report(&mut self, report: &WindowReport<'_>) -> ControlFlow<()> {
            if report.window == self.0 {
                return ControlFlow::Break(());
            }

            ControlFlow::Continue(())
        }
    }

    #[test]
    fn history_averages_fractions_of_the_run() {
        let empty = Array2::zeros((1, 0));
        let state = Array2::zeros((1, 1));
        let mut history = LossHistory::new();

        for (i, loss) in [4.0, 3.0, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5, 0.5].into_iter().enumerate() {
            let _ = history.report(&report(i, loss, &empty, &state));
        }

        assert_eq!(history.losses().len(), 10);
        assert_eq!(history.mean_loss(0.0, 0.2), Some(3.5));
        assert_eq!(history.mean_loss(0.8, 1.0), Some(0.5));
        assert_eq!(history.mean_loss(0.5, 0.5), None);
    }

    #[test]
    fn pairs_stop_when_either_side_stops() {
        let empty = Array2::zeros((1, 0));
        let state = Array2::zeros((1, 1));
        let mut pair = (LossHistory::new(), StopAt(2));

        assert!(pair.report(&report(1, 1.0, &empty, &state)).is_continue());
        assert!(pair.report(&report(2, 1.0, &empty, &state)).is_break());
        assert_eq!(pair.0.losses(), [1.0, 1.0]);
    }
}
