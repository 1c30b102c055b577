use std::{num::NonZeroUsize, ops::ControlFlow, time::Instant};

use log::{debug, info, warn};
use ndarray::ArrayView2;
use rand::Rng;

use super::{EpochSummary, HiddenState, Reporter, TrainMetrics, WindowReport};
use crate::{
    MlErr, Result,
    arch::{ForwardPass, Model, loss::LossFn},
    dataset::{BatchedSeries, SequenceGenerator},
    optimization::Optimizer,
};

/// What a finished `train` call hands back.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub metrics: TrainMetrics,
    pub epochs: Vec<EpochSummary>,
}

/// A model trainer. Owns the model, its parameters and the optimizer state, and runs
/// truncated backpropagation through time over freshly generated echo series.
pub struct ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    model: M,
    params: Vec<f32>,
    grad: Vec<f32>,
    optimizer: O,
    loss_fn: L,

    generator: SequenceGenerator,
    batch_size: usize,
    window_len: NonZeroUsize,
    epochs: usize,
    rng: R,
}

impl<M, O, L, R> ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `params` - The model's initial parameters.
    /// * `optimizer` - The optimizer, holding one slot of state per parameter.
    /// * `loss_fn` - The per-step loss function.
    /// * `generator` - Produces a fresh series every epoch.
    /// * `batch_size` - The amount of parallel rows every series is split into.
    /// * `window_len` - The amount of time-steps backpropagated through per optimizer step.
    /// * `epochs` - The amount of epochs a `train` call runs.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A new `ModelTrainer` or an error if `params` doesn't fit `model`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: M,
        params: Vec<f32>,
        optimizer: O,
        loss_fn: L,
        generator: SequenceGenerator,
        batch_size: usize,
        window_len: NonZeroUsize,
        epochs: usize,
        rng: R,
    ) -> Result<Self> {
        if params.len() != model.size() {
            return Err(MlErr::SizeMismatch {
                what: "initial parameters",
                got: params.len(),
                expected: model.size(),
            });
        }

        let grad = vec![0.0; params.len()];

        Ok(Self {
            model,
            params,
            grad,
            optimizer,
            loss_fn,
            generator,
            batch_size,
            window_len,
            epochs,
            rng,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The current flat parameters.
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Runs one window: forward pass, loss and gradient, then a single optimizer step.
    ///
    /// # Arguments
    /// * `x` - The window's input bits, shaped `(batch_size, steps)`.
    /// * `y` - The window's targets, same shape as `x`.
    /// * `state` - The state carried in from the previous window.
    ///
    /// # Returns
    /// The forward pass, computed with the parameters from before the update, and the
    /// window's scalar loss.
    pub fn step(
        &mut self,
        x: ArrayView2<u8>,
        y: ArrayView2<u8>,
        state: &HiddenState,
    ) -> Result<(ForwardPass, f32)> {
        let pass = self.model.forward(&self.params, x, state.view())?;
        let loss = self.model.compute_gradients(
            &self.params,
            &pass,
            y,
            &self.loss_fn,
            &mut self.grad,
        )?;

        self.optimizer.update_weights(&self.grad, &mut self.params);
        Ok((pass, loss))
    }

    /// Performs every configured epoch, stopping early if `reporter` asks to.
    ///
    /// # Arguments
    /// * `reporter` - Receives every window's metrics and every epoch's summary.
    ///
    /// # Returns
    /// The counters of the run and a summary per finished epoch.
    pub fn train<P: Reporter + ?Sized>(&mut self, reporter: &mut P) -> Result<TrainSummary> {
        let mut metrics = TrainMetrics::default();
        let mut epochs = Vec::with_capacity(self.epochs);

        for epoch in 0..self.epochs {
            let (summary, flow) = self.run_epoch(epoch, reporter, &mut metrics)?;

            if summary.windows > 0 {
                reporter.epoch_done(&summary);
                epochs.push(summary);
                metrics.bump_epoch();
            }

            if flow.is_break() {
                info!("training stopped by the reporter during epoch {epoch}");
                metrics.stopped_early = true;
                break;
            }
        }

        Ok(TrainSummary { metrics, epochs })
    }

    fn run_epoch<P: Reporter + ?Sized>(
        &mut self,
        epoch: usize,
        reporter: &mut P,
        metrics: &mut TrainMetrics,
    ) -> Result<(EpochSummary, ControlFlow<()>)> {
        info!("new data, epoch {epoch}");

        let series = self.generator.generate(&mut self.rng);
        let batched = BatchedSeries::reshape(&series, self.batch_size)?;
        let mut state = HiddenState::zeros(self.batch_size, self.model.state_size());

        let mut loss_sum = 0.0;
        let mut accuracy_sum = 0.0;
        let mut windows = 0;
        let mut flow = ControlFlow::Continue(());

        for window in batched.windows(self.window_len) {
            let start = Instant::now();
            let (pass, loss) = self.step(window.input(), window.target(), &state)?;
            metrics.compute_time += start.elapsed();

            debug!("epoch {epoch} window {}: loss {loss:.6}", window.index());
            if !loss.is_finite() {
                warn!("non-finite loss {loss} at epoch {epoch}, window {}", window.index());
            }

            let accuracy = pass.accuracy(window.target());
            loss_sum += loss;
            accuracy_sum += accuracy;
            windows += 1;
            metrics.bump_window(window.len() * self.batch_size, loss);

            let report = WindowReport {
                epoch,
                window: window.index(),
                loss,
                accuracy,
                predictions: pass.predictions(),
                input: window.input(),
                target: window.target(),
                state_in: state.view(),
                state_out: pass.terminal_state(),
            };
            flow = reporter.report(&report);

            state = HiddenState::from(pass.terminal_state());

            if flow.is_break() {
                break;
            }
        }

        let summary = EpochSummary {
            epoch,
            windows,
            mean_loss: loss_sum / windows.max(1) as f32,
            accuracy: accuracy_sum / windows.max(1) as f32,
        };
        info!(
            "epoch {epoch} done over {windows} windows: mean loss {:.6}, accuracy {:.3}",
            summary.mean_loss, summary.accuracy
        );

        Ok((summary, flow))
    }
}
