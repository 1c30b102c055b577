use ndarray::ArrayView2;

use super::{ForwardPass, loss::LossFn};
use crate::Result;

/// A differentiable sequence model whose parameters live in a single flat slice.
///
/// Gradient computation sits behind `compute_gradients` so the trainer's control flow doesn't
/// care whether the derivatives are hand-derived or obtained some other way.
pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Returns the width of the state carried between windows.
    fn state_size(&self) -> usize;

    /// Runs the model over a window, starting from a carried state.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The window's input bits, shaped `(batch_size, steps)`.
    /// * `state` - The state carried in from the previous window.
    ///
    /// # Returns
    /// The forward pass, or an error if the shapes don't match the model.
    fn forward(
        &self,
        params: &[f32],
        x: ArrayView2<u8>,
        state: ArrayView2<f32>,
    ) -> Result<ForwardPass>;

    /// Computes the gradient of the window's scalar loss with respect to the parameters.
    ///
    /// # Arguments
    /// * `params` - The parameters used for `pass`.
    /// * `pass` - The result of `forward`.
    /// * `y` - The window's target labels, shaped `(batch_size, steps)`.
    /// * `loss_fn` - The per-step loss function.
    /// * `grad` - A buffer the gradient is **written** into.
    ///
    /// # Returns
    /// The scalar loss, the mean over every (time-step, row) of the window.
    fn compute_gradients<L: LossFn>(
        &self,
        params: &[f32],
        pass: &ForwardPass,
        y: ArrayView2<u8>,
        loss_fn: &L,
        grad: &mut [f32],
    ) -> Result<f32>;
}
