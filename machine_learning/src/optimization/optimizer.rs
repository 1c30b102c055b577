/// Defines the strategy for updating model parameters based on calculated gradients.
///
/// The `Optimizer` trait is responsible for the transition of the weights from step `t` to `t+1`.
pub trait Optimizer {
    /// Updates the provided slice of weights using the given gradient.
    ///
    /// # Arguments
    /// * `grad` - The gradient corresponding to the `weights` slice.
    /// * `weights` - A mutable slice of the current parameter values.
    fn update_weights(&mut self, grad: &[f32], weights: &mut [f32]);
}

impl<T: Optimizer + ?Sized> Optimizer for Box<T> {
    fn update_weights(&mut self, grad: &[f32], weights: &mut [f32]) {
        (**self).update_weights(grad, weights)
    }
}
