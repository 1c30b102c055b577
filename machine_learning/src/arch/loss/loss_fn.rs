use ndarray::{Array2, ArrayView1, ArrayView2};

/// A classification loss over a batch of logits and integer labels.
pub trait LossFn {
    /// The loss averaged over the rows of `logits`.
    fn loss(&self, logits: ArrayView2<f32>, labels: ArrayView1<u8>) -> f32;

    /// The derivative of `loss` with respect to `logits`.
    fn loss_prime(&self, logits: ArrayView2<f32>, labels: ArrayView1<u8>) -> Array2<f32>;
}
