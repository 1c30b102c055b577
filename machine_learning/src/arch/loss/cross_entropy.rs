use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::LossFn;
use crate::arch::activations::{log_sum_exp, softmax};

/// Sparse categorical cross-entropy on top of a softmax.
///
/// Both steps are fused in log-space, `-log(softmax(z)[y]) = logsumexp(z) - z[y]`, so a
/// probability that rounds to zero never reaches a `log`.
#[derive(Default, Clone, Copy, Debug)]
pub struct SparseCrossEntropy;

impl SparseCrossEntropy {
    /// Returns a new `SparseCrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for SparseCrossEntropy {
    fn loss(&self, logits: ArrayView2<f32>, labels: ArrayView1<u8>) -> f32 {
        let total: f32 = logits
            .axis_iter(Axis(0))
            .zip(labels)
            .map(|(row, &label)| log_sum_exp(row) - row[label as usize])
            .sum();

        total / logits.nrows().max(1) as f32
    }

    fn loss_prime(&self, logits: ArrayView2<f32>, labels: ArrayView1<u8>) -> Array2<f32> {
        let mut d = softmax(logits);

        for (mut row, &label) in d.axis_iter_mut(Axis(0)).zip(labels) {
            row[label as usize] -= 1.;
        }

        d /= logits.nrows().max(1) as f32;
        d
    }
}
