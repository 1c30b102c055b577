use ndarray::{Array2, ArrayView2};

use super::{
    activations::softmax,
    layers::{Dense, DensePass},
};
use crate::Result;

/// The linear output head, `logits = state · w2 + b2`, read out through a softmax.
#[derive(Clone, Debug)]
pub struct Classifier {
    num_classes: usize,
    head: Dense,
}

impl Classifier {
    /// Creates a new `Classifier`.
    ///
    /// # Arguments
    /// * `state_size` - The width of the states it classifies.
    /// * `num_classes` - The amount of classes.
    ///
    /// # Returns
    /// A new `Classifier` instance.
    pub fn new(state_size: usize, num_classes: usize) -> Self {
        Self {
            num_classes,
            head: Dense::new((state_size, num_classes), None),
        }
    }

    /// Returns the amount of parameters of the head, `w2` followed by `b2`.
    pub fn size(&self) -> usize {
        self.head.size()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Computes the logits of every row of `state`.
    pub fn forward(&self, params: &[f32], state: ArrayView2<f32>) -> Result<DensePass> {
        self.head.forward(params, state)
    }

    /// Turns the logits of a `forward` pass into per-class probabilities.
    pub fn predict(&self, pass: &DensePass) -> Array2<f32> {
        softmax(pass.output())
    }

    /// Backpropagates the logit deltas, returning the deltas of the classified state.
    pub fn backward(
        &self,
        params: &[f32],
        grad: &mut [f32],
        state: ArrayView2<f32>,
        pass: &DensePass,
        d_logits: Array2<f32>,
    ) -> Result<Array2<f32>> {
        self.head.backward(params, grad, state, pass, d_logits)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Axis, array};

    use super::*;

    #[test]
    fn predictions_are_distributions() {
        let classifier = Classifier::new(2, 3);
        assert_eq!(classifier.size(), 9);

        let params: Vec<f32> = (0..classifier.size()).map(|i| i as f32 * 0.1).collect();
        let state = array![[0.5, -0.5], [1.0, 0.0]];

        let pass = classifier.forward(&params, state.view()).unwrap();
        let probs = classifier.predict(&pass);

        assert_eq!(probs.dim(), (2, 3));
        for row in probs.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-6);
        }
    }
}
