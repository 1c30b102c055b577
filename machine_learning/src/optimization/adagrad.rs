use super::Optimizer;

/// Adaptive gradient optimization algorithm.
///
/// Every parameter keeps the sum of its squared historical gradients and its step is scaled by
/// the inverse square root of that sum, so frequently updated parameters slow down. The
/// accumulators are never reset.
#[derive(Debug)]
pub struct Adagrad {
    learning_rate: f32,
    epsilon: f32,
    accumulator: Box<[f32]>,
}

impl Adagrad {
    /// Creates a new `Adagrad` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The base step length.
    /// * `initial_accumulator` - The starting value of every accumulator.
    /// * `epsilon` - Added to the denominator, keeps a zero accumulator from dividing by zero.
    pub fn new(len: usize, learning_rate: f32, initial_accumulator: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            epsilon,
            accumulator: vec![initial_accumulator; len].into_boxed_slice(),
        }
    }

    /// The accumulated squared gradients, one per parameter.
    pub fn accumulator(&self) -> &[f32] {
        &self.accumulator
    }
}

impl Optimizer for Adagrad {
    fn update_weights(&mut self, grad: &[f32], weights: &mut [f32]) {
        debug_assert_eq!(grad.len(), self.accumulator.len());
        debug_assert_eq!(weights.len(), self.accumulator.len());

        let lr = self.learning_rate;
        let eps = self.epsilon;

        weights
            .iter_mut()
            .zip(grad)
            .zip(self.accumulator.iter_mut())
            .for_each(|((w, g), acc)| {
                *acc += g.powi(2);
                *w -= lr * g / (acc.sqrt() + eps);
            });
    }
}
