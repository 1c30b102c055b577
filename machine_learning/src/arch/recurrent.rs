use ndarray::{Array2, ArrayView2, Axis};

use super::{
    Classifier, Model, RecurrentCell, Unrolled,
    activations::argmax,
    layers::DensePass,
    loss::LossFn,
};
use crate::{MlErr, Result};

/// A recurrent cell followed by a classifier applied independently to every recorded state.
///
/// The flat parameter slice is laid out as `[w, b, w2, b2]`, every matrix row-major.
#[derive(Clone, Debug)]
pub struct Recurrent {
    cell: RecurrentCell,
    classifier: Classifier,
}

/// Everything a `Recurrent` computed over one window.
#[derive(Clone, Debug)]
pub struct ForwardPass {
    unrolled: Unrolled,
    logits: Vec<DensePass>,
    predictions: Vec<Array2<f32>>,
}

impl ForwardPass {
    /// The amount of time-steps.
    pub fn len(&self) -> usize {
        self.unrolled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unrolled.is_empty()
    }

    pub fn unrolled(&self) -> &Unrolled {
        &self.unrolled
    }

    /// The state to carry into the next window.
    pub fn terminal_state(&self) -> ArrayView2<'_, f32> {
        self.unrolled.terminal_state()
    }

    /// Per time-step class probabilities, each shaped `(batch_size, num_classes)`.
    pub fn predictions(&self) -> &[Array2<f32>] {
        &self.predictions
    }

    /// The fraction of (time-step, row) positions whose most likely class is the target.
    pub fn accuracy(&self, y: ArrayView2<u8>) -> f32 {
        let mut hits = 0;
        let mut total = 0;

        for (probs, labels) in self.predictions.iter().zip(y.axis_iter(Axis(1))) {
            for (pred, &label) in argmax(probs.view()).into_iter().zip(labels) {
                hits += (pred == label as usize) as usize;
                total += 1;
            }
        }

        if total == 0 {
            return 0.0;
        }

        hits as f32 / total as f32
    }
}

impl Recurrent {
    /// Creates a new `Recurrent` model.
    ///
    /// # Arguments
    /// * `state_size` - The width of the hidden state.
    /// * `num_classes` - The amount of output classes.
    ///
    /// # Returns
    /// A new `Recurrent` instance.
    pub fn new(state_size: usize, num_classes: usize) -> Self {
        Self {
            cell: RecurrentCell::new(state_size),
            classifier: Classifier::new(state_size, num_classes),
        }
    }

    pub fn cell(&self) -> &RecurrentCell {
        &self.cell
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn num_classes(&self) -> usize {
        self.classifier.num_classes()
    }

    fn check_len(&self, what: &'static str, len: usize) -> Result<()> {
        if len != self.size() {
            return Err(MlErr::SizeMismatch {
                what,
                got: len,
                expected: self.size(),
            });
        }

        Ok(())
    }
}

impl Model for Recurrent {
    fn size(&self) -> usize {
        self.cell.size() + self.classifier.size()
    }

    fn state_size(&self) -> usize {
        self.cell.state_size()
    }

    fn forward(
        &self,
        params: &[f32],
        x: ArrayView2<u8>,
        state: ArrayView2<f32>,
    ) -> Result<ForwardPass> {
        self.check_len("model parameters", params.len())?;
        let (cell_params, head_params) = params.split_at(self.cell.size());

        let x = x.mapv(f32::from);
        let unrolled = self.cell.forward(cell_params, x.view(), state)?;

        let logits = unrolled
            .states()
            .map(|state| self.classifier.forward(head_params, state))
            .collect::<Result<Vec<_>>>()?;

        let predictions = logits
            .iter()
            .map(|pass| self.classifier.predict(pass))
            .collect();

        Ok(ForwardPass {
            unrolled,
            logits,
            predictions,
        })
    }

    // The scalar loss is the mean of the per-step batch means, so each step's logit deltas are
    // scaled by `1 / steps` on top of the loss function's own `1 / batch_size`.
    fn compute_gradients<L: LossFn>(
        &self,
        params: &[f32],
        pass: &ForwardPass,
        y: ArrayView2<u8>,
        loss_fn: &L,
        grad: &mut [f32],
    ) -> Result<f32> {
        self.check_len("model parameters", params.len())?;
        self.check_len("model gradient", grad.len())?;

        let steps = pass.len();
        if y.ncols() != steps {
            return Err(MlErr::SizeMismatch {
                what: "target window steps",
                got: y.ncols(),
                expected: steps,
            });
        }
        if let Some(&label) = y.iter().find(|&&label| label as usize >= self.num_classes()) {
            return Err(MlErr::invalid_config(
                "num_classes",
                format!("label {label} is out of range for {} classes", self.num_classes()),
            ));
        }

        grad.fill(0.0);
        let (cell_params, head_params) = params.split_at(self.cell.size());
        let (cell_grad, head_grad) = grad.split_at_mut(self.cell.size());

        let mut total_loss = 0.0;
        let mut d_states = Vec::with_capacity(steps);

        for ((state, logits), labels) in pass
            .unrolled
            .states()
            .zip(&pass.logits)
            .zip(y.axis_iter(Axis(1)))
        {
            if labels.len() != state.nrows() {
                return Err(MlErr::SizeMismatch {
                    what: "target window rows",
                    got: labels.len(),
                    expected: state.nrows(),
                });
            }

            total_loss += loss_fn.loss(logits.output(), labels);

            let mut d_logits = loss_fn.loss_prime(logits.output(), labels);
            d_logits /= steps as f32;

            let d_state =
                self.classifier
                    .backward(head_params, head_grad, state, logits, d_logits)?;
            d_states.push(d_state);
        }

        self.cell
            .backward(cell_params, cell_grad, &pass.unrolled, d_states)?;

        Ok(total_loss / steps.max(1) as f32)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;
    use crate::arch::loss::SparseCrossEntropy;

    fn random_params(model: &Recurrent, rng: &mut StdRng) -> Vec<f32> {
        (0..model.size())
            .map(|_| rng.random::<f32>() - 0.5)
            .collect()
    }

    fn window_loss(
        model: &Recurrent,
        params: &[f32],
        x: ArrayView2<u8>,
        y: ArrayView2<u8>,
        state: ArrayView2<f32>,
    ) -> f32 {
        let pass = model.forward(params, x, state).unwrap();
        let mut grad = vec![0.0; model.size()];
        model
            .compute_gradients(params, &pass, y, &SparseCrossEntropy, &mut grad)
            .unwrap()
    }

    #[test]
    fn parameter_layout_matches_the_tensor_shapes() {
        let model = Recurrent::new(4, 2);

        // w (5, 4) + b (1, 4) + w2 (4, 2) + b2 (1, 2)
        assert_eq!(model.cell().size(), 5 * 4 + 4);
        assert_eq!(model.classifier().size(), 4 * 2 + 2);
        assert_eq!(model.size(), 34);
    }

    #[test]
    fn forward_pass_is_deterministic() {
        let model = Recurrent::new(4, 2);
        let mut rng = StdRng::seed_from_u64(3);
        let params = random_params(&model, &mut rng);

        let x = array![[1, 0, 1, 1, 0], [0, 0, 1, 0, 1]];
        let state = array![[0.1, -0.2, 0.3, 0.0], [0.5, 0.5, -0.5, 0.2]];

        let a = model.forward(&params, x.view(), state.view()).unwrap();
        let b = model.forward(&params, x.view(), state.view()).unwrap();

        assert_eq!(a.predictions(), b.predictions());
        assert_eq!(a.terminal_state(), b.terminal_state());
        for t in 0..a.len() {
            assert_eq!(a.unrolled().state(t), b.unrolled().state(t));
        }
    }

    #[test]
    fn one_prediction_per_step() {
        let model = Recurrent::new(3, 2);
        let params = vec![0.2; model.size()];
        let x = Array2::<u8>::ones((4, 6));
        let state = Array2::zeros((4, 3));

        let pass = model.forward(&params, x.view(), state.view()).unwrap();

        assert_eq!(pass.len(), 6);
        assert_eq!(pass.predictions().len(), 6);
        assert!(pass.predictions().iter().all(|p| p.dim() == (4, 2)));
        assert_eq!(pass.terminal_state().dim(), (4, 3));
    }

    #[test]
    fn gradients_match_finite_differences() {
        let model = Recurrent::new(3, 2);
        let mut rng = StdRng::seed_from_u64(11);
        let params = random_params(&model, &mut rng);

        let x = array![[1, 0, 1, 1], [0, 1, 1, 0]];
        let y = array![[0, 1, 0, 1], [1, 0, 1, 1]];
        let state = array![[0.3, -0.1, 0.2], [-0.4, 0.0, 0.1]];

        let pass = model.forward(&params, x.view(), state.view()).unwrap();
        let mut grad = vec![1.0; model.size()];
        model
            .compute_gradients(&params, &pass, y.view(), &SparseCrossEntropy, &mut grad)
            .unwrap();

        let h = 1e-2;
        for i in 0..params.len() {
            let mut plus = params.clone();
            let mut minus = params.clone();
            plus[i] += h;
            minus[i] -= h;

            let numeric = (window_loss(&model, &plus, x.view(), y.view(), state.view())
                - window_loss(&model, &minus, x.view(), y.view(), state.view()))
                / (2. * h);

            assert!(
                (numeric - grad[i]).abs() < 5e-3,
                "param {i}: numeric {numeric}, analytic {}",
                grad[i]
            );
        }
    }

    #[test]
    fn accuracy_counts_argmax_hits() {
        let model = Recurrent::new(1, 2);

        // w = 0, b = 0 keeps the state at zero, so only b2 decides: class 1 always wins.
        let params = [0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 1.0];
        let x = array![[1, 0], [0, 1]];
        let y = array![[1, 1], [0, 1]];
        let state = Array2::zeros((2, 1));

        let pass = model.forward(&params, x.view(), state.view()).unwrap();
        assert_eq!(pass.accuracy(y.view()), 0.75);
    }

    #[test]
    fn out_of_range_labels_are_rejected() {
        let model = Recurrent::new(2, 2);
        let params = vec![0.0; model.size()];
        let x = array![[1, 0]];
        let y = array![[2, 0]];
        let state = Array2::zeros((1, 2));

        let pass = model.forward(&params, x.view(), state.view()).unwrap();
        let mut grad = vec![0.0; model.size()];

        assert!(
            model
                .compute_gradients(&params, &pass, y.view(), &SparseCrossEntropy, &mut grad)
                .is_err()
        );
    }
}
