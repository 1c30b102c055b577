use ndarray::{Array2, ArrayView2, Axis, concatenate, s};

use super::{
    activations::ActFn,
    layers::{Dense, DensePass},
};
use crate::{MlErr, Result};

/// A fully connected recurrent cell, `state = tanh([x_t, state] · w + b)`.
///
/// The transition weights have shape `(state_size + 1, state_size)`: the first row multiplies
/// the input bit, the remaining ones the previous state.
#[derive(Clone, Debug)]
pub struct RecurrentCell {
    state_size: usize,
    transition: Dense,
}

/// The cell unrolled over every column of a window.
#[derive(Clone, Debug)]
pub struct Unrolled {
    initial: Array2<f32>,
    inputs: Vec<Array2<f32>>,
    passes: Vec<DensePass>,
}

impl Unrolled {
    /// The amount of time-steps.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// The state the window started from.
    pub fn initial_state(&self) -> ArrayView2<'_, f32> {
        self.initial.view()
    }

    /// The state recorded after time-step `t`.
    pub fn state(&self, t: usize) -> Option<ArrayView2<'_, f32>> {
        self.passes.get(t).map(DensePass::output)
    }

    /// The recorded states in time order.
    pub fn states(&self) -> impl Iterator<Item = ArrayView2<'_, f32>> {
        self.passes.iter().map(DensePass::output)
    }

    /// The state after the last time-step, which is the one carried into the next window.
    pub fn terminal_state(&self) -> ArrayView2<'_, f32> {
        self.passes
            .last()
            .map(DensePass::output)
            .unwrap_or_else(|| self.initial.view())
    }
}

impl RecurrentCell {
    /// Creates a new `RecurrentCell`.
    ///
    /// # Arguments
    /// * `state_size` - The width of the hidden state.
    ///
    /// # Returns
    /// A new `RecurrentCell` instance.
    pub fn new(state_size: usize) -> Self {
        Self {
            state_size,
            transition: Dense::new((state_size + 1, state_size), Some(ActFn::tanh())),
        }
    }

    /// Returns the amount of parameters of the cell, `w` followed by `b`.
    pub fn size(&self) -> usize {
        self.transition.size()
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    /// Runs the cell over the columns of `x` in increasing order, starting from `state`.
    ///
    /// # Arguments
    /// * `params` - The cell's parameters.
    /// * `x` - The inputs, shaped `(batch_size, steps)`.
    /// * `state` - The carried state, shaped `(batch_size, state_size)`.
    ///
    /// # Returns
    /// Every intermediate value needed to backpropagate through the window.
    pub fn forward(
        &self,
        params: &[f32],
        x: ArrayView2<f32>,
        state: ArrayView2<f32>,
    ) -> Result<Unrolled> {
        if state.dim() != (x.nrows(), self.state_size) {
            return Err(MlErr::SizeMismatch {
                what: "carried hidden state",
                got: state.len(),
                expected: x.nrows() * self.state_size,
            });
        }

        let steps = x.ncols();
        let mut inputs = Vec::with_capacity(steps);
        let mut passes: Vec<DensePass> = Vec::with_capacity(steps);

        for t in 0..steps {
            let prev = passes.last().map_or(state, DensePass::output);
            let augmented = concatenate(Axis(1), &[x.slice(s![.., t..t + 1]), prev])?;
            let pass = self.transition.forward(params, augmented.view())?;

            inputs.push(augmented);
            passes.push(pass);
        }

        Ok(Unrolled {
            initial: state.to_owned(),
            inputs,
            passes,
        })
    }

    /// Backpropagates through time over an unrolled window.
    ///
    /// The gradient stops at the window's initial state, which is what makes the
    /// backpropagation truncated.
    ///
    /// # Arguments
    /// * `params` - The cell's parameters.
    /// * `grad` - The cell's slice of the gradient, accumulated into.
    /// * `unrolled` - The result of `forward`.
    /// * `d_states` - The derivative of the loss with respect to each recorded state, coming
    ///   from the outputs only.
    pub fn backward(
        &self,
        params: &[f32],
        grad: &mut [f32],
        unrolled: &Unrolled,
        d_states: Vec<Array2<f32>>,
    ) -> Result<()> {
        if d_states.len() != unrolled.len() {
            return Err(MlErr::SizeMismatch {
                what: "state deltas",
                got: d_states.len(),
                expected: unrolled.len(),
            });
        }

        let mut d_next: Option<Array2<f32>> = None;
        let steps = unrolled.inputs.iter().zip(&unrolled.passes).zip(d_states);

        for ((x, pass), mut d) in steps.rev() {
            if let Some(d_next) = d_next {
                d += &d_next;
            }

            let dx = self.transition.backward(params, grad, x.view(), pass, d)?;
            d_next = Some(dx.slice_move(s![.., 1..]));
        }

        Ok(())
    }
}
