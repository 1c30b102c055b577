use ndarray::{linalg, prelude::*};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer, `a = act_fn(x · w + b)`.
///
/// Its parameters are a flat slice holding the row-major weights `(dim.0, dim.1)` followed by
/// the `dim.1` biases. The layer itself is stateless: `forward` hands back a `DensePass` that the
/// caller keeps around for as long as it needs to backpropagate through that call, so the same
/// layer can be unrolled over many time-steps.
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,
}

/// The values produced by a single `Dense::forward` call.
#[derive(Clone, Debug, PartialEq)]
pub struct DensePass {
    z: Array2<f32>,
    a: Option<Array2<f32>>,
}

impl DensePass {
    /// The output of the layer, after the activation function if there is one.
    pub fn output(&self) -> ArrayView2<'_, f32> {
        self.a.as_ref().unwrap_or(&self.z).view()
    }
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The (input, output) dimensions.
    /// * `act_fn` - An optional activation function applied to `x · w + b`.
    ///
    /// # Returns
    /// A new `Dense` instance.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
            act_fn,
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Computes the output of the layer for every row of `x`.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `x` - The input, one sample per row.
    ///
    /// # Returns
    /// The pre-activation and activation values or an error if the shapes don't match.
    pub fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<DensePass> {
        self.check_input(x.ncols())?;
        let (w, b) = self.view_params(params)?;

        let mut z = x.dot(&w);
        z += &b;

        let a = self.act_fn.map(|act_fn| z.mapv(|z| act_fn.f(z)));
        Ok(DensePass { z, a })
    }

    /// Backpropagates `d`, the derivative of the loss with respect to this layer's output.
    ///
    /// The weight and bias derivatives are **added** to `grad`, so unrolled calls accumulate.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `grad` - This layer's slice of the gradient.
    /// * `x` - The input given to the `forward` call that produced `pass`.
    /// * `pass` - The result of that `forward` call.
    /// * `d` - The derivative of the loss with respect to `pass.output()`.
    ///
    /// # Returns
    /// The derivative of the loss with respect to `x`.
    pub fn backward(
        &self,
        params: &[f32],
        grad: &mut [f32],
        x: ArrayView2<f32>,
        pass: &DensePass,
        mut d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        self.check_input(x.ncols())?;
        if d.dim() != pass.z.dim() || d.nrows() != x.nrows() {
            return Err(MlErr::SizeMismatch {
                what: "dense layer deltas",
                got: d.len(),
                expected: pass.z.len(),
            });
        }

        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&pass.z, |d, &z| *d *= act_fn.df(z));
        }

        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &x.t(), &d, 1.0, &mut dw);
        db += &d.sum_axis(Axis(0));

        let (w, _) = self.view_params(params)?;
        Ok(d.dot(&w.t()))
    }

    fn check_input(&self, ncols: usize) -> Result<()> {
        if ncols != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense layer input columns",
                got: ncols,
                expected: self.dim.0,
            });
        }

        Ok(())
    }

    fn check_len(&self, what: &'static str, len: usize) -> Result<()> {
        if len != self.size {
            return Err(MlErr::SizeMismatch {
                what,
                got: len,
                expected: self.size,
            });
        }

        Ok(())
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    ///
    /// # Arguments
    /// * `grad` - A gradient slice.
    ///
    /// # Returns
    /// A tuple containing the delta weights and delta biases.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        self.check_len("dense layer gradient", grad.len())?;

        let w_size = self.size - self.dim.1;
        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw)?;
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw)?;
        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        self.check_len("dense layer parameters", params.len())?;

        let w_size = self.size - self.dim.1;
        let weights = ArrayView2::from_shape(self.dim, &params[..w_size])?;
        let biases = ArrayView1::from_shape(self.dim.1, &params[w_size..])?;
        Ok((weights, biases))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn forward_computes_an_affine_map() {
        let dense = Dense::new((2, 3), None);
        assert_eq!(dense.size(), 9);

        #[rustfmt::skip]
        let params = [
            1.0, 0.0, 2.0,  // w row 0
            0.0, 1.0, -1.0, // w row 1
            0.5, 0.5, 0.5,  // b
        ];
        let x = array![[1.0, 2.0], [3.0, -1.0]];

        let pass = dense.forward(&params, x.view()).unwrap();
        assert_eq!(pass.output(), array![[1.5, 2.5, 0.5], [3.5, -0.5, 7.5]]);
    }

    #[test]
    fn forward_applies_the_activation() {
        let dense = Dense::new((1, 1), Some(ActFn::tanh()));
        let pass = dense.forward(&[2.0, -1.0], array![[1.0]].view()).unwrap();

        assert!((pass.output()[[0, 0]] - 1.0f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn backward_accumulates_into_the_gradient() {
        let dense = Dense::new((2, 1), None);
        let params = [2.0, 3.0, 1.0];
        let x = array![[1.0, 2.0]];

        let pass = dense.forward(&params, x.view()).unwrap();
        let mut grad = [0.0; 3];

        let dx = dense
            .backward(&params, &mut grad, x.view(), &pass, array![[1.0]])
            .unwrap();
        assert_eq!(dx, array![[2.0, 3.0]]);
        assert_eq!(grad, [1.0, 2.0, 1.0]);

        dense
            .backward(&params, &mut grad, x.view(), &pass, array![[1.0]])
            .unwrap();
        assert_eq!(grad, [2.0, 4.0, 2.0]);
    }

    #[test]
    fn mismatched_shapes_are_errors() {
        let dense = Dense::new((2, 2), None);

        assert!(dense.forward(&[0.0; 5], array![[1.0, 2.0]].view()).is_err());
        assert!(dense.forward(&[0.0; 6], array![[1.0]].view()).is_err());
    }
}
