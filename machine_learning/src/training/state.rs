use ndarray::{Array2, ArrayView2};

/// The recurrent memory of every batch row, shaped `(batch_size, state_size)`.
///
/// It is threaded by value through the windows of an epoch: each training step takes the
/// state the previous window ended with and hands back the one to carry into the next.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenState(Array2<f32>);

impl HiddenState {
    /// The state every epoch starts from.
    pub fn zeros(batch_size: usize, state_size: usize) -> Self {
        Self(Array2::zeros((batch_size, state_size)))
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.0.view()
    }

    pub fn batch_size(&self) -> usize {
        self.0.nrows()
    }

    pub fn state_size(&self) -> usize {
        self.0.ncols()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    pub fn into_inner(self) -> Array2<f32> {
        self.0
    }
}

impl From<Array2<f32>> for HiddenState {
    fn from(value: Array2<f32>) -> Self {
        Self(value)
    }
}

impl From<ArrayView2<'_, f32>> for HiddenState {
    fn from(value: ArrayView2<'_, f32>) -> Self {
        Self(value.to_owned())
    }
}
