use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2};

use super::{Series, Windows};
use crate::{MlErr, Result};

/// A `Series` split into `batch_size` parallel rows.
///
/// The split is row-major: row `r` holds the contiguous block of samples
/// `[r * row_len, (r + 1) * row_len)`, it is never interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedSeries {
    input: Array2<u8>,
    target: Array2<u8>,
}

impl BatchedSeries {
    /// Reshapes a series into `batch_size` rows.
    ///
    /// # Arguments
    /// * `series` - The series to reshape.
    /// * `batch_size` - The amount of rows.
    ///
    /// # Returns
    /// The batched series or an error if the series length is not a multiple of `batch_size`.
    pub fn reshape(series: &Series, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(MlErr::invalid_config("batch_size", "must be positive"));
        }

        let len = series.len();
        if len % batch_size != 0 {
            return Err(MlErr::NotDivisible {
                what: "series",
                len,
                by: batch_size,
            });
        }

        let shape = (batch_size, len / batch_size);
        let input = Array2::from_shape_vec(shape, series.input().to_vec())?;
        let target = Array2::from_shape_vec(shape, series.target().to_vec())?;

        Ok(Self { input, target })
    }

    pub fn batch_size(&self) -> usize {
        self.input.nrows()
    }

    pub fn row_len(&self) -> usize {
        self.input.ncols()
    }

    pub fn input(&self) -> ArrayView2<'_, u8> {
        self.input.view()
    }

    pub fn target(&self) -> ArrayView2<'_, u8> {
        self.target.view()
    }

    /// Splits the rows into consecutive windows of `window_len` columns.
    ///
    /// Trailing columns that do not fill a whole window are never yielded.
    pub fn windows(&self, window_len: NonZeroUsize) -> Windows<'_> {
        Windows::new(self, window_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_series(len: usize) -> Series {
        let input = (0..len).map(|i| (i % 2) as u8).collect();
        Series::echo(input, 1)
    }

    #[test]
    fn reshape_is_row_major() {
        let input: Vec<u8> = vec![1, 1, 0, 0, 1, 0, 1, 0, 0, 0, 1, 1];
        let series = Series::echo(input.clone(), 2);
        let batched = BatchedSeries::reshape(&series, 3).unwrap();

        assert_eq!(batched.batch_size(), 3);
        assert_eq!(batched.row_len(), 4);

        for r in 0..3 {
            for c in 0..4 {
                assert_eq!(batched.input()[[r, c]], series.input()[r * 4 + c]);
                assert_eq!(batched.target()[[r, c]], series.target()[r * 4 + c]);
            }
        }

        // An interleaved split would put input[1] in row 1.
        assert_eq!(batched.input().row(0).to_vec(), vec![1, 1, 0, 0]);
        assert_eq!(batched.input().row(1).to_vec(), vec![1, 0, 1, 0]);
        assert_eq!(batched.input().row(2).to_vec(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn reshape_keeps_the_cross_row_echo() {
        let series = counting_series(10);
        let batched = BatchedSeries::reshape(&series, 2).unwrap();

        // row 1 starts at sample 5, its target is the last input of row 0.
        assert_eq!(batched.target()[[1, 0]], batched.input()[[0, 4]]);
    }

    #[test]
    fn reshape_rejects_uneven_lengths() {
        let series = counting_series(10);

        assert!(matches!(
            BatchedSeries::reshape(&series, 3),
            Err(MlErr::NotDivisible {
                len: 10,
                by: 3,
                ..
            })
        ));
        assert!(BatchedSeries::reshape(&series, 0).is_err());
    }
}
