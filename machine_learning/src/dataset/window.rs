use std::num::NonZeroUsize;

use ndarray::{ArrayView2, s};

use super::BatchedSeries;

/// A contiguous block of columns of a `BatchedSeries`, shaped `(batch_size, len)`.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    index: usize,
    start: usize,
    input: ArrayView2<'a, u8>,
    target: ArrayView2<'a, u8>,
}

impl<'a> Window<'a> {
    /// The position of this window within its epoch.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The first column of the batched series covered by this window.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.input.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.input.ncols() == 0
    }

    pub fn input(&self) -> ArrayView2<'a, u8> {
        self.input
    }

    pub fn target(&self) -> ArrayView2<'a, u8> {
        self.target
    }
}

/// Lazily yields the non-overlapping windows of a `BatchedSeries` from left to right.
///
/// Cloning the iterator, or asking the series for a new one, restarts from the first window.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    series: &'a BatchedSeries,
    window_len: usize,
    curr: usize,
    count: usize,
}

impl<'a> Windows<'a> {
    pub(super) fn new(series: &'a BatchedSeries, window_len: NonZeroUsize) -> Self {
        let window_len = window_len.get();

        Self {
            series,
            window_len,
            curr: 0,
            count: series.row_len() / window_len,
        }
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.curr == self.count {
            return None;
        }

        let index = self.curr;
        let start = index * self.window_len;
        let end = start + self.window_len;
        self.curr += 1;

        Some(Window {
            index,
            start,
            input: self.series.input().slice_move(s![.., start..end]),
            target: self.series.target().slice_move(s![.., start..end]),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.curr;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

#[cfg(test)]
mod tests {
    use ndarray::{Axis, concatenate};

    use super::*;
    use crate::dataset::Series;

    fn batched(len: usize, batch_size: usize) -> BatchedSeries {
        let input = (0..len).map(|i| ((i * 7 + i / 3) % 2) as u8).collect();
        BatchedSeries::reshape(&Series::echo(input, 3), batch_size).unwrap()
    }

    #[test]
    fn yields_floor_of_row_len_over_window_len() {
        let series = batched(60, 3); // rows of 20
        let windows = series.windows(NonZeroUsize::new(6).unwrap());

        assert_eq!(windows.len(), 3);
        assert_eq!(windows.count(), 3);
    }

    #[test]
    fn windows_concatenate_back_into_the_series() {
        let series = batched(60, 3);
        let window_len = NonZeroUsize::new(6).unwrap();

        let windows: Vec<_> = series.windows(window_len).collect();
        for (i, window) in windows.iter().enumerate() {
            assert_eq!(window.index(), i);
            assert_eq!(window.start(), i * 6);
            assert_eq!(window.input().dim(), (3, 6));
            assert_eq!(window.target().dim(), (3, 6));
        }

        let inputs: Vec<_> = windows.iter().map(|w| w.input()).collect();
        let targets: Vec<_> = windows.iter().map(|w| w.target()).collect();
        let input = concatenate(Axis(1), &inputs).unwrap();
        let target = concatenate(Axis(1), &targets).unwrap();

        // the last 2 columns don't fill a window and are dropped
        assert_eq!(input, series.input().slice(s![.., ..18]));
        assert_eq!(target, series.target().slice(s![.., ..18]));
    }

    #[test]
    fn windows_are_restartable() {
        let series = batched(40, 2);
        let window_len = NonZeroUsize::new(5).unwrap();

        let first: Vec<_> = series.windows(window_len).map(|w| w.input().to_owned()).collect();
        let second: Vec<_> = series.windows(window_len).map(|w| w.input().to_owned()).collect();
        assert_eq!(first, second);

        let mut windows = series.windows(window_len);
        windows.next();
        let cloned = windows.clone();
        assert_eq!(windows.count(), cloned.count());
    }

    #[test]
    fn window_longer_than_a_row_yields_nothing() {
        let series = batched(10, 2);
        assert_eq!(series.windows(NonZeroUsize::new(6).unwrap()).count(), 0);
    }
}
