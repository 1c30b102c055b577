use rand::{
    Rng,
    distr::{Bernoulli, Distribution},
};

use crate::{MlErr, Result};

/// A pair of equally long bit sequences where the target is the input delayed by `lag` steps.
///
/// The first `lag` target positions are always zero, nothing wraps around from the end of the
/// input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    input: Vec<u8>,
    target: Vec<u8>,
    lag: usize,
}

impl Series {
    /// Creates a new `Series` by echoing `input` with a delay of `lag` steps.
    ///
    /// # Arguments
    /// * `input` - The input bits.
    /// * `lag` - The amount of steps the target lags behind the input.
    ///
    /// # Returns
    /// A new `Series` instance.
    pub fn echo(input: Vec<u8>, lag: usize) -> Self {
        let len = input.len();
        let mut target = vec![0; len];

        if lag < len {
            target[lag..].copy_from_slice(&input[..len - lag]);
        }

        Self { input, target, lag }
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn lag(&self) -> usize {
        self.lag
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn target(&self) -> &[u8] {
        &self.target
    }
}

/// Generates random echo series of a fixed length and lag.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    length: usize,
    lag: usize,
    flip: Bernoulli,
}

impl SequenceGenerator {
    /// Creates a new `SequenceGenerator`.
    ///
    /// # Arguments
    /// * `length` - The length of every generated series.
    /// * `lag` - The delay between input and target.
    /// * `flip_probability` - The probability of each input bit being a one.
    ///
    /// # Returns
    /// A new `SequenceGenerator` or an error if `flip_probability` is not a probability.
    pub fn new(length: usize, lag: usize, flip_probability: f64) -> Result<Self> {
        let flip = Bernoulli::new(flip_probability)
            .map_err(|_| MlErr::InvalidProbability(flip_probability))?;

        Ok(Self { length, lag, flip })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Draws a fresh series, consuming exactly `length` samples from `rng`.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A new `Series`.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Series {
        let input = (0..self.length)
            .map(|_| self.flip.sample(rng) as u8)
            .collect();

        Series::echo(input, self.lag)
    }
}
