use rand::Rng;

pub trait WeightGen<R: Rng> {
    /// Should sample at most `n` weights.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `n` - The upper limit of samples to generate.
    ///
    /// # Returns
    /// The samples, or `None` if the generator is exhausted.
    fn sample(&mut self, rng: &mut R, n: usize) -> Option<Vec<f32>>;

    /// Should return the amount of remaining weights this generator can still generate.
    fn remaining(&self) -> usize;
}
