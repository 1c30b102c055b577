mod chain;
mod constant;
mod random;
mod weight_gen;

pub use chain::ChainWeightGen;
pub use constant::ConstWeightGen;
pub use random::RandWeightGen;
pub use weight_gen::WeightGen;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    MlErr, Result,
    arch::{Model, Recurrent},
};

/// How the weight matrices of a `Recurrent` model are initialized. Biases always start at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitScheme {
    /// Uniform in `[0, 1)`.
    #[default]
    Uniform01,
    XavierUniform,
    XavierNormal,
}

impl InitScheme {
    fn weights<R: Rng>(&self, fan_in: usize, fan_out: usize) -> Result<Box<dyn WeightGen<R>>> {
        let limit = fan_in * fan_out;

        let weight_gen: Box<dyn WeightGen<R>> = match self {
            InitScheme::Uniform01 => Box::new(
                RandWeightGen::uniform(limit, 0., 1.).map_err(|e| MlErr::Init(e.to_string()))?,
            ),
            InitScheme::XavierUniform => Box::new(
                RandWeightGen::xavier_uniform(limit, fan_in, fan_out)
                    .map_err(|e| MlErr::Init(e.to_string()))?,
            ),
            InitScheme::XavierNormal => Box::new(
                RandWeightGen::xavier(limit, fan_in, fan_out)
                    .map_err(|e| MlErr::Init(e.to_string()))?,
            ),
        };

        Ok(weight_gen)
    }
}

/// Samples a full set of parameters for `model`, laid out as `[w, b, w2, b2]`.
///
/// # Arguments
/// * `model` - The model to initialize.
/// * `scheme` - The initialization used for `w` and `w2`.
/// * `rng` - A random number generator.
///
/// # Returns
/// The flat parameter vector or an error if a distribution could not be built.
pub fn init_params<R: Rng>(model: &Recurrent, scheme: InitScheme, rng: &mut R) -> Result<Vec<f32>> {
    let state_size = model.state_size();
    let num_classes = model.num_classes();

    let weight_gens: Vec<Box<dyn WeightGen<R>>> = vec![
        scheme.weights(state_size + 1, state_size)?,
        Box::new(ConstWeightGen::new(0., state_size)),
        scheme.weights(state_size, num_classes)?,
        Box::new(ConstWeightGen::new(0., num_classes)),
    ];
    let mut chain = ChainWeightGen::new(weight_gens);

    let size = model.size();
    match chain.sample(rng, size) {
        Some(params) if params.len() == size => Ok(params),
        sample => Err(MlErr::SizeMismatch {
            what: "initialized parameters",
            got: sample.map_or(0, |params| params.len()),
            expected: size,
        }),
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn chain_hands_over_between_generators() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut chain: ChainWeightGen<StdRng> = ChainWeightGen::new(vec![
            Box::new(ConstWeightGen::new(1., 2)),
            Box::new(ConstWeightGen::new(2., 3)),
        ]);

        assert_eq!(chain.remaining(), 5);
        assert_eq!(chain.sample(&mut rng, 3), Some(vec![1., 1., 2.]));
        assert_eq!(chain.sample(&mut rng, 4), Some(vec![2., 2.]));
        assert_eq!(chain.sample(&mut rng, 1), None);
        assert_eq!(chain.remaining(), 0);
    }

    #[test]
    fn reference_init_is_unit_uniform_weights_and_zero_biases() {
        let model = Recurrent::new(4, 2);
        let mut rng = StdRng::seed_from_u64(1);

        let params = init_params(&model, InitScheme::Uniform01, &mut rng).unwrap();
        assert_eq!(params.len(), model.size());

        let (w, rest) = params.split_at(20);
        let (b, rest) = rest.split_at(4);
        let (w2, b2) = rest.split_at(8);

        assert!(w.iter().chain(w2).all(|&v| (0.0..1.0).contains(&v)));
        assert!(b.iter().chain(b2).all(|&v| v == 0.0));
    }

    #[test]
    fn xavier_weights_are_centered() {
        let model = Recurrent::new(8, 2);
        let mut rng = StdRng::seed_from_u64(2);

        let params = init_params(&model, InitScheme::XavierUniform, &mut rng).unwrap();
        let range = (6.0f32 / 17.).sqrt();

        assert!(params[..72].iter().all(|v| v.abs() <= range));
        assert!(params[..72].iter().any(|&v| v < 0.0));
    }

    #[test]
    fn seeded_inits_are_reproducible() {
        let model = Recurrent::new(4, 2);

        let a = init_params(&model, InitScheme::XavierNormal, &mut StdRng::seed_from_u64(9));
        let b = init_params(&model, InitScheme::XavierNormal, &mut StdRng::seed_from_u64(9));
        assert_eq!(a.unwrap(), b.unwrap());
    }
}
