use std::num::NonZeroUsize;

use log::info;
use rand::{SeedableRng, rngs::StdRng};

use super::{ModelTrainer, OptimizerConfig, TrainerConfig};
use crate::{
    MlErr, Result,
    arch::{Model, Recurrent, loss::SparseCrossEntropy},
    dataset::SequenceGenerator,
    initialization::init_params,
    optimization::{Adagrad, GradientDescent, Optimizer},
};

/// The trainer produced from a `TrainerConfig`.
pub type EchoTrainer = ModelTrainer<Recurrent, Box<dyn Optimizer>, SparseCrossEntropy, StdRng>;

/// Builds `ModelTrainer`s given a configuration.
#[derive(Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new trainer following a configuration.
    ///
    /// # Arguments
    /// * `config` - The hyperparameters of the run.
    ///
    /// # Returns
    /// The trainer, or a configuration error found before any training happens.
    pub fn build(&self, config: &TrainerConfig) -> Result<EchoTrainer> {
        config.validate()?;

        let mut rng = self.generate_rng(config.seed);
        let model = Recurrent::new(config.state_size, config.num_classes);
        let params = init_params(&model, config.init, &mut rng)?;
        let optimizer = self.resolve_optimizer(config, model.size());
        let generator = SequenceGenerator::new(
            config.total_series_length,
            config.echo_step,
            config.flip_probability,
        )?;

        let window_len = NonZeroUsize::new(config.truncated_backprop_length).ok_or_else(|| {
            MlErr::invalid_config("truncated_backprop_length", "must be positive")
        })?;

        info!(
            "built trainer: {} parameters, {} windows per epoch, {} epochs",
            model.size(),
            config.windows_per_epoch(),
            config.num_epochs
        );

        ModelTrainer::new(
            model,
            params,
            optimizer,
            SparseCrossEntropy,
            generator,
            config.batch_size,
            window_len,
            config.num_epochs,
            rng,
        )
    }

    fn resolve_optimizer(&self, config: &TrainerConfig, len: usize) -> Box<dyn Optimizer> {
        let lr = config.learning_rate;

        match config.optimizer {
            OptimizerConfig::Adagrad {
                initial_accumulator,
                epsilon,
            } => Box::new(Adagrad::new(len, lr, initial_accumulator, epsilon)),
            OptimizerConfig::GradientDescent => Box::new(GradientDescent::new(lr)),
        }
    }

    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_reference_model() {
        let config = TrainerConfig {
            seed: Some(1),
            ..Default::default()
        };

        let trainer = TrainerBuilder::new().build(&config).unwrap();

        assert_eq!(trainer.model().state_size(), 4);
        assert_eq!(trainer.params().len(), 34);
    }

    #[test]
    fn invalid_configs_never_build() {
        let config = TrainerConfig {
            batch_size: 7,
            ..Default::default()
        };

        let err = TrainerBuilder::new().build(&config).err().unwrap();
        assert!(err.is_config());
    }
}
