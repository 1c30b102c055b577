use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{MlErr, Result, initialization::InitScheme};

/// The optimizer applied after every window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Adagrad {
        #[serde(default)]
        initial_accumulator: f32,
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },
    GradientDescent,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adagrad {
            initial_accumulator: 0.0,
            epsilon: default_epsilon(),
        }
    }
}

fn default_epsilon() -> f32 {
    1e-7
}

/// Every hyperparameter of an echo training run.
///
/// Missing fields take the values of the reference run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    pub num_epochs: usize,
    pub total_series_length: usize,
    pub truncated_backprop_length: usize,
    pub state_size: usize,
    pub num_classes: usize,
    pub echo_step: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub flip_probability: f64,
    pub report_every: usize,
    pub seed: Option<u64>,
    pub optimizer: OptimizerConfig,
    pub init: InitScheme,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_epochs: 100,
            total_series_length: 50000,
            truncated_backprop_length: 15,
            state_size: 4,
            num_classes: 2,
            echo_step: 3,
            batch_size: 5,
            learning_rate: 0.3,
            flip_probability: 0.5,
            report_every: 100,
            seed: None,
            optimizer: OptimizerConfig::default(),
            init: InitScheme::default(),
        }
    }
}

impl TrainerConfig {
    /// Checks every hyperparameter and their compatibility with each other.
    ///
    /// # Returns
    /// The first problem found, if any.
    pub fn validate(&self) -> Result<()> {
        positive("num_epochs", self.num_epochs)?;
        positive("total_series_length", self.total_series_length)?;
        positive("truncated_backprop_length", self.truncated_backprop_length)?;
        positive("state_size", self.state_size)?;
        positive("batch_size", self.batch_size)?;
        positive("report_every", self.report_every)?;

        if self.num_classes < 2 {
            return Err(MlErr::invalid_config(
                "num_classes",
                format!("must be at least 2, got {}", self.num_classes),
            ));
        }

        if self.echo_step >= self.total_series_length {
            return Err(MlErr::invalid_config(
                "echo_step",
                format!(
                    "must be lower than total_series_length ({}), got {}",
                    self.total_series_length, self.echo_step
                ),
            ));
        }

        if self.total_series_length % self.batch_size != 0 {
            return Err(MlErr::NotDivisible {
                what: "total_series_length",
                len: self.total_series_length,
                by: self.batch_size,
            });
        }

        let row_len = self.total_series_length / self.batch_size;
        if self.truncated_backprop_length > row_len {
            return Err(MlErr::invalid_config(
                "truncated_backprop_length",
                format!(
                    "must not exceed total_series_length / batch_size ({row_len}), got {}",
                    self.truncated_backprop_length
                ),
            ));
        }

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(MlErr::invalid_config(
                "learning_rate",
                format!("must be a positive number, got {}", self.learning_rate),
            ));
        }

        if !(0.0..=1.0).contains(&self.flip_probability) {
            return Err(MlErr::InvalidProbability(self.flip_probability));
        }

        if let OptimizerConfig::Adagrad {
            initial_accumulator,
            epsilon,
        } = self.optimizer
        {
            if !(initial_accumulator >= 0.0 && epsilon >= 0.0) {
                return Err(MlErr::invalid_config(
                    "optimizer",
                    "adagrad's initial_accumulator and epsilon must not be negative",
                ));
            }
        }

        Ok(())
    }

    /// The amount of windows every epoch is split into.
    pub fn windows_per_epoch(&self) -> usize {
        match self.batch_size * self.truncated_backprop_length {
            0 => 0,
            n => self.total_series_length / n,
        }
    }
}

fn positive(field: &'static str, value: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(value).ok_or_else(|| MlErr::invalid_config(field, "must be positive"))
}
