mod builder;
mod config;
mod metrics;
mod model_trainer;
mod report;
mod schedule;
mod state;

pub use builder::{EchoTrainer, TrainerBuilder};
pub use config::{OptimizerConfig, TrainerConfig};
pub use metrics::{EpochSummary, TrainMetrics};
pub use model_trainer::{ModelTrainer, TrainSummary};
pub use report::{LogReporter, LossHistory, Reporter, WindowReport};
pub use schedule::Schedule;
pub use state::HiddenState;
