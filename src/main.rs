use std::{env, num::NonZeroUsize, path::PathBuf};

use anyhow::{Context, Result};
use log::info;
use machine_learning::training::{LogReporter, TrainerBuilder};

mod config;

fn main() -> Result<()> {
    env_logger::init();

    let path = env::args().nth(1).map(PathBuf::from);
    let config = config::resolve(path.as_deref())?;
    info!("config: {config:?}");

    let mut trainer = TrainerBuilder::new()
        .build(&config)
        .context("invalid training configuration")?;

    let every = NonZeroUsize::new(config.report_every).context("report_every must be positive")?;
    let mut reporter = LogReporter::new(every);

    let summary = trainer.train(&mut reporter)?;
    let metrics = &summary.metrics;

    info!(
        "done: {} epochs, {} windows, {} samples in {:.2?}, final loss {:?}",
        metrics.epochs, metrics.windows, metrics.samples, metrics.compute_time, metrics.last_loss
    );

    if let Some(last) = summary.epochs.last() {
        info!(
            "last epoch: mean loss {:.6}, accuracy {:.3}",
            last.mean_loss, last.accuracy
        );
    }

    Ok(())
}
