use std::time::Duration;

/// Counters collected over a whole training run.
#[derive(Debug, Default, Clone)]
pub struct TrainMetrics {
    pub compute_time: Duration,

    pub epochs: u64,
    pub windows: u64,
    pub samples: u64,

    pub last_loss: Option<f32>,
    pub stopped_early: bool,
}

impl TrainMetrics {
    #[inline]
    pub fn bump_epoch(&mut self) {
        self.epochs += 1;
    }

    #[inline]
    pub fn bump_window(&mut self, samples: usize, loss: f32) {
        self.windows += 1;
        self.samples += samples as u64;
        self.last_loss = Some(loss);
    }
}

/// The mean loss and accuracy over the windows of one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    pub epoch: usize,
    pub windows: usize,
    pub mean_loss: f32,
    pub accuracy: f32,
}
