mod batched;
mod series;
mod window;

pub use batched::BatchedSeries;
pub use series::{SequenceGenerator, Series};
pub use window::{Window, Windows};
