pub mod activations;
mod cell;
mod classifier;
pub mod layers;
pub mod loss;
mod model;
mod recurrent;

pub use cell::{RecurrentCell, Unrolled};
pub use classifier::Classifier;
pub use model::Model;
pub use recurrent::{ForwardPass, Recurrent};
