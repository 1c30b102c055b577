mod dense;

pub use dense::{Dense, DensePass};
