use std::{
    error::Error,
    fmt::{self, Display},
};

use ndarray::ShapeError;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    NotDivisible {
        what: &'static str,
        len: usize,
        by: usize,
    },
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
    InvalidProbability(f64),
    Init(String),
    Shape(ShapeError),
}

impl MlErr {
    /// Whether this error comes from an invalid or incompatible set of hyperparameters.
    ///
    /// # Returns
    /// `true` for every error that should abort before training starts.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            MlErr::SizeMismatch { .. }
                | MlErr::NotDivisible { .. }
                | MlErr::InvalidConfig { .. }
                | MlErr::InvalidProbability(_)
                | MlErr::Init(_)
        )
    }

    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        MlErr::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::NotDivisible { what, len, by } => {
                write!(f, "The length of {what} ({len}) is not evenly divisible by {by}")
            }
            MlErr::InvalidConfig { field, reason } => {
                write!(f, "Invalid configuration for `{field}`: {reason}")
            }
            MlErr::InvalidProbability(p) => {
                write!(f, "The probability {p} is outside of the [0, 1] range")
            }
            MlErr::Init(msg) => write!(f, "Failed to initialize the parameters: {msg}"),
            MlErr::Shape(e) => write!(f, "Shape error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_classified() {
        assert!(MlErr::invalid_config("batch_size", "must be positive").is_config());
        assert!(
            MlErr::NotDivisible {
                what: "series",
                len: 10,
                by: 3
            }
            .is_config()
        );

        let shape = ndarray::Array2::<f32>::from_shape_vec((2, 2), vec![0.0; 3]).unwrap_err();
        assert!(!MlErr::from(shape).is_config());
    }

    #[test]
    fn display_names_the_offending_field() {
        let err = MlErr::invalid_config("num_classes", "must be at least 2, got 1");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for `num_classes`: must be at least 2, got 1"
        );
    }
}
