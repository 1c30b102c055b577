mod act_fn;
mod softmax;
mod tanh;

pub use act_fn::ActFn;
pub use softmax::{argmax, log_sum_exp, softmax};
pub use tanh::Tanh;
