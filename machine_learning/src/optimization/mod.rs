mod adagrad;
mod gradient_descent;
mod optimizer;

pub use adagrad::Adagrad;
pub use gradient_descent::GradientDescent;
pub use optimizer::Optimizer;
