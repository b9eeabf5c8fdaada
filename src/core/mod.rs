//! Core business logic modules

pub mod estimator;
pub mod kelly;
pub mod linalg;

// Re-export commonly used types
pub use estimator::{compute_returns, estimate, ReturnEstimator, ReturnMatrix};
pub use kelly::{
    compute_half_kelly, compute_kelly_vector, compute_max_growth_rate, compute_sharpe, solve,
    KellySolver,
};
