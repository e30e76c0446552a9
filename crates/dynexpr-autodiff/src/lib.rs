//! Forward-mode differentiation of dynamic expression trees.
//!
//! This crate differentiates the trees of [`dynexpr_core`] over batches of
//! samples, propagating derivatives alongside values from the leaves to the
//! root. There is no tape and no graph: each engine is one recursion over the
//! node degree, mirroring the value-only evaluator.
//!
//! # Features
//!
//! - **Directional derivatives**: Derivative with respect to one feature
//! - **Gradients**: All features or all constants at once, one row per component
//! - **Completeness flag**: NaN/infinity is reported as `complete == false`, not as an error
//! - **Finite differences**: Central-difference approximations for validation
//!
//! # Architecture
//!
//! 1. **Directional**: Value and tangent buffers per node
//! 2. **Gradient**: Value buffer and `rows x samples` gradient buffer per node
//! 3. **Finite difference**: Value-only reference derivatives

pub mod directional;
pub mod finite_difference;
pub mod gradient;

// Re-export key types
pub use directional::{
    differentiate, differentiate_mixed, differentiate_with_config, DirectionalDerivative,
};
pub use gradient::{gradient, gradient_mixed, gradient_with_config, Gradient, GradientMode};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::directional::{
        differentiate, differentiate_mixed, differentiate_with_config, DirectionalDerivative,
    };
    pub use crate::finite_difference;
    pub use crate::gradient::{
        gradient, gradient_mixed, gradient_with_config, Gradient, GradientMode,
    };
    pub use dynexpr_core::prelude::*;
}
