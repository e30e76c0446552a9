//! # dynexpr
//!
//! Evaluation and forward-mode differentiation of dynamic expression trees.
//!
//! Expression trees are built at runtime from constants, feature references
//! and operators looked up by index in an [`OperatorTable`]. This crate
//! re-exports the pieces from its member crates:
//!
//! - [`dynexpr_core`]: trees, operator tables, value evaluation
//! - [`dynexpr_autodiff`]: directional derivatives and gradients (feature `autodiff`)
//!
//! ## Quick Start
//!
//! ```rust
//! use dynexpr::prelude::*;
//!
//! let ops = standard::<f64>();
//! // sin(x0) * 2
//! let tree = Node::binary(
//!     binary::MUL,
//!     Node::unary(unary::SIN, Node::feature(0)),
//!     Node::constant(2.0),
//! );
//! let x = SampleMatrix::from_row_slice(1, 2, &[0.0, 1.0]);
//!
//! let result = eval_tree(&tree, &x, &ops).unwrap();
//! assert!(result.complete);
//!
//! # #[cfg(feature = "autodiff")]
//! # {
//! let grad = gradient(&tree, &x, &ops, GradientMode::Constants).unwrap();
//! assert_eq!(grad.gradient.nrows(), 1);
//! # }
//! ```

pub use dynexpr_core;

#[cfg(feature = "autodiff")]
pub use dynexpr_autodiff;

pub use nalgebra;

pub use dynexpr_core::{
    eval_tree, eval_tree_with_config, ConstantIndexTree, EvalConfig, EvalError, Evaluation, Node,
    OperatorTable, Result, Scalar,
};

#[cfg(feature = "autodiff")]
pub use dynexpr_autodiff::{
    differentiate, differentiate_with_config, gradient, gradient_with_config,
    DirectionalDerivative, Gradient, GradientMode,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use dynexpr_core::prelude::*;

    #[cfg(feature = "autodiff")]
    pub use dynexpr_autodiff::prelude::*;
}
