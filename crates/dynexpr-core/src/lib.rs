//! Expression trees, operator tables and value evaluation.
//!
//! This crate provides the data model shared by the evaluation and
//! differentiation engines: small expression trees built from constants,
//! features and indexed unary/binary operators, evaluated column-wise
//! against a batch of samples.
//!
//! # Key Concepts
//!
//! - **Trees**: Strict rooted trees of degree 0, 1 or 2 nodes
//! - **Operator tables**: Indexed registries of pure functions and, optionally, their derivatives
//! - **Completeness**: Numerically invalid results are flagged, never raised as errors
//!
//! # Modules
//!
//! - [`core`]: Scalar trait, type aliases, errors and configuration
//! - [`node`]: Expression tree nodes
//! - [`operators`]: Operator tables and a standard operator library
//! - [`constant_index`]: Stable ordinals for constant leaves
//! - [`kernels`]: Per-sample loops, sequential or on the rayon pool
//! - [`eval`]: Value-only evaluation
//! - [`promote`]: Mixed-precision promotion

pub mod constant_index;
pub mod core;
pub mod eval;
pub mod kernels;
pub mod node;
pub mod operators;
pub mod promote;

// Re-export commonly used items at the crate root
pub use crate::core::{
    config::EvalConfig,
    error::{EvalError, OperatorKind, Result},
    types::{DMatrix, DVector, GradientMatrix, SampleMatrix, Scalar},
};
pub use constant_index::ConstantIndexTree;
pub use eval::{eval_leaf, eval_tree, eval_tree_mixed, eval_tree_with_config, Evaluation};
pub use node::Node;
pub use operators::{OperatorTable, OperatorTableBuilder};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use dynexpr_core::prelude::*;
///
/// let ops = standard::<f64>();
/// let tree = Node::binary(binary::ADD, Node::feature(0), Node::constant(2.0));
/// let samples = SampleMatrix::from_row_slice(1, 2, &[1.0, 3.0]);
/// let result = eval_tree(&tree, &samples, &ops).unwrap();
/// assert_eq!(result.values.as_slice(), &[3.0, 5.0]);
/// ```
pub mod prelude {
    pub use crate::constant_index::ConstantIndexTree;
    pub use crate::core::{
        config::EvalConfig,
        error::{EvalError, OperatorKind, Result},
        types::{DMatrix, DVector, GradientMatrix, SampleMatrix, Scalar},
    };
    pub use crate::eval::{eval_leaf, eval_tree, eval_tree_mixed, eval_tree_with_config, Evaluation};
    pub use crate::node::Node;
    pub use crate::operators::{
        standard::{binary, standard, unary},
        BinaryDerivFn, BinaryFn, OperatorTable, OperatorTableBuilder, UnaryFn,
    };
    pub use crate::promote::{promote, Promote, Promoted};
}
