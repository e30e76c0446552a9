//! Value-only evaluation of expression trees.
//!
//! The evaluator walks a tree bottom-up against a sample matrix (one row per
//! feature, one column per sample) and produces one value per sample. A
//! numerically invalid result is not an error: it comes back with
//! `complete == false`, and recursion stops at the first node that detects it.

use crate::{
    core::{
        config::EvalConfig,
        error::{EvalError, Result},
        types::{all_finite, DVector, SampleMatrix, Scalar},
    },
    kernels,
    node::Node,
    operators::OperatorTable,
    promote::{promote, Promote, Promoted},
};

/// Values of a tree over a batch of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<T: Scalar> {
    /// One value per sample
    pub values: DVector<T>,
    /// `false` if any value is NaN or infinite
    pub complete: bool,
}

/// Row `index` of the sample matrix as a vector over samples.
pub fn feature_row<T: Scalar>(samples: &SampleMatrix<T>, index: usize) -> Result<DVector<T>> {
    if index >= samples.nrows() {
        return Err(EvalError::feature_out_of_bounds(index, samples.nrows()));
    }
    Ok(samples.row(index).transpose())
}

/// Values of a leaf: the constant broadcast to every sample, or the feature row.
pub fn eval_leaf<T: Scalar>(node: &Node<T>, samples: &SampleMatrix<T>) -> Result<DVector<T>> {
    match node {
        Node::Constant(c) => Ok(DVector::from_element(samples.ncols(), *c)),
        Node::Feature(i) => feature_row(samples, *i),
        _ => Err(EvalError::shape_mismatch(format!(
            "expected a leaf, got a degree-{} node",
            node.degree()
        ))),
    }
}

/// Whether a freshly computed node result may continue upward.
///
/// Always `true` when `config.early_exit` is off.
pub fn node_is_finite<T: Scalar>(config: &EvalConfig, values: &DVector<T>) -> bool {
    !config.early_exit || all_finite(values.as_slice())
}

/// Evaluates `tree` on every sample with the default configuration.
pub fn eval_tree<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
) -> Result<Evaluation<T>> {
    eval_tree_with_config(tree, samples, operators, &EvalConfig::default())
}

/// Evaluates `tree` on every sample.
///
/// Derivative lists are not needed. The final values are always scanned for
/// non-finite entries, whatever `config.early_exit` says.
pub fn eval_tree_with_config<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    config: &EvalConfig,
) -> Result<Evaluation<T>> {
    let mut result = eval_node(tree, samples, operators, config)?;
    if result.complete && !all_finite(result.values.as_slice()) {
        log::debug!("evaluation produced non-finite values");
        result.complete = false;
    }
    Ok(result)
}

/// Evaluates a tree whose precision may differ from the samples'.
pub fn eval_tree_mixed<T, U>(
    tree: &Node<T>,
    samples: &SampleMatrix<U>,
    operators: &OperatorTable<Promoted<T, U>>,
    config: &EvalConfig,
) -> Result<Evaluation<Promoted<T, U>>>
where
    T: Promote<U>,
    U: Scalar,
{
    let inputs = promote(tree, samples);
    eval_tree_with_config(&inputs.tree, &inputs.samples, operators, config)
}

fn eval_node<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    config: &EvalConfig,
) -> Result<Evaluation<T>> {
    match tree {
        Node::Constant(_) | Node::Feature(_) => {
            let values = eval_leaf(tree, samples)?;
            let complete = node_is_finite(config, &values);
            Ok(Evaluation { values, complete })
        }
        Node::Unary { op, child } => {
            let f = operators.unary(*op)?;
            let mut result = eval_node(child, samples, operators, config)?;
            if !result.complete {
                return Ok(result);
            }
            kernels::map_in_place(config, result.values.as_mut_slice(), f);
            result.complete = node_is_finite(config, &result.values);
            Ok(result)
        }
        Node::Binary { op, left, right } => {
            let g = operators.binary(*op)?;
            let mut result = eval_node(left, samples, operators, config)?;
            if !result.complete {
                return Ok(result);
            }
            let rhs = eval_node(right, samples, operators, config)?;
            if !rhs.complete {
                return Ok(rhs);
            }
            kernels::zip_map_in_place(
                config,
                result.values.as_mut_slice(),
                rhs.values.as_slice(),
                g,
            );
            result.complete = node_is_finite(config, &result.values);
            Ok(result)
        }
    }
}
