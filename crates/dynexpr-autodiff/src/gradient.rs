//! Forward-mode gradients with respect to all features or all constants.
//!
//! Each node carries a `rows x samples` gradient buffer next to its values.
//! Leaves seed one row with ones; interior nodes rescale (unary) or linearly
//! combine (binary) the children's gradient columns sample by sample.
//!
//! In constants mode row `k` belongs to the `k`-th constant of a pre-order,
//! left-to-right traversal, the same order [`Node::constants`] returns.

use dynexpr_core::{
    constant_index::ConstantIndexTree,
    core::{
        config::EvalConfig,
        error::{EvalError, Result},
        types::{all_finite, DVector, GradientMatrix, SampleMatrix, Scalar},
    },
    eval::{eval_leaf, node_is_finite},
    kernels,
    node::Node,
    operators::OperatorTable,
    promote::{promote, Promote, Promoted},
};
use std::fmt;

/// What the gradient is taken with respect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientMode {
    /// One row per feature of the sample matrix.
    Features,
    /// One row per constant leaf of the tree.
    Constants,
}

impl fmt::Display for GradientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Features => write!(f, "features"),
            Self::Constants => write!(f, "constants"),
        }
    }
}

/// Values and gradient of a tree over a batch of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient<T: Scalar> {
    /// One value per sample
    pub values: DVector<T>,
    /// One row per gradient component, one column per sample
    pub gradient: GradientMatrix<T>,
    /// `false` if any value or gradient entry is NaN or infinite
    pub complete: bool,
}

/// Computes the gradient of `tree` (default configuration).
pub fn gradient<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    mode: GradientMode,
) -> Result<Gradient<T>> {
    gradient_with_config(tree, samples, operators, mode, &EvalConfig::default())
}

/// Computes the gradient of `tree` with respect to all features or all constants.
///
/// Row `i` of a features-mode gradient equals the derivative
/// [`differentiate`](crate::directional::differentiate) returns for direction `i`.
pub fn gradient_with_config<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    mode: GradientMode,
    config: &EvalConfig,
) -> Result<Gradient<T>> {
    operators.require_derivatives()?;

    let (rows, index) = match mode {
        GradientMode::Features => (samples.nrows(), None),
        GradientMode::Constants => {
            let index = ConstantIndexTree::build(tree, 0);
            (index.count(), Some(index))
        }
    };
    log::debug!(
        "gradient w.r.t. {mode}: {rows} rows x {} samples",
        samples.ncols()
    );

    let pass = GradientPass {
        samples,
        operators,
        config,
        mode,
        rows,
    };
    let mut result = pass.node(tree, index.as_ref())?;
    if result.complete
        && !(all_finite(result.values.as_slice()) && all_finite(result.gradient.as_slice()))
    {
        log::debug!("gradient w.r.t. {mode} produced non-finite entries");
        result.complete = false;
    }
    Ok(result)
}

/// Computes the gradient of a tree whose precision may differ from the samples'.
pub fn gradient_mixed<T, U>(
    tree: &Node<T>,
    samples: &SampleMatrix<U>,
    operators: &OperatorTable<Promoted<T, U>>,
    mode: GradientMode,
    config: &EvalConfig,
) -> Result<Gradient<Promoted<T, U>>>
where
    T: Promote<U>,
    U: Scalar,
{
    let inputs = promote(tree, samples);
    gradient_with_config(&inputs.tree, &inputs.samples, operators, mode, config)
}

struct GradientPass<'a, T: Scalar> {
    samples: &'a SampleMatrix<T>,
    operators: &'a OperatorTable<T>,
    config: &'a EvalConfig,
    mode: GradientMode,
    rows: usize,
}

impl<T: Scalar> GradientPass<'_, T> {
    fn node(&self, tree: &Node<T>, index: Option<&ConstantIndexTree>) -> Result<Gradient<T>> {
        match tree {
            Node::Constant(_) | Node::Feature(_) => self.leaf(tree, index),
            Node::Unary { op, child } => {
                let (f, df) = self.operators.unary_with_derivative(*op)?;
                let mut result = self.node(child, unary_child(index)?)?;
                if !result.complete {
                    return Ok(result);
                }
                kernels::unary_gradient(
                    self.config,
                    result.values.as_mut_slice(),
                    result.gradient.as_mut_slice(),
                    self.rows,
                    |x, column| {
                        let scale = df(*x);
                        column.iter_mut().for_each(|g| *g = scale * *g);
                        *x = f(*x);
                    },
                );
                result.complete = node_is_finite(self.config, &result.values);
                Ok(result)
            }
            Node::Binary { op, left, right } => {
                let (g, dg) = self.operators.binary_with_derivative(*op)?;
                let (left_index, right_index) = binary_children(index)?;
                let mut result = self.node(left, left_index)?;
                if !result.complete {
                    return Ok(result);
                }
                let rhs = self.node(right, right_index)?;
                if !rhs.complete {
                    return Ok(rhs);
                }
                kernels::binary_gradient(
                    self.config,
                    result.values.as_mut_slice(),
                    result.gradient.as_mut_slice(),
                    rhs.values.as_slice(),
                    rhs.gradient.as_slice(),
                    self.rows,
                    |l, dl, r, dr| {
                        let (dg_dl, dg_dr) = dg(*l, r);
                        dl.iter_mut()
                            .zip(dr)
                            .for_each(|(a, b)| *a = dg_dl * *a + dg_dr * *b);
                        *l = g(*l, r);
                    },
                );
                result.complete = node_is_finite(self.config, &result.values);
                Ok(result)
            }
        }
    }

    fn leaf(&self, tree: &Node<T>, index: Option<&ConstantIndexTree>) -> Result<Gradient<T>> {
        let values = eval_leaf(tree, self.samples)?;
        let mut gradient = GradientMatrix::zeros(self.rows, values.len());

        let seeded_row = match (self.mode, tree) {
            (GradientMode::Features, Node::Feature(i)) => Some(*i),
            (GradientMode::Constants, Node::Constant(_)) => match index {
                Some(ConstantIndexTree::Leaf(Some(ordinal))) => Some(*ordinal),
                _ => {
                    return Err(EvalError::shape_mismatch(
                        "constant leaf has no ordinal in the constant index tree",
                    ))
                }
            },
            _ => None,
        };
        if let Some(row) = seeded_row {
            if row >= self.rows {
                return Err(EvalError::shape_mismatch(format!(
                    "gradient row {row} out of bounds for {} rows",
                    self.rows
                )));
            }
            gradient.row_mut(row).fill(T::one());
        }

        Ok(Gradient {
            complete: node_is_finite(self.config, &values),
            values,
            gradient,
        })
    }
}

fn unary_child(index: Option<&ConstantIndexTree>) -> Result<Option<&ConstantIndexTree>> {
    match index {
        None => Ok(None),
        Some(ConstantIndexTree::Unary(child)) => Ok(Some(&**child)),
        Some(_) => Err(EvalError::shape_mismatch(
            "unary node paired with a non-unary index node",
        )),
    }
}

fn binary_children(
    index: Option<&ConstantIndexTree>,
) -> Result<(Option<&ConstantIndexTree>, Option<&ConstantIndexTree>)> {
    match index {
        None => Ok((None, None)),
        Some(ConstantIndexTree::Binary(left, right)) => Ok((Some(&**left), Some(&**right))),
        Some(_) => Err(EvalError::shape_mismatch(
            "binary node paired with a non-binary index node",
        )),
    }
}
