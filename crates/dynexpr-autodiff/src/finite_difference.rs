//! Central finite differences for checking analytic derivatives.
//!
//! These routines only use the value-only evaluator, so they are independent
//! of the derivative tables. They are slow (two evaluations per component) and
//! meant for validation, not for search loops.

use dynexpr_core::{
    core::{
        config::EvalConfig,
        error::Result,
        types::{DVector, GradientMatrix, SampleMatrix, Scalar},
    },
    eval::{eval_tree_with_config, feature_row},
    node::Node,
    operators::OperatorTable,
};
use crate::gradient::{gradient, GradientMode};
use num_traits::Float;

fn central<T: Scalar>(plus: &DVector<T>, minus: &DVector<T>, step: T) -> DVector<T> {
    let two_h = step + step;
    plus.zip_map(minus, |p, m| (p - m) / two_h)
}

/// Approximates the derivative along feature `direction` with step `step`.
pub fn directional<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    direction: usize,
    step: T,
) -> Result<DVector<T>> {
    let config = EvalConfig::default().with_early_exit(false);
    let row = feature_row(samples, direction)?;

    let mut perturbed = samples.clone();
    perturbed.set_row(direction, &row.add_scalar(step).transpose());
    let plus = eval_tree_with_config(tree, &perturbed, operators, &config)?.values;
    perturbed.set_row(direction, &row.add_scalar(-step).transpose());
    let minus = eval_tree_with_config(tree, &perturbed, operators, &config)?.values;

    Ok(central(&plus, &minus, step))
}

/// Approximates the gradient with respect to every feature.
pub fn features<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    step: T,
) -> Result<GradientMatrix<T>> {
    let mut out = GradientMatrix::zeros(samples.nrows(), samples.ncols());
    for i in 0..samples.nrows() {
        let d = directional(tree, samples, operators, i, step)?;
        out.set_row(i, &d.transpose());
    }
    Ok(out)
}

/// Approximates the gradient with respect to every constant, in the order
/// [`Node::constants`] lists them.
pub fn constants<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    step: T,
) -> Result<GradientMatrix<T>> {
    let config = EvalConfig::default().with_early_exit(false);
    let base = tree.constants();
    let mut out = GradientMatrix::zeros(base.len(), samples.ncols());
    let mut shifted = tree.clone();

    for k in 0..base.len() {
        let mut values = base.clone();
        values[k] = base[k] + step;
        shifted.set_constants(&values)?;
        let plus = eval_tree_with_config(&shifted, samples, operators, &config)?.values;
        values[k] = base[k] - step;
        shifted.set_constants(&values)?;
        let minus = eval_tree_with_config(&shifted, samples, operators, &config)?.values;
        out.set_row(k, &central(&plus, &minus, step).transpose());
    }
    Ok(out)
}

/// Largest relative error between the analytic gradient and central
/// differences taken with [`Scalar::FD_STEP`].
///
/// Returns `None` when the analytic gradient is incomplete, since there is
/// nothing meaningful to compare. Compare the result against
/// [`Scalar::FD_TOLERANCE`].
pub fn check_gradient<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    mode: GradientMode,
) -> Result<Option<T>> {
    let analytic = gradient(tree, samples, operators, mode)?;
    if !analytic.complete {
        return Ok(None);
    }
    let numeric = match mode {
        GradientMode::Features => features(tree, samples, operators, T::FD_STEP)?,
        GradientMode::Constants => constants(tree, samples, operators, T::FD_STEP)?,
    };
    Ok(Some(max_relative_error(
        analytic.gradient.as_slice(),
        numeric.as_slice(),
    )))
}

/// Largest relative error between two buffers.
///
/// Each difference is scaled by `max(|a|, |b|, 1)`, so entries near zero are
/// compared absolutely. Returns infinity if the lengths differ.
pub fn max_relative_error<T: Scalar>(a: &[T], b: &[T]) -> T {
    if a.len() != b.len() {
        return <T as Float>::infinity();
    }
    a.iter().zip(b).fold(T::zero(), |worst, (&x, &y)| {
        let scale = Float::max(Float::max(Float::abs(x), Float::abs(y)), T::one());
        Float::max(worst, Float::abs(x - y) / scale)
    })
}
