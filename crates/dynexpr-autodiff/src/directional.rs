//! Forward derivative with respect to one feature.
//!
//! The engine mirrors the value-only evaluator: the same recursion over node
//! degree, but every node carries a tangent buffer alongside its values. At a
//! leaf the tangent is one for the selected feature and zero otherwise; unary
//! nodes apply the chain rule and binary nodes combine both child tangents with
//! the operator's partial derivatives.

use dynexpr_core::{
    core::{
        config::EvalConfig,
        error::{EvalError, Result},
        types::{all_finite, DVector, SampleMatrix, Scalar},
    },
    eval::{eval_leaf, node_is_finite},
    kernels,
    node::Node,
    operators::OperatorTable,
    promote::{promote, Promote, Promoted},
};

/// Values and directional derivative of a tree over a batch of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalDerivative<T: Scalar> {
    /// One value per sample
    pub values: DVector<T>,
    /// Derivative of each value with respect to the selected feature
    pub derivative: DVector<T>,
    /// `false` if any value or derivative is NaN or infinite
    pub complete: bool,
}

/// Differentiates `tree` with respect to feature `direction` (default configuration).
pub fn differentiate<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    direction: usize,
) -> Result<DirectionalDerivative<T>> {
    differentiate_with_config(tree, samples, operators, direction, &EvalConfig::default())
}

/// Differentiates `tree` with respect to feature `direction`.
///
/// Fails if the operator table has no derivatives or `direction` is not a
/// row of `samples`. Non-finite results are reported with `complete == false`.
pub fn differentiate_with_config<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    direction: usize,
    config: &EvalConfig,
) -> Result<DirectionalDerivative<T>> {
    operators.require_derivatives()?;
    if direction >= samples.nrows() {
        return Err(EvalError::invalid_direction(direction, samples.nrows()));
    }

    let mut result = diff_node(tree, samples, operators, direction, config)?;
    if result.complete
        && !(all_finite(result.values.as_slice()) && all_finite(result.derivative.as_slice()))
    {
        log::debug!("derivative along feature {direction} produced non-finite entries");
        result.complete = false;
    }
    Ok(result)
}

/// Differentiates a tree whose precision may differ from the samples'.
///
/// Both are promoted to the wider precision first; see [`promote`].
pub fn differentiate_mixed<T, U>(
    tree: &Node<T>,
    samples: &SampleMatrix<U>,
    operators: &OperatorTable<Promoted<T, U>>,
    direction: usize,
    config: &EvalConfig,
) -> Result<DirectionalDerivative<Promoted<T, U>>>
where
    T: Promote<U>,
    U: Scalar,
{
    let inputs = promote(tree, samples);
    differentiate_with_config(&inputs.tree, &inputs.samples, operators, direction, config)
}

fn diff_node<T: Scalar>(
    tree: &Node<T>,
    samples: &SampleMatrix<T>,
    operators: &OperatorTable<T>,
    direction: usize,
    config: &EvalConfig,
) -> Result<DirectionalDerivative<T>> {
    match tree {
        Node::Constant(_) | Node::Feature(_) => {
            let values = eval_leaf(tree, samples)?;
            let seed = if matches!(tree, Node::Feature(i) if *i == direction) {
                T::one()
            } else {
                T::zero()
            };
            Ok(DirectionalDerivative {
                derivative: DVector::from_element(values.len(), seed),
                complete: node_is_finite(config, &values),
                values,
            })
        }
        Node::Unary { op, child } => {
            let (f, df) = operators.unary_with_derivative(*op)?;
            let mut result = diff_node(child, samples, operators, direction, config)?;
            if !result.complete {
                return Ok(result);
            }
            kernels::unary_tangent(
                config,
                result.values.as_mut_slice(),
                result.derivative.as_mut_slice(),
                |x, dx| {
                    *dx = df(*x) * *dx;
                    *x = f(*x);
                },
            );
            result.complete = node_is_finite(config, &result.values);
            Ok(result)
        }
        Node::Binary { op, left, right } => {
            let (g, dg) = operators.binary_with_derivative(*op)?;
            let mut result = diff_node(left, samples, operators, direction, config)?;
            if !result.complete {
                return Ok(result);
            }
            let rhs = diff_node(right, samples, operators, direction, config)?;
            if !rhs.complete {
                return Ok(rhs);
            }
            kernels::binary_tangent(
                config,
                result.values.as_mut_slice(),
                result.derivative.as_mut_slice(),
                rhs.values.as_slice(),
                rhs.derivative.as_slice(),
                |l, dl, r, dr| {
                    let (dg_dl, dg_dr) = dg(*l, r);
                    *dl = dg_dl * *dl + dg_dr * dr;
                    *l = g(*l, r);
                },
            );
            result.complete = node_is_finite(config, &result.values);
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dynexpr_core::{
        core::error::OperatorKind,
        operators::standard::{binary, standard, unary},
    };

    fn samples() -> SampleMatrix<f64> {
        SampleMatrix::from_row_slice(2, 4, &[0.5, 1.0, 1.5, 2.0, -1.0, 0.0, 1.0, 3.0])
    }

    #[test]
    fn test_feature_leaf_seeds() {
        let ops = standard::<f64>();
        let x = samples();
        let tree = Node::feature(1);

        let d = differentiate(&tree, &x, &ops, 1).unwrap();
        assert!(d.complete);
        assert_eq!(d.derivative.as_slice(), &[1.0; 4]);
        assert_eq!(d.values.as_slice(), &[-1.0, 0.0, 1.0, 3.0]);

        let d = differentiate(&tree, &x, &ops, 0).unwrap();
        assert_eq!(d.derivative.as_slice(), &[0.0; 4]);

        let d = differentiate(&Node::constant(4.0), &x, &ops, 0).unwrap();
        assert_eq!(d.values.as_slice(), &[4.0; 4]);
        assert_eq!(d.derivative.as_slice(), &[0.0; 4]);
    }

    #[test]
    fn test_chain_rule() {
        let ops = standard::<f64>();
        let x = samples();
        // sin(x0 * x0)
        let tree = Node::unary(
            unary::SIN,
            Node::binary(binary::MUL, Node::feature(0), Node::feature(0)),
        );
        let d = differentiate(&tree, &x, &ops, 0).unwrap();
        assert!(d.complete);
        for j in 0..4 {
            let x0: f64 = x[(0, j)];
            assert_relative_eq!(d.values[j], (x0 * x0).sin(), epsilon = 1e-12);
            assert_relative_eq!(d.derivative[j], 2.0 * x0 * (x0 * x0).cos(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_quotient_rule() {
        let ops = standard::<f64>();
        let x = samples();
        // x1 / x0
        let tree = Node::binary(binary::DIV, Node::feature(1), Node::feature(0));
        let d0 = differentiate(&tree, &x, &ops, 0).unwrap();
        let d1 = differentiate(&tree, &x, &ops, 1).unwrap();
        for j in 0..4 {
            let (x0, x1): (f64, f64) = (x[(0, j)], x[(1, j)]);
            assert_relative_eq!(d0.derivative[j], -x1 / (x0 * x0), epsilon = 1e-12);
            assert_relative_eq!(d1.derivative[j], 1.0 / x0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_requires_derivatives() {
        let ops = standard::<f64>().without_derivatives();
        let err = differentiate(&Node::feature(0), &samples(), &ops, 0).unwrap_err();
        assert_eq!(err, EvalError::missing_derivatives(OperatorKind::Unary));
    }

    #[test]
    fn test_invalid_direction() {
        let ops = standard::<f64>();
        let err = differentiate(&Node::feature(0), &samples(), &ops, 2).unwrap_err();
        assert_eq!(err, EvalError::invalid_direction(2, 2));
    }

    #[test]
    fn test_domain_error_is_incomplete() {
        let ops = standard::<f64>();
        // log(x1) hits log(-1) and log(0)
        let tree = Node::unary(unary::LOG, Node::feature(1));
        let d = differentiate(&tree, &samples(), &ops, 1).unwrap();
        assert!(!d.complete);
        assert_eq!(d.values.len(), 4);
        assert_eq!(d.derivative.len(), 4);
    }

    #[test]
    fn test_non_finite_derivative_only() {
        let ops = standard::<f64>();
        // sqrt(x1 * x1) is finite everywhere, but its derivative at x1 = 0 is 0 * inf
        let tree = Node::unary(
            unary::SQRT,
            Node::binary(binary::MUL, Node::feature(1), Node::feature(1)),
        );
        let d = differentiate(&tree, &samples(), &ops, 1).unwrap();
        assert!(d.values.iter().all(|v| v.is_finite()));
        assert!(!d.complete);
    }

    #[test]
    fn test_non_finite_constant_is_incomplete() {
        let ops = standard::<f64>();
        // tanh(+inf) * x0 is finite with derivative tanh(+inf) = 1
        let tree = Node::binary(
            binary::MUL,
            Node::unary(unary::TANH, Node::constant(f64::INFINITY)),
            Node::feature(0),
        );
        let d = differentiate(&tree, &samples(), &ops, 0).unwrap();
        assert!(!d.complete);
        assert_eq!(d.derivative.len(), 4);
    }

    #[test]
    fn test_mixed_precision() {
        let ops = standard::<f64>();
        let tree: Node<f32> = Node::binary(binary::MUL, Node::feature(0), Node::constant(3.0));
        let d = differentiate_mixed(&tree, &samples(), &ops, 0, &EvalConfig::default()).unwrap();
        assert!(d.complete);
        assert_eq!(d.derivative.as_slice(), &[3.0; 4]);
    }
}
