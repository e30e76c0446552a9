//! Type definitions and aliases for expression evaluation.
//!
//! This module provides the scalar trait shared by trees, operator tables and
//! sample matrices, plus the matrix/vector aliases used for every buffer the
//! engines hand back.

use nalgebra::{Dyn, OMatrix, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, NumCast};
use std::fmt::{Debug, Display};

/// Trait for scalar types a tree can be evaluated in (f32 or f64).
///
/// This trait combines all the numeric traits required by the evaluator
/// and the forward-mode differentiation engines.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + NumCast
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Default step for central finite differences.
    const FD_STEP: Self;

    /// Default relative tolerance when comparing analytic derivatives against
    /// central finite differences taken with [`FD_STEP`](Self::FD_STEP).
    const FD_TOLERANCE: Self;

    /// Convert into another scalar type.
    ///
    /// Values outside the target range become infinities, as with `as` casts
    /// between float widths.
    fn cast<U: Scalar>(self) -> U {
        num_traits::cast(self).unwrap_or_else(<U as Float>::nan)
    }
}

impl Scalar for f32 {
    const FD_STEP: Self = 1e-3;
    const FD_TOLERANCE: Self = 1e-2;
}

impl Scalar for f64 {
    const FD_STEP: Self = 1e-6;
    const FD_TOLERANCE: Self = 1e-4;
}

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Input samples: one row per feature, one column per sample.
pub type SampleMatrix<T> = DMatrix<T>;

/// Gradient buffer: one row per gradient component, one column per sample.
pub type GradientMatrix<T> = DMatrix<T>;

/// Returns `true` if every entry of the slice is finite.
///
/// This is the scan used for completeness checks on value, derivative and
/// gradient buffers.
pub fn all_finite<T: Scalar>(data: &[T]) -> bool {
    data.iter().all(|x| Float::is_finite(*x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_constants() {
        assert!(<f64 as Scalar>::FD_STEP < <f64 as From<f32>>::from(<f32 as Scalar>::FD_STEP));
        assert!(<f64 as Scalar>::FD_TOLERANCE < <f64 as From<f32>>::from(<f32 as Scalar>::FD_TOLERANCE));
    }

    #[test]
    fn test_cast_between_widths() {
        let x: f64 = 1.5;
        let y: f32 = x.cast();
        assert_eq!(y, 1.5_f32);

        let big: f64 = 1e300;
        let z: f32 = big.cast();
        assert!(!z.is_finite());
    }

    #[test]
    fn test_all_finite() {
        assert!(all_finite(&[1.0_f64, -2.0, 0.0]));
        assert!(!all_finite(&[1.0_f64, f64::NAN]));
        assert!(!all_finite(&[f32::INFINITY]));
        assert!(all_finite::<f64>(&[]));
    }
}
