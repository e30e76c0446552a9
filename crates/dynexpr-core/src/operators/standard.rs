//! A ready-made table of common operators with derivatives.
//!
//! Domain violations (`log` of a negative number, division by zero, ...)
//! produce NaN or infinity rather than panicking, so they surface through the
//! completeness flag of the engines.

use super::{BinaryDerivFn, BinaryFn, OperatorTable, UnaryFn};
use crate::core::types::Scalar;
use num_traits::Float;

/// Indices of the binary operators in [`standard`].
pub mod binary {
    /// `l + r`
    pub const ADD: usize = 0;
    /// `l - r`
    pub const SUB: usize = 1;
    /// `l * r`
    pub const MUL: usize = 2;
    /// `l / r`
    pub const DIV: usize = 3;
    /// `l ^ r`
    pub const POW: usize = 4;
}

/// Indices of the unary operators in [`standard`].
pub mod unary {
    /// `-x`
    pub const NEG: usize = 0;
    /// `x^2`
    pub const SQUARE: usize = 1;
    /// `x^3`
    pub const CUBE: usize = 2;
    /// `sqrt(x)`
    pub const SQRT: usize = 3;
    /// `exp(x)`
    pub const EXP: usize = 4;
    /// `ln(x)`
    pub const LOG: usize = 5;
    /// `sin(x)`
    pub const SIN: usize = 6;
    /// `cos(x)`
    pub const COS: usize = 7;
    /// `tanh(x)`
    pub const TANH: usize = 8;
    /// `|x|`
    pub const ABS: usize = 9;
}

fn two<T: Scalar>() -> T {
    T::one() + T::one()
}

/// `l + r`
pub fn add<T: Scalar>(l: T, r: T) -> T {
    l + r
}

fn d_add<T: Scalar>(_l: T, _r: T) -> (T, T) {
    (T::one(), T::one())
}

/// `l - r`
pub fn sub<T: Scalar>(l: T, r: T) -> T {
    l - r
}

fn d_sub<T: Scalar>(_l: T, _r: T) -> (T, T) {
    (T::one(), -T::one())
}

/// `l * r`
pub fn mul<T: Scalar>(l: T, r: T) -> T {
    l * r
}

fn d_mul<T: Scalar>(l: T, r: T) -> (T, T) {
    (r, l)
}

/// `l / r`
pub fn div<T: Scalar>(l: T, r: T) -> T {
    l / r
}

fn d_div<T: Scalar>(l: T, r: T) -> (T, T) {
    (T::one() / r, -l / (r * r))
}

/// `l ^ r`; NaN for a negative base with a non-integer exponent.
pub fn pow<T: Scalar>(l: T, r: T) -> T {
    Float::powf(l, r)
}

// The exponent partial uses ln|l| (the real part of the complex log), and is
// zero at a zero base, so integer powers of non-positive bases stay finite.
fn d_pow<T: Scalar>(l: T, r: T) -> (T, T) {
    let d_exponent = if l == T::zero() {
        T::zero()
    } else {
        Float::powf(l, r) * Float::ln(Float::abs(l))
    };
    (r * Float::powf(l, r - T::one()), d_exponent)
}

/// `-x`
pub fn neg<T: Scalar>(x: T) -> T {
    -x
}

fn d_neg<T: Scalar>(_x: T) -> T {
    -T::one()
}

/// `x^2`
pub fn square<T: Scalar>(x: T) -> T {
    x * x
}

fn d_square<T: Scalar>(x: T) -> T {
    two::<T>() * x
}

/// `x^3`
pub fn cube<T: Scalar>(x: T) -> T {
    x * x * x
}

fn d_cube<T: Scalar>(x: T) -> T {
    (two::<T>() + T::one()) * x * x
}

/// `sqrt(x)`
pub fn sqrt<T: Scalar>(x: T) -> T {
    Float::sqrt(x)
}

fn d_sqrt<T: Scalar>(x: T) -> T {
    T::one() / (two::<T>() * Float::sqrt(x))
}

/// `exp(x)`
pub fn exp<T: Scalar>(x: T) -> T {
    Float::exp(x)
}

/// `ln(x)`
pub fn log<T: Scalar>(x: T) -> T {
    Float::ln(x)
}

fn d_log<T: Scalar>(x: T) -> T {
    T::one() / x
}

/// `sin(x)`
pub fn sin<T: Scalar>(x: T) -> T {
    Float::sin(x)
}

/// `cos(x)`
pub fn cos<T: Scalar>(x: T) -> T {
    Float::cos(x)
}

fn d_cos<T: Scalar>(x: T) -> T {
    -Float::sin(x)
}

/// `tanh(x)`
pub fn tanh<T: Scalar>(x: T) -> T {
    Float::tanh(x)
}

fn d_tanh<T: Scalar>(x: T) -> T {
    let t = Float::tanh(x);
    T::one() - t * t
}

/// `|x|`
pub fn abs<T: Scalar>(x: T) -> T {
    Float::abs(x)
}

// Subgradient 0 at the kink.
fn d_abs<T: Scalar>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else if x < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}

/// Builds the standard table: binary `add, sub, mul, div, pow` and unary
/// `neg, square, cube, sqrt, exp, log, sin, cos, tanh, abs`, all with
/// derivatives. Indices are listed in [`binary`] and [`unary`].
pub fn standard<T: Scalar>() -> OperatorTable<T> {
    let binaries: [(&'static str, BinaryFn<T>, BinaryDerivFn<T>); 5] = [
        ("add", add, d_add),
        ("sub", sub, d_sub),
        ("mul", mul, d_mul),
        ("div", div, d_div),
        ("pow", pow, d_pow),
    ];
    let unaries: [(&'static str, UnaryFn<T>, UnaryFn<T>); 10] = [
        ("neg", neg, d_neg),
        ("square", square, d_square),
        ("cube", cube, d_cube),
        ("sqrt", sqrt, d_sqrt),
        ("exp", exp, exp),
        ("log", log, d_log),
        ("sin", sin, cos),
        ("cos", cos, d_cos),
        ("tanh", tanh, d_tanh),
        ("abs", abs, d_abs),
    ];

    let builder = binaries
        .into_iter()
        .fold(OperatorTable::builder(), |b, (name, g, dg)| {
            b.binary_differentiable(name, g, dg)
        });
    unaries
        .into_iter()
        .fold(builder, |b, (name, f, df)| b.unary_differentiable(name, f, df))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_indices_match_names() {
        let table = standard::<f64>();
        assert!(table.has_derivatives());
        assert_eq!(table.binary_index("add"), Some(binary::ADD));
        assert_eq!(table.binary_index("pow"), Some(binary::POW));
        assert_eq!(table.unary_index("neg"), Some(unary::NEG));
        assert_eq!(table.unary_index("abs"), Some(unary::ABS));
        assert_eq!(table.nbinary(), 5);
        assert_eq!(table.nunary(), 10);
    }

    #[test]
    fn test_unary_derivatives_against_central_difference() {
        let table = standard::<f64>();
        let h = 1e-6;
        for index in 0..table.nunary() {
            let (f, df) = table.unary_with_derivative(index).unwrap();
            for &x in &[0.3, 0.9, 1.7] {
                let numeric = (f(x + h) - f(x - h)) / (2.0 * h);
                assert_relative_eq!(df(x), numeric, epsilon = 1e-5, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_binary_derivatives_against_central_difference() {
        let table = standard::<f64>();
        let h = 1e-6;
        for index in 0..table.nbinary() {
            let (g, dg) = table.binary_with_derivative(index).unwrap();
            let (l, r) = (1.3, 0.7);
            let (dl, dr) = dg(l, r);
            let numeric_l = (g(l + h, r) - g(l - h, r)) / (2.0 * h);
            let numeric_r = (g(l, r + h) - g(l, r - h)) / (2.0 * h);
            assert_relative_eq!(dl, numeric_l, epsilon = 1e-5, max_relative = 1e-5);
            assert_relative_eq!(dr, numeric_r, epsilon = 1e-5, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_pow_partials_at_non_positive_base() {
        assert_eq!(d_pow(0.0_f64, 2.0), (0.0, 0.0));
        assert_eq!(d_pow(0.0_f64, 3.0), (0.0, 0.0));

        let (dl, dr) = d_pow(-2.0_f64, 2.0);
        assert_relative_eq!(dl, -4.0, epsilon = 1e-12);
        assert_relative_eq!(dr, 4.0 * 2.0_f64.ln(), epsilon = 1e-12);

        let (dl, dr) = d_pow(-1.5_f64, 3.0);
        assert_relative_eq!(dl, 3.0 * 2.25, epsilon = 1e-12);
        assert_relative_eq!(dr, -3.375 * 1.5_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_domain_errors_are_non_finite() {
        assert!(log(-1.0_f64).is_nan());
        assert!(div(1.0_f64, 0.0).is_infinite());
        assert!(sqrt(-4.0_f32).is_nan());
        assert_eq!(d_abs(0.0_f64), 0.0);
    }
}
