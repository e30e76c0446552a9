//! Operator tables.
//!
//! An [`OperatorTable`] is a plain indexable registry: two ordered lists of
//! pure numeric functions (unary and binary) and, optionally, two parallel
//! lists of their derivatives. Tree nodes store an index into the list that
//! matches their degree.
//!
//! Functions are stored as plain `fn` pointers, so a table is cheap to clone,
//! can be shared across threads and cannot capture mutable state.

pub mod standard;

use crate::core::error::{EvalError, OperatorKind, Result};
use std::fmt;

/// A unary operator, or the derivative of one.
pub type UnaryFn<T> = fn(T) -> T;

/// A binary operator.
pub type BinaryFn<T> = fn(T, T) -> T;

/// Partial derivatives of a binary operator: `(d/dleft, d/dright)`.
pub type BinaryDerivFn<T> = fn(T, T) -> (T, T);

/// Indexed registry of unary and binary functions and their derivatives.
#[derive(Clone)]
pub struct OperatorTable<T> {
    unary: Vec<UnaryFn<T>>,
    unary_names: Vec<&'static str>,
    binary: Vec<BinaryFn<T>>,
    binary_names: Vec<&'static str>,
    unary_derivatives: Option<Vec<UnaryFn<T>>>,
    binary_derivatives: Option<Vec<BinaryDerivFn<T>>>,
}

impl<T> fmt::Debug for OperatorTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorTable")
            .field("unary", &self.unary_names)
            .field("binary", &self.binary_names)
            .field("has_derivatives", &self.has_derivatives())
            .finish()
    }
}

impl<T> OperatorTable<T> {
    /// Starts building a table.
    pub fn builder() -> OperatorTableBuilder<T> {
        OperatorTableBuilder::new()
    }

    /// Attaches derivative lists, replacing any already present.
    ///
    /// Each list must have exactly one entry per operator of its family.
    pub fn with_derivatives(
        mut self,
        unary: Vec<UnaryFn<T>>,
        binary: Vec<BinaryDerivFn<T>>,
    ) -> Result<Self> {
        if unary.len() != self.unary.len() {
            return Err(EvalError::DerivativeTableMismatch {
                kind: OperatorKind::Unary,
                expected: self.unary.len(),
                actual: unary.len(),
            });
        }
        if binary.len() != self.binary.len() {
            return Err(EvalError::DerivativeTableMismatch {
                kind: OperatorKind::Binary,
                expected: self.binary.len(),
                actual: binary.len(),
            });
        }
        self.unary_derivatives = Some(unary);
        self.binary_derivatives = Some(binary);
        Ok(self)
    }

    /// Drops the derivative lists, leaving a value-only table.
    pub fn without_derivatives(mut self) -> Self {
        self.unary_derivatives = None;
        self.binary_derivatives = None;
        self
    }

    /// Number of unary operators.
    pub fn nunary(&self) -> usize {
        self.unary.len()
    }

    /// Number of binary operators.
    pub fn nbinary(&self) -> usize {
        self.binary.len()
    }

    /// Checks if both derivative lists are present.
    pub fn has_derivatives(&self) -> bool {
        self.unary_derivatives.is_some() && self.binary_derivatives.is_some()
    }

    /// Fails unless both derivative lists are present.
    pub fn require_derivatives(&self) -> Result<()> {
        if self.unary_derivatives.is_none() {
            return Err(EvalError::missing_derivatives(OperatorKind::Unary));
        }
        if self.binary_derivatives.is_none() {
            return Err(EvalError::missing_derivatives(OperatorKind::Binary));
        }
        Ok(())
    }

    /// Unary operator at `index`.
    pub fn unary(&self, index: usize) -> Result<UnaryFn<T>> {
        self.unary.get(index).copied().ok_or_else(|| {
            EvalError::operator_out_of_bounds(OperatorKind::Unary, index, self.unary.len())
        })
    }

    /// Binary operator at `index`.
    pub fn binary(&self, index: usize) -> Result<BinaryFn<T>> {
        self.binary.get(index).copied().ok_or_else(|| {
            EvalError::operator_out_of_bounds(OperatorKind::Binary, index, self.binary.len())
        })
    }

    /// Unary operator at `index` together with its derivative.
    pub fn unary_with_derivative(&self, index: usize) -> Result<(UnaryFn<T>, UnaryFn<T>)> {
        let f = self.unary(index)?;
        let derivatives = self
            .unary_derivatives
            .as_ref()
            .ok_or_else(|| EvalError::missing_derivatives(OperatorKind::Unary))?;
        let df = derivatives.get(index).copied().ok_or_else(|| {
            EvalError::operator_out_of_bounds(OperatorKind::Unary, index, derivatives.len())
        })?;
        Ok((f, df))
    }

    /// Binary operator at `index` together with its partial derivatives.
    pub fn binary_with_derivative(&self, index: usize) -> Result<(BinaryFn<T>, BinaryDerivFn<T>)> {
        let g = self.binary(index)?;
        let derivatives = self
            .binary_derivatives
            .as_ref()
            .ok_or_else(|| EvalError::missing_derivatives(OperatorKind::Binary))?;
        let dg = derivatives.get(index).copied().ok_or_else(|| {
            EvalError::operator_out_of_bounds(OperatorKind::Binary, index, derivatives.len())
        })?;
        Ok((g, dg))
    }

    /// Name the unary operator at `index` was registered under.
    pub fn unary_name(&self, index: usize) -> Option<&'static str> {
        self.unary_names.get(index).copied()
    }

    /// Name the binary operator at `index` was registered under.
    pub fn binary_name(&self, index: usize) -> Option<&'static str> {
        self.binary_names.get(index).copied()
    }

    /// Index of the unary operator registered as `name`.
    pub fn unary_index(&self, name: &str) -> Option<usize> {
        self.unary_names.iter().position(|n| *n == name)
    }

    /// Index of the binary operator registered as `name`.
    pub fn binary_index(&self, name: &str) -> Option<usize> {
        self.binary_names.iter().position(|n| *n == name)
    }
}

/// Builder for [`OperatorTable`].
///
/// Operators are indexed in registration order within their family.
pub struct OperatorTableBuilder<T> {
    unary: Vec<(&'static str, UnaryFn<T>, Option<UnaryFn<T>>)>,
    binary: Vec<(&'static str, BinaryFn<T>, Option<BinaryDerivFn<T>>)>,
}

impl<T> Default for OperatorTableBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OperatorTableBuilder<T> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            unary: Vec::new(),
            binary: Vec::new(),
        }
    }

    /// Register a unary operator with no derivative.
    pub fn unary(mut self, name: &'static str, f: UnaryFn<T>) -> Self {
        self.unary.push((name, f, None));
        self
    }

    /// Register a unary operator and its derivative.
    pub fn unary_differentiable(
        mut self,
        name: &'static str,
        f: UnaryFn<T>,
        df: UnaryFn<T>,
    ) -> Self {
        self.unary.push((name, f, Some(df)));
        self
    }

    /// Register a binary operator with no derivative.
    pub fn binary(mut self, name: &'static str, g: BinaryFn<T>) -> Self {
        self.binary.push((name, g, None));
        self
    }

    /// Register a binary operator and its partial derivatives.
    pub fn binary_differentiable(
        mut self,
        name: &'static str,
        g: BinaryFn<T>,
        dg: BinaryDerivFn<T>,
    ) -> Self {
        self.binary.push((name, g, Some(dg)));
        self
    }

    /// Build the table.
    ///
    /// A derivative list is attached for a family only when every operator
    /// of that family was registered with a derivative.
    pub fn build(self) -> OperatorTable<T> {
        let unary_derivatives: Option<Vec<UnaryFn<T>>> =
            self.unary.iter().map(|(_, _, df)| *df).collect();
        let binary_derivatives: Option<Vec<BinaryDerivFn<T>>> =
            self.binary.iter().map(|(_, _, dg)| *dg).collect();

        OperatorTable {
            unary_names: self.unary.iter().map(|(name, _, _)| *name).collect(),
            unary: self.unary.iter().map(|(_, f, _)| *f).collect(),
            binary_names: self.binary.iter().map(|(name, _, _)| *name).collect(),
            binary: self.binary.iter().map(|(_, g, _)| *g).collect(),
            unary_derivatives,
            binary_derivatives,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(x: f64) -> f64 {
        2.0 * x
    }

    fn two(_x: f64) -> f64 {
        2.0
    }

    fn sub(a: f64, b: f64) -> f64 {
        a - b
    }

    fn dsub(_a: f64, _b: f64) -> (f64, f64) {
        (1.0, -1.0)
    }

    #[test]
    fn test_builder_with_derivatives() {
        let table = OperatorTable::builder()
            .unary_differentiable("double", double, two)
            .binary_differentiable("sub", sub, dsub)
            .build();

        assert_eq!(table.nunary(), 1);
        assert_eq!(table.nbinary(), 1);
        assert!(table.has_derivatives());
        assert!(table.require_derivatives().is_ok());

        let (f, df) = table.unary_with_derivative(0).unwrap();
        assert_eq!(f(3.0), 6.0);
        assert_eq!(df(3.0), 2.0);

        let (g, dg) = table.binary_with_derivative(0).unwrap();
        assert_eq!(g(5.0, 2.0), 3.0);
        assert_eq!(dg(5.0, 2.0), (1.0, -1.0));

        assert_eq!(table.binary_name(0), Some("sub"));
        assert_eq!(table.unary_index("double"), Some(0));
        assert_eq!(table.binary_index("add"), None);
    }

    #[test]
    fn test_partial_derivatives_drop_family_list() {
        let table = OperatorTable::builder()
            .unary("double", double)
            .binary_differentiable("sub", sub, dsub)
            .build();

        assert!(!table.has_derivatives());
        assert_eq!(
            table.require_derivatives(),
            Err(EvalError::missing_derivatives(OperatorKind::Unary))
        );
        assert!(table.unary(0).is_ok());
        assert!(table.unary_with_derivative(0).is_err());
    }

    #[test]
    fn test_out_of_bounds_lookup() {
        let table = OperatorTable::<f64>::builder().binary("sub", sub).build();
        assert_eq!(
            table.binary(3).unwrap_err(),
            EvalError::operator_out_of_bounds(OperatorKind::Binary, 3, 1)
        );
        assert!(matches!(
            table.unary(0),
            Err(EvalError::OperatorOutOfBounds { len: 0, .. })
        ));
    }

    #[test]
    fn test_with_derivatives_checks_lengths() {
        let table = OperatorTable::builder()
            .unary("double", double)
            .binary("sub", sub)
            .build();
        assert!(!table.has_derivatives());

        let err = table
            .clone()
            .with_derivatives(vec![], vec![dsub as BinaryDerivFn<f64>])
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::DerivativeTableMismatch {
                kind: OperatorKind::Unary,
                expected: 1,
                actual: 0
            }
        );

        let table = table
            .with_derivatives(vec![two as UnaryFn<f64>], vec![dsub as BinaryDerivFn<f64>])
            .unwrap();
        assert!(table.has_derivatives());
        assert!(!table.without_derivatives().has_derivatives());
    }
}
