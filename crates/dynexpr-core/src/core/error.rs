//! Error types for expression evaluation and differentiation.
//!
//! Only configuration and precondition failures are errors. A numerically
//! invalid result (NaN or infinity somewhere in the output) is not an error:
//! it is reported through the `complete` flag of the returned buffers.

use thiserror::Error;

/// Which family of operators an index or derivative list refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Degree-1 operators.
    Unary,
    /// Degree-2 operators.
    Binary,
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unary => write!(f, "unary"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Errors that abort an evaluation or differentiation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Differentiation was requested against a table without derivatives.
    #[error("Operator table has no {kind} derivative functions")]
    MissingDerivatives {
        /// The derivative list that is absent
        kind: OperatorKind,
    },

    /// A node refers to an operator the table does not contain.
    #[error("{kind} operator index {index} out of bounds for table of {len} operators")]
    OperatorOutOfBounds {
        /// Operator family, matching the node degree
        kind: OperatorKind,
        /// Offending index
        index: usize,
        /// Number of operators of that family
        len: usize,
    },

    /// A feature leaf refers to a row the sample matrix does not have.
    #[error("Feature index {index} out of bounds for sample matrix with {nfeatures} features")]
    FeatureOutOfBounds {
        /// Offending feature index
        index: usize,
        /// Number of rows in the sample matrix
        nfeatures: usize,
    },

    /// The requested derivative direction is not a feature of the samples.
    #[error("Direction {direction} out of bounds for sample matrix with {nfeatures} features")]
    InvalidDirection {
        /// Requested direction
        direction: usize,
        /// Number of rows in the sample matrix
        nfeatures: usize,
    },

    /// A derivative list does not line up with its function list.
    #[error("{kind} derivative list has {actual} entries, expected {expected}")]
    DerivativeTableMismatch {
        /// Operator family
        kind: OperatorKind,
        /// Number of functions
        expected: usize,
        /// Number of derivative functions supplied
        actual: usize,
    },

    /// Wrong number of constants supplied to a tree.
    #[error("Tree has {expected} constants, got {actual}")]
    ConstantCountMismatch {
        /// Number of constant leaves in the tree
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// An index structure does not mirror the tree it was built for.
    #[error("Shape mismatch: {reason}")]
    ShapeMismatch {
        /// Description of the mismatch
        reason: String,
    },
}

impl EvalError {
    /// Create a MissingDerivatives error.
    pub fn missing_derivatives(kind: OperatorKind) -> Self {
        Self::MissingDerivatives { kind }
    }

    /// Create an OperatorOutOfBounds error.
    pub fn operator_out_of_bounds(kind: OperatorKind, index: usize, len: usize) -> Self {
        Self::OperatorOutOfBounds { kind, index, len }
    }

    /// Create a FeatureOutOfBounds error.
    pub fn feature_out_of_bounds(index: usize, nfeatures: usize) -> Self {
        Self::FeatureOutOfBounds { index, nfeatures }
    }

    /// Create an InvalidDirection error.
    pub fn invalid_direction(direction: usize, nfeatures: usize) -> Self {
        Self::InvalidDirection {
            direction,
            nfeatures,
        }
    }

    /// Create a ShapeMismatch error with a custom reason.
    pub fn shape_mismatch<S: Into<String>>(reason: S) -> Self {
        Self::ShapeMismatch {
            reason: reason.into(),
        }
    }
}

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
