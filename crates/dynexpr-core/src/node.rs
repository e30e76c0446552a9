//! Expression tree nodes.
//!
//! A tree is a strict rooted tree: every interior node exclusively owns its
//! children. Node shape is a closed set of variants keyed by degree, and
//! interior nodes carry an index into the matching operator list of an
//! [`OperatorTable`](crate::operators::OperatorTable).

use crate::core::{
    error::{EvalError, Result},
    types::Scalar,
};

/// A node of an expression tree over scalar type `T`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node<T> {
    /// Degree 0: a constant broadcast to every sample.
    Constant(T),
    /// Degree 0: a row of the sample matrix.
    Feature(usize),
    /// Degree 1: a unary operator applied to one child.
    Unary {
        /// Index into the unary operator list
        op: usize,
        /// Operand
        child: Box<Node<T>>,
    },
    /// Degree 2: a binary operator applied to an ordered pair of children.
    Binary {
        /// Index into the binary operator list
        op: usize,
        /// Left operand
        left: Box<Node<T>>,
        /// Right operand
        right: Box<Node<T>>,
    },
}

impl<T> Node<T> {
    /// Creates a constant leaf.
    pub fn constant(value: T) -> Self {
        Self::Constant(value)
    }

    /// Creates a leaf reading feature row `index`.
    pub fn feature(index: usize) -> Self {
        Self::Feature(index)
    }

    /// Creates a unary node.
    pub fn unary(op: usize, child: Self) -> Self {
        Self::Unary {
            op,
            child: Box::new(child),
        }
    }

    /// Creates a binary node.
    pub fn binary(op: usize, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Arity of this node: 0 for leaves, 1 for unary, 2 for binary.
    pub fn degree(&self) -> usize {
        match self {
            Self::Constant(_) | Self::Feature(_) => 0,
            Self::Unary { .. } => 1,
            Self::Binary { .. } => 2,
        }
    }

    /// Checks if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.degree() == 0
    }

    /// Total number of nodes in the tree.
    pub fn count_nodes(&self) -> usize {
        match self {
            Self::Constant(_) | Self::Feature(_) => 1,
            Self::Unary { child, .. } => 1 + child.count_nodes(),
            Self::Binary { left, right, .. } => 1 + left.count_nodes() + right.count_nodes(),
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn count_depth(&self) -> usize {
        match self {
            Self::Constant(_) | Self::Feature(_) => 1,
            Self::Unary { child, .. } => 1 + child.count_depth(),
            Self::Binary { left, right, .. } => 1 + left.count_depth().max(right.count_depth()),
        }
    }

    /// Number of constant leaves in the tree.
    pub fn count_constants(&self) -> usize {
        match self {
            Self::Constant(_) => 1,
            Self::Feature(_) => 0,
            Self::Unary { child, .. } => child.count_constants(),
            Self::Binary { left, right, .. } => left.count_constants() + right.count_constants(),
        }
    }

    /// Checks if any leaf of the tree is a constant.
    pub fn has_constants(&self) -> bool {
        match self {
            Self::Constant(_) => true,
            Self::Feature(_) => false,
            Self::Unary { child, .. } => child.has_constants(),
            Self::Binary { left, right, .. } => left.has_constants() || right.has_constants(),
        }
    }

    /// Largest feature index referenced by the tree, if any.
    pub fn max_feature(&self) -> Option<usize> {
        match self {
            Self::Constant(_) => None,
            Self::Feature(i) => Some(*i),
            Self::Unary { child, .. } => child.max_feature(),
            Self::Binary { left, right, .. } => match (left.max_feature(), right.max_feature()) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
        }
    }
}

impl<T: Copy> Node<T> {
    /// Constant values in pre-order, left to right.
    ///
    /// The position of a value in this list is the ordinal the
    /// [`ConstantIndexTree`](crate::constant_index::ConstantIndexTree)
    /// assigns to its leaf with offset 0.
    pub fn constants(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.count_constants());
        self.collect_constants(&mut out);
        out
    }

    fn collect_constants(&self, out: &mut Vec<T>) {
        match self {
            Self::Constant(c) => out.push(*c),
            Self::Feature(_) => {}
            Self::Unary { child, .. } => child.collect_constants(out),
            Self::Binary { left, right, .. } => {
                left.collect_constants(out);
                right.collect_constants(out);
            }
        }
    }

    /// Overwrites the constants in the same order [`constants`](Self::constants) returns them.
    pub fn set_constants(&mut self, values: &[T]) -> Result<()> {
        let expected = self.count_constants();
        if values.len() != expected {
            return Err(EvalError::ConstantCountMismatch {
                expected,
                actual: values.len(),
            });
        }
        let mut iter = values.iter().copied();
        self.assign_constants(&mut iter);
        Ok(())
    }

    fn assign_constants<I: Iterator<Item = T>>(&mut self, values: &mut I) {
        match self {
            Self::Constant(c) => {
                if let Some(v) = values.next() {
                    *c = v;
                }
            }
            Self::Feature(_) => {}
            Self::Unary { child, .. } => child.assign_constants(values),
            Self::Binary { left, right, .. } => {
                left.assign_constants(values);
                right.assign_constants(values);
            }
        }
    }
}

impl<T: Scalar> Node<T> {
    /// Converts the tree to another precision.
    pub fn cast<U: Scalar>(&self) -> Node<U> {
        match self {
            Self::Constant(c) => Node::Constant((*c).cast()),
            Self::Feature(i) => Node::Feature(*i),
            Self::Unary { op, child } => Node::unary(*op, child.cast()),
            Self::Binary { op, left, right } => Node::binary(*op, left.cast(), right.cast()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// cos(x0 * 2.5) + (x3 - -1.0)
    fn sample_tree() -> Node<f64> {
        Node::binary(
            0,
            Node::unary(1, Node::binary(2, Node::feature(0), Node::constant(2.5))),
            Node::binary(1, Node::feature(3), Node::constant(-1.0)),
        )
    }

    #[test]
    fn test_degree() {
        assert_eq!(Node::<f64>::feature(0).degree(), 0);
        assert_eq!(Node::constant(1.0).degree(), 0);
        assert_eq!(Node::unary(0, Node::constant(1.0)).degree(), 1);
        assert_eq!(sample_tree().degree(), 2);
        assert!(Node::<f32>::feature(2).is_leaf());
    }

    #[test]
    fn test_counts() {
        let tree = sample_tree();
        assert_eq!(tree.count_nodes(), 8);
        assert_eq!(tree.count_depth(), 4);
        assert_eq!(tree.count_constants(), 2);
        assert!(tree.has_constants());
        assert_eq!(tree.max_feature(), Some(3));

        let no_consts: Node<f64> = Node::unary(0, Node::feature(1));
        assert!(!no_consts.has_constants());
        assert_eq!(Node::constant(3.0).max_feature(), None);
    }

    #[test]
    fn test_get_and_set_constants() {
        let mut tree = sample_tree();
        assert_eq!(tree.constants(), vec![2.5, -1.0]);

        tree.set_constants(&[7.0, 8.0]).unwrap();
        assert_eq!(tree.constants(), vec![7.0, 8.0]);

        let err = tree.set_constants(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            EvalError::ConstantCountMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(tree.constants(), vec![7.0, 8.0]);
    }

    #[test]
    fn test_cast_preserves_shape() {
        let tree = sample_tree();
        let narrow: Node<f32> = tree.cast();
        assert_eq!(narrow.count_nodes(), tree.count_nodes());
        assert_eq!(narrow.constants(), vec![2.5_f32, -1.0]);
        let wide: Node<f64> = narrow.cast();
        assert_eq!(wide, tree);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip_structure() {
        let tree = sample_tree();
        let json = serde_json::to_string(&tree).unwrap();
        let back: Node<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
