//! Constant index trees.
//!
//! A [`ConstantIndexTree`] mirrors the shape of one expression tree and
//! records, at every constant leaf, the ordinal of that constant in a
//! pre-order, left-to-right, depth-first traversal. The gradient engine uses
//! these ordinals as row indices of the constants gradient, so row `k` of the
//! gradient is the derivative with respect to `tree.constants()[k]`.

use crate::node::Node;

/// Shadow of an expression tree holding constant ordinals at its leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantIndexTree {
    /// Leaf: `Some(ordinal)` for a constant, `None` for a feature.
    Leaf(Option<usize>),
    /// Mirror of a unary node.
    Unary(Box<ConstantIndexTree>),
    /// Mirror of a binary node.
    Binary(Box<ConstantIndexTree>, Box<ConstantIndexTree>),
}

impl ConstantIndexTree {
    /// Builds the index tree for `tree`, numbering constants from `offset`.
    pub fn build<T>(tree: &Node<T>, offset: usize) -> Self {
        let mut next = offset;
        Self::build_from(tree, &mut next)
    }

    fn build_from<T>(tree: &Node<T>, next: &mut usize) -> Self {
        match tree {
            Node::Constant(_) => {
                let ordinal = *next;
                *next += 1;
                Self::Leaf(Some(ordinal))
            }
            Node::Feature(_) => Self::Leaf(None),
            Node::Unary { child, .. } => Self::Unary(Box::new(Self::build_from(child, next))),
            Node::Binary { left, right, .. } => {
                let left = Self::build_from(left, next);
                let right = Self::build_from(right, next);
                Self::Binary(Box::new(left), Box::new(right))
            }
        }
    }

    /// Number of constant ordinals assigned in this tree.
    pub fn count(&self) -> usize {
        match self {
            Self::Leaf(ordinal) => usize::from(ordinal.is_some()),
            Self::Unary(child) => child.count(),
            Self::Binary(left, right) => left.count() + right.count(),
        }
    }

    /// Assigned ordinals in traversal order.
    pub fn ordinals(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.count());
        self.collect_ordinals(&mut out);
        out
    }

    fn collect_ordinals(&self, out: &mut Vec<usize>) {
        match self {
            Self::Leaf(Some(ordinal)) => out.push(*ordinal),
            Self::Leaf(None) => {}
            Self::Unary(child) => child.collect_ordinals(out),
            Self::Binary(left, right) => {
                left.collect_ordinals(out);
                right.collect_ordinals(out);
            }
        }
    }
}
