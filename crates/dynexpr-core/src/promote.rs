//! Precision promotion for mixed tree/sample scalar types.
//!
//! When a tree and its sample matrix use different float widths, both are
//! widened to the wider type before evaluation. Matching widths are borrowed
//! as-is; only a real mismatch copies data and emits a performance warning.

use crate::{
    core::types::{SampleMatrix, Scalar},
    node::Node,
};
use std::any::{type_name, Any};
use std::borrow::Cow;

/// Picks the common scalar type of `Self` and `U`.
pub trait Promote<U: Scalar>: Scalar {
    /// The wider of the two types.
    type Output: Scalar;
}

impl Promote<f32> for f32 {
    type Output = f32;
}

impl Promote<f64> for f32 {
    type Output = f64;
}

impl Promote<f32> for f64 {
    type Output = f64;
}

impl Promote<f64> for f64 {
    type Output = f64;
}

/// Common scalar type of `T` and `U`.
pub type Promoted<T, U> = <T as Promote<U>>::Output;

/// A tree and sample matrix expressed in one common precision.
#[derive(Debug)]
pub struct PromotedInputs<'a, P: Scalar> {
    /// The tree, borrowed if it was already in the common precision
    pub tree: Cow<'a, Node<P>>,
    /// The samples, borrowed if they were already in the common precision
    pub samples: Cow<'a, SampleMatrix<P>>,
}

impl<P: Scalar> PromotedInputs<'_, P> {
    /// Checks if either input had to be converted.
    pub fn converted(&self) -> bool {
        matches!(self.tree, Cow::Owned(_)) || matches!(self.samples, Cow::Owned(_))
    }
}

fn borrow_or_cast<'a, X, P, F>(input: &'a X, cast: F) -> Cow<'a, P>
where
    X: Any,
    P: Any + Clone,
    F: FnOnce(&X) -> P,
{
    match (input as &dyn Any).downcast_ref::<P>() {
        Some(same) => Cow::Borrowed(same),
        None => Cow::Owned(cast(input)),
    }
}

/// Brings `tree` and `samples` to their common precision.
///
/// Emits a `log::warn!` diagnostic when the precisions differ, since the
/// conversion copies the whole sample matrix on every call.
pub fn promote<'a, T, U>(
    tree: &'a Node<T>,
    samples: &'a SampleMatrix<U>,
) -> PromotedInputs<'a, Promoted<T, U>>
where
    T: Promote<U>,
    U: Scalar,
{
    let inputs = PromotedInputs {
        tree: borrow_or_cast(tree, |t: &Node<T>| t.cast()),
        samples: borrow_or_cast(samples, |s: &SampleMatrix<U>| {
            s.map(|x| x.cast::<Promoted<T, U>>())
        }),
    };
    if inputs.converted() {
        log::warn!(
            "tree precision {} differs from sample precision {}; promoting both to {}, \
             which copies the inputs on every call",
            type_name::<T>(),
            type_name::<U>(),
            type_name::<Promoted<T, U>>(),
        );
    }
    inputs
}
