// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Strongly Typed Indices (Zero-Cost)
//!
//! Phantom-typed wrappers around `usize` that keep the index spaces of a
//! workflow instance apart. A solver pipeline juggles step indices, user
//! indices and the indices of backend variables at the same time; passing a
//! user where a step was expected compiles fine with raw `usize` and produces
//! a silently wrong encoding. `TypedIndex<T>` carries a tag type
//! `T: TypedIndexTag` that rules this out at compile time while staying a
//! transparent `usize` at runtime.
//!
//! Indices are always zero-based. The textual formats of the solver use
//! one-based identifiers (`s1`, `u1`), so `one_based` and `from_one_based`
//! are provided for the conversion at the boundary.
//!
//! ## Usage
//!
//! ```rust
//! use wsp_core::utils::index::{TypedIndex, TypedIndexTag};
//!
//! #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
//! struct StepTag;
//! impl TypedIndexTag for StepTag { const NAME: &'static str = "StepIndex"; }
//!
//! type StepIndex = TypedIndex<StepTag>;
//! let s = StepIndex::new(2);
//! assert_eq!(s.get(), 2);
//! assert_eq!(s.one_based(), 3);
//! assert_eq!(format!("{}", s), "StepIndex(2)");
//! ```

/// A trait to tag typed indices with a name for debugging and display purposes.
pub trait TypedIndexTag: Clone {
    const NAME: &'static str;
}

/// A strongly typed, zero-based index associated with a tag type `T`.
///
/// # Examples
///
/// ```rust
/// # use wsp_core::utils::index::{TypedIndex, TypedIndexTag};
/// #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
/// struct UserTag;
///
/// impl TypedIndexTag for UserTag {
///    const NAME: &'static str = "UserIndex";
/// }
///
/// type UserIndex = TypedIndex<UserTag>;
///
/// let user = UserIndex::from_one_based(4).unwrap();
/// assert_eq!(user.get(), 3);
/// ```
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedIndex<T> {
    index: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T> TypedIndex<T> {
    /// Creates a new `TypedIndex` from a zero-based `usize` index.
    #[inline(always)]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: std::marker::PhantomData,
        }
    }

    /// Creates an index from a one-based identifier as it appears in the
    /// text formats (`s1` is step `0`). Returns `None` for `0`.
    #[inline(always)]
    pub const fn from_one_based(id: usize) -> Option<Self> {
        if id == 0 {
            None
        } else {
            Some(Self::new(id - 1))
        }
    }

    /// Returns the underlying zero-based `usize` index.
    #[inline(always)]
    pub const fn get(&self) -> usize {
        self.index
    }

    /// Returns the one-based identifier of this index.
    #[inline(always)]
    pub const fn one_based(&self) -> usize {
        self.index + 1
    }
}

impl<T> std::fmt::Debug for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> std::fmt::Display for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> From<usize> for TypedIndex<T> {
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl<T> From<TypedIndex<T>> for usize {
    fn from(typed_index: TypedIndex<T>) -> Self {
        typed_index.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
    struct TestTag;

    impl TypedIndexTag for TestTag {
        const NAME: &'static str = "TestIdx";
    }

    type TestIndex = TypedIndex<TestTag>;

    #[test]
    fn test_new_and_get() {
        let idx = TestIndex::new(10);
        assert_eq!(idx.get(), 10);
        assert_eq!(idx.one_based(), 11);
    }

    #[test]
    fn test_one_based_round_trip() {
        assert_eq!(TestIndex::from_one_based(0), None);

        let idx = TestIndex::from_one_based(1).unwrap();
        assert_eq!(idx.get(), 0);
        assert_eq!(idx.one_based(), 1);
    }

    #[test]
    fn test_conversions() {
        let idx: TestIndex = 42.into();
        assert_eq!(idx.get(), 42);

        let val: usize = idx.into();
        assert_eq!(val, 42);
    }

    #[test]
    fn test_debug_and_display() {
        let idx = TestIndex::new(7);
        assert_eq!(format!("{}", idx), "TestIdx(7)");
        assert_eq!(format!("{:?}", idx), "TestIdx(7)");
    }

    #[test]
    fn test_ordering_follows_index() {
        let mut v = vec![TestIndex::new(3), TestIndex::new(1), TestIndex::new(2)];
        v.sort();
        assert_eq!(v.iter().map(|i| i.get()).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
