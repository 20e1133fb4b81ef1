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

//! # Combinatorial Iterators
//!
//! Index-level enumeration helpers for encodings that materialise every
//! subset or every tuple of a small ground set. They yield positions
//! (`Vec<usize>`) rather than borrowed items so callers can map them onto
//! whatever slice they are encoding without lifetime gymnastics.
//!
//! - `Combinations::new(n, r)` yields every `r`-subset of `0..n` in
//!   lexicographic order (`C(n, r)` items).
//! - `CartesianPower::new(base, exponent)` yields every `exponent`-tuple over
//!   `0..base` in odometer order (`base^exponent` items).
//! - `binomial(n, k)` computes `C(n, k)` and returns `None` on overflow.
//!
//! ## Usage
//!
//! ```rust
//! use wsp_core::utils::combinatorics::{CartesianPower, Combinations};
//!
//! let pairs: Vec<_> = Combinations::new(3, 2).collect();
//! assert_eq!(pairs, vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
//!
//! let tuples: Vec<_> = CartesianPower::new(2, 2).collect();
//! assert_eq!(tuples, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
//! ```

use std::iter::FusedIterator;

/// Iterator over all `r`-element subsets of `0..n`, in lexicographic order.
///
/// `r == 0` yields exactly one empty subset; `r > n` yields nothing.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    first: bool,
    done: bool,
}

impl Combinations {
    /// Creates an iterator over the `r`-subsets of `0..n`.
    #[inline]
    pub fn new(n: usize, r: usize) -> Self {
        Self {
            n,
            indices: (0..r).collect(),
            first: true,
            done: r > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.first {
            self.first = false;
            return Some(self.indices.clone());
        }

        let r = self.indices.len();
        let mut i = r;
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            if self.indices[i] < self.n - r + i {
                break;
            }
        }

        self.indices[i] += 1;
        for j in (i + 1)..r {
            self.indices[j] = self.indices[j - 1] + 1;
        }

        Some(self.indices.clone())
    }
}

impl FusedIterator for Combinations {}

/// Iterator over all `exponent`-tuples drawn from `0..base`, with the last
/// position varying fastest.
///
/// `exponent == 0` yields exactly one empty tuple; `base == 0` with a
/// positive exponent yields nothing.
#[derive(Debug, Clone)]
pub struct CartesianPower {
    base: usize,
    digits: Vec<usize>,
    done: bool,
}

impl CartesianPower {
    /// Creates an iterator over `0..base` raised to the power `exponent`.
    #[inline]
    pub fn new(base: usize, exponent: usize) -> Self {
        Self {
            base,
            digits: vec![0; exponent],
            done: base == 0 && exponent > 0,
        }
    }
}

impl Iterator for CartesianPower {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self.digits.clone();

        let mut i = self.digits.len();
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            self.digits[i] += 1;
            if self.digits[i] < self.base {
                break;
            }
            self.digits[i] = 0;
        }

        Some(current)
    }
}

impl FusedIterator for CartesianPower {}

/// Returns the binomial coefficient `C(n, k)`, or `None` if it does not fit
/// into a `u128`.
pub fn binomial(n: usize, k: usize) -> Option<u128> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc * (n - i) is always divisible by (i + 1) at this point.
        acc = acc.checked_mul((n - i) as u128)? / (i as u128 + 1);
    }
    Some(acc)
}
