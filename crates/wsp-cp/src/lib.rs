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

//! # WSP CP
//!
//! **A Minimal Constraint-Programming Layer Between the Compiler and a Solver.**
//!
//! The constraint compiler does not talk to a SAT solver directly. It builds
//! a `CpModel`: bounded integer variables, boolean variables and a handful
//! of primitive constraints, each of which may be enforced conditionally on
//! a conjunction of literals. A `Backend` then decides the model, either once
//! or as a pull-based stream of distinct solutions.
//!
//! ## Architecture
//!
//! * **`model`**: Variables, literals, primitives and the write-once `CpModel`.
//! * **`backend`**: The `Backend` trait, statuses, `Values` and the `SolutionStream` type.
//! * **`sat`**: `SatBackend`, which lowers a `CpModel` into CNF and drives `varisat`.
//! * **`error`**: `BackendError`.
//!
//! ## Usage
//!
//! ```rust
//! use wsp_cp::{backend::Backend, model::CpModel, sat::SatBackend};
//!
//! let mut model = CpModel::new();
//! let x = model.new_int_var(1, 2, "x");
//! let y = model.new_int_var(1, 2, "y");
//! model.add_not_equal(x, y);
//!
//! let backend = SatBackend::new();
//! let count = backend.enumerate(&model).unwrap().count();
//! assert_eq!(count, 2);
//! ```

pub mod backend;
pub mod error;
pub mod model;
pub mod sat;
