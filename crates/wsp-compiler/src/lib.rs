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

//! # WSP Compiler
//!
//! **Translates WSP Instances into Constraint Models.**
//!
//! This crate turns an immutable `wsp_model::instance::Instance` into a
//! `wsp_cp::model::CpModel` that a backend can decide. One decision variable
//! is created per step, ranging over the one-based user ids `[1, M]`. Every
//! constraint family is lowered by its own encoder; the two families with
//! more than one sensible encoding (at-most-k and one-team) are controlled by
//! an `EncodingStrategy` each.
//!
//! ## Motivation
//!
//! The cost of deciding a WSP instance is dominated by how cardinality and
//! team constraints are encoded. The direct encodings are simple and
//! obviously correct but grow combinatorially; the symmetry-reduced ones
//! introduce auxiliary variables to keep the model small and cut permutation
//! symmetry from the search. Keeping both behind one compiler makes them
//! comparable on the same instance and keeps the shared encodings
//! (authorisation, separation and binding of duty, capacity) in one place.
//!
//! ## Architecture
//!
//! * **`strategy`**: `EncodingStrategy` and the per-family `StrategyConfig`.
//! * **`compiler`**: `ConstraintCompiler`, `CompilerConfig` and the `CompiledModel` it returns.
//! * **`context`**: The compilation state, including the cached reified indicators.
//! * **`encoding`**: One module per constraint family.
//! * **`diagnostics`**: Non-fatal findings reported alongside the model.
//! * **`stats`**: Counters describing the produced encoding.
//! * **`error`**: `CompileError`.
//!
//! ## Usage
//!
//! ```rust
//! use wsp_compiler::{compiler::ConstraintCompiler, strategy::StrategyConfig};
//! use wsp_model::loading::InstanceLoader;
//!
//! let instance = InstanceLoader::new()
//!     .from_str("#Steps: 2\n#Users: 2\n#Constraints: 1\nSeparation-of-duty s1 s2\n")
//!     .unwrap();
//!
//! let compiled = ConstraintCompiler::with_strategy(StrategyConfig::direct())
//!     .compile(&instance)
//!     .unwrap();
//! assert_eq!(compiled.step_vars().len(), 2);
//! ```

pub mod compiler;
mod context;
pub mod diagnostics;
mod encoding;
pub mod error;
pub mod stats;
pub mod strategy;
