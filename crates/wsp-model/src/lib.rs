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

//! # WSP Model
//!
//! **The Core Domain Model for the Workflow Satisfiability Problem.**
//!
//! This crate defines the data structures that describe a WSP instance and
//! its solutions. It is the interchange layer between the textual problem
//! definition and the constraint compiler (`wsp_compiler`).
//!
//! ## Architecture
//!
//! * **`index`**: Strongly-typed wrappers (`StepIndex`, `UserIndex`) so steps and users can never be swapped.
//! * **`constraint`**: The tagged `Constraint` variant covering the six constraint families.
//! * **`instance`**: The immutable `Instance` and the validating `InstanceBuilder`.
//! * **`loading`**: The `InstanceLoader` turning the line-oriented text format into an `Instance`.
//! * **`solution`**: Total step→user assignments (`Solution`), bounded collections of them (`SolutionSet`) and the solution text reader.
//! * **`format`**: Canonical `s<i>: u<j>` rendering of solutions and solution sets.
//! * **`validation`**: Independent checking of an assignment against every constraint of an instance.
//!
//! ## Design Philosophy
//!
//! 1.  **Type Safety**: Indices are distinct types. A `UserIndex` cannot be used to address a step.
//! 2.  **Parse Once**: Constraint lines are parsed into a tagged variant exactly once; nothing downstream re-inspects raw text.
//! 3.  **Fail-Fast**: The builder validates every reference eagerly, so the compiler never sees an out-of-range step or user.

pub mod constraint;
pub mod format;
pub mod index;
pub mod instance;
pub mod loading;
pub mod solution;
pub mod validation;
