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

//! # WSP Solver
//!
//! **Runs Compiled WSP Models Against a Constraint Backend.**
//!
//! This crate ties the pipeline together: an `Instance` is compiled with the
//! configured strategies, handed to a `wsp_cp::backend::Backend`, and the
//! backend's answer is mapped back onto steps and users. The result is an
//! immutable `SolveOutcome` carrying the status (`sat`, `unsat` or
//! `unknown`), the solutions, the compiler diagnostics and timing.
//!
//! ## Motivation
//!
//! Deciding satisfiability and enumerating distinct assignments are the two
//! questions asked of a WSP instance. Both are answered by the same
//! orchestrator; enumeration is a pull over the backend's solution stream
//! that search monitors can stop at any solution boundary. A time limit runs
//! the attempt on a worker thread and reports `unknown` on expiry, never
//! `unsat`.
//!
//! ## Architecture
//!
//! * **`solver`**: `Solver`, `SolverBuilder` and `SolveMode`.
//! * **`monitor`**: `SearchMonitor` and the solution-limit, interrupt and composite monitors.
//! * **`outcome`**: `SolveOutcome`, `SatStatus` and `TerminationReason`.
//! * **`stats`**: `SolveStatistics` and its builder.
//! * **`error`**: `SolverError`.
//!
//! ## Usage
//!
//! ```rust
//! use wsp_model::loading::InstanceLoader;
//! use wsp_solver::{outcome::SatStatus, solver::SolverBuilder};
//!
//! let instance = InstanceLoader::new()
//!     .from_str("#Steps: 2\n#Users: 2\n#Constraints: 1\nSeparation-of-duty s1 s2\n")
//!     .unwrap();
//!
//! let solver = SolverBuilder::new().with_solution_limit(10).build();
//! let outcome = solver.solve(&instance).unwrap();
//! assert_eq!(outcome.status(), SatStatus::Sat);
//! assert_eq!(outcome.all_solutions().len(), 2);
//! ```

pub mod error;
pub mod monitor;
pub mod outcome;
pub mod solver;
pub mod stats;
