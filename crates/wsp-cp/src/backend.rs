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

//! The collaborator interface every solving engine implements.
//!
//! A `Backend` decides a frozen `CpModel` in one of two ways:
//!
//! * `solve` answers once with a `SolveStatus` and, if a solution exists,
//!   the values of every variable;
//! * `enumerate` returns a `SolutionStream`, a lazy iterator producing
//!   distinct solutions with respect to the model's decision variables. The
//!   backend only searches for the next solution when the consumer pulls, so
//!   dropping the stream stops the search.

use crate::{
    error::BackendError,
    model::{BoolVar, CpModel, IntVar, Literal},
};

/// The answer of a single solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// A solution was found and proven optimal. Models without an objective
    /// report this for any solution.
    Optimal,
    /// A solution was found.
    Feasible,
    /// The model has no solution.
    Infeasible,
    /// The backend could not decide the model.
    Unknown,
}

impl SolveStatus {
    /// Returns `true` for `Optimal` and `Feasible`.
    #[inline]
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "OPTIMAL"),
            SolveStatus::Feasible => write!(f, "FEASIBLE"),
            SolveStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolveStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// The values of every variable of a model in one solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Values {
    ints: Vec<i64>,
    bools: Vec<bool>,
}

impl Values {
    #[inline]
    pub fn new(ints: Vec<i64>, bools: Vec<bool>) -> Self {
        Self { ints, bools }
    }

    /// Returns the value of an integer variable.
    #[inline]
    pub fn value(&self, var: IntVar) -> i64 {
        let index = var.get();
        debug_assert!(
            index < self.ints.len(),
            "called `Values::value` with int var out of bounds: the len is {} but the index is {}",
            self.ints.len(),
            index
        );

        self.ints[index]
    }

    /// Returns the value of a boolean variable.
    #[inline]
    pub fn bool_value(&self, var: BoolVar) -> bool {
        let index = var.get();
        debug_assert!(
            index < self.bools.len(),
            "called `Values::bool_value` with bool var out of bounds: the len is {} but the index is {}",
            self.bools.len(),
            index
        );

        self.bools[index]
    }

    /// Returns the truth value of a literal.
    #[inline]
    pub fn literal_value(&self, literal: Literal) -> bool {
        self.bool_value(literal.var()) != literal.is_negated()
    }
}

/// The result of `Backend::solve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveResponse {
    status: SolveStatus,
    values: Option<Values>,
}

impl SolveResponse {
    #[inline]
    pub fn new(status: SolveStatus, values: Option<Values>) -> Self {
        debug_assert!(
            status.has_solution() == values.is_some(),
            "called `SolveResponse::new` with status {} but values present is {}",
            status,
            values.is_some()
        );
        Self { status, values }
    }

    #[inline]
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Returns the solution values, present iff the status has a solution.
    #[inline]
    pub fn values(&self) -> Option<&Values> {
        self.values.as_ref()
    }

    #[inline]
    pub fn into_values(self) -> Option<Values> {
        self.values
    }
}

/// A pull-based stream of distinct solutions.
pub type SolutionStream<'a> = Box<dyn Iterator<Item = Result<Values, BackendError>> + 'a>;

/// A constraint-solving engine.
pub trait Backend: Send + Sync {
    /// A short name for logs.
    fn name(&self) -> &str;

    /// Decides `model` once.
    fn solve(&self, model: &CpModel) -> Result<SolveResponse, BackendError>;

    /// Starts enumerating the solutions of `model`, distinct on its decision
    /// variables.
    fn enumerate<'a>(&'a self, model: &'a CpModel) -> Result<SolutionStream<'a>, BackendError>;
}
