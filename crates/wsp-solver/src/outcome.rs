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

//! The immutable result of a solve attempt.
//!
//! `SolveOutcome`'s `Display` renders the plain-text report:
//!
//! ```text
//! sat
//! s1: u1
//! s2: u2
//!
//! Solution 1:
//! s1: u1
//! s2: u2
//!
//! Solution 2:
//! s1: u2
//! s2: u1
//! 3ms
//! ```
//!
//! The status word comes first, then the primary solution. Multi-solution
//! blocks follow only when more than one solution was found; a single
//! solution is annotated as unique if the search proved there is no other.
//! The last line is the elapsed wall-clock time in milliseconds.

use crate::stats::SolveStatistics;
use std::time::Duration;
use wsp_compiler::diagnostics::Diagnostics;
use wsp_model::{
    format::{render_solution, render_solution_set},
    solution::{Solution, SolutionSet},
};

/// The answer to "is this instance satisfiable?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatStatus {
    /// At least one solution was found.
    Sat,
    /// The search proved that no solution exists.
    Unsat,
    /// The search ended without a solution and without a proof.
    Unknown,
}

impl std::fmt::Display for SatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SatStatus::Sat => write!(f, "sat"),
            SatStatus::Unsat => write!(f, "unsat"),
            SatStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// A single-solution search found its solution.
    SolutionFound,
    /// Every solution was enumerated.
    SearchExhausted,
    /// The backend proved that the model has no solution.
    InfeasibilityProven,
    /// A monitor, the time limit or an indeterminate backend stopped the search.
    Aborted(String),
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::SolutionFound => write!(f, "Solution Found"),
            TerminationReason::SearchExhausted => write!(f, "Search Exhausted"),
            TerminationReason::InfeasibilityProven => write!(f, "Infeasibility Proven"),
            TerminationReason::Aborted(reason) => write!(f, "Aborted: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    status: SatStatus,
    primary_solution: Option<Solution>,
    all_solutions: SolutionSet,
    elapsed: Duration,
    diagnostics: Diagnostics,
    reason: TerminationReason,
    statistics: SolveStatistics,
}

impl SolveOutcome {
    /// Creates a satisfiable outcome; the first solution of `solutions` is the primary one.
    ///
    /// # Panics
    ///
    /// Panics if `solutions` is empty.
    pub fn sat(
        solutions: SolutionSet,
        elapsed: Duration,
        diagnostics: Diagnostics,
        reason: TerminationReason,
        statistics: SolveStatistics,
    ) -> Self {
        assert!(
            !solutions.is_empty(),
            "called `SolveOutcome::sat` with an empty solution set"
        );

        Self {
            status: SatStatus::Sat,
            primary_solution: solutions.first().cloned(),
            all_solutions: solutions,
            elapsed,
            diagnostics,
            reason,
            statistics,
        }
    }

    #[inline]
    pub fn unsat(
        elapsed: Duration,
        diagnostics: Diagnostics,
        statistics: SolveStatistics,
    ) -> Self {
        Self::empty(
            SatStatus::Unsat,
            elapsed,
            diagnostics,
            TerminationReason::InfeasibilityProven,
            statistics,
        )
    }

    #[inline]
    pub fn unknown(
        elapsed: Duration,
        diagnostics: Diagnostics,
        reason: TerminationReason,
        statistics: SolveStatistics,
    ) -> Self {
        Self::empty(SatStatus::Unknown, elapsed, diagnostics, reason, statistics)
    }

    fn empty(
        status: SatStatus,
        elapsed: Duration,
        diagnostics: Diagnostics,
        reason: TerminationReason,
        statistics: SolveStatistics,
    ) -> Self {
        Self {
            status,
            primary_solution: None,
            all_solutions: SolutionSet::new(),
            elapsed,
            diagnostics,
            reason,
            statistics,
        }
    }

    #[inline]
    pub fn status(&self) -> SatStatus {
        self.status
    }

    #[inline]
    pub fn is_sat(&self) -> bool {
        self.status == SatStatus::Sat
    }

    #[inline]
    pub fn is_unsat(&self) -> bool {
        self.status == SatStatus::Unsat
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.status == SatStatus::Unknown
    }

    #[inline]
    pub fn primary_solution(&self) -> Option<&Solution> {
        self.primary_solution.as_ref()
    }

    /// Returns every recorded solution, in the order the backend produced them.
    #[inline]
    pub fn all_solutions(&self) -> &SolutionSet {
        &self.all_solutions
    }

    /// Wall-clock duration of the whole attempt.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[inline]
    pub fn reason(&self) -> &TerminationReason {
        &self.reason
    }

    #[inline]
    pub fn statistics(&self) -> &SolveStatistics {
        &self.statistics
    }
}

impl std::fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.status)?;
        if let Some(primary) = &self.primary_solution {
            write!(f, "{}", render_solution(primary))?;
        }
        match self.all_solutions.len() {
            0 => {}
            1 if self.reason == TerminationReason::SearchExhausted => {
                writeln!(f, "Unique solution found")?
            }
            1 => writeln!(f, "1 solution found")?,
            _ => writeln!(f, "\n{}", render_solution_set(&self.all_solutions))?,
        }
        write!(f, "{}ms", self.elapsed.as_millis())
    }
}
