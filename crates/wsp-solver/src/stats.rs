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

use std::time::Duration;

/// Counters and timings of one solve attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveStatistics {
    /// Number of solutions recorded.
    pub solutions_found: u64,
    /// Integer and boolean variables of the compiled model.
    pub num_variables: usize,
    /// Constraints posted in the compiled model.
    pub num_constraints: usize,
    /// Time spent compiling the instance.
    pub compile_duration: Duration,
    /// Time spent in the backend.
    pub solve_duration: Duration,
}

impl std::fmt::Display for SolveStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solve Statistics:")?;
        writeln!(f, "  Solutions Found: {}", self.solutions_found)?;
        writeln!(f, "  Variables: {}", self.num_variables)?;
        writeln!(f, "  Constraints: {}", self.num_constraints)?;
        writeln!(
            f,
            "  Compile Duration (secs): {:.3}",
            self.compile_duration.as_secs_f64()
        )?;
        writeln!(
            f,
            "  Solve Duration (secs): {:.3}",
            self.solve_duration.as_secs_f64()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveStatisticsBuilder {
    solutions_found: u64,
    num_variables: usize,
    num_constraints: usize,
    compile_duration: Duration,
    solve_duration: Duration,
}

impl Default for SolveStatisticsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SolveStatisticsBuilder {
    /// Creates a new `SolveStatisticsBuilder` with zeroed values.
    #[inline]
    pub fn new() -> Self {
        Self {
            solutions_found: 0,
            num_variables: 0,
            num_constraints: 0,
            compile_duration: Duration::ZERO,
            solve_duration: Duration::ZERO,
        }
    }

    #[inline]
    pub fn solutions_found(mut self, solutions_found: u64) -> Self {
        self.solutions_found = solutions_found;
        self
    }

    #[inline]
    pub fn num_variables(mut self, num_variables: usize) -> Self {
        self.num_variables = num_variables;
        self
    }

    #[inline]
    pub fn num_constraints(mut self, num_constraints: usize) -> Self {
        self.num_constraints = num_constraints;
        self
    }

    #[inline]
    pub fn compile_duration(mut self, compile_duration: Duration) -> Self {
        self.compile_duration = compile_duration;
        self
    }

    #[inline]
    pub fn solve_duration(mut self, solve_duration: Duration) -> Self {
        self.solve_duration = solve_duration;
        self
    }

    /// Builds the `SolveStatistics` instance.
    #[inline]
    pub fn build(self) -> SolveStatistics {
        SolveStatistics {
            solutions_found: self.solutions_found,
            num_variables: self.num_variables,
            num_constraints: self.num_constraints,
            compile_duration: self.compile_duration,
            solve_duration: self.solve_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_constructs_expected_struct() {
        let stats = SolveStatisticsBuilder::new()
            .solutions_found(3)
            .num_variables(12)
            .num_constraints(40)
            .compile_duration(Duration::from_millis(5))
            .solve_duration(Duration::from_millis(1234))
            .build();

        assert_eq!(stats.solutions_found, 3);
        assert_eq!(stats.num_variables, 12);
        assert_eq!(stats.num_constraints, 40);
        assert_eq!(stats.compile_duration, Duration::from_millis(5));
        assert_eq!(stats.solve_duration, Duration::from_millis(1234));
    }

    #[test]
    fn test_display_formats_all_fields() {
        let stats = SolveStatisticsBuilder::new()
            .solutions_found(2)
            .num_variables(7)
            .num_constraints(9)
            .solve_duration(Duration::from_millis(1234))
            .build();

        let rendered = stats.to_string();
        assert!(rendered.contains("Solve Statistics:"), "missing header");
        assert!(rendered.contains("Solutions Found: 2"));
        assert!(rendered.contains("Variables: 7"));
        assert!(rendered.contains("Constraints: 9"));
        assert!(rendered.contains("Compile Duration (secs): 0.000"));
        assert!(rendered.contains("Solve Duration (secs): 1.234"));
    }
}
