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

//! Canonical text rendering of solutions.
//!
//! A solution is rendered as one `s<i>: u<j>` line per step in increasing
//! step order. A solution set becomes one such block per solution; the
//! joined form heads every block with `Solution <n>:` and separates blocks
//! by a blank line. All functions are pure.

use crate::solution::{Solution, SolutionSet};

/// Returns the `s<i>: u<j>` lines of `solution`, in step order.
pub fn solution_lines(solution: &Solution) -> Vec<String> {
    solution
        .iter()
        .map(|(step, user)| format!("s{}: u{}", step.one_based(), user.one_based()))
        .collect()
}

/// Renders `solution` as newline-terminated lines.
pub fn render_solution(solution: &Solution) -> String {
    let mut out = String::new();
    for line in solution_lines(solution) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Returns one block of lines per solution, in discovery order.
#[inline]
pub fn solution_blocks(solutions: &SolutionSet) -> Vec<Vec<String>> {
    solutions.iter().map(solution_lines).collect()
}

/// Renders every solution as a `Solution <n>:` block, blocks separated by a
/// blank line. An empty set renders as the empty string.
pub fn render_solution_set(solutions: &SolutionSet) -> String {
    solution_blocks(solutions)
        .into_iter()
        .enumerate()
        .map(|(i, lines)| format!("Solution {}:\n{}", i + 1, lines.join("\n")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::UserIndex;

    fn sol(users: &[usize]) -> Solution {
        Solution::new(users.iter().map(|&u| UserIndex::new(u)).collect())
    }

    #[test]
    fn test_solution_lines_are_one_based_and_ordered() {
        assert_eq!(solution_lines(&sol(&[1, 0])), vec!["s1: u2", "s2: u1"]);
        assert_eq!(render_solution(&sol(&[0])), "s1: u1\n");
    }

    #[test]
    fn test_render_solution_set_blocks() {
        let set: SolutionSet = [sol(&[0, 1]), sol(&[1, 0])].into_iter().collect();
        assert_eq!(solution_blocks(&set).len(), 2);
        assert_eq!(
            render_solution_set(&set),
            "Solution 1:\ns1: u1\ns2: u2\n\nSolution 2:\ns1: u2\ns2: u1"
        );
        assert_eq!(render_solution_set(&SolutionSet::new()), "");
    }
}
