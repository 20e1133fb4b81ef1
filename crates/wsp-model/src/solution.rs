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

//! Concrete step→user assignments.
//!
//! A `Solution` stores one user per step, indexed by step. It is total by
//! construction: there is no way to leave a step unassigned. A `SolutionSet`
//! is the ordered, duplicate-free collection produced by multi-solution
//! search. `SolutionLoader` reads the `s<i>: u<j>` text format back into a
//! `Solution`, which is how externally produced assignments reach the
//! validator.

use crate::index::{StepIndex, UserIndex};
use rustc_hash::FxHashSet;
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

/// A total assignment of users to steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Solution {
    users: Vec<UserIndex>,
}

impl Solution {
    /// Creates a solution where step `i` is performed by `users[i]`.
    #[inline]
    pub fn new(users: Vec<UserIndex>) -> Self {
        Self { users }
    }

    /// Returns the number of steps covered by this solution.
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.users.len()
    }

    /// Returns the user assigned to `step`.
    ///
    /// # Panics
    ///
    /// Panics if `step` is not in `0..num_steps()`.
    #[inline]
    pub fn user(&self, step: StepIndex) -> UserIndex {
        let index = step.get();
        debug_assert!(
            index < self.num_steps(),
            "called `Solution::user` with step index out of bounds: the len is {} but the index is {}",
            self.num_steps(),
            index
        );

        self.users[index]
    }

    /// Returns the assigned users in step order.
    #[inline]
    pub fn users(&self) -> &[UserIndex] {
        &self.users
    }

    /// Returns an iterator over `(step, user)` pairs in step order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (StepIndex, UserIndex)> + '_ {
        self.users
            .iter()
            .enumerate()
            .map(|(step, &user)| (StepIndex::new(step), user))
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, line) in crate::format::solution_lines(self).iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// An ordered collection of distinct solutions.
#[derive(Debug, Clone, Default)]
pub struct SolutionSet {
    solutions: Vec<Solution>,
    seen: FxHashSet<Solution>,
}

impl SolutionSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `solution` unless an equal one is already present.
    /// Returns `true` if the solution was new.
    pub fn push(&mut self, solution: Solution) -> bool {
        if !self.seen.insert(solution.clone()) {
            return false;
        }
        self.solutions.push(solution);
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Returns `true` if an equal solution is part of the set.
    #[inline]
    pub fn contains(&self, solution: &Solution) -> bool {
        self.seen.contains(solution)
    }

    /// Returns the first solution found, if any.
    #[inline]
    pub fn first(&self) -> Option<&Solution> {
        self.solutions.first()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Solution> {
        self.solutions.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Solution] {
        &self.solutions
    }

    #[inline]
    pub fn into_vec(self) -> Vec<Solution> {
        self.solutions
    }
}

impl PartialEq for SolutionSet {
    fn eq(&self, other: &Self) -> bool {
        self.solutions == other.solutions
    }
}

impl Eq for SolutionSet {}

impl FromIterator<Solution> for SolutionSet {
    fn from_iter<I: IntoIterator<Item = Solution>>(iter: I) -> Self {
        let mut set = SolutionSet::new();
        for solution in iter {
            set.push(solution);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SolutionSet {
    type Item = &'a Solution;
    type IntoIter = std::slice::Iter<'a, Solution>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The error type for reading solution text.
#[derive(Debug, thiserror::Error)]
pub enum SolutionParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected `s<i>: u<j>`, found `{text}`")]
    MalformedLine { line: usize, text: String },
    #[error("line {line}: step s{} is assigned more than once", .step.one_based())]
    DuplicateStep { line: usize, step: StepIndex },
    #[error("step s{} has no assigned user", .step.one_based())]
    MissingStep { step: StepIndex },
    #[error("the solution assigns no steps")]
    Empty,
}

/// Reads the `s<i>: u<j>` solution format.
///
/// Lines may appear in any order but every step from `s1` up to the highest
/// step mentioned must be assigned exactly once. Blank lines are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolutionLoader;

impl SolutionLoader {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Loads a solution from a type implementing `BufRead`.
    pub fn from_bufread<R: BufRead>(&self, rdr: R) -> Result<Solution, SolutionParseError> {
        let mut assigned: Vec<Option<UserIndex>> = Vec::new();

        for (i, line) in rdr.lines().enumerate() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let number = i + 1;
            let (step, user) =
                parse_assignment(text).ok_or_else(|| SolutionParseError::MalformedLine {
                    line: number,
                    text: text.to_owned(),
                })?;

            if assigned.len() <= step.get() {
                assigned.resize(step.get() + 1, None);
            }
            let slot = &mut assigned[step.get()];
            if slot.is_some() {
                return Err(SolutionParseError::DuplicateStep { line: number, step });
            }
            *slot = Some(user);
        }

        if assigned.is_empty() {
            return Err(SolutionParseError::Empty);
        }

        let users = assigned
            .into_iter()
            .enumerate()
            .map(|(step, user)| {
                user.ok_or(SolutionParseError::MissingStep {
                    step: StepIndex::new(step),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Solution::new(users))
    }

    #[inline]
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Solution, SolutionParseError> {
        let file = File::open(path)?;
        self.from_bufread(BufReader::new(file))
    }

    #[inline]
    pub fn from_reader<R: Read>(&self, r: R) -> Result<Solution, SolutionParseError> {
        self.from_bufread(BufReader::new(r))
    }

    #[inline]
    pub fn from_str(&self, s: &str) -> Result<Solution, SolutionParseError> {
        self.from_reader(s.as_bytes())
    }
}

fn parse_assignment(text: &str) -> Option<(StepIndex, UserIndex)> {
    let (step, user) = text.split_once(':')?;
    let step = parse_id(step.trim(), 's').and_then(StepIndex::from_one_based)?;
    let user = parse_id(user.trim(), 'u').and_then(UserIndex::from_one_based)?;
    Some((step, user))
}

fn parse_id(token: &str, prefix: char) -> Option<usize> {
    let digits = token.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
