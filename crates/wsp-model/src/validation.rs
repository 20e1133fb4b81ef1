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

//! Independent checking of an assignment against an instance.
//!
//! `validate` walks every constraint of an instance and records each one the
//! assignment breaks as a typed `Violation`. It shares nothing with the
//! constraint compiler except the first-wins authorisation policy from
//! `Instance::authorisations`, which makes it a useful oracle for the
//! encodings.
//!
//! Structural problems (wrong number of steps, users outside the instance)
//! are reported on their own; constraint checks only run on a structurally
//! sound assignment.

use crate::{
    constraint::Constraint,
    index::{StepIndex, UserIndex},
    instance::Instance,
    solution::Solution,
};
use fixedbitset::FixedBitSet;

/// A single broken invariant. `constraint` fields are zero-based positions
/// in the instance's constraint list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    StepCountMismatch {
        expected: usize,
        found: usize,
    },
    UserOutOfRange {
        step: StepIndex,
        user: UserIndex,
        num_users: usize,
    },
    Unauthorised {
        step: StepIndex,
        user: UserIndex,
    },
    SeparationOfDuty {
        constraint: usize,
        first: StepIndex,
        second: StepIndex,
        user: UserIndex,
    },
    BindingOfDuty {
        constraint: usize,
        first: StepIndex,
        second: StepIndex,
    },
    AtMostK {
        constraint: usize,
        k: usize,
        distinct: usize,
    },
    OneTeam {
        constraint: usize,
    },
    UserCapacity {
        constraint: usize,
        user: UserIndex,
        capacity: usize,
        assigned: usize,
    },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::StepCountMismatch { expected, found } => write!(
                f,
                "solution assigns {} steps but the instance has {}",
                found, expected
            ),
            Violation::UserOutOfRange {
                step,
                user,
                num_users,
            } => write!(
                f,
                "s{} is assigned to u{} but the instance has {} users",
                step.one_based(),
                user.one_based(),
                num_users
            ),
            Violation::Unauthorised { step, user } => write!(
                f,
                "u{} is not authorised for s{}",
                user.one_based(),
                step.one_based()
            ),
            Violation::SeparationOfDuty {
                constraint,
                first,
                second,
                user,
            } => write!(
                f,
                "constraint {}: s{} and s{} are both assigned to u{}",
                constraint + 1,
                first.one_based(),
                second.one_based(),
                user.one_based()
            ),
            Violation::BindingOfDuty {
                constraint,
                first,
                second,
            } => write!(
                f,
                "constraint {}: s{} and s{} are assigned to different users",
                constraint + 1,
                first.one_based(),
                second.one_based()
            ),
            Violation::AtMostK {
                constraint,
                k,
                distinct,
            } => write!(
                f,
                "constraint {}: {} distinct users exceed the bound of {}",
                constraint + 1,
                distinct,
                k
            ),
            Violation::OneTeam { constraint } => write!(
                f,
                "constraint {}: no single team covers the assigned users",
                constraint + 1
            ),
            Violation::UserCapacity {
                constraint,
                user,
                capacity,
                assigned,
            } => write!(
                f,
                "constraint {}: u{} performs {} steps but the capacity is {}",
                constraint + 1,
                user.one_based(),
                assigned,
                capacity
            ),
        }
    }
}

/// The outcome of validating one solution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if the solution satisfies every constraint.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    #[inline]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            return write!(f, "valid");
        }
        write!(f, "invalid ({} violations)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

/// Checks `solution` against every constraint of `instance`.
pub fn validate(instance: &Instance, solution: &Solution) -> ValidationReport {
    let mut violations = Vec::new();

    if solution.num_steps() != instance.num_steps() {
        violations.push(Violation::StepCountMismatch {
            expected: instance.num_steps(),
            found: solution.num_steps(),
        });
        return ValidationReport { violations };
    }

    for (step, user) in solution.iter() {
        if user.get() >= instance.num_users() {
            violations.push(Violation::UserOutOfRange {
                step,
                user,
                num_users: instance.num_users(),
            });
        }
    }
    if !violations.is_empty() {
        return ValidationReport { violations };
    }

    let authorisations = instance.authorisations();
    for (step, user) in solution.iter() {
        if !authorisations.is_authorised(user, step) {
            violations.push(Violation::Unauthorised { step, user });
        }
    }

    for (position, constraint) in instance.constraints().iter().enumerate() {
        if let Some(violation) = check_constraint(instance, solution, position, constraint) {
            violations.push(violation);
        }
    }

    ValidationReport { violations }
}

fn check_constraint(
    instance: &Instance,
    solution: &Solution,
    constraint: usize,
    c: &Constraint,
) -> Option<Violation> {
    match c {
        // Checked once above with the resolved table.
        Constraint::Authorisation { .. } => None,
        Constraint::SeparationOfDuty { first, second } => {
            let user = solution.user(*first);
            (user == solution.user(*second)).then_some(Violation::SeparationOfDuty {
                constraint,
                first: *first,
                second: *second,
                user,
            })
        }
        Constraint::BindingOfDuty { first, second } => (solution.user(*first)
            != solution.user(*second))
        .then_some(Violation::BindingOfDuty {
            constraint,
            first: *first,
            second: *second,
        }),
        Constraint::AtMostK { k, steps } => {
            let used = used_users(instance, solution, steps);
            let distinct = used.count_ones(..);
            (distinct > *k).then_some(Violation::AtMostK {
                constraint,
                k: *k,
                distinct,
            })
        }
        Constraint::OneTeam { steps, teams } => {
            let used = used_users(instance, solution, steps);
            let covered = teams
                .iter()
                .any(|team| used.ones().all(|u| team.contains(UserIndex::new(u))));
            (!covered).then_some(Violation::OneTeam { constraint })
        }
        Constraint::UserCapacity { user, capacity } => {
            let assigned = solution.users().iter().filter(|&&u| u == *user).count();
            (assigned > *capacity).then_some(Violation::UserCapacity {
                constraint,
                user: *user,
                capacity: *capacity,
                assigned,
            })
        }
    }
}

fn used_users(instance: &Instance, solution: &Solution, steps: &[StepIndex]) -> FixedBitSet {
    let mut used = FixedBitSet::with_capacity(instance.num_users());
    for &step in steps {
        used.insert(solution.user(step).get());
    }
    used
}
