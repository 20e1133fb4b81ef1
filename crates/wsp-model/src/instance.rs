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

//! # Workflow Instances
//!
//! An `Instance` is the immutable description of one Workflow Satisfiability
//! Problem: a number of steps, a number of users and an ordered list of
//! constraints over them. Instances are produced either by the text loader
//! (`crate::loading::InstanceLoader`) or programmatically via
//! `InstanceBuilder`. Both routes share the builder's eager validation, so an
//! `Instance` in hand never references a step or user outside its dimensions.
//!
//! ## Authorisations
//!
//! A user may be restricted by at most one effective authorisation. When an
//! instance declares several entries for the same user, the first one wins
//! and the rest are recorded as duplicates. `Instance::authorisations`
//! resolves this once into an `Authorisations` table, which the compiler and
//! the validator both consume so they can never disagree about the policy.
//!
//! ## Writing
//!
//! `Display` renders the instance in the same line-oriented format the loader
//! reads, so `InstanceLoader::new().from_str(&instance.to_string())` yields an
//! equal instance.
//!
//! ## Usage
//!
//! ```rust
//! use wsp_model::index::{StepIndex, UserIndex};
//! use wsp_model::instance::InstanceBuilder;
//!
//! let mut builder = InstanceBuilder::new(2, 2);
//! builder.add_separation_of_duty(StepIndex::new(0), StepIndex::new(1));
//! let instance = builder.build().unwrap();
//!
//! assert_eq!(instance.num_steps(), 2);
//! assert_eq!(instance.constraints().len(), 1);
//! assert!(instance.to_string().starts_with("#Steps: 2\n#Users: 2\n#Constraints: 1\n"));
//! ```

use crate::{
    constraint::{Constraint, Team},
    index::{StepIndex, UserIndex},
};
use fixedbitset::FixedBitSet;

/// Errors raised when an instance violates a structural invariant.
///
/// `constraint` fields are zero-based positions in the constraint list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceError {
    #[error("an instance needs at least one step and one user, got {num_steps} steps and {num_users} users")]
    InvalidDimensions { num_steps: usize, num_users: usize },
    #[error("constraint {constraint} references step s{} but the instance has {num_steps} steps", .step.one_based())]
    StepOutOfRange {
        constraint: usize,
        step: StepIndex,
        num_steps: usize,
    },
    #[error("constraint {constraint} references user u{} but the instance has {num_users} users", .user.one_based())]
    UserOutOfRange {
        constraint: usize,
        user: UserIndex,
        num_users: usize,
    },
    #[error("constraint {constraint} must name at least one step")]
    EmptyStepSet { constraint: usize },
    #[error("one-team constraint {constraint} declares no teams")]
    NoTeams { constraint: usize },
    #[error("team {team} of one-team constraint {constraint} has no members")]
    EmptyTeam { constraint: usize, team: usize },
}

/// An immutable WSP instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    num_steps: usize,
    num_users: usize,
    constraints: Vec<Constraint>,
}

impl Instance {
    /// Returns the number of workflow steps.
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Returns the number of users.
    #[inline]
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Returns the constraints in declaration order.
    #[inline]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns an iterator over all step indices.
    #[inline]
    pub fn steps(&self) -> impl Iterator<Item = StepIndex> + use<> {
        (0..self.num_steps).map(StepIndex::new)
    }

    /// Returns an iterator over all user indices.
    #[inline]
    pub fn users(&self) -> impl Iterator<Item = UserIndex> + use<> {
        (0..self.num_users).map(UserIndex::new)
    }

    /// Resolves the authorisation entries with the first-wins policy.
    pub fn authorisations(&self) -> Authorisations {
        let mut allowed: Vec<Option<FixedBitSet>> = vec![None; self.num_users];
        let mut duplicates = Vec::new();

        for (position, constraint) in self.constraints.iter().enumerate() {
            if let Constraint::Authorisation { user, steps } = constraint {
                let slot = &mut allowed[user.get()];
                if slot.is_some() {
                    duplicates.push(DuplicateAuthorisation {
                        constraint: position,
                        user: *user,
                    });
                    continue;
                }
                let mut set = FixedBitSet::with_capacity(self.num_steps);
                for step in steps {
                    set.insert(step.get());
                }
                *slot = Some(set);
            }
        }

        Authorisations {
            allowed,
            duplicates,
        }
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "#Steps: {}", self.num_steps)?;
        writeln!(f, "#Users: {}", self.num_users)?;
        writeln!(f, "#Constraints: {}", self.constraints.len())?;
        for constraint in &self.constraints {
            writeln!(f, "{}", constraint)?;
        }
        Ok(())
    }
}

/// An authorisation entry that was ignored because its user already had one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateAuthorisation {
    /// Position of the ignored entry in the constraint list.
    pub constraint: usize,
    pub user: UserIndex,
}

/// The effective authorisation of every user after first-wins resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorisations {
    allowed: Vec<Option<FixedBitSet>>,
    duplicates: Vec<DuplicateAuthorisation>,
}

impl Authorisations {
    /// Returns the allowed step set of `user`, or `None` if the user is unrestricted.
    #[inline]
    pub fn allowed_steps(&self, user: UserIndex) -> Option<&FixedBitSet> {
        let index = user.get();
        debug_assert!(
            index < self.allowed.len(),
            "called `Authorisations::allowed_steps` with user index out of bounds: the len is {} but the index is {}",
            self.allowed.len(),
            index
        );

        self.allowed[index].as_ref()
    }

    /// Returns `true` if `user` may perform `step`.
    #[inline]
    pub fn is_authorised(&self, user: UserIndex, step: StepIndex) -> bool {
        self.allowed_steps(user)
            .is_none_or(|allowed| allowed.contains(step.get()))
    }

    /// Returns `true` if `user` has no effective authorisation entry.
    #[inline]
    pub fn is_unrestricted(&self, user: UserIndex) -> bool {
        self.allowed_steps(user).is_none()
    }

    /// Returns the users that have no authorisation entry.
    pub fn unrestricted_users(&self) -> Vec<UserIndex> {
        self.allowed
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_none())
            .map(|(u, _)| UserIndex::new(u))
            .collect()
    }

    /// Returns the ignored duplicate entries in declaration order.
    #[inline]
    pub fn duplicates(&self) -> &[DuplicateAuthorisation] {
        &self.duplicates
    }
}

/// A builder that collects constraints and validates them on `build`.
///
/// # Examples
///
/// ```rust
/// # use wsp_model::index::{StepIndex, UserIndex};
/// # use wsp_model::instance::{InstanceBuilder, InstanceError};
/// let mut builder = InstanceBuilder::new(2, 2);
/// builder.add_binding_of_duty(StepIndex::new(0), StepIndex::new(5));
/// assert!(matches!(builder.build(), Err(InstanceError::StepOutOfRange { .. })));
/// ```
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    num_steps: usize,
    num_users: usize,
    constraints: Vec<Constraint>,
}

impl InstanceBuilder {
    /// Creates a builder for an instance with the given dimensions.
    #[inline]
    pub fn new(num_steps: usize, num_users: usize) -> Self {
        Self {
            num_steps,
            num_users,
            constraints: Vec::new(),
        }
    }

    #[inline]
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    #[inline]
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Returns the number of constraints collected so far.
    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Appends an arbitrary constraint.
    #[inline]
    pub fn add_constraint(&mut self, constraint: Constraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    #[inline]
    pub fn add_authorisation<I>(&mut self, user: UserIndex, steps: I) -> &mut Self
    where
        I: IntoIterator<Item = StepIndex>,
    {
        self.add_constraint(Constraint::Authorisation {
            user,
            steps: steps.into_iter().collect(),
        })
    }

    #[inline]
    pub fn add_separation_of_duty(&mut self, first: StepIndex, second: StepIndex) -> &mut Self {
        self.add_constraint(Constraint::SeparationOfDuty { first, second })
    }

    #[inline]
    pub fn add_binding_of_duty(&mut self, first: StepIndex, second: StepIndex) -> &mut Self {
        self.add_constraint(Constraint::BindingOfDuty { first, second })
    }

    #[inline]
    pub fn add_at_most_k<I>(&mut self, k: usize, steps: I) -> &mut Self
    where
        I: IntoIterator<Item = StepIndex>,
    {
        self.add_constraint(Constraint::AtMostK {
            k,
            steps: steps.into_iter().collect(),
        })
    }

    #[inline]
    pub fn add_one_team<I, T>(&mut self, steps: I, teams: T) -> &mut Self
    where
        I: IntoIterator<Item = StepIndex>,
        T: IntoIterator<Item = Team>,
    {
        self.add_constraint(Constraint::OneTeam {
            steps: steps.into_iter().collect(),
            teams: teams.into_iter().collect(),
        })
    }

    #[inline]
    pub fn add_user_capacity(&mut self, user: UserIndex, capacity: usize) -> &mut Self {
        self.add_constraint(Constraint::UserCapacity { user, capacity })
    }

    /// Validates every constraint and freezes the instance.
    pub fn build(self) -> Result<Instance, InstanceError> {
        if self.num_steps == 0 || self.num_users == 0 {
            return Err(InstanceError::InvalidDimensions {
                num_steps: self.num_steps,
                num_users: self.num_users,
            });
        }

        for (position, constraint) in self.constraints.iter().enumerate() {
            self.check_constraint(position, constraint)?;
        }

        Ok(Instance {
            num_steps: self.num_steps,
            num_users: self.num_users,
            constraints: self.constraints,
        })
    }

    fn check_step(&self, constraint: usize, step: StepIndex) -> Result<(), InstanceError> {
        if step.get() < self.num_steps {
            Ok(())
        } else {
            Err(InstanceError::StepOutOfRange {
                constraint,
                step,
                num_steps: self.num_steps,
            })
        }
    }

    fn check_user(&self, constraint: usize, user: UserIndex) -> Result<(), InstanceError> {
        if user.get() < self.num_users {
            Ok(())
        } else {
            Err(InstanceError::UserOutOfRange {
                constraint,
                user,
                num_users: self.num_users,
            })
        }
    }

    fn check_step_set(&self, constraint: usize, steps: &[StepIndex]) -> Result<(), InstanceError> {
        if steps.is_empty() {
            return Err(InstanceError::EmptyStepSet { constraint });
        }
        steps
            .iter()
            .try_for_each(|&step| self.check_step(constraint, step))
    }

    fn check_constraint(&self, position: usize, constraint: &Constraint) -> Result<(), InstanceError> {
        match constraint {
            Constraint::Authorisation { user, steps } => {
                self.check_user(position, *user)?;
                steps
                    .iter()
                    .try_for_each(|&step| self.check_step(position, step))
            }
            Constraint::SeparationOfDuty { first, second }
            | Constraint::BindingOfDuty { first, second } => {
                self.check_step(position, *first)?;
                self.check_step(position, *second)
            }
            Constraint::AtMostK { steps, .. } => self.check_step_set(position, steps),
            Constraint::OneTeam { steps, teams } => {
                self.check_step_set(position, steps)?;
                if teams.is_empty() {
                    return Err(InstanceError::NoTeams {
                        constraint: position,
                    });
                }
                for (team_index, team) in teams.iter().enumerate() {
                    if team.is_empty() {
                        return Err(InstanceError::EmptyTeam {
                            constraint: position,
                            team: team_index,
                        });
                    }
                    team.members()
                        .iter()
                        .try_for_each(|&user| self.check_user(position, user))?;
                }
                Ok(())
            }
            Constraint::UserCapacity { user, .. } => self.check_user(position, *user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn si(i: usize) -> StepIndex {
        StepIndex::new(i)
    }

    fn ui(i: usize) -> UserIndex {
        UserIndex::new(i)
    }

    #[test]
    fn test_build_rejects_zero_dimensions() {
        assert_eq!(
            InstanceBuilder::new(0, 3).build(),
            Err(InstanceError::InvalidDimensions {
                num_steps: 0,
                num_users: 3
            })
        );
        assert!(InstanceBuilder::new(3, 0).build().is_err());
    }

    #[test]
    fn test_build_rejects_out_of_range_references() {
        let mut builder = InstanceBuilder::new(2, 2);
        builder.add_separation_of_duty(si(0), si(1));
        builder.add_user_capacity(ui(2), 1);
        assert_eq!(
            builder.build(),
            Err(InstanceError::UserOutOfRange {
                constraint: 1,
                user: ui(2),
                num_users: 2
            })
        );

        let mut builder = InstanceBuilder::new(2, 2);
        builder.add_authorisation(ui(0), [si(0), si(2)]);
        assert!(matches!(
            builder.build(),
            Err(InstanceError::StepOutOfRange { constraint: 0, .. })
        ));
    }

    #[test]
    fn test_build_rejects_malformed_one_team() {
        let mut builder = InstanceBuilder::new(2, 2);
        builder.add_one_team([si(0)], Vec::<Team>::new());
        assert_eq!(builder.build(), Err(InstanceError::NoTeams { constraint: 0 }));

        let mut builder = InstanceBuilder::new(2, 2);
        builder.add_one_team([si(0)], [Team::new([ui(0)]), Team::new(Vec::<UserIndex>::new())]);
        assert_eq!(
            builder.build(),
            Err(InstanceError::EmptyTeam {
                constraint: 0,
                team: 1
            })
        );

        let mut builder = InstanceBuilder::new(2, 2);
        builder.add_one_team(Vec::<StepIndex>::new(), [Team::new([ui(0)])]);
        assert_eq!(
            builder.build(),
            Err(InstanceError::EmptyStepSet { constraint: 0 })
        );
    }

    #[test]
    fn test_empty_authorisation_is_accepted() {
        let mut builder = InstanceBuilder::new(2, 2);
        builder.add_authorisation(ui(1), Vec::<StepIndex>::new());
        let instance = builder.build().unwrap();
        let auth = instance.authorisations();
        assert!(!auth.is_authorised(ui(1), si(0)));
        assert!(!auth.is_authorised(ui(1), si(1)));
        assert!(auth.is_unrestricted(ui(0)));
    }

    #[test]
    fn test_authorisations_first_entry_wins() {
        let mut builder = InstanceBuilder::new(3, 3);
        builder
            .add_authorisation(ui(0), [si(0)])
            .add_separation_of_duty(si(0), si(1))
            .add_authorisation(ui(0), [si(1), si(2)]);
        let instance = builder.build().unwrap();

        let auth = instance.authorisations();
        assert!(auth.is_authorised(ui(0), si(0)));
        assert!(!auth.is_authorised(ui(0), si(1)));
        assert_eq!(
            auth.duplicates(),
            &[DuplicateAuthorisation {
                constraint: 2,
                user: ui(0)
            }]
        );
        assert_eq!(auth.unrestricted_users(), vec![ui(1), ui(2)]);
    }

    #[test]
    fn test_display_writes_header_and_lines() {
        let mut builder = InstanceBuilder::new(3, 2);
        builder
            .add_at_most_k(1, [si(0), si(2)])
            .add_user_capacity(ui(1), 2);
        let instance = builder.build().unwrap();

        assert_eq!(
            instance.to_string(),
            "#Steps: 3\n#Users: 2\n#Constraints: 2\nAt-most-k 1 s1 s3\nUser-capacity u2 2\n"
        );
    }
}
