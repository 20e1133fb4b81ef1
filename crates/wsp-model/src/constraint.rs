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

//! The six constraint families of a WSP instance as one tagged variant.
//!
//! Every constraint line of an instance file becomes exactly one
//! `Constraint` value. Downstream code dispatches on the variant with an
//! exhaustive `match`, so adding a family is a compile error everywhere it
//! has to be handled. `Display` renders the canonical text line, which makes
//! an `Instance` writable in the same format it was read from.

use crate::index::{StepIndex, UserIndex};

/// A set of users that may jointly cover the steps of a one-team constraint.
///
/// Members are kept sorted and free of duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Team {
    members: Vec<UserIndex>,
}

impl Team {
    /// Creates a team from an arbitrary list of users, normalising order and
    /// dropping duplicates.
    pub fn new<I>(members: I) -> Self
    where
        I: IntoIterator<Item = UserIndex>,
    {
        let mut members: Vec<UserIndex> = members.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        Self { members }
    }

    /// Returns the members in increasing user order.
    #[inline]
    pub fn members(&self) -> &[UserIndex] {
        &self.members
    }

    /// Returns `true` if `user` belongs to this team.
    #[inline]
    pub fn contains(&self, user: UserIndex) -> bool {
        self.members.binary_search(&user).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, user) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "u{}", user.one_based())?;
        }
        write!(f, ")")
    }
}

/// Discriminant of a `Constraint`, used for statistics and log messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    Authorisation,
    SeparationOfDuty,
    BindingOfDuty,
    AtMostK,
    OneTeam,
    UserCapacity,
}

impl ConstraintKind {
    /// All kinds, in the order they are documented in the instance format.
    pub const ALL: [ConstraintKind; 6] = [
        ConstraintKind::Authorisation,
        ConstraintKind::SeparationOfDuty,
        ConstraintKind::BindingOfDuty,
        ConstraintKind::AtMostK,
        ConstraintKind::OneTeam,
        ConstraintKind::UserCapacity,
    ];

    /// The keyword that introduces a constraint line of this kind.
    #[inline]
    pub const fn keyword(self) -> &'static str {
        match self {
            ConstraintKind::Authorisation => "Authorisations",
            ConstraintKind::SeparationOfDuty => "Separation-of-duty",
            ConstraintKind::BindingOfDuty => "Binding-of-duty",
            ConstraintKind::AtMostK => "At-most-k",
            ConstraintKind::OneTeam => "One-team",
            ConstraintKind::UserCapacity => "User-capacity",
        }
    }

    /// Looks up the kind introduced by `keyword`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single security constraint of a workflow instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// `user` may only perform the listed steps. An empty list forbids every step.
    Authorisation {
        user: UserIndex,
        steps: Vec<StepIndex>,
    },
    /// The two steps must be performed by different users.
    SeparationOfDuty { first: StepIndex, second: StepIndex },
    /// The two steps must be performed by the same user.
    BindingOfDuty { first: StepIndex, second: StepIndex },
    /// At most `k` distinct users may perform the listed steps.
    AtMostK { k: usize, steps: Vec<StepIndex> },
    /// All listed steps must be performed by members of one single team.
    OneTeam {
        steps: Vec<StepIndex>,
        teams: Vec<Team>,
    },
    /// `user` may perform at most `capacity` steps.
    UserCapacity { user: UserIndex, capacity: usize },
}

impl Constraint {
    /// Returns the discriminant of this constraint.
    #[inline]
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Authorisation { .. } => ConstraintKind::Authorisation,
            Constraint::SeparationOfDuty { .. } => ConstraintKind::SeparationOfDuty,
            Constraint::BindingOfDuty { .. } => ConstraintKind::BindingOfDuty,
            Constraint::AtMostK { .. } => ConstraintKind::AtMostK,
            Constraint::OneTeam { .. } => ConstraintKind::OneTeam,
            Constraint::UserCapacity { .. } => ConstraintKind::UserCapacity,
        }
    }
}

fn write_steps(f: &mut std::fmt::Formatter<'_>, steps: &[StepIndex]) -> std::fmt::Result {
    for step in steps {
        write!(f, " s{}", step.one_based())?;
    }
    Ok(())
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind().keyword())?;
        match self {
            Constraint::Authorisation { user, steps } => {
                write!(f, " u{}", user.one_based())?;
                write_steps(f, steps)
            }
            Constraint::SeparationOfDuty { first, second }
            | Constraint::BindingOfDuty { first, second } => {
                write!(f, " s{} s{}", first.one_based(), second.one_based())
            }
            Constraint::AtMostK { k, steps } => {
                write!(f, " {}", k)?;
                write_steps(f, steps)
            }
            Constraint::OneTeam { steps, teams } => {
                write_steps(f, steps)?;
                for team in teams {
                    write!(f, " {}", team)?;
                }
                Ok(())
            }
            Constraint::UserCapacity { user, capacity } => {
                write!(f, " u{} {}", user.one_based(), capacity)
            }
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
    fn test_team_normalises_members() {
        let team = Team::new([ui(3), ui(1), ui(3), ui(0)]);
        assert_eq!(team.members(), &[ui(0), ui(1), ui(3)]);
        assert!(team.contains(ui(1)));
        assert!(!team.contains(ui(2)));
        assert_eq!(team.len(), 3);
    }

    #[test]
    fn test_keyword_lookup_round_trips() {
        for kind in ConstraintKind::ALL {
            assert_eq!(ConstraintKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(ConstraintKind::from_keyword("Precedence"), None);
    }

    #[test]
    fn test_display_renders_instance_lines() {
        let cases = vec![
            (
                Constraint::Authorisation {
                    user: ui(0),
                    steps: vec![si(0), si(2)],
                },
                "Authorisations u1 s1 s3",
            ),
            (
                Constraint::Authorisation {
                    user: ui(4),
                    steps: vec![],
                },
                "Authorisations u5",
            ),
            (
                Constraint::SeparationOfDuty {
                    first: si(0),
                    second: si(1),
                },
                "Separation-of-duty s1 s2",
            ),
            (
                Constraint::BindingOfDuty {
                    first: si(2),
                    second: si(3),
                },
                "Binding-of-duty s3 s4",
            ),
            (
                Constraint::AtMostK {
                    k: 2,
                    steps: vec![si(0), si(1), si(2)],
                },
                "At-most-k 2 s1 s2 s3",
            ),
            (
                Constraint::OneTeam {
                    steps: vec![si(0), si(1)],
                    teams: vec![Team::new([ui(0), ui(1)]), Team::new([ui(2)])],
                },
                "One-team s1 s2 (u1 u2) (u3)",
            ),
            (
                Constraint::UserCapacity {
                    user: ui(1),
                    capacity: 3,
                },
                "User-capacity u2 3",
            ),
        ];

        for (constraint, expected) in cases {
            assert_eq!(constraint.to_string(), expected);
        }
    }
}
