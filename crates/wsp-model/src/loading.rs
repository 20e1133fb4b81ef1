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

//! Instance loader for the line-oriented WSP text format.
//!
//! The format opens with three header lines declaring the number of steps,
//! users and constraint lines, followed by one constraint per line:
//!
//! ```raw
//! #Steps: 4
//! #Users: 3
//! #Constraints: 3
//! Authorisations u1 s1 s2
//! Separation-of-duty s1 s2
//! One-team s3 s4 (u1 u2) (u3)
//! ```
//!
//! Identifiers are one-based (`s1`, `u1`) and must lie within the declared
//! dimensions. Blank lines are skipped everywhere and surrounding whitespace
//! is ignored. Team groups of a one-team line are parenthesised lists whose
//! parentheses may touch the identifiers they enclose.
//!
//! Every error that concerns a specific line carries its one-based line
//! number and the offending text, so a malformed file can be fixed without
//! guessing. Constraint lines are handed to `InstanceBuilder`, which means
//! the loader enforces exactly the invariants a programmatically built
//! instance is subject to.
//!
//! The loader accepts any `BufRead`, file path, raw reader or string slice.

use crate::{
    constraint::{Constraint, ConstraintKind, Team},
    index::{StepIndex, UserIndex},
    instance::{Instance, InstanceBuilder, InstanceError},
};
use regex::Regex;
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
    sync::LazyLock,
};

static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(Steps|Users|Constraints):\s*(\d+)$").expect("header pattern is a valid regex")
});

/// The error type for the instance loading process.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// An I/O error occurred while reading the input stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The input ended before the named header was seen.
    #[error("missing `{expected}` header")]
    MissingHeader { expected: &'static str },
    /// A header line did not match `<name>: <count>`.
    #[error("line {line}: expected `{expected}: <count>` header, found `{text}`")]
    MalformedHeader {
        line: usize,
        expected: &'static str,
        text: String,
    },
    /// A constraint line starts with a keyword that names no constraint family.
    #[error("line {line}: unknown constraint keyword `{keyword}` in `{text}`")]
    UnknownKeyword {
        line: usize,
        keyword: String,
        text: String,
    },
    /// A constraint line has the wrong shape or references an unknown step or user.
    #[error("line {line}: malformed {keyword} constraint `{text}`: {reason}")]
    MalformedConstraint {
        line: usize,
        keyword: ConstraintKind,
        text: String,
        reason: String,
    },
    /// Strict mode only: the number of constraint lines differs from the header.
    #[error("header declares {declared} constraints but {found} constraint lines were found")]
    ConstraintCountMismatch { declared: usize, found: usize },
    /// The assembled instance violates a structural invariant.
    #[error(transparent)]
    Instance(#[from] InstanceError),
}

/// A configurable loader for WSP instances.
///
/// # Configuration
/// * `strict_constraint_count`: If true (the default), the number of constraint
///   lines must equal the `#Constraints` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceLoader {
    strict_constraint_count: bool,
}

impl Default for InstanceLoader {
    fn default() -> Self {
        Self {
            strict_constraint_count: true,
        }
    }
}

impl InstanceLoader {
    /// Creates a new `InstanceLoader` with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures whether a constraint line count that differs from the
    /// `#Constraints` header is an error.
    #[inline]
    pub fn strict_constraint_count(mut self, yes: bool) -> Self {
        self.strict_constraint_count = yes;
        self
    }

    /// Loads an instance from a type implementing `BufRead`.
    pub fn from_bufread<R: BufRead>(&self, rdr: R) -> Result<Instance, ParseError> {
        let mut lines = ContentLines::new(rdr);

        let num_steps = parse_header(&mut lines, "#Steps")?;
        let num_users = parse_header(&mut lines, "#Users")?;
        let declared = parse_header(&mut lines, "#Constraints")?;

        if num_steps == 0 || num_users == 0 {
            return Err(InstanceError::InvalidDimensions {
                num_steps,
                num_users,
            }
            .into());
        }

        let parser = LineParser {
            num_steps,
            num_users,
        };
        let mut builder = InstanceBuilder::new(num_steps, num_users);

        while let Some((line, text)) = lines.next_line()? {
            let constraint = parser.parse(line, &text)?;
            builder.add_constraint(constraint);
        }

        let found = builder.num_constraints();
        if self.strict_constraint_count && found != declared {
            return Err(ParseError::ConstraintCountMismatch { declared, found });
        }

        Ok(builder.build()?)
    }

    /// Loads an instance from a file path.
    #[inline]
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Instance, ParseError> {
        let file = File::open(path)?;
        self.from_bufread(BufReader::new(file))
    }

    /// Loads an instance from a generic reader.
    #[inline]
    pub fn from_reader<R: Read>(&self, r: R) -> Result<Instance, ParseError> {
        self.from_bufread(BufReader::new(r))
    }

    /// Loads an instance from a string slice.
    #[inline]
    pub fn from_str(&self, s: &str) -> Result<Instance, ParseError> {
        self.from_reader(s.as_bytes())
    }
}

/// Yields trimmed, non-blank lines together with their one-based line number.
struct ContentLines<R> {
    rdr: R,
    buf: String,
    line: usize,
}

impl<R: BufRead> ContentLines<R> {
    #[inline]
    fn new(rdr: R) -> Self {
        Self {
            rdr,
            buf: String::new(),
            line: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>, ParseError> {
        loop {
            self.buf.clear();
            if self.rdr.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let trimmed = self.buf.trim();
            if !trimmed.is_empty() {
                return Ok(Some((self.line, trimmed.to_owned())));
            }
        }
    }
}

fn parse_header<R: BufRead>(
    lines: &mut ContentLines<R>,
    expected: &'static str,
) -> Result<usize, ParseError> {
    let (line, text) = lines
        .next_line()?
        .ok_or(ParseError::MissingHeader { expected })?;

    let malformed = || ParseError::MalformedHeader {
        line,
        expected,
        text: text.clone(),
    };

    let captures = HEADER_PATTERN.captures(&text).ok_or_else(malformed)?;
    if &captures[1] != expected.trim_start_matches('#') {
        return Err(malformed());
    }

    // Only fails on overflow, the pattern guarantees digits.
    captures[2].parse::<usize>().map_err(|_| malformed())
}

/// Parses single constraint lines against fixed instance dimensions.
struct LineParser {
    num_steps: usize,
    num_users: usize,
}

impl LineParser {
    fn parse(&self, line: usize, text: &str) -> Result<Constraint, ParseError> {
        let spaced = text.replace('(', " ( ").replace(')', " ) ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();

        // Blank lines never reach the parser, so there is always a keyword.
        let keyword = tokens[0];
        let kind = ConstraintKind::from_keyword(keyword).ok_or_else(|| {
            ParseError::UnknownKeyword {
                line,
                keyword: keyword.to_owned(),
                text: text.to_owned(),
            }
        })?;

        let args = &tokens[1..];
        let parsed = match kind {
            ConstraintKind::Authorisation => self.parse_authorisation(args),
            ConstraintKind::SeparationOfDuty => self
                .parse_step_pair(args)
                .map(|(first, second)| Constraint::SeparationOfDuty { first, second }),
            ConstraintKind::BindingOfDuty => self
                .parse_step_pair(args)
                .map(|(first, second)| Constraint::BindingOfDuty { first, second }),
            ConstraintKind::AtMostK => self.parse_at_most_k(args),
            ConstraintKind::OneTeam => self.parse_one_team(args),
            ConstraintKind::UserCapacity => self.parse_user_capacity(args),
        };

        parsed.map_err(|reason| ParseError::MalformedConstraint {
            line,
            keyword: kind,
            text: text.to_owned(),
            reason,
        })
    }

    fn parse_authorisation(&self, args: &[&str]) -> Result<Constraint, String> {
        let (user, steps) = args
            .split_first()
            .ok_or_else(|| "expected a user identifier".to_owned())?;
        Ok(Constraint::Authorisation {
            user: self.parse_user(user)?,
            steps: self.parse_steps(steps)?,
        })
    }

    fn parse_step_pair(&self, args: &[&str]) -> Result<(StepIndex, StepIndex), String> {
        match args {
            [first, second] => Ok((self.parse_step(first)?, self.parse_step(second)?)),
            _ => Err(format!("expected exactly two steps, found {} tokens", args.len())),
        }
    }

    fn parse_at_most_k(&self, args: &[&str]) -> Result<Constraint, String> {
        let (k, steps) = args
            .split_first()
            .ok_or_else(|| "expected a bound followed by steps".to_owned())?;
        let k = parse_count(k, "bound")?;
        if steps.is_empty() {
            return Err("expected at least one step".to_owned());
        }
        Ok(Constraint::AtMostK {
            k,
            steps: self.parse_steps(steps)?,
        })
    }

    fn parse_one_team(&self, args: &[&str]) -> Result<Constraint, String> {
        let split = args.iter().position(|&t| t == "(").unwrap_or(args.len());
        let (steps, groups) = args.split_at(split);
        if steps.is_empty() {
            return Err("expected at least one step before the teams".to_owned());
        }
        let steps = self.parse_steps(steps)?;

        let mut teams = Vec::new();
        let mut tokens = groups.iter();
        while let Some(&open) = tokens.next() {
            if open != "(" {
                return Err(format!("unexpected token `{open}` outside of a team"));
            }
            let mut members = Vec::new();
            loop {
                match tokens.next() {
                    None => return Err("unbalanced parentheses".to_owned()),
                    Some(&")") => break,
                    Some(&"(") => return Err("nested team group".to_owned()),
                    Some(token) => members.push(self.parse_user(token)?),
                }
            }
            if members.is_empty() {
                return Err(format!("team {} is empty", teams.len() + 1));
            }
            teams.push(Team::new(members));
        }

        if teams.is_empty() {
            return Err("expected at least one team".to_owned());
        }
        Ok(Constraint::OneTeam { steps, teams })
    }

    fn parse_user_capacity(&self, args: &[&str]) -> Result<Constraint, String> {
        match args {
            [user, capacity] => Ok(Constraint::UserCapacity {
                user: self.parse_user(user)?,
                capacity: parse_count(capacity, "capacity")?,
            }),
            _ => Err(format!(
                "expected a user and a capacity, found {} tokens",
                args.len()
            )),
        }
    }

    fn parse_steps(&self, tokens: &[&str]) -> Result<Vec<StepIndex>, String> {
        tokens.iter().map(|t| self.parse_step(t)).collect()
    }

    #[inline]
    fn parse_step(&self, token: &str) -> Result<StepIndex, String> {
        parse_identifier(token, 's', "step", self.num_steps).map(StepIndex::new)
    }

    #[inline]
    fn parse_user(&self, token: &str) -> Result<UserIndex, String> {
        parse_identifier(token, 'u', "user", self.num_users).map(UserIndex::new)
    }
}

/// Parses `<prefix><id>` with `1 <= id <= count` into a zero-based index.
fn parse_identifier(token: &str, prefix: char, what: &str, count: usize) -> Result<usize, String> {
    let id = token
        .strip_prefix(prefix)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<usize>().ok())
        .ok_or_else(|| format!("expected a {what} identifier `{prefix}<n>`, found `{token}`"))?;

    if id == 0 || id > count {
        return Err(format!(
            "{what} `{token}` is out of range, the instance has {count} {what}s"
        ));
    }
    Ok(id - 1)
}

fn parse_count(token: &str, what: &str) -> Result<usize, String> {
    token
        .parse::<usize>()
        .map_err(|_| format!("expected a non-negative {what}, found `{token}`"))
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

    const SAMPLE: &str = "\
#Steps: 4
#Users: 4
#Constraints: 6
Authorisations u1 s1 s2
Separation-of-duty s1 s2
Binding-of-duty s3 s4
At-most-k 2 s1 s2 s3
One-team s1 s2 (u1 u2) (u3 u4)
User-capacity u2 3
";

    #[test]
    fn test_load_all_constraint_kinds() {
        let instance = InstanceLoader::new().from_str(SAMPLE).unwrap();
        assert_eq!(instance.num_steps(), 4);
        assert_eq!(instance.num_users(), 4);

        let expected = vec![
            Constraint::Authorisation {
                user: ui(0),
                steps: vec![si(0), si(1)],
            },
            Constraint::SeparationOfDuty {
                first: si(0),
                second: si(1),
            },
            Constraint::BindingOfDuty {
                first: si(2),
                second: si(3),
            },
            Constraint::AtMostK {
                k: 2,
                steps: vec![si(0), si(1), si(2)],
            },
            Constraint::OneTeam {
                steps: vec![si(0), si(1)],
                teams: vec![Team::new([ui(0), ui(1)]), Team::new([ui(2), ui(3)])],
            },
            Constraint::UserCapacity {
                user: ui(1),
                capacity: 3,
            },
        ];
        assert_eq!(instance.constraints(), expected.as_slice());
    }

    #[test]
    fn test_blank_lines_and_whitespace_are_ignored() {
        let text = "\n  #Steps:   2  \n\n#Users:2\n#Constraints: 1\n\n   Separation-of-duty   s1 s2   \n\n";
        let instance = InstanceLoader::new().from_str(text).unwrap();
        assert_eq!(instance.num_users(), 2);
        assert_eq!(instance.constraints().len(), 1);
    }

    #[test]
    fn test_touching_and_spaced_parentheses_are_equivalent() {
        let touching = "#Steps: 2\n#Users: 3\n#Constraints: 1\nOne-team s1 s2 (u1 u2)(u3)\n";
        let spaced = "#Steps: 2\n#Users: 3\n#Constraints: 1\nOne-team s1 s2 ( u1 u2 ) ( u3 )\n";
        assert_eq!(
            InstanceLoader::new().from_str(touching).unwrap(),
            InstanceLoader::new().from_str(spaced).unwrap()
        );
    }

    #[test]
    fn test_empty_authorisation_line() {
        let text = "#Steps: 2\n#Users: 2\n#Constraints: 1\nAuthorisations u2\n";
        let instance = InstanceLoader::new().from_str(text).unwrap();
        assert_eq!(
            instance.constraints(),
            &[Constraint::Authorisation {
                user: ui(1),
                steps: vec![]
            }]
        );
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        let err = InstanceLoader::new().from_str("#Steps: 2\n#Users: 2\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingHeader {
                expected: "#Constraints"
            }
        ));

        let err = InstanceLoader::new()
            .from_str("#Users: 2\n#Steps: 2\n#Constraints: 0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedHeader {
                line: 1,
                expected: "#Steps",
                ..
            }
        ));

        let err = InstanceLoader::new()
            .from_str("#Steps: 2\n#Users: two\n#Constraints: 0\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeader { line: 2, .. }));
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        let err = InstanceLoader::new()
            .from_str("#Steps: 0\n#Users: 2\n#Constraints: 0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::Instance(InstanceError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_unknown_keyword_reports_line() {
        let text = "#Steps: 2\n#Users: 2\n#Constraints: 1\n\nPrecedence s1 s2\n";
        match InstanceLoader::new().from_str(text).unwrap_err() {
            ParseError::UnknownKeyword {
                line,
                keyword,
                text,
            } => {
                assert_eq!(line, 5);
                assert_eq!(keyword, "Precedence");
                assert_eq!(text, "Precedence s1 s2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_constraint_lines() {
        let bad = [
            "Separation-of-duty s1",
            "Binding-of-duty s1 s2 s3",
            "Separation-of-duty s1 u2",
            "At-most-k two s1 s2",
            "At-most-k 1",
            "One-team s1 s2",
            "One-team (u1)",
            "One-team s1 (u1 u2",
            "One-team s1 () (u1)",
            "One-team s1 (u1 (u2))",
            "One-team s1 (u1) u2",
            "User-capacity u1",
            "User-capacity u1 -1",
            "Authorisations",
            "Authorisations s1 s2",
        ];
        for line in bad {
            let text = format!("#Steps: 3\n#Users: 3\n#Constraints: 1\n{line}\n");
            let err = InstanceLoader::new().from_str(&text).unwrap_err();
            assert!(
                matches!(err, ParseError::MalformedConstraint { line: 4, .. }),
                "`{line}` gave {err:?}"
            );
        }
    }

    #[test]
    fn test_out_of_range_identifiers_are_parse_errors() {
        for line in ["Separation-of-duty s1 s4", "User-capacity u4 1", "Authorisations u1 s0"] {
            let text = format!("#Steps: 3\n#Users: 3\n#Constraints: 1\n{line}\n");
            match InstanceLoader::new().from_str(&text).unwrap_err() {
                ParseError::MalformedConstraint { line: 4, text, .. } => assert_eq!(text, line),
                other => panic!("`{line}` gave {other:?}"),
            }
        }
    }

    #[test]
    fn test_constraint_count_is_strict_by_default() {
        let text = "#Steps: 2\n#Users: 2\n#Constraints: 2\nSeparation-of-duty s1 s2\n";
        assert!(matches!(
            InstanceLoader::new().from_str(text).unwrap_err(),
            ParseError::ConstraintCountMismatch {
                declared: 2,
                found: 1
            }
        ));

        let lenient = InstanceLoader::new()
            .strict_constraint_count(false)
            .from_str(text)
            .unwrap();
        assert_eq!(lenient.constraints().len(), 1);
    }

    #[test]
    fn test_display_round_trips_through_loader() {
        let instance = InstanceLoader::new().from_str(SAMPLE).unwrap();
        let reloaded = InstanceLoader::new()
            .from_str(&instance.to_string())
            .unwrap();
        assert_eq!(instance, reloaded);
    }

    #[test]
    fn test_from_reader_matches_from_str() {
        let a = InstanceLoader::new().from_str(SAMPLE).unwrap();
        let b = InstanceLoader::new()
            .from_reader(std::io::Cursor::new(SAMPLE.as_bytes()))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_path_reports_io_errors() {
        let err = InstanceLoader::new()
            .from_path("/definitely/not/a/real/instance.txt")
            .unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }
}
