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

//! # Constraint Model
//!
//! `CpModel` is a write-once container of variables and primitive
//! constraints. Integer variables have a closed domain `[lo, hi]`; boolean
//! variables are referenced through `Literal`s, which can be negated with
//! `!`.
//!
//! Every posted constraint returns a `ConstraintHandle`. Calling
//! `only_enforce_if` on it attaches an enforcement literal: the constraint
//! must then hold only when all of its enforcement literals are true. This is
//! how reified indicators (`b <=> x == v`) are expressed:
//!
//! ```rust
//! use wsp_cp::model::{CpModel, Literal};
//!
//! let mut model = CpModel::new();
//! let x = model.new_int_var(1, 3, "x");
//! let b = Literal::from(model.new_bool_var("x_is_2"));
//! model.add_equal_value(x, 2).only_enforce_if(b);
//! model.add_not_equal_value(x, 2).only_enforce_if(!b);
//! assert_eq!(model.num_constraints(), 2);
//! ```
//!
//! ## Decision variables
//!
//! Enumeration distinguishes solutions by the values of the decision
//! variables only. By default every integer variable is a decision variable;
//! `add_decision_vars` narrows this to an explicit projection so auxiliary
//! variables never produce duplicate solutions.

use smallvec::SmallVec;
use wsp_core::utils::index::{TypedIndex, TypedIndexTag};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct IntVarTag;

impl TypedIndexTag for IntVarTag {
    const NAME: &'static str = "IntVar";
}

/// A handle to a bounded integer variable of a `CpModel`.
pub type IntVar = TypedIndex<IntVarTag>;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BoolVarTag;

impl TypedIndexTag for BoolVarTag {
    const NAME: &'static str = "BoolVar";
}

/// A handle to a boolean variable of a `CpModel`.
pub type BoolVar = TypedIndex<BoolVarTag>;

/// A boolean variable or its negation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    var: BoolVar,
    negated: bool,
}

impl Literal {
    #[inline]
    pub const fn positive(var: BoolVar) -> Self {
        Self {
            var,
            negated: false,
        }
    }

    #[inline]
    pub const fn negative(var: BoolVar) -> Self {
        Self { var, negated: true }
    }

    #[inline]
    pub const fn var(&self) -> BoolVar {
        self.var
    }

    #[inline]
    pub const fn is_negated(&self) -> bool {
        self.negated
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    #[inline]
    fn not(self) -> Self::Output {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }
}

impl From<BoolVar> for Literal {
    #[inline]
    fn from(var: BoolVar) -> Self {
        Literal::positive(var)
    }
}

impl std::fmt::Debug for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "!b{}", self.var.get())
        } else {
            write!(f, "b{}", self.var.get())
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A closed integer interval `[lo, hi]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IntDomain {
    lo: i64,
    hi: i64,
}

impl IntDomain {
    /// Creates the domain `[lo, hi]`.
    ///
    /// # Panics
    ///
    /// Panics if `lo > hi`.
    #[inline]
    pub fn new(lo: i64, hi: i64) -> Self {
        assert!(
            lo <= hi,
            "called `IntDomain::new` with an empty interval: lo is {} but hi is {}",
            lo,
            hi
        );
        Self { lo, hi }
    }

    #[inline]
    pub fn lo(&self) -> i64 {
        self.lo
    }

    #[inline]
    pub fn hi(&self) -> i64 {
        self.hi
    }

    /// Returns the number of values in the domain.
    #[inline]
    pub fn size(&self) -> usize {
        (self.hi - self.lo) as usize + 1
    }

    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        self.lo <= value && value <= self.hi
    }

    #[inline]
    pub fn values(&self) -> std::ops::RangeInclusive<i64> {
        self.lo..=self.hi
    }
}

impl std::fmt::Display for IntDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// The primitive constraints a backend has to understand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    /// `var == value`
    EqualsValue { var: IntVar, value: i64 },
    /// `var != value`
    NotEqualsValue { var: IntVar, value: i64 },
    /// `a == b`
    Equal { a: IntVar, b: IntVar },
    /// `a != b`
    NotEqual { a: IntVar, b: IntVar },
    /// `a < b`
    LessThan { a: IntVar, b: IntVar },
    /// At least one literal is true. An empty disjunction is false.
    BoolOr { literals: Vec<Literal> },
    /// Exactly one literal is true.
    ExactlyOne { literals: Vec<Literal> },
    /// At most `bound` literals are true.
    AtMost { literals: Vec<Literal>, bound: usize },
    /// The tuple of values of `vars` is one of `tuples`.
    Table {
        vars: Vec<IntVar>,
        tuples: Vec<Vec<i64>>,
    },
}

/// A primitive together with the literals that must all hold for it to apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostedConstraint {
    primitive: Primitive,
    enforcement: SmallVec<[Literal; 2]>,
}

impl PostedConstraint {
    #[inline]
    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    /// Returns the enforcement literals. Empty means the constraint always holds.
    #[inline]
    pub fn enforcement(&self) -> &[Literal] {
        &self.enforcement
    }
}

/// A handle to a freshly posted constraint.
pub struct ConstraintHandle<'a> {
    constraint: &'a mut PostedConstraint,
}

impl ConstraintHandle<'_> {
    /// Makes the constraint conditional on `literal`. Repeated calls build a
    /// conjunction.
    #[inline]
    pub fn only_enforce_if<L: Into<Literal>>(self, literal: L) -> Self {
        self.constraint.enforcement.push(literal.into());
        self
    }
}

/// A write-once constraint model.
#[derive(Clone, Debug, Default)]
pub struct CpModel {
    int_domains: Vec<IntDomain>,
    int_names: Vec<String>,
    bool_names: Vec<String>,
    constraints: Vec<PostedConstraint>,
    decision_vars: Vec<IntVar>,
}

impl CpModel {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an integer variable ranging over `[lo, hi]`.
    pub fn new_int_var<S: Into<String>>(&mut self, lo: i64, hi: i64, name: S) -> IntVar {
        let var = IntVar::new(self.int_domains.len());
        self.int_domains.push(IntDomain::new(lo, hi));
        self.int_names.push(name.into());
        var
    }

    /// Creates a boolean variable.
    pub fn new_bool_var<S: Into<String>>(&mut self, name: S) -> BoolVar {
        let var = BoolVar::new(self.bool_names.len());
        self.bool_names.push(name.into());
        var
    }

    #[inline]
    pub fn num_int_vars(&self) -> usize {
        self.int_domains.len()
    }

    #[inline]
    pub fn num_bool_vars(&self) -> usize {
        self.bool_names.len()
    }

    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    #[inline]
    pub fn constraints(&self) -> &[PostedConstraint] {
        &self.constraints
    }

    #[inline]
    pub fn int_domain(&self, var: IntVar) -> IntDomain {
        let index = var.get();
        debug_assert!(
            index < self.num_int_vars(),
            "called `CpModel::int_domain` with int var out of bounds: the len is {} but the index is {}",
            self.num_int_vars(),
            index
        );

        self.int_domains[index]
    }

    #[inline]
    pub fn int_var_name(&self, var: IntVar) -> &str {
        &self.int_names[var.get()]
    }

    #[inline]
    pub fn bool_var_name(&self, var: BoolVar) -> &str {
        &self.bool_names[var.get()]
    }

    /// Restricts the projection used to tell enumerated solutions apart.
    pub fn add_decision_vars<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = IntVar>,
    {
        self.decision_vars.extend(vars);
    }

    /// Returns the decision variables, or every integer variable if none were
    /// declared explicitly.
    pub fn decision_vars(&self) -> Vec<IntVar> {
        if self.decision_vars.is_empty() {
            (0..self.num_int_vars()).map(IntVar::new).collect()
        } else {
            self.decision_vars.clone()
        }
    }

    pub fn add_equal_value(&mut self, var: IntVar, value: i64) -> ConstraintHandle<'_> {
        self.post(Primitive::EqualsValue { var, value })
    }

    pub fn add_not_equal_value(&mut self, var: IntVar, value: i64) -> ConstraintHandle<'_> {
        self.post(Primitive::NotEqualsValue { var, value })
    }

    pub fn add_equal(&mut self, a: IntVar, b: IntVar) -> ConstraintHandle<'_> {
        self.post(Primitive::Equal { a, b })
    }

    pub fn add_not_equal(&mut self, a: IntVar, b: IntVar) -> ConstraintHandle<'_> {
        self.post(Primitive::NotEqual { a, b })
    }

    pub fn add_less_than(&mut self, a: IntVar, b: IntVar) -> ConstraintHandle<'_> {
        self.post(Primitive::LessThan { a, b })
    }

    pub fn add_bool_or<I>(&mut self, literals: I) -> ConstraintHandle<'_>
    where
        I: IntoIterator<Item = Literal>,
    {
        self.post(Primitive::BoolOr {
            literals: literals.into_iter().collect(),
        })
    }

    pub fn add_exactly_one<I>(&mut self, literals: I) -> ConstraintHandle<'_>
    where
        I: IntoIterator<Item = Literal>,
    {
        self.post(Primitive::ExactlyOne {
            literals: literals.into_iter().collect(),
        })
    }

    /// Posts `sum(literals) <= bound`.
    pub fn add_at_most<I>(&mut self, literals: I, bound: usize) -> ConstraintHandle<'_>
    where
        I: IntoIterator<Item = Literal>,
    {
        self.post(Primitive::AtMost {
            literals: literals.into_iter().collect(),
            bound,
        })
    }

    /// Posts an allowed-assignment table over `vars`.
    pub fn add_allowed_assignments(
        &mut self,
        vars: Vec<IntVar>,
        tuples: Vec<Vec<i64>>,
    ) -> ConstraintHandle<'_> {
        debug_assert!(
            tuples.iter().all(|t| t.len() == vars.len()),
            "called `CpModel::add_allowed_assignments` with a tuple whose arity differs from the {} variables",
            vars.len()
        );

        self.post(Primitive::Table { vars, tuples })
    }

    fn post(&mut self, primitive: Primitive) -> ConstraintHandle<'_> {
        self.constraints.push(PostedConstraint {
            primitive,
            enforcement: SmallVec::new(),
        });
        let last = self.constraints.len() - 1;
        ConstraintHandle {
            constraint: &mut self.constraints[last],
        }
    }
}

impl std::fmt::Display for CpModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CpModel({} int vars, {} bool vars, {} constraints)",
            self.num_int_vars(),
            self.num_bool_vars(),
            self.num_constraints()
        )
    }
}
