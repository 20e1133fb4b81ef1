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

//! # CNF Backend on `varisat`
//!
//! `SatBackend` decides a `CpModel` by lowering it to a CNF formula and
//! handing that to the `varisat` CDCL solver. The search itself is entirely
//! `varisat`'s; this module only owns the encoding.
//!
//! ## Encoding
//!
//! * Every integer variable `x` over `[lo, hi]` becomes one boolean per value
//!   (`x = v`) with an exactly-one constraint. Small groups use the pairwise
//!   at-most-one encoding, larger ones a sequential counter.
//! * Boolean variables map one-to-one onto solver variables.
//! * Enforcement literals `e1 .. en` are appended to every clause of a
//!   constraint as `!e1 .. !en`, so the constraint collapses to `true` as soon
//!   as one of them is false.
//! * Cardinality (`AtMost`) uses the sequential counter of Sinz (2005).
//! * Tables introduce one selector per distinct row; a selected row pins its
//!   variables, and at least one selector must hold.
//!
//! An empty clause is never handed to the solver. It marks the formula as
//! contradictory, and both `solve` and `enumerate` short-circuit on it.
//!
//! ## Enumeration
//!
//! After each solution a blocking clause over the decision variables' value
//! literals is added and the (incremental) solver is called again. Solutions
//! are therefore pairwise distinct on the decision variables regardless of
//! how many auxiliary literals the encoding introduced.

use crate::{
    backend::{Backend, SolutionStream, SolveResponse, SolveStatus, Values},
    error::BackendError,
    model::{CpModel, IntVar, Literal, PostedConstraint, Primitive},
};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver};

/// Groups of at most this many literals use the pairwise at-most-one encoding.
const PAIRWISE_AT_MOST_ONE_LIMIT: usize = 6;

/// A `Backend` built on the `varisat` SAT solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SatBackend;

impl SatBackend {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Backend for SatBackend {
    fn name(&self) -> &str {
        "varisat"
    }

    fn solve(&self, model: &CpModel) -> Result<SolveResponse, BackendError> {
        let cnf = Cnf::lower(model);
        if cnf.contradiction {
            return Ok(SolveResponse::new(SolveStatus::Infeasible, None));
        }

        let mut solver = Solver::new();
        solver.add_formula(&cnf.formula);

        match solver.solve() {
            Ok(true) => {
                let assignment = solver
                    .model()
                    .ok_or_else(|| BackendError::Solver("satisfiable but no model".to_owned()))?;
                let values = cnf.decode(&assignment)?;
                Ok(SolveResponse::new(SolveStatus::Optimal, Some(values)))
            }
            Ok(false) => Ok(SolveResponse::new(SolveStatus::Infeasible, None)),
            Err(e) => Err(BackendError::Solver(e.to_string())),
        }
    }

    fn enumerate<'a>(&'a self, model: &'a CpModel) -> Result<SolutionStream<'a>, BackendError> {
        let cnf = Cnf::lower(model);
        if cnf.contradiction {
            return Ok(Box::new(std::iter::empty()));
        }

        let mut solver = Solver::new();
        solver.add_formula(&cnf.formula);

        Ok(Box::new(SatSolutionStream {
            solver,
            projection: model.decision_vars(),
            cnf,
            done: false,
        }))
    }
}

/// The one-hot encoding of one integer variable.
struct IntEncoding {
    lo: i64,
    lits: Vec<Lit>,
}

impl IntEncoding {
    /// Returns the literal for `x = value`, or `None` if `value` is outside the domain.
    #[inline]
    fn lit(&self, value: i64) -> Option<Lit> {
        if value < self.lo {
            return None;
        }
        usize::try_from(value - self.lo)
            .ok()
            .and_then(|offset| self.lits.get(offset).copied())
    }

    #[inline]
    fn values(&self) -> impl Iterator<Item = (i64, Lit)> + '_ {
        self.lits
            .iter()
            .enumerate()
            .map(|(offset, &lit)| (self.lo + offset as i64, lit))
    }
}

/// A `CpModel` lowered to CNF.
struct Cnf {
    formula: CnfFormula,
    num_vars: usize,
    num_clauses: usize,
    ints: Vec<IntEncoding>,
    bools: Vec<Lit>,
    contradiction: bool,
}

impl Cnf {
    fn lower(model: &CpModel) -> Self {
        let mut cnf = Cnf {
            formula: CnfFormula::new(),
            num_vars: 0,
            num_clauses: 0,
            ints: Vec::with_capacity(model.num_int_vars()),
            bools: Vec::with_capacity(model.num_bool_vars()),
            contradiction: false,
        };

        for index in 0..model.num_int_vars() {
            let domain = model.int_domain(IntVar::new(index));
            let lits: Vec<Lit> = (0..domain.size()).map(|_| cnf.fresh()).collect();
            cnf.clause(&lits, &[]);
            cnf.at_most_one(&lits, &[]);
            cnf.ints.push(IntEncoding {
                lo: domain.lo(),
                lits,
            });
        }

        for _ in 0..model.num_bool_vars() {
            let lit = cnf.fresh();
            cnf.bools.push(lit);
        }

        for constraint in model.constraints() {
            cnf.post(constraint);
        }

        tracing::debug!(
            variables = cnf.num_vars,
            clauses = cnf.num_clauses,
            contradiction = cnf.contradiction,
            "lowered model to CNF"
        );

        cnf
    }

    #[inline]
    fn fresh(&mut self) -> Lit {
        self.num_vars += 1;
        Lit::positive(self.formula.new_var())
    }

    #[inline]
    fn literal(&self, literal: Literal) -> Lit {
        let lit = self.bools[literal.var().get()];
        if literal.is_negated() { !lit } else { lit }
    }

    #[inline]
    fn int(&self, var: IntVar) -> &IntEncoding {
        &self.ints[var.get()]
    }

    /// Adds `lits ∨ suffix`.
    fn clause(&mut self, lits: &[Lit], suffix: &[Lit]) {
        if lits.is_empty() && suffix.is_empty() {
            self.contradiction = true;
            return;
        }
        let clause: SmallVec<[Lit; 8]> = lits.iter().chain(suffix).copied().collect();
        self.formula.add_clause(&clause);
        self.num_clauses += 1;
    }

    fn at_most_one(&mut self, lits: &[Lit], suffix: &[Lit]) {
        if lits.len() <= PAIRWISE_AT_MOST_ONE_LIMIT {
            for i in 0..lits.len() {
                for j in (i + 1)..lits.len() {
                    self.clause(&[!lits[i], !lits[j]], suffix);
                }
            }
        } else {
            self.at_most(lits, 1, suffix);
        }
    }

    /// Sequential counter: `r[i][j]` holds if at least `j + 1` of `lits[..=i]` are true.
    fn at_most(&mut self, lits: &[Lit], bound: usize, suffix: &[Lit]) {
        let n = lits.len();
        if bound >= n {
            return;
        }
        if bound == 0 {
            for &lit in lits {
                self.clause(&[!lit], suffix);
            }
            return;
        }

        let mut r: Vec<Vec<Lit>> = Vec::with_capacity(n - 1);
        for _ in 0..n - 1 {
            let row: Vec<Lit> = (0..bound).map(|_| self.fresh()).collect();
            r.push(row);
        }

        self.clause(&[!lits[0], r[0][0]], suffix);
        for j in 1..bound {
            self.clause(&[!r[0][j]], suffix);
        }
        for i in 1..n - 1 {
            self.clause(&[!lits[i], r[i][0]], suffix);
            self.clause(&[!r[i - 1][0], r[i][0]], suffix);
            for j in 1..bound {
                self.clause(&[!lits[i], !r[i - 1][j - 1], r[i][j]], suffix);
                self.clause(&[!r[i - 1][j], r[i][j]], suffix);
            }
            self.clause(&[!lits[i], !r[i - 1][bound - 1]], suffix);
        }
        self.clause(&[!lits[n - 1], !r[n - 2][bound - 1]], suffix);
    }

    fn post(&mut self, constraint: &PostedConstraint) {
        let suffix: SmallVec<[Lit; 2]> = constraint
            .enforcement()
            .iter()
            .map(|&e| !self.literal(e))
            .collect();

        match constraint.primitive() {
            Primitive::EqualsValue { var, value } => match self.int(*var).lit(*value) {
                Some(lit) => self.clause(&[lit], &suffix),
                None => self.clause(&[], &suffix),
            },
            Primitive::NotEqualsValue { var, value } => {
                if let Some(lit) = self.int(*var).lit(*value) {
                    self.clause(&[!lit], &suffix);
                }
            }
            Primitive::Equal { a, b } => {
                let pairs: Vec<(Lit, Option<Lit>)> = self
                    .int(*a)
                    .values()
                    .map(|(v, la)| (la, self.int(*b).lit(v)))
                    .collect();
                for (la, lb) in pairs {
                    match lb {
                        Some(lb) => self.clause(&[!la, lb], &suffix),
                        None => self.clause(&[!la], &suffix),
                    }
                }
            }
            Primitive::NotEqual { a, b } => {
                let pairs: Vec<(Lit, Lit)> = self
                    .int(*a)
                    .values()
                    .filter_map(|(v, la)| self.int(*b).lit(v).map(|lb| (la, lb)))
                    .collect();
                for (la, lb) in pairs {
                    self.clause(&[!la, !lb], &suffix);
                }
            }
            Primitive::LessThan { a, b } => {
                let clauses: Vec<Vec<Lit>> = self
                    .int(*a)
                    .values()
                    .map(|(va, la)| {
                        std::iter::once(!la)
                            .chain(
                                self.int(*b)
                                    .values()
                                    .filter(|&(vb, _)| vb > va)
                                    .map(|(_, lb)| lb),
                            )
                            .collect()
                    })
                    .collect();
                for clause in clauses {
                    self.clause(&clause, &suffix);
                }
            }
            Primitive::BoolOr { literals } => {
                let lits: Vec<Lit> = literals.iter().map(|&l| self.literal(l)).collect();
                self.clause(&lits, &suffix);
            }
            Primitive::ExactlyOne { literals } => {
                let lits: Vec<Lit> = literals.iter().map(|&l| self.literal(l)).collect();
                self.clause(&lits, &suffix);
                self.at_most_one(&lits, &suffix);
            }
            Primitive::AtMost { literals, bound } => {
                let lits: Vec<Lit> = literals.iter().map(|&l| self.literal(l)).collect();
                self.at_most(&lits, *bound, &suffix);
            }
            Primitive::Table { vars, tuples } => self.table(vars, tuples, &suffix),
        }
    }

    fn table(&mut self, vars: &[IntVar], tuples: &[Vec<i64>], suffix: &[Lit]) {
        let mut seen: FxHashSet<&[i64]> = FxHashSet::default();
        let rows: Vec<Vec<Lit>> = tuples
            .iter()
            .filter(|t| seen.insert(t.as_slice()))
            .filter_map(|t| {
                vars.iter()
                    .zip(t)
                    .map(|(&var, &value)| self.int(var).lit(value))
                    .collect::<Option<Vec<Lit>>>()
            })
            .collect();

        if rows.is_empty() {
            self.clause(&[], suffix);
            return;
        }
        if vars.is_empty() {
            return;
        }
        if vars.len() == 1 {
            let lits: Vec<Lit> = rows.iter().map(|row| row[0]).collect();
            self.clause(&lits, suffix);
            return;
        }

        let mut selectors = Vec::with_capacity(rows.len());
        for row in rows {
            let selector = self.fresh();
            for lit in row {
                self.clause(&[!selector, lit], &[]);
            }
            selectors.push(selector);
        }
        self.clause(&selectors, suffix);
    }

    fn decode(&self, assignment: &[Lit]) -> Result<Values, BackendError> {
        let mut truth = vec![false; self.num_vars];
        for lit in assignment {
            let index = lit.var().index();
            if index < truth.len() {
                truth[index] = lit.is_positive();
            }
        }
        let holds = |lit: Lit| truth[lit.var().index()] == lit.is_positive();

        let ints = self
            .ints
            .iter()
            .enumerate()
            .map(|(index, encoding)| {
                encoding
                    .values()
                    .find(|&(_, lit)| holds(lit))
                    .map(|(value, _)| value)
                    .ok_or_else(|| {
                        BackendError::Model(format!("int var {} has no value in the model", index))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let bools = self.bools.iter().map(|&lit| holds(lit)).collect();

        Ok(Values::new(ints, bools))
    }
}

/// Incremental enumeration with blocking clauses over the projection.
struct SatSolutionStream<'s> {
    solver: Solver<'s>,
    cnf: Cnf,
    projection: Vec<IntVar>,
    done: bool,
}

impl Iterator for SatSolutionStream<'_> {
    type Item = Result<Values, BackendError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.solver.solve() {
            Ok(true) => {
                let values = self
                    .solver
                    .model()
                    .ok_or_else(|| BackendError::Solver("satisfiable but no model".to_owned()))
                    .and_then(|assignment| self.cnf.decode(&assignment));
                let values = match values {
                    Ok(values) => values,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                };

                let blocking: Vec<Lit> = self
                    .projection
                    .iter()
                    .filter_map(|&var| self.cnf.int(var).lit(values.value(var)))
                    .map(|lit| !lit)
                    .collect();
                if blocking.is_empty() {
                    self.done = true;
                } else {
                    self.solver.add_clause(&blocking);
                }

                tracing::trace!("enumerated a solution");
                Some(Ok(values))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(BackendError::Solver(e.to_string())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_solutions(model: &CpModel) -> Vec<Values> {
        SatBackend::new()
            .enumerate(model)
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    /// An int var over `[0, 1]` together with a literal equivalent to `x == 1`.
    fn flag(model: &mut CpModel, name: &str) -> (IntVar, Literal) {
        let x = model.new_int_var(0, 1, name);
        let b = Literal::from(model.new_bool_var(format!("{name}_set")));
        model.add_equal_value(x, 1).only_enforce_if(b);
        model.add_not_equal_value(x, 1).only_enforce_if(!b);
        (x, b)
    }

    #[test]
    fn test_not_equal_has_two_solutions() {
        let mut model = CpModel::new();
        let x = model.new_int_var(1, 2, "x");
        let y = model.new_int_var(1, 2, "y");
        model.add_not_equal(x, y);

        let solutions = all_solutions(&model);
        assert_eq!(solutions.len(), 2);
        for s in &solutions {
            assert_ne!(s.value(x), s.value(y));
        }
    }

    #[test]
    fn test_solve_reports_infeasible() {
        let mut model = CpModel::new();
        let x = model.new_int_var(1, 1, "x");
        let y = model.new_int_var(1, 1, "y");
        model.add_not_equal(x, y);

        let response = SatBackend::new().solve(&model).unwrap();
        assert_eq!(response.status(), SolveStatus::Infeasible);
        assert!(response.values().is_none());
    }

    #[test]
    fn test_solve_returns_values() {
        let mut model = CpModel::new();
        let x = model.new_int_var(1, 3, "x");
        let y = model.new_int_var(1, 3, "y");
        model.add_equal(x, y);
        model.add_equal_value(y, 3);

        let response = SatBackend::new().solve(&model).unwrap();
        assert_eq!(response.status(), SolveStatus::Optimal);
        let values = response.values().unwrap();
        assert_eq!(values.value(x), 3);
        assert_eq!(values.value(y), 3);
    }

    #[test]
    fn test_reified_indicator() {
        let mut model = CpModel::new();
        let x = model.new_int_var(1, 3, "x");
        let b = Literal::from(model.new_bool_var("b"));
        model.add_equal_value(x, 2).only_enforce_if(b);
        model.add_not_equal_value(x, 2).only_enforce_if(!b);
        model.add_bool_or([b]);

        let solutions = all_solutions(&model);
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].value(x), 2);
        assert!(solutions[0].literal_value(b));
    }

    #[test]
    fn test_less_than_chain_is_unique() {
        let mut model = CpModel::new();
        let vars: Vec<IntVar> = (0..3)
            .map(|i| model.new_int_var(1, 3, format!("x{i}")))
            .collect();
        model.add_less_than(vars[0], vars[1]);
        model.add_less_than(vars[1], vars[2]);

        let solutions = all_solutions(&model);
        assert_eq!(solutions.len(), 1);
        let values: Vec<i64> = vars.iter().map(|&v| solutions[0].value(v)).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_at_most_counts_subsets() {
        let mut model = CpModel::new();
        let lits: Vec<Literal> = (0..4).map(|i| flag(&mut model, &format!("f{i}")).1).collect();
        model.add_at_most(lits.clone(), 2);

        // C(4,0) + C(4,1) + C(4,2)
        let solutions = all_solutions(&model);
        assert_eq!(solutions.len(), 11);
        for s in &solutions {
            assert!(lits.iter().filter(|&&l| s.literal_value(l)).count() <= 2);
        }
    }

    #[test]
    fn test_at_most_zero_forces_all_false() {
        let mut model = CpModel::new();
        let (x, b) = flag(&mut model, "f");
        model.add_at_most([b], 0);

        let solutions = all_solutions(&model);
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].value(x), 0);
    }

    #[test]
    fn test_large_domain_uses_sequential_at_most_one() {
        let mut model = CpModel::new();
        let x = model.new_int_var(1, 10, "x");

        let mut values: Vec<i64> = all_solutions(&model).iter().map(|s| s.value(x)).collect();
        values.sort_unstable();
        assert_eq!(values, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_exactly_one_over_flags() {
        let mut model = CpModel::new();
        let lits: Vec<Literal> = (0..8).map(|i| flag(&mut model, &format!("f{i}")).1).collect();
        model.add_exactly_one(lits);

        assert_eq!(all_solutions(&model).len(), 8);
    }

    #[test]
    fn test_table_deduplicates_rows() {
        let mut model = CpModel::new();
        let x = model.new_int_var(1, 3, "x");
        let y = model.new_int_var(1, 3, "y");
        model.add_allowed_assignments(vec![x, y], vec![vec![1, 2], vec![2, 1], vec![1, 2], vec![9, 9]]);

        let mut pairs: Vec<(i64, i64)> = all_solutions(&model)
            .iter()
            .map(|s| (s.value(x), s.value(y)))
            .collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn test_enforced_table_can_be_switched_off() {
        let mut model = CpModel::new();
        let x = model.new_int_var(1, 2, "x");
        let b = Literal::from(model.new_bool_var("b"));
        model.add_allowed_assignments(vec![x], vec![vec![1]]).only_enforce_if(b);
        model.add_bool_or([!b]);

        assert_eq!(all_solutions(&model).len(), 2);
    }

    #[test]
    fn test_empty_disjunction_is_a_contradiction() {
        let mut model = CpModel::new();
        model.new_int_var(1, 2, "x");
        model.add_bool_or(Vec::<Literal>::new());

        let response = SatBackend::new().solve(&model).unwrap();
        assert_eq!(response.status(), SolveStatus::Infeasible);
        assert_eq!(all_solutions(&model).len(), 0);
    }

    #[test]
    fn test_enforced_empty_disjunction_forces_enforcement_false() {
        let mut model = CpModel::new();
        let (x, b) = flag(&mut model, "f");
        model
            .add_bool_or(Vec::<Literal>::new())
            .only_enforce_if(b);

        let solutions = all_solutions(&model);
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].value(x), 0);
    }

    #[test]
    fn test_projection_hides_auxiliary_variables() {
        let mut model = CpModel::new();
        let x = model.new_int_var(1, 2, "x");
        let _aux = model.new_int_var(1, 3, "aux");
        model.add_decision_vars([x]);

        assert_eq!(all_solutions(&model).len(), 2);
    }

    #[test]
    fn test_stream_is_lazy() {
        let mut model = CpModel::new();
        for i in 0..6 {
            model.new_int_var(1, 4, format!("x{i}"));
        }

        let backend = SatBackend::new();
        let first_three: Vec<_> = backend.enumerate(&model).unwrap().take(3).collect();
        assert_eq!(first_three.len(), 3);
        assert!(first_three.iter().all(|r| r.is_ok()));
    }
}
