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

//! Mutable state of one compilation.
//!
//! `CompileContext` owns the model under construction and everything the
//! encoders share: the step variables, the caches of reified indicators, the
//! selectors of symmetry-reduced one-team constraints (needed for the
//! cross-constraint pass), the diagnostics and the statistics.
//!
//! Indicators are created on demand and cached, so two encoders asking for
//! "is `s3` assigned to `u2`" receive the same literal and the model carries
//! one reification instead of two.

use crate::{compiler::CompilerConfig, diagnostics::Diagnostics, stats::EncodingStats};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use wsp_cp::model::{CpModel, IntVar, Literal};
use wsp_model::{
    constraint::Team,
    index::{StepIndex, UserIndex},
    instance::Instance,
};

/// The selectors of one symmetry-reduced one-team constraint.
#[derive(Debug, Clone)]
pub struct TeamGroup {
    pub constraint: usize,
    pub steps: FixedBitSet,
    pub teams: Vec<Team>,
    pub selectors: Vec<Literal>,
}

pub struct CompileContext<'a> {
    instance: &'a Instance,
    config: &'a CompilerConfig,
    model: CpModel,
    step_vars: Vec<IntVar>,
    assigned: FxHashMap<(StepIndex, UserIndex), Literal>,
    same_user: FxHashMap<(StepIndex, StepIndex), Literal>,
    team_groups: Vec<TeamGroup>,
    diagnostics: Diagnostics,
    stats: EncodingStats,
}

impl<'a> CompileContext<'a> {
    /// Creates the context and one decision variable per step over `[1, M]`.
    pub fn new(instance: &'a Instance, config: &'a CompilerConfig) -> Self {
        let mut model = CpModel::new();
        let num_users = instance.num_users() as i64;
        let step_vars: Vec<IntVar> = instance
            .steps()
            .map(|step| model.new_int_var(1, num_users, format!("s{}", step.one_based())))
            .collect();
        model.add_decision_vars(step_vars.iter().copied());

        Self {
            instance,
            config,
            model,
            step_vars,
            assigned: FxHashMap::default(),
            same_user: FxHashMap::default(),
            team_groups: Vec::new(),
            diagnostics: Diagnostics::new(),
            stats: EncodingStats::default(),
        }
    }

    #[inline]
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    #[inline]
    pub fn config(&self) -> &'a CompilerConfig {
        self.config
    }

    #[inline]
    pub fn model(&mut self) -> &mut CpModel {
        &mut self.model
    }

    /// Returns the decision variable of `step`.
    #[inline]
    pub fn step_var(&self, step: StepIndex) -> IntVar {
        let index = step.get();
        debug_assert!(
            index < self.step_vars.len(),
            "called `CompileContext::step_var` with step index out of bounds: the len is {} but the index is {}",
            self.step_vars.len(),
            index
        );

        self.step_vars[index]
    }

    /// The value a step variable takes when `user` performs the step.
    #[inline]
    pub fn user_value(user: UserIndex) -> i64 {
        user.one_based() as i64
    }

    /// Returns the cached literal `b <=> (step == user)`, creating it if needed.
    pub fn assigned_indicator(&mut self, step: StepIndex, user: UserIndex) -> Literal {
        if let Some(&literal) = self.assigned.get(&(step, user)) {
            return literal;
        }

        let var = self.step_var(step);
        let value = Self::user_value(user);
        let literal = Literal::from(
            self.model
                .new_bool_var(format!("s{}_is_u{}", step.one_based(), user.one_based())),
        );
        self.model.add_equal_value(var, value).only_enforce_if(literal);
        self.model
            .add_not_equal_value(var, value)
            .only_enforce_if(!literal);

        self.stats.indicators += 1;
        self.assigned.insert((step, user), literal);
        literal
    }

    /// Returns the cached literal `b <=> (first == second)`, creating it if needed.
    /// The pair is unordered.
    pub fn same_user_indicator(&mut self, first: StepIndex, second: StepIndex) -> Literal {
        debug_assert!(
            first != second,
            "called `CompileContext::same_user_indicator` with the same step twice: {}",
            first
        );

        let key = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        if let Some(&literal) = self.same_user.get(&key) {
            return literal;
        }

        let (a, b) = (self.step_var(key.0), self.step_var(key.1));
        let literal = Literal::from(self.model.new_bool_var(format!(
            "s{}_with_s{}",
            key.0.one_based(),
            key.1.one_based()
        )));
        self.model.add_equal(a, b).only_enforce_if(literal);
        self.model.add_not_equal(a, b).only_enforce_if(!literal);

        self.stats.indicators += 1;
        self.same_user.insert(key, literal);
        literal
    }

    #[inline]
    pub fn register_team_group(&mut self, group: TeamGroup) {
        self.team_groups.push(group);
    }

    /// Takes the registered one-team selector groups out of the context.
    #[inline]
    pub fn take_team_groups(&mut self) -> Vec<TeamGroup> {
        std::mem::take(&mut self.team_groups)
    }

    #[inline]
    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    #[inline]
    pub fn stats(&mut self) -> &mut EncodingStats {
        &mut self.stats
    }

    /// Freezes the model.
    pub fn finish(self) -> (CpModel, Vec<IntVar>, Diagnostics, EncodingStats) {
        (self.model, self.step_vars, self.diagnostics, self.stats)
    }
}

/// Removes repeated steps, keeping the first occurrence of each.
pub fn distinct_steps(steps: &[StepIndex]) -> Vec<StepIndex> {
    let mut seen = FixedBitSet::new();
    let mut out = Vec::with_capacity(steps.len());
    for &step in steps {
        seen.grow(step.get() + 1);
        if !seen.put(step.get()) {
            out.push(step);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsp_model::instance::InstanceBuilder;

    fn si(i: usize) -> StepIndex {
        StepIndex::new(i)
    }

    fn ui(i: usize) -> UserIndex {
        UserIndex::new(i)
    }

    #[test]
    fn test_step_vars_range_over_one_based_users() {
        let instance = InstanceBuilder::new(3, 4).build().unwrap();
        let config = CompilerConfig::default();
        let mut ctx = CompileContext::new(&instance, &config);
        let var = ctx.step_var(si(2));
        let domain = ctx.model().int_domain(var);
        assert_eq!((domain.lo(), domain.hi()), (1, 4));
        assert_eq!(CompileContext::user_value(ui(0)), 1);
    }

    #[test]
    fn test_indicators_are_cached() {
        let instance = InstanceBuilder::new(3, 2).build().unwrap();
        let config = CompilerConfig::default();
        let mut ctx = CompileContext::new(&instance, &config);

        let a = ctx.assigned_indicator(si(0), ui(1));
        let b = ctx.assigned_indicator(si(0), ui(1));
        assert_eq!(a, b);
        assert_ne!(a, ctx.assigned_indicator(si(1), ui(1)));

        let p = ctx.same_user_indicator(si(0), si(2));
        let q = ctx.same_user_indicator(si(2), si(0));
        assert_eq!(p, q);
        assert_eq!(ctx.stats().indicators, 3);

        // Two reification constraints per indicator.
        let (model, _, _, _) = ctx.finish();
        assert_eq!(model.num_constraints(), 6);
    }

    #[test]
    fn test_distinct_steps_keeps_first_occurrence() {
        assert_eq!(
            distinct_steps(&[si(2), si(0), si(2), si(1), si(0)]),
            vec![si(2), si(0), si(1)]
        );
    }
}
