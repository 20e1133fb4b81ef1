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

//! # Constraint Compiler
//!
//! `ConstraintCompiler` lowers an `Instance` into a `CpModel`. Every
//! constraint is dispatched on its variant to the encoder of its family;
//! the raw instance text is never looked at again.
//!
//! Compilation runs in three passes:
//!
//! 1. A defensive range check of every step and user reference.
//! 2. Authorisation, resolved once for the whole instance with the
//!    first-wins policy of `Instance::authorisations`.
//! 3. All other constraints in declaration order, followed by the
//!    cross-constraint exclusions between symmetry-reduced one-team
//!    selectors.

use crate::{
    context::CompileContext,
    diagnostics::Diagnostics,
    encoding,
    error::CompileError,
    stats::EncodingStats,
    strategy::StrategyConfig,
};
use wsp_cp::model::{CpModel, IntVar};
use wsp_model::{
    constraint::{Constraint, ConstraintKind},
    instance::Instance,
};

/// Configuration of a `ConstraintCompiler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompilerConfig {
    strategy: StrategyConfig,
    max_table_rows: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::default(),
            max_table_rows: Self::DEFAULT_MAX_TABLE_ROWS,
        }
    }
}

impl CompilerConfig {
    /// The default ceiling on rows of a direct one-team table.
    pub const DEFAULT_MAX_TABLE_ROWS: usize = 1_000_000;

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the ceiling on rows of a direct one-team table.
    #[inline]
    pub fn with_max_table_rows(mut self, max_table_rows: usize) -> Self {
        self.max_table_rows = max_table_rows;
        self
    }

    #[inline]
    pub fn strategy(&self) -> StrategyConfig {
        self.strategy
    }

    #[inline]
    pub fn max_table_rows(&self) -> usize {
        self.max_table_rows
    }
}

/// The frozen result of a compilation.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    model: CpModel,
    step_vars: Vec<IntVar>,
    diagnostics: Diagnostics,
    stats: EncodingStats,
}

impl CompiledModel {
    #[inline]
    pub fn model(&self) -> &CpModel {
        &self.model
    }

    /// Returns the decision variable of every step, in step order.
    #[inline]
    pub fn step_vars(&self) -> &[IntVar] {
        &self.step_vars
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[inline]
    pub fn stats(&self) -> &EncodingStats {
        &self.stats
    }

    #[inline]
    pub fn into_parts(self) -> (CpModel, Vec<IntVar>, Diagnostics, EncodingStats) {
        (self.model, self.step_vars, self.diagnostics, self.stats)
    }
}

/// Lowers instances into constraint models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintCompiler {
    config: CompilerConfig,
}

impl ConstraintCompiler {
    #[inline]
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Creates a compiler with the given strategies and the default table ceiling.
    #[inline]
    pub fn with_strategy(strategy: StrategyConfig) -> Self {
        Self::new(CompilerConfig::default().with_strategy(strategy))
    }

    #[inline]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles `instance` into a model with one variable per step.
    ///
    /// # Errors
    ///
    /// Returns `CompileError` if a constraint references a step or user
    /// outside the instance, or if a direct one-team table would exceed
    /// `CompilerConfig::max_table_rows`.
    pub fn compile(&self, instance: &Instance) -> Result<CompiledModel, CompileError> {
        check_references(instance)?;

        let mut ctx = CompileContext::new(instance, &self.config);
        encoding::authorisation::encode(&mut ctx);

        for (position, constraint) in instance.constraints().iter().enumerate() {
            match constraint {
                // Resolved as a whole above.
                Constraint::Authorisation { .. } => {}
                Constraint::SeparationOfDuty { first, second } => {
                    encoding::duty::encode_separation(&mut ctx, *first, *second);
                }
                Constraint::BindingOfDuty { first, second } => {
                    encoding::duty::encode_binding(&mut ctx, *first, *second);
                }
                Constraint::AtMostK { k, steps } => {
                    encoding::at_most_k::encode(&mut ctx, position, *k, steps);
                }
                Constraint::OneTeam { steps, teams } => {
                    encoding::one_team::encode(&mut ctx, position, steps, teams)?;
                }
                Constraint::UserCapacity { user, capacity } => {
                    encoding::capacity::encode(&mut ctx, position, *user, *capacity);
                }
            }
        }

        encoding::one_team::exclude_disjoint_teams(&mut ctx);

        let (model, step_vars, diagnostics, stats) = ctx.finish();
        for kind in ConstraintKind::ALL {
            tracing::debug!(family = %kind, encoded = stats.encoded(kind), "compiled constraint family");
        }
        tracing::debug!(
            strategy = %self.config.strategy,
            int_vars = model.num_int_vars(),
            bool_vars = model.num_bool_vars(),
            constraints = model.num_constraints(),
            skipped = stats.skipped_trivial,
            "compiled instance"
        );

        Ok(CompiledModel {
            model,
            step_vars,
            diagnostics,
            stats,
        })
    }
}

fn check_references(instance: &Instance) -> Result<(), CompileError> {
    let num_steps = instance.num_steps();
    let num_users = instance.num_users();

    for (constraint, entry) in instance.constraints().iter().enumerate() {
        let (steps, users): (Vec<_>, Vec<_>) = match entry {
            Constraint::Authorisation { user, steps } => (steps.clone(), vec![*user]),
            Constraint::SeparationOfDuty { first, second }
            | Constraint::BindingOfDuty { first, second } => (vec![*first, *second], Vec::new()),
            Constraint::AtMostK { steps, .. } => (steps.clone(), Vec::new()),
            Constraint::OneTeam { steps, teams } => (
                steps.clone(),
                teams
                    .iter()
                    .flat_map(|team| team.members().iter().copied())
                    .collect(),
            ),
            Constraint::UserCapacity { user, .. } => (Vec::new(), vec![*user]),
        };

        if let Some(&step) = steps.iter().find(|s| s.get() >= num_steps) {
            return Err(CompileError::StepOutOfRange {
                constraint,
                step,
                num_steps,
            });
        }
        if let Some(&user) = users.iter().find(|u| u.get() >= num_users) {
            return Err(CompileError::UserOutOfRange {
                constraint,
                user,
                num_users,
            });
        }
    }

    Ok(())
}
