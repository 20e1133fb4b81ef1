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

//! All steps of a set performed by members of one team.
//!
//! The direct encoding materialises the allowed tuples: for every team the
//! `|T|^n` tuples over its members, deduplicated across teams. The team
//! choice stays implicit in the table.
//!
//! The symmetry-reduced encoding introduces one selector per team, exactly
//! one of which holds. A selected team forces every step onto one of its
//! members. When two one-team constraints share a step, selectors of
//! disjoint teams are made mutually exclusive across the two constraints
//! by `exclude_disjoint_teams`, which runs after all constraints are posted.

use crate::{
    context::{CompileContext, TeamGroup, distinct_steps},
    error::CompileError,
    strategy::EncodingStrategy,
};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashSet;
use wsp_core::utils::combinatorics::CartesianPower;
use wsp_cp::model::{IntVar, Literal};
use wsp_model::{
    constraint::{ConstraintKind, Team},
    index::StepIndex,
};

pub fn encode(
    ctx: &mut CompileContext<'_>,
    position: usize,
    steps: &[StepIndex],
    teams: &[Team],
) -> Result<(), CompileError> {
    let steps = distinct_steps(steps);
    match ctx.config().strategy().one_team() {
        EncodingStrategy::Direct => encode_direct(ctx, position, &steps, teams)?,
        EncodingStrategy::SymmetryReduced => encode_symmetry_reduced(ctx, position, &steps, teams),
    }
    ctx.stats().record(ConstraintKind::OneTeam);
    Ok(())
}

/// Returns `sum |T|^n` over `teams`, or `None` on overflow.
fn table_rows(teams: &[Team], n: usize) -> Option<u128> {
    let exponent = u32::try_from(n).ok()?;
    teams.iter().try_fold(0u128, |acc, team| {
        acc.checked_add((team.len() as u128).checked_pow(exponent)?)
    })
}

fn encode_direct(
    ctx: &mut CompileContext<'_>,
    position: usize,
    steps: &[StepIndex],
    teams: &[Team],
) -> Result<(), CompileError> {
    let limit = ctx.config().max_table_rows();
    let rows = table_rows(teams, steps.len());
    if rows.is_none_or(|r| r > limit as u128) {
        return Err(CompileError::TableTooLarge {
            constraint: position,
            rows,
            limit,
        });
    }

    let mut seen: FxHashSet<Vec<i64>> = FxHashSet::default();
    let mut tuples: Vec<Vec<i64>> = Vec::new();
    for team in teams {
        let members: Vec<i64> = team
            .members()
            .iter()
            .map(|&user| CompileContext::user_value(user))
            .collect();
        for digits in CartesianPower::new(members.len(), steps.len()) {
            let tuple: Vec<i64> = digits.into_iter().map(|d| members[d]).collect();
            if seen.insert(tuple.clone()) {
                tuples.push(tuple);
            }
        }
    }

    let vars: Vec<IntVar> = steps.iter().map(|&step| ctx.step_var(step)).collect();
    ctx.stats().table_rows += tuples.len();
    ctx.model().add_allowed_assignments(vars, tuples);
    Ok(())
}

fn encode_symmetry_reduced(
    ctx: &mut CompileContext<'_>,
    position: usize,
    steps: &[StepIndex],
    teams: &[Team],
) {
    let selectors: Vec<Literal> = (0..teams.len())
        .map(|t| {
            Literal::from(
                ctx.model()
                    .new_bool_var(format!("c{}_team{}", position + 1, t + 1)),
            )
        })
        .collect();
    ctx.model().add_exactly_one(selectors.iter().copied());
    ctx.stats().selectors += selectors.len();

    for (team, &selector) in teams.iter().zip(&selectors) {
        for &step in steps {
            let members: Vec<Literal> = team
                .members()
                .iter()
                .map(|&user| ctx.assigned_indicator(step, user))
                .collect();
            ctx.model().add_bool_or(members).only_enforce_if(selector);
        }
    }

    let mut step_set = FixedBitSet::with_capacity(ctx.instance().num_steps());
    for step in steps {
        step_set.insert(step.get());
    }
    ctx.register_team_group(TeamGroup {
        constraint: position,
        steps: step_set,
        teams: teams.to_vec(),
        selectors,
    });
}

fn teams_disjoint(a: &Team, b: &Team) -> bool {
    a.members().iter().all(|&user| !b.contains(user))
}

/// Forbids selecting two disjoint teams of one-team constraints that share a step.
pub fn exclude_disjoint_teams(ctx: &mut CompileContext<'_>) {
    let groups = ctx.take_team_groups();
    for (i, first) in groups.iter().enumerate() {
        for second in &groups[i + 1..] {
            if first.steps.is_disjoint(&second.steps) {
                continue;
            }

            let mut posted = 0;
            for (team_a, &sel_a) in first.teams.iter().zip(&first.selectors) {
                for (team_b, &sel_b) in second.teams.iter().zip(&second.selectors) {
                    if teams_disjoint(team_a, team_b) {
                        ctx.model().add_bool_or([!sel_a, !sel_b]);
                        posted += 1;
                    }
                }
            }
            tracing::trace!(
                first = first.constraint,
                second = second.constraint,
                exclusions = posted,
                "linked overlapping one-team constraints"
            );
            ctx.stats().team_exclusions += posted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiler::{CompiledModel, ConstraintCompiler},
        strategy::StrategyConfig,
    };
    use wsp_cp::{backend::Backend, sat::SatBackend};
    use wsp_model::{
        index::UserIndex,
        instance::{Instance, InstanceBuilder},
    };

    fn si(i: usize) -> StepIndex {
        StepIndex::new(i)
    }

    fn team(users: &[usize]) -> Team {
        Team::new(users.iter().map(|&u| UserIndex::new(u)))
    }

    fn compile(instance: &Instance, strategy: StrategyConfig) -> CompiledModel {
        ConstraintCompiler::with_strategy(strategy)
            .compile(instance)
            .unwrap()
    }

    fn solutions(compiled: &CompiledModel) -> Vec<Vec<i64>> {
        let mut out: Vec<Vec<i64>> = SatBackend::new()
            .enumerate(compiled.model())
            .unwrap()
            .map(|v| {
                let v = v.unwrap();
                compiled.step_vars().iter().map(|&x| v.value(x)).collect()
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_table_rows_counts_and_overflows() {
        let teams = [team(&[0, 1]), team(&[2, 3, 4])];
        assert_eq!(table_rows(&teams, 3), Some(8 + 27));
        assert_eq!(table_rows(&teams, 0), Some(2));
        assert_eq!(table_rows(&teams, 200), None);
    }

    #[test]
    fn test_teams_disjoint() {
        assert!(teams_disjoint(&team(&[0, 1]), &team(&[2, 3])));
        assert!(!teams_disjoint(&team(&[0, 1]), &team(&[1, 3])));
    }

    #[test]
    fn test_two_disjoint_teams() {
        let mut builder = InstanceBuilder::new(2, 4);
        builder.add_one_team([si(0), si(1)], [team(&[0, 1]), team(&[2, 3])]);
        let instance = builder.build().unwrap();

        let expected = vec![
            vec![1, 1],
            vec![1, 2],
            vec![2, 1],
            vec![2, 2],
            vec![3, 3],
            vec![3, 4],
            vec![4, 3],
            vec![4, 4],
        ];
        for strategy in [StrategyConfig::direct(), StrategyConfig::symmetry_reduced()] {
            assert_eq!(solutions(&compile(&instance, strategy)), expected);
        }
    }

    #[test]
    fn test_direct_table_is_deduplicated() {
        let mut builder = InstanceBuilder::new(2, 3);
        builder.add_one_team([si(0), si(1)], [team(&[0, 1]), team(&[1, 2])]);
        let instance = builder.build().unwrap();

        let compiled = compile(&instance, StrategyConfig::direct());
        // (u2, u2) is drawn from both teams.
        assert_eq!(compiled.stats().table_rows, 7);
        assert_eq!(compiled.stats().selectors, 0);
        assert_eq!(solutions(&compiled).len(), 7);
    }

    #[test]
    fn test_symmetry_creates_selectors() {
        let mut builder = InstanceBuilder::new(2, 3);
        builder.add_one_team([si(0), si(1)], [team(&[0, 1]), team(&[1, 2])]);
        let instance = builder.build().unwrap();

        let compiled = compile(&instance, StrategyConfig::symmetry_reduced());
        assert_eq!(compiled.stats().selectors, 2);
        assert_eq!(compiled.stats().table_rows, 0);
        assert_eq!(solutions(&compiled).len(), 7);
    }

    #[test]
    fn test_overlapping_constraints_agree_across_strategies() {
        let mut builder = InstanceBuilder::new(3, 4);
        builder
            .add_one_team([si(0), si(1)], [team(&[0, 1]), team(&[2, 3])])
            .add_one_team([si(1), si(2)], [team(&[0, 2]), team(&[1, 3])]);
        let instance = builder.build().unwrap();

        let direct = compile(&instance, StrategyConfig::direct());
        let symmetry = compile(&instance, StrategyConfig::symmetry_reduced());
        assert_eq!(solutions(&direct), solutions(&symmetry));
        assert!(!solutions(&direct).is_empty());

        // Every pair of teams across the two constraints overlaps.
        assert_eq!(symmetry.stats().team_exclusions, 0);
        assert_eq!(direct.stats().team_exclusions, 0);
    }

    #[test]
    fn test_disjoint_teams_of_overlapping_constraints_are_excluded() {
        let mut builder = InstanceBuilder::new(3, 4);
        builder
            .add_one_team([si(0), si(1)], [team(&[0, 1]), team(&[2, 3])])
            .add_one_team([si(1), si(2)], [team(&[0, 1]), team(&[2])]);
        let instance = builder.build().unwrap();

        let symmetry = compile(&instance, StrategyConfig::symmetry_reduced());
        // {u1,u2} x {u3} and {u3,u4} x {u1,u2}.
        assert_eq!(symmetry.stats().team_exclusions, 2);

        let direct = compile(&instance, StrategyConfig::direct());
        assert_eq!(solutions(&direct), solutions(&symmetry));
    }

    #[test]
    fn test_non_overlapping_constraints_are_not_linked() {
        let mut builder = InstanceBuilder::new(4, 4);
        builder
            .add_one_team([si(0), si(1)], [team(&[0, 1]), team(&[2, 3])])
            .add_one_team([si(2), si(3)], [team(&[0, 1]), team(&[2, 3])]);
        let instance = builder.build().unwrap();

        let compiled = compile(&instance, StrategyConfig::symmetry_reduced());
        assert_eq!(compiled.stats().team_exclusions, 0);
        assert_eq!(solutions(&compiled).len(), 8 * 8);
    }
}
