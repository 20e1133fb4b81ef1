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

use std::{
    thread,
    time::{Duration, Instant},
};
use wsp_compiler::strategy::StrategyConfig;
use wsp_cp::{
    backend::{Backend, SolutionStream, SolveResponse},
    error::BackendError,
    model::CpModel,
};
use wsp_model::{
    constraint::Team,
    index::{StepIndex, UserIndex},
    instance::{Instance, InstanceBuilder},
    loading::InstanceLoader,
    solution::Solution,
    validation::validate,
};
use wsp_solver::{
    outcome::{SatStatus, TerminationReason},
    solver::SolverBuilder,
};

const STRATEGIES: [StrategyConfig; 2] = [StrategyConfig::direct(), StrategyConfig::symmetry_reduced()];

fn si(i: usize) -> StepIndex {
    StepIndex::new(i)
}

fn ui(i: usize) -> UserIndex {
    UserIndex::new(i)
}

fn sol(users: &[usize]) -> Solution {
    Solution::new(users.iter().map(|&u| ui(u)).collect())
}

fn enumerate(instance: &Instance, strategy: StrategyConfig, limit: u64) -> Vec<Solution> {
    let solver = SolverBuilder::new()
        .with_strategy(strategy)
        .with_solution_limit(limit)
        .build();
    let outcome = solver.solve(instance).unwrap();
    for solution in outcome.all_solutions() {
        let report = validate(instance, solution);
        assert!(report.is_valid(), "invalid solution {}: {}", solution, report);
    }
    let mut solutions = outcome.all_solutions().as_slice().to_vec();
    solutions.sort_by(|a, b| a.users().cmp(b.users()));
    solutions
}

#[test]
fn test_scenario_a_separation_of_two() {
    let instance = InstanceLoader::new()
        .from_str("#Steps: 2\n#Users: 2\n#Constraints: 1\nSeparation-of-duty s1 s2\n")
        .unwrap();
    for strategy in STRATEGIES {
        assert_eq!(
            enumerate(&instance, strategy, 10),
            vec![sol(&[0, 1]), sol(&[1, 0])]
        );
    }
}

#[test]
fn test_scenario_b_single_user_is_unsat() {
    let instance = InstanceLoader::new()
        .from_str("#Steps: 2\n#Users: 1\n#Constraints: 1\nSeparation-of-duty s1 s2\n")
        .unwrap();
    for strategy in STRATEGIES {
        let solver = SolverBuilder::new().with_strategy(strategy).build();
        let outcome = solver.solve(&instance).unwrap();
        assert_eq!(outcome.status(), SatStatus::Unsat);
        assert!(outcome.primary_solution().is_none());
        assert!(outcome.to_string().starts_with("unsat\n"));
    }
}

#[test]
fn test_scenario_c_one_user_for_three_steps() {
    let instance = InstanceLoader::new()
        .from_str("#Steps: 3\n#Users: 3\n#Constraints: 1\nAt-most-k 1 s1 s2 s3\n")
        .unwrap();
    for strategy in STRATEGIES {
        assert_eq!(
            enumerate(&instance, strategy, 100),
            vec![sol(&[0, 0, 0]), sol(&[1, 1, 1]), sol(&[2, 2, 2])]
        );
    }
}

#[test]
fn test_scenario_d_one_team() {
    let instance = InstanceLoader::new()
        .from_str("#Steps: 2\n#Users: 4\n#Constraints: 1\nOne-team s1 s2 (u1 u2) (u3 u4)\n")
        .unwrap();
    for strategy in STRATEGIES {
        let solutions = enumerate(&instance, strategy, 100);
        assert_eq!(solutions.len(), 8);
        for solution in &solutions {
            let both_low = solution.users().iter().all(|u| u.get() < 2);
            let both_high = solution.users().iter().all(|u| u.get() >= 2);
            assert!(both_low || both_high, "mixed teams in {}", solution);
        }
        assert!(!solutions.contains(&sol(&[0, 2])));
    }
    assert!(!validate(&instance, &sol(&[0, 2])).is_valid());
}

#[test]
fn test_zero_bound_is_unsat_for_both_strategies() {
    let mut builder = InstanceBuilder::new(2, 3);
    builder.add_at_most_k(0, [si(0), si(1)]);
    let instance = builder.build().unwrap();
    for strategy in STRATEGIES {
        let solver = SolverBuilder::new()
            .with_strategy(strategy)
            .with_solution_limit(5)
            .build();
        assert_eq!(solver.solve(&instance).unwrap().status(), SatStatus::Unsat);
    }
}

#[test]
fn test_overlapping_one_team_constraints_agree() {
    let mut builder = InstanceBuilder::new(4, 5);
    builder
        .add_one_team(
            [si(0), si(1), si(2)],
            [
                Team::new([ui(0), ui(1)]),
                Team::new([ui(2), ui(3)]),
                Team::new([ui(4)]),
            ],
        )
        .add_one_team(
            [si(2), si(3)],
            [Team::new([ui(1), ui(2)]), Team::new([ui(3), ui(4)])],
        )
        .add_separation_of_duty(si(0), si(1));
    let instance = builder.build().unwrap();

    let direct = enumerate(&instance, StrategyConfig::direct(), 10_000);
    let symmetry = enumerate(&instance, StrategyConfig::symmetry_reduced(), 10_000);
    assert!(!direct.is_empty());
    assert_eq!(direct, symmetry);
}

#[test]
fn test_limit_bounds_the_solution_count() {
    let instance = InstanceBuilder::new(3, 3).build().unwrap();
    for strategy in STRATEGIES {
        let solutions = enumerate(&instance, strategy, 4);
        assert_eq!(solutions.len(), 4);
        let mut distinct = solutions.clone();
        distinct.dedup();
        assert_eq!(distinct.len(), 4);
    }
}

struct SleepingBackend(Duration);

impl Backend for SleepingBackend {
    fn name(&self) -> &str {
        "sleeping"
    }

    fn solve(&self, _model: &CpModel) -> Result<SolveResponse, BackendError> {
        thread::sleep(self.0);
        Err(BackendError::Solver("woke up too late".to_string()))
    }

    fn enumerate<'a>(&'a self, model: &'a CpModel) -> Result<SolutionStream<'a>, BackendError> {
        self.solve(model)?;
        Ok(Box::new(std::iter::empty()))
    }
}

#[test]
fn test_timeout_is_unknown_without_solutions() {
    let instance = InstanceLoader::new()
        .from_str("#Steps: 2\n#Users: 2\n#Constraints: 1\nSeparation-of-duty s1 s2\n")
        .unwrap();
    let solver = SolverBuilder::new()
        .with_backend(SleepingBackend(Duration::from_secs(5)))
        .with_time_limit(Duration::from_millis(50))
        .build();

    let start = Instant::now();
    let outcome = solver.solve(&instance).unwrap();
    assert!(start.elapsed() < Duration::from_secs(4));

    assert_eq!(outcome.status(), SatStatus::Unknown);
    assert!(outcome.primary_solution().is_none());
    assert!(outcome.all_solutions().is_empty());
    assert_eq!(
        outcome.reason(),
        &TerminationReason::Aborted("time limit reached".to_string())
    );
    assert!(outcome.to_string().starts_with("unknown\n"));
}

#[test]
fn test_timeout_keeps_compile_diagnostics() {
    let instance = InstanceLoader::new()
        .from_str(
            "#Steps: 2\n#Users: 2\n#Constraints: 2\nAuthorisations u1 s1\nAuthorisations u1 s2\n",
        )
        .unwrap();
    let solver = SolverBuilder::new()
        .with_backend(SleepingBackend(Duration::from_secs(3)))
        .with_time_limit(Duration::from_millis(100))
        .build();

    let outcome = solver.solve(&instance).unwrap();
    assert!(outcome.is_unknown());

    let warnings: Vec<_> = outcome.diagnostics().warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].message(),
        "User u1 has multiple authorisations defined; only the first will be used."
    );
    assert!(outcome.statistics().num_variables >= 2);
    assert!(outcome.statistics().compile_duration <= outcome.elapsed());
}
