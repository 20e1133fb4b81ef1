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

//! # Solve Orchestration
//!
//! `Solver` runs one attempt per call: compile, hand the model to the
//! backend, map the answer back onto steps. It is configured once through
//! `SolverBuilder` and may be reused for any number of instances.
//!
//! ## Modes
//!
//! * `SolveMode::Single` asks the backend for one solution.
//! * `SolveMode::Multi` pulls from the backend's solution stream until the
//!   stream ends or a monitor terminates the search. A `SolutionLimitMonitor`
//!   bounds the number of solutions; an `InterruptMonitor` watches the
//!   external stop flag.
//!
//! ## Time Limits
//!
//! Compilation always happens on the calling thread, so its diagnostics and
//! model size are part of every outcome. With a time limit only the search
//! runs on a worker thread, sharing the compiled model through an `Arc`.
//! When the deadline passes first, the orchestrator raises the worker's
//! deadline flag, stops waiting and reports `unknown`. The worker is not
//! joined; an enumerating worker stops at its next solution boundary.

use crate::{
    error::SolverError,
    monitor::{
        composite::CompositeMonitor,
        interrupt::InterruptMonitor,
        search_monitor::{SearchCommand, SearchMonitor},
        solution_limit::SolutionLimitMonitor,
    },
    outcome::{SatStatus, SolveOutcome, TerminationReason},
    stats::SolveStatisticsBuilder,
};
use std::{
    num::NonZeroU64,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    time::{Duration, Instant},
};
use wsp_compiler::{
    compiler::{CompiledModel, CompilerConfig, ConstraintCompiler},
    strategy::StrategyConfig,
};
use wsp_cp::{
    backend::{Backend, SolveStatus, Values},
    error::BackendError,
    sat::SatBackend,
};
use wsp_model::{
    index::UserIndex,
    instance::Instance,
    solution::{Solution, SolutionSet},
};

/// How many solutions to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SolveMode {
    /// One solution, or a proof that none exists.
    #[default]
    Single,
    /// Up to `limit` distinct solutions.
    Multi { limit: NonZeroU64 },
}

impl SolveMode {
    /// Enumeration of up to `limit` solutions.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero.
    #[inline]
    pub fn multi(limit: u64) -> Self {
        match NonZeroU64::new(limit) {
            Some(limit) => SolveMode::Multi { limit },
            None => panic!("called `SolveMode::multi` with a solution limit of zero"),
        }
    }
}

impl std::fmt::Display for SolveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveMode::Single => write!(f, "single"),
            SolveMode::Multi { limit } => write!(f, "multi({})", limit),
        }
    }
}

pub struct Solver {
    compiler: ConstraintCompiler,
    backend: Arc<dyn Backend>,
    mode: SolveMode,
    time_limit: Option<Duration>,
    interrupt: Arc<AtomicBool>,
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("compiler", &self.compiler)
            .field("backend", &self.backend.name())
            .field("mode", &self.mode)
            .field("time_limit", &self.time_limit)
            .finish()
    }
}

impl Solver {
    #[inline]
    pub fn mode(&self) -> SolveMode {
        self.mode
    }

    #[inline]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    #[inline]
    pub fn has_time_limit(&self) -> bool {
        self.time_limit.is_some()
    }

    /// The flag that stops an enumeration at its next solution boundary when raised.
    #[inline]
    pub fn interrupt_flag(&self) -> &Arc<AtomicBool> {
        &self.interrupt
    }

    #[inline]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    #[inline]
    pub fn compiler_config(&self) -> &CompilerConfig {
        self.compiler.config()
    }

    /// Solves `instance` in the configured mode.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::Compile` if the instance cannot be compiled and
    /// `SolverError::Backend` if the backend fails. A search that ends
    /// without an answer is not an error; it yields `SatStatus::Unknown`.
    pub fn solve(&self, instance: &Instance) -> Result<SolveOutcome, SolverError> {
        let start_time = Instant::now();
        let compiled = Arc::new(self.compiler.compile(instance)?);
        let compile_duration = start_time.elapsed();

        let solve_start = Instant::now();
        let (status, solutions, reason) = match self.time_limit {
            None => search(
                self.backend.as_ref(),
                self.mode,
                &compiled,
                &self.interrupt,
                &AtomicBool::new(false),
            )?,
            Some(limit) => self.search_with_deadline(Arc::clone(&compiled), limit)?,
        };
        let solve_duration = solve_start.elapsed();

        let model = compiled.model();
        let statistics = SolveStatisticsBuilder::new()
            .solutions_found(solutions.len() as u64)
            .num_variables(model.num_int_vars() + model.num_bool_vars())
            .num_constraints(model.num_constraints())
            .compile_duration(compile_duration)
            .solve_duration(solve_duration)
            .build();
        let diagnostics = compiled.diagnostics().clone();

        let elapsed = start_time.elapsed();
        let outcome = match status {
            SatStatus::Sat => SolveOutcome::sat(solutions, elapsed, diagnostics, reason, statistics),
            SatStatus::Unsat => SolveOutcome::unsat(elapsed, diagnostics, statistics),
            SatStatus::Unknown => SolveOutcome::unknown(elapsed, diagnostics, reason, statistics),
        };
        tracing::info!(
            status = %outcome.status(),
            solutions = outcome.all_solutions().len(),
            elapsed_ms = outcome.elapsed().as_millis() as u64,
            reason = %outcome.reason(),
            "solve attempt finished"
        );
        Ok(outcome)
    }

    fn search_with_deadline(
        &self,
        compiled: Arc<CompiledModel>,
        limit: Duration,
    ) -> Result<SearchResult, SolverError> {
        let (sender, receiver) = mpsc::channel();
        let deadline = Arc::new(AtomicBool::new(false));

        let backend = Arc::clone(&self.backend);
        let mode = self.mode;
        let interrupt = Arc::clone(&self.interrupt);
        let worker_deadline = Arc::clone(&deadline);

        std::thread::spawn(move || {
            let result = search(
                backend.as_ref(),
                mode,
                &compiled,
                &interrupt,
                &worker_deadline,
            );
            // The receiver is gone if the deadline passed first.
            let _ = sender.send(result);
        });

        match receiver.recv_timeout(limit) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                deadline.store(true, Ordering::Relaxed);
                tracing::debug!(limit_ms = limit.as_millis() as u64, "abandoning solve worker");
                Ok((
                    SatStatus::Unknown,
                    SolutionSet::new(),
                    TerminationReason::Aborted("time limit reached".to_string()),
                ))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(SolverError::WorkerPanicked),
        }
    }
}

type SearchResult = (SatStatus, SolutionSet, TerminationReason);

fn search(
    backend: &dyn Backend,
    mode: SolveMode,
    compiled: &CompiledModel,
    interrupt: &AtomicBool,
    deadline: &AtomicBool,
) -> Result<SearchResult, SolverError> {
    let mut monitor = CompositeMonitor::with_capacity(3);
    monitor.add_monitor(InterruptMonitor::new(interrupt));
    monitor.add_monitor(InterruptMonitor::new(deadline).with_reason("time limit reached"));
    if let SolveMode::Multi { limit } = mode {
        monitor.add_monitor(SolutionLimitMonitor::new(limit.get()));
    }

    match mode {
        SolveMode::Single => solve_single(backend, compiled, &mut monitor),
        SolveMode::Multi { .. } => solve_multi(backend, compiled, &mut monitor),
    }
}

fn solve_single(
    backend: &dyn Backend,
    compiled: &CompiledModel,
    monitor: &mut CompositeMonitor<'_>,
) -> Result<SearchResult, SolverError> {
    monitor.on_enter_search(compiled.model());
    if let SearchCommand::Terminate(reason) = monitor.search_command() {
        monitor.on_exit_search();
        return Ok((
            SatStatus::Unknown,
            SolutionSet::new(),
            TerminationReason::Aborted(reason),
        ));
    }

    let response = backend.solve(compiled.model())?;
    let result = match response.status() {
        SolveStatus::Optimal | SolveStatus::Feasible => {
            let values = response.into_values().ok_or_else(|| {
                BackendError::Solver(format!(
                    "backend `{}` reported a solution without values",
                    backend.name()
                ))
            })?;
            let solution = decode(compiled, &values)?;
            monitor.on_solution_found(&solution);

            let mut solutions = SolutionSet::new();
            solutions.push(solution);
            (SatStatus::Sat, solutions, TerminationReason::SolutionFound)
        }
        SolveStatus::Infeasible => (
            SatStatus::Unsat,
            SolutionSet::new(),
            TerminationReason::InfeasibilityProven,
        ),
        SolveStatus::Unknown => (
            SatStatus::Unknown,
            SolutionSet::new(),
            TerminationReason::Aborted(format!(
                "backend `{}` returned an indeterminate status",
                backend.name()
            )),
        ),
    };

    monitor.on_exit_search();
    Ok(result)
}

fn solve_multi(
    backend: &dyn Backend,
    compiled: &CompiledModel,
    monitor: &mut CompositeMonitor<'_>,
) -> Result<SearchResult, SolverError> {
    monitor.on_enter_search(compiled.model());

    let mut solutions = SolutionSet::new();
    let mut reason = TerminationReason::SearchExhausted;

    if let SearchCommand::Terminate(message) = monitor.search_command() {
        reason = TerminationReason::Aborted(message);
    } else {
        for values in backend.enumerate(compiled.model())? {
            let solution = decode(compiled, &values?)?;
            if solutions.contains(&solution) {
                tracing::trace!("skipping repeated solution");
                continue;
            }
            tracing::trace!(index = solutions.len() + 1, "enumerated solution");

            monitor.on_solution_found(&solution);
            solutions.push(solution);

            if let SearchCommand::Terminate(message) = monitor.search_command() {
                reason = TerminationReason::Aborted(message);
                break;
            }
        }
    }
    monitor.on_exit_search();

    let status = match (solutions.is_empty(), &reason) {
        (false, _) => SatStatus::Sat,
        (true, TerminationReason::SearchExhausted) => SatStatus::Unsat,
        (true, _) => SatStatus::Unknown,
    };
    let reason = if status == SatStatus::Unsat {
        TerminationReason::InfeasibilityProven
    } else {
        reason
    };
    Ok((status, solutions, reason))
}

/// Reads the user of every step from the backend values.
fn decode(compiled: &CompiledModel, values: &Values) -> Result<Solution, BackendError> {
    compiled
        .step_vars()
        .iter()
        .map(|&var| {
            let value = values.value(var);
            usize::try_from(value)
                .ok()
                .and_then(UserIndex::from_one_based)
                .ok_or_else(|| {
                    BackendError::Model(format!(
                        "step variable {} took the value {} outside the user range",
                        compiled.model().int_var_name(var),
                        value
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Solution::new)
}

/// Builds a `Solver`.
pub struct SolverBuilder {
    compiler_config: CompilerConfig,
    backend: Option<Arc<dyn Backend>>,
    mode: SolveMode,
    time_limit: Option<Duration>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Default for SolverBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl SolverBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            compiler_config: CompilerConfig::default(),
            backend: None,
            mode: SolveMode::Single,
            time_limit: None,
            interrupt: None,
        }
    }

    #[inline]
    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.compiler_config = self.compiler_config.with_strategy(strategy);
        self
    }

    #[inline]
    pub fn with_compiler_config(mut self, config: CompilerConfig) -> Self {
        self.compiler_config = config;
        self
    }

    #[inline]
    pub fn with_mode(mut self, mode: SolveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Switches to enumeration of up to `limit` solutions.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero.
    #[inline]
    pub fn with_solution_limit(mut self, limit: u64) -> Self {
        self.mode = SolveMode::multi(limit);
        self
    }

    #[inline]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Uses `flag` as the external stop signal.
    #[inline]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    #[inline]
    pub fn with_backend<B>(mut self, backend: B) -> Self
    where
        B: Backend + 'static,
    {
        self.backend = Some(Arc::new(backend));
        self
    }

    #[inline]
    pub fn with_shared_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Builds the solver. The SAT backend is used unless another one was set.
    #[inline]
    pub fn build(self) -> Solver {
        Solver {
            compiler: ConstraintCompiler::new(self.compiler_config),
            backend: self
                .backend
                .unwrap_or_else(|| Arc::new(SatBackend::new())),
            mode: self.mode,
            time_limit: self.time_limit,
            interrupt: self
                .interrupt
                .unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsp_cp::{
        backend::{SolutionStream, SolveResponse},
        model::CpModel,
    };
    use wsp_model::{index::StepIndex, instance::InstanceBuilder};

    fn si(i: usize) -> StepIndex {
        StepIndex::new(i)
    }

    fn separation(num_users: usize) -> Instance {
        let mut builder = InstanceBuilder::new(2, num_users);
        builder.add_separation_of_duty(si(0), si(1));
        builder.build().unwrap()
    }

    struct FailingBackend;

    impl Backend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn solve(&self, _model: &CpModel) -> Result<SolveResponse, BackendError> {
            Err(BackendError::Solver("boom".to_string()))
        }

        fn enumerate<'a>(&'a self, _model: &'a CpModel) -> Result<SolutionStream<'a>, BackendError> {
            Err(BackendError::Solver("boom".to_string()))
        }
    }

    struct IndeterminateBackend;

    impl Backend for IndeterminateBackend {
        fn name(&self) -> &str {
            "indeterminate"
        }

        fn solve(&self, _model: &CpModel) -> Result<SolveResponse, BackendError> {
            Ok(SolveResponse::new(SolveStatus::Unknown, None))
        }

        fn enumerate<'a>(&'a self, _model: &'a CpModel) -> Result<SolutionStream<'a>, BackendError> {
            Ok(Box::new(std::iter::empty()))
        }
    }

    /// Streams a fixed list of step values, repeats included.
    struct ScriptedBackend(Vec<Vec<i64>>);

    impl Backend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn solve(&self, _model: &CpModel) -> Result<SolveResponse, BackendError> {
            let values = self.0.first().map(|ints| Values::new(ints.clone(), Vec::new()));
            Ok(SolveResponse::new(SolveStatus::Feasible, values))
        }

        fn enumerate<'a>(&'a self, _model: &'a CpModel) -> Result<SolutionStream<'a>, BackendError> {
            Ok(Box::new(
                self.0
                    .iter()
                    .map(|ints| Ok(Values::new(ints.clone(), Vec::new()))),
            ))
        }
    }

    #[test]
    fn test_solve_mode() {
        assert_eq!(SolveMode::default(), SolveMode::Single);
        assert_eq!(SolveMode::multi(4).to_string(), "multi(4)");
    }

    #[test]
    #[should_panic(expected = "solution limit of zero")]
    fn test_zero_solution_limit_panics() {
        let _ = SolverBuilder::new().with_solution_limit(0);
    }

    #[test]
    fn test_builder_defaults() {
        let solver = SolverBuilder::new().build();
        assert_eq!(solver.mode(), SolveMode::Single);
        assert!(!solver.has_time_limit());
        assert_eq!(solver.backend_name(), "varisat");
        assert_eq!(
            solver.compiler_config().strategy(),
            StrategyConfig::symmetry_reduced()
        );
    }

    #[test]
    fn test_single_mode_finds_one_solution() {
        let solver = SolverBuilder::new().build();
        let outcome = solver.solve(&separation(2)).unwrap();
        assert!(outcome.is_sat());
        assert_eq!(outcome.all_solutions().len(), 1);
        assert_eq!(outcome.reason(), &TerminationReason::SolutionFound);

        let primary = outcome.primary_solution().unwrap();
        assert_ne!(primary.user(si(0)), primary.user(si(1)));
        assert_eq!(outcome.statistics().solutions_found, 1);
        assert_eq!(outcome.statistics().num_constraints, 1);
    }

    #[test]
    fn test_single_mode_unsat() {
        let solver = SolverBuilder::new().build();
        let outcome = solver.solve(&separation(1)).unwrap();
        assert!(outcome.is_unsat());
        assert!(outcome.primary_solution().is_none());
    }

    #[test]
    fn test_multi_mode_stops_at_the_limit() {
        let instance = InstanceBuilder::new(3, 3).build().unwrap();
        let solver = SolverBuilder::new().with_solution_limit(5).build();
        let outcome = solver.solve(&instance).unwrap();
        assert_eq!(outcome.all_solutions().len(), 5);
        assert_eq!(
            outcome.reason(),
            &TerminationReason::Aborted("solution limit reached".to_string())
        );
    }

    #[test]
    fn test_repeated_solutions_do_not_count_towards_the_limit() {
        let instance = InstanceBuilder::new(2, 2).build().unwrap();
        let solver = SolverBuilder::new()
            .with_backend(ScriptedBackend(vec![vec![1, 1], vec![1, 1], vec![1, 2]]))
            .with_solution_limit(2)
            .build();

        let outcome = solver.solve(&instance).unwrap();
        assert_eq!(outcome.all_solutions().len(), 2);
        assert_eq!(outcome.statistics().solutions_found, 2);
        assert_eq!(
            outcome.reason(),
            &TerminationReason::Aborted("solution limit reached".to_string())
        );
    }

    #[test]
    fn test_multi_mode_tolerates_fewer_solutions() {
        let solver = SolverBuilder::new().with_solution_limit(10).build();
        let outcome = solver.solve(&separation(2)).unwrap();
        assert_eq!(outcome.all_solutions().len(), 2);
        assert_eq!(outcome.reason(), &TerminationReason::SearchExhausted);

        let outcome = solver.solve(&separation(1)).unwrap();
        assert!(outcome.is_unsat());
        assert_eq!(outcome.reason(), &TerminationReason::InfeasibilityProven);
    }

    #[test]
    fn test_raised_interrupt_yields_unknown() {
        let flag = Arc::new(AtomicBool::new(true));
        let solver = SolverBuilder::new()
            .with_solution_limit(3)
            .with_interrupt(Arc::clone(&flag))
            .build();
        let outcome = solver.solve(&separation(2)).unwrap();
        assert!(outcome.is_unknown());
        assert!(outcome.all_solutions().is_empty());
        assert_eq!(
            outcome.reason(),
            &TerminationReason::Aborted("interrupt signal received".to_string())
        );

        flag.store(false, Ordering::Relaxed);
        assert!(solver.solve(&separation(2)).unwrap().is_sat());
    }

    #[test]
    fn test_backend_errors_propagate() {
        for mode in [SolveMode::Single, SolveMode::multi(2)] {
            let solver = SolverBuilder::new()
                .with_backend(FailingBackend)
                .with_mode(mode)
                .build();
            assert_eq!(
                solver.solve(&separation(2)).unwrap_err(),
                SolverError::Backend(BackendError::Solver("boom".to_string()))
            );
        }
    }

    #[test]
    fn test_indeterminate_backend_is_unknown() {
        let solver = SolverBuilder::new()
            .with_backend(IndeterminateBackend)
            .build();
        let outcome = solver.solve(&separation(2)).unwrap();
        assert!(outcome.is_unknown());
        assert!(matches!(outcome.reason(), TerminationReason::Aborted(_)));
    }

    #[test]
    fn test_time_limit_with_fast_attempt() {
        let solver = SolverBuilder::new()
            .with_solution_limit(10)
            .with_time_limit(Duration::from_secs(30))
            .build();
        let outcome = solver.solve(&separation(2)).unwrap();
        assert!(outcome.is_sat());
        assert_eq!(outcome.all_solutions().len(), 2);
        assert!(!outcome.diagnostics().is_empty());
    }
}
