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

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wsp_compiler::{
    compiler::CompilerConfig,
    strategy::{EncodingStrategy, StrategyConfig},
};
use wsp_model::{
    format::render_solution,
    instance::Instance,
    loading::InstanceLoader,
    solution::SolutionLoader,
    validation::validate,
};
use wsp_solver::solver::SolverBuilder;

/// WSP - Workflow Satisfiability Problem solver
#[derive(Parser, Debug)]
#[command(name = "wsp", author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Solve an instance
    Solve(SolveArgs),

    /// Check a solution against an instance
    Validate {
        /// Instance file
        instance: PathBuf,

        /// Solution file (`s<i>: u<j>` lines)
        solution: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Instance file
    instance: PathBuf,

    /// Encoding strategy for every constraint family (direct or symmetry)
    #[arg(short, long, default_value = "symmetry")]
    strategy: EncodingStrategy,

    /// Encoding strategy for at-most-k constraints
    #[arg(long)]
    at_most_k: Option<EncodingStrategy>,

    /// Encoding strategy for one-team constraints
    #[arg(long)]
    one_team: Option<EncodingStrategy>,

    /// Enumerate up to this many solutions instead of one
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    solutions: Option<u64>,

    /// Give up after this many seconds and report unknown
    #[arg(short, long, value_parser = parse_seconds)]
    time_limit: Option<Duration>,

    /// Ceiling on rows of a direct one-team table
    #[arg(long)]
    max_table_rows: Option<usize>,

    /// Re-check every produced solution
    #[arg(long)]
    validate: bool,

    /// Print solve statistics after the report
    #[arg(long)]
    stats: bool,

    /// Write the primary solution to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SolveArgs {
    fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig::uniform(self.strategy)
            .with_at_most_k(self.at_most_k.unwrap_or(self.strategy))
            .with_one_team(self.one_team.unwrap_or(self.strategy))
    }

    fn compiler_config(&self) -> CompilerConfig {
        let config = CompilerConfig::default().with_strategy(self.strategy_config());
        match self.max_table_rows {
            Some(rows) => config.with_max_table_rows(rows),
            None => config,
        }
    }
}

fn parse_seconds(s: &str) -> Result<Duration> {
    let seconds: f64 = s
        .trim()
        .parse()
        .with_context(|| format!("`{}` is not a number of seconds", s))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("the time limit must be a positive number of seconds");
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn load_instance(path: &Path) -> Result<Instance> {
    InstanceLoader::new()
        .from_path(path)
        .with_context(|| format!("failed to load instance {}", path.display()))
}

/// Returns `false` if a produced solution failed validation.
fn solve<W: Write>(args: &SolveArgs, out: &mut W) -> Result<bool> {
    let instance = load_instance(&args.instance)?;
    info!(
        steps = instance.num_steps(),
        users = instance.num_users(),
        constraints = instance.constraints().len(),
        "loaded instance"
    );

    let mut builder = SolverBuilder::new().with_compiler_config(args.compiler_config());
    if let Some(limit) = args.solutions {
        builder = builder.with_solution_limit(limit);
    }
    if let Some(limit) = args.time_limit {
        builder = builder.with_time_limit(limit);
    }
    let solver = builder.build();

    let outcome = solver
        .solve(&instance)
        .with_context(|| format!("failed to solve {}", args.instance.display()))?;
    writeln!(out, "{}", outcome)?;

    if args.stats {
        write!(out, "{}", outcome.statistics())?;
    }

    let mut all_valid = true;
    if args.validate {
        for (i, solution) in outcome.all_solutions().iter().enumerate() {
            let report = validate(&instance, solution);
            writeln!(out, "Solution {}: {}", i + 1, report)?;
            all_valid &= report.is_valid();
        }
    }

    if let Some(path) = &args.output {
        match outcome.primary_solution() {
            Some(primary) => fs::write(path, render_solution(primary))
                .with_context(|| format!("failed to write solution to {}", path.display()))?,
            None => warn!(
                "no solution to write to {}, the instance is {}",
                path.display(),
                outcome.status()
            ),
        }
    }

    Ok(all_valid)
}

/// Returns `false` if the solution violates the instance.
fn check<W: Write>(instance: &Path, solution: &Path, out: &mut W) -> Result<bool> {
    let instance = load_instance(instance)?;
    let solution = SolutionLoader::new()
        .from_path(solution)
        .with_context(|| format!("failed to load solution {}", solution.display()))?;

    let report = validate(&instance, &solution);
    writeln!(out, "{}", report)?;
    Ok(report.is_valid())
}

fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<bool> {
    match &cli.command {
        Commands::Solve(args) => solve(args, out),
        Commands::Validate { instance, solution } => check(instance, solution, out),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let success = run(&cli, &mut stdout.lock())?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("wsp-cli-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    const SEPARATION: &str = "#Steps: 2\n#Users: 2\n#Constraints: 1\nSeparation-of-duty s1 s2\n";

    #[test]
    fn test_parse_solve_defaults() {
        let cli = Cli::try_parse_from(["wsp", "solve", "instance.txt"]).unwrap();
        let Commands::Solve(args) = cli.command else {
            panic!("expected the solve command");
        };
        assert_eq!(args.instance, PathBuf::from("instance.txt"));
        assert_eq!(args.strategy_config(), StrategyConfig::symmetry_reduced());
        assert_eq!(args.solutions, None);
        assert_eq!(args.time_limit, None);
        assert!(!args.validate);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_mixed_strategies() {
        let cli = Cli::try_parse_from([
            "wsp",
            "-vv",
            "solve",
            "instance.txt",
            "--strategy",
            "direct",
            "--one-team",
            "symmetry",
            "-n",
            "5",
            "--time-limit",
            "1.5",
            "--max-table-rows",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Solve(args) = cli.command else {
            panic!("expected the solve command");
        };
        let config = args.compiler_config();
        assert_eq!(config.strategy().at_most_k(), EncodingStrategy::Direct);
        assert_eq!(config.strategy().one_team(), EncodingStrategy::SymmetryReduced);
        assert_eq!(config.max_table_rows(), 10);
        assert_eq!(args.solutions, Some(5));
        assert_eq!(args.time_limit, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["wsp", "solve", "i.txt", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["wsp", "solve", "i.txt", "--strategy", "fast"]).is_err());
        assert!(Cli::try_parse_from(["wsp", "solve", "i.txt", "--time-limit", "-1"]).is_err());
        assert!(Cli::try_parse_from(["wsp", "validate", "i.txt"]).is_err());
    }

    #[test]
    fn test_solve_and_validate_end_to_end() {
        let instance = temp_file("e2e-instance.txt", SEPARATION);
        let output = std::env::temp_dir().join(format!("wsp-cli-{}-e2e-out.txt", std::process::id()));
        let cli = Cli::try_parse_from([
            "wsp",
            "solve",
            instance.to_str().unwrap(),
            "-n",
            "10",
            "--validate",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

        let mut out = Vec::new();
        assert!(run(&cli, &mut out).unwrap());
        let report = String::from_utf8(out).unwrap();
        assert!(report.starts_with("sat\n"));
        assert!(report.contains("Solution 2:"));
        assert!(report.contains("Solution 1: valid"));

        let cli = Cli::try_parse_from([
            "wsp",
            "validate",
            instance.to_str().unwrap(),
            output.to_str().unwrap(),
        ])
        .unwrap();
        let mut out = Vec::new();
        assert!(run(&cli, &mut out).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "valid\n");
    }

    #[test]
    fn test_validate_reports_violations() {
        let instance = temp_file("violation-instance.txt", SEPARATION);
        let solution = temp_file("violation-solution.txt", "s1: u1\ns2: u1\n");
        let cli = Cli::try_parse_from([
            "wsp",
            "validate",
            instance.to_str().unwrap(),
            solution.to_str().unwrap(),
        ])
        .unwrap();

        let mut out = Vec::new();
        assert!(!run(&cli, &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("invalid (1 violations)"));
    }

    #[test]
    fn test_missing_instance_is_an_error() {
        let cli = Cli::try_parse_from(["wsp", "solve", "/definitely/not/here.txt"]).unwrap();
        let err = run(&cli, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("failed to load instance"));
    }
}
