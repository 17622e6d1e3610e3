use crate::data::{ScheduleResult, SolveStatus, TimetableInput};
use crate::error::Result;
use crate::interpret;
use crate::model::{self, TimetableModel};
use good_lp::solvers::SolutionStatus;
use good_lp::{ResolutionError, Solution, SolverModel, default_solver};
use log::{info, warn};
use std::time::{Duration, Instant};

/// Options forwarded to HiGHS.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub threads: i32,
    pub random_seed: i32,
    pub time_limit: Option<Duration>,
    pub log_to_console: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            threads: 1, // single thread for reproducibility
            random_seed: 1234,
            time_limit: None,
            log_to_console: false,
        }
    }
}

/// Solved values of the decision grid (subject-major) and of MaxLoad.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedValues {
    pub num_slots: usize,
    pub assignment: Vec<f64>,
    pub max_load: f64,
}

impl SolvedValues {
    pub fn value(&self, subject: usize, slot: usize) -> f64 {
        self.assignment[subject * self.num_slots + slot]
    }
}

/// What came back from one solver call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverRun {
    pub status: SolveStatus,
    pub values: Option<SolvedValues>,
    pub elapsed: Duration,
}

/// Solves a timetable end to end: build, solve with HiGHS, interpret.
pub fn solve(input: &TimetableInput, settings: &SolverSettings) -> Result<ScheduleResult> {
    let model = model::build_model(input)?;
    let run = solve_model(model, settings);
    interpret::interpret(input, &run)
}

/// Hands a built model to HiGHS.
pub fn solve_model(model: TimetableModel, settings: &SolverSettings) -> SolverRun {
    let TimetableModel {
        problem,
        grid,
        max_load,
        constraints,
        objective,
    } = model;

    let mut highs = problem
        .minimise(objective)
        .using(default_solver)
        .set_option("threads", settings.threads)
        .set_option("random_seed", settings.random_seed)
        .set_option("log_to_console", settings.log_to_console);
    if let Some(limit) = settings.time_limit {
        highs = highs.set_option("time_limit", limit.as_secs_f64());
    }
    for c in constraints {
        highs.add_constraint(c.constraint);
    }

    info!("Starting ILP solver...");
    let start_time = Instant::now();
    let outcome = highs.solve();
    let elapsed = start_time.elapsed();

    match outcome {
        Ok(solution) => {
            info!("Solution found in {:.2?}", elapsed);
            let assignment = (0..grid.num_subjects())
                .flat_map(|i| grid.row(i))
                .map(|var| solution.value(var))
                .collect();
            SolverRun {
                status: status_of_solution(solution.status()),
                values: Some(SolvedValues {
                    num_slots: grid.num_slots(),
                    assignment,
                    max_load: solution.value(max_load),
                }),
                elapsed,
            }
        }
        Err(e) => {
            warn!("Solver stopped without a solution after {:.2?}: {}", elapsed, e);
            SolverRun {
                status: status_of(e),
                values: None,
                elapsed,
            }
        }
    }
}

// HiGHS hands back an incumbent when it stops on a time, iteration or gap limit
fn status_of_solution(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        SolutionStatus::TimeLimit | SolutionStatus::GapLimit => SolveStatus::Feasible,
    }
}

fn status_of(error: ResolutionError) -> SolveStatus {
    match error {
        ResolutionError::Infeasible => SolveStatus::Infeasible,
        ResolutionError::Unbounded => SolveStatus::Unbounded,
        other => SolveStatus::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_errors_map_to_statuses() {
        assert_eq!(status_of(ResolutionError::Infeasible), SolveStatus::Infeasible);
        assert_eq!(status_of(ResolutionError::Unbounded), SolveStatus::Unbounded);
        match status_of(ResolutionError::Other("SolveError")) {
            SolveStatus::Other(raw) => assert!(raw.contains("SolveError")),
            other => panic!("unexpected status {other}"),
        }
    }

    #[test]
    fn solution_statuses_map_to_optimal_or_feasible() {
        assert_eq!(status_of_solution(SolutionStatus::Optimal), SolveStatus::Optimal);
        assert_eq!(status_of_solution(SolutionStatus::TimeLimit), SolveStatus::Feasible);
        assert_eq!(status_of_solution(SolutionStatus::GapLimit), SolveStatus::Feasible);
    }

    #[test]
    fn default_settings_are_reproducible() {
        let settings = SolverSettings::default();
        assert_eq!(settings.threads, 1);
        assert_eq!(settings.random_seed, 1234);
        assert!(settings.time_limit.is_none());
    }
}
