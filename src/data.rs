use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type SubjectIndex = usize;
pub type SlotIndex = usize;

/// A class offering that needs a fixed number of weekly hour slots.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub hours: u32,
    pub teacher: String,
    /// Comma-separated student group identifiers, e.g. `"6A, 6B"`.
    pub groups: String,
}

impl Subject {
    /// Trimmed, non-empty group tokens of the membership string, in written order.
    pub fn group_tokens(&self) -> impl Iterator<Item = &str> {
        self.groups
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }
}

/// The complete input for one timetabling run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableInput {
    pub subjects: Vec<Subject>,
    /// Slot labels in input order; repeats are allowed and kept distinct by index.
    pub slots: Vec<String>,
}

/// A subject placed in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledClass {
    pub slot_index: SlotIndex,
    pub slot: String,
    pub subject_index: SubjectIndex,
    pub subject: String,
    pub teacher: String,
    pub groups: String,
}

impl fmt::Display for ScheduledClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Slot {}: {} (Teacher: {}, Groups: {})",
            self.slot, self.subject, self.teacher, self.groups
        )
    }
}

/// Raw status reported by the MILP engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unbounded,
    Other(String),
}

impl SolveStatus {
    /// Whether the solver handed back usable variable values.
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Feasible => write!(f, "feasible"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::Other(raw) => write!(f, "other ({raw})"),
        }
    }
}

/// Why no schedule could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureCategory {
    Infeasible,
    Unbounded,
    NoUsableSolution,
}

/// A successful run: classroom count plus the slot-major schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub status: SolveStatus,
    pub classroom_count: u32,
    pub classes: Vec<ScheduledClass>,
}

/// A run that ended without a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub category: FailureCategory,
    pub message: String,
    pub status: SolveStatus,
}

/// The final output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ScheduleResult {
    Scheduled(Timetable),
    Unsolved(FailureReport),
}

impl fmt::Display for ScheduleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleResult::Scheduled(timetable) => {
                writeln!(f, "Solution found ({}):", timetable.status)?;
                writeln!(f, "Classrooms required = {}", timetable.classroom_count)?;
                for class in &timetable.classes {
                    writeln!(f, "{class}")?;
                }
                Ok(())
            }
            ScheduleResult::Unsolved(report) => {
                writeln!(f, "No solution found.")?;
                writeln!(f, "{} (solver status: {})", report.message, report.status)
            }
        }
    }
}
