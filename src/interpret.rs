//! Turns solver output back into a schedule, or explains why there is none.

use crate::data::{
    FailureCategory, FailureReport, ScheduleResult, ScheduledClass, SolveStatus, Subject,
    Timetable, TimetableInput,
};
use crate::error::{Result, TimetableError};
use crate::model::{build_groups_index, build_teachers_index};
use crate::solver::{SolvedValues, SolverRun};
use itertools::Itertools;
use log::{error, info, warn};
use std::collections::HashMap;

/// A decision variable counts as set above this value. HiGHS may return
/// near-integral values such as 0.9999997 or 1e-9 for binaries.
pub const ASSIGNED_THRESHOLD: f64 = 0.5;

/// Interprets one solver run against the input it was built from.
pub fn interpret(input: &TimetableInput, run: &SolverRun) -> Result<ScheduleResult> {
    if !run.status.has_solution() {
        return Ok(ScheduleResult::Unsolved(explain_failure(&run.status)));
    }

    let values = run.values.as_ref();
    let classroom_count = extract_objective(&run.status, values.map(|v| v.max_load))?;
    let classes = extract_schedule(&run.status, values, &input.subjects, &input.slots)?;
    let timetable = Timetable {
        status: run.status.clone(),
        classroom_count,
        classes,
    };
    check_schedule(input, &timetable)?;

    info!(
        "Schedule uses {} classrooms for {} placed classes.",
        timetable.classroom_count,
        timetable.classes.len()
    );
    Ok(ScheduleResult::Scheduled(timetable))
}

/// Classroom count from the MaxLoad value.
pub fn extract_objective(status: &SolveStatus, objective_value: Option<f64>) -> Result<u32> {
    if !status.has_solution() {
        return Err(TimetableError::InternalConsistency(format!(
            "objective requested for a {status} run"
        )));
    }
    let value = objective_value.ok_or_else(|| {
        TimetableError::InternalConsistency(format!("{status} run has no objective value"))
    })?;
    if !value.is_finite() || value < -ASSIGNED_THRESHOLD {
        return Err(TimetableError::InternalConsistency(format!(
            "objective value {value} is not a classroom count"
        )));
    }
    Ok(value.round().max(0.0) as u32)
}

/// Slot-major, then subject-index order list of every placed class.
pub fn extract_schedule(
    status: &SolveStatus,
    values: Option<&SolvedValues>,
    subjects: &[Subject],
    slots: &[String],
) -> Result<Vec<ScheduledClass>> {
    if !status.has_solution() {
        return Err(TimetableError::InternalConsistency(format!(
            "schedule requested for a {status} run"
        )));
    }
    let values = values.ok_or_else(|| {
        TimetableError::InternalConsistency(format!("{status} run has no variable values"))
    })?;
    if values.num_slots != slots.len()
        || values.assignment.len() != subjects.len() * slots.len()
    {
        return Err(TimetableError::InternalConsistency(format!(
            "expected {}x{} variable values, got {} values over {} slots",
            subjects.len(),
            slots.len(),
            values.assignment.len(),
            values.num_slots
        )));
    }
    if let Some(position) = values.assignment.iter().position(|v| !v.is_finite()) {
        return Err(TimetableError::InternalConsistency(format!(
            "variable {position} has non-finite value"
        )));
    }

    let classes = slots
        .iter()
        .enumerate()
        .flat_map(|(j, label)| {
            subjects
                .iter()
                .enumerate()
                .filter(move |&(i, _)| values.value(i, j) > ASSIGNED_THRESHOLD)
                .map(move |(i, subject)| ScheduledClass {
                    slot_index: j,
                    slot: label.clone(),
                    subject_index: i,
                    subject: subject.name.clone(),
                    teacher: subject.teacher.clone(),
                    groups: subject.groups.clone(),
                })
        })
        .collect();
    Ok(classes)
}

/// Diagnostic for a run that produced no usable values.
pub fn explain_failure(status: &SolveStatus) -> FailureReport {
    let (category, message) = match status {
        SolveStatus::Infeasible => (
            FailureCategory::Infeasible,
            "no feasible assignment satisfies hour, group, and teacher constraints",
        ),
        SolveStatus::Unbounded => {
            // MaxLoad is bounded by the subject count
            error!("Solver reported an unbounded objective for a bounded model");
            (FailureCategory::Unbounded, "objective unbounded")
        }
        _ => (
            FailureCategory::NoUsableSolution,
            "solver terminated without a usable solution",
        ),
    };
    warn!("No schedule: {} (status: {})", message, status);
    FailureReport {
        category,
        message: message.to_string(),
        status: status.clone(),
    }
}

/// Re-checks a schedule against the hour, group, teacher and load rules.
pub fn check_schedule(input: &TimetableInput, timetable: &Timetable) -> Result<()> {
    let per_subject = timetable
        .classes
        .iter()
        .map(|c| c.subject_index)
        .counts();
    for (i, subject) in input.subjects.iter().enumerate() {
        let placed = per_subject.get(&i).copied().unwrap_or(0);
        if placed != subject.hours as usize {
            return Err(TimetableError::InternalConsistency(format!(
                "subject {} ({}) placed {} times, requires {}",
                i, subject.name, placed, subject.hours
            )));
        }
    }

    let by_slot: HashMap<usize, Vec<usize>> = timetable
        .classes
        .iter()
        .map(|c| (c.slot_index, c.subject_index))
        .into_group_map();

    let conflict_families = [
        ("group", build_groups_index(&input.subjects)),
        ("teacher", build_teachers_index(&input.subjects)),
    ];
    for (family, index) in &conflict_families {
        for (key, members) in index {
            for (slot, placed) in &by_slot {
                let clashing = placed.iter().filter(|&&i| members.contains(&i)).count();
                if clashing > 1 {
                    return Err(TimetableError::InternalConsistency(format!(
                        "{family} {key} has {clashing} classes in slot {slot}"
                    )));
                }
            }
        }
    }

    let peak = by_slot.values().map(Vec::len).max().unwrap_or(0);
    let count = timetable.classroom_count as usize;
    let tight = match timetable.status {
        SolveStatus::Optimal => count == peak,
        _ => count >= peak,
    };
    if !tight {
        return Err(TimetableError::InternalConsistency(format!(
            "classroom count {count} does not match peak load {peak}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn subject(name: &str, hours: u32, teacher: &str, groups: &str) -> Subject {
        Subject {
            name: name.to_string(),
            hours,
            teacher: teacher.to_string(),
            groups: groups.to_string(),
        }
    }

    fn two_subject_input() -> TimetableInput {
        TimetableInput {
            subjects: vec![
                subject("Maths", 2, "Dupont", "6A"),
                subject("French", 1, "Martin", "6B"),
            ],
            slots: vec!["Mon_M1".to_string(), "Mon_M2".to_string()],
        }
    }

    fn run(status: SolveStatus, assignment: Vec<f64>, max_load: f64) -> SolverRun {
        SolverRun {
            status,
            values: Some(SolvedValues {
                num_slots: 2,
                assignment,
                max_load,
            }),
            elapsed: Duration::from_millis(3),
        }
    }

    #[test]
    fn schedule_is_slot_major_with_threshold() {
        let input = two_subject_input();
        // Maths in both slots, French in the first; relaxation noise included
        let solved = run(
            SolveStatus::Optimal,
            vec![0.9999997, 1.0, 1.0, 1e-9],
            2.0000001,
        );
        let result = interpret(&input, &solved).unwrap();
        let ScheduleResult::Scheduled(timetable) = result else {
            panic!("expected a schedule");
        };
        assert_eq!(timetable.classroom_count, 2);
        let order: Vec<(&str, &str)> = timetable
            .classes
            .iter()
            .map(|c| (c.slot.as_str(), c.subject.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("Mon_M1", "Maths"), ("Mon_M1", "French"), ("Mon_M2", "Maths")]
        );
        assert_eq!(timetable.classes[1].teacher, "Martin");
        assert_eq!(timetable.classes[1].groups, "6B");
    }

    #[test]
    fn failure_statuses_are_reported_not_raised() {
        let input = two_subject_input();
        let cases = [
            (SolveStatus::Infeasible, FailureCategory::Infeasible),
            (SolveStatus::Unbounded, FailureCategory::Unbounded),
            (
                SolveStatus::Other("ReachedTimeLimit".to_string()),
                FailureCategory::NoUsableSolution,
            ),
        ];
        for (status, category) in cases {
            let failed = SolverRun {
                status: status.clone(),
                values: None,
                elapsed: Duration::ZERO,
            };
            match interpret(&input, &failed).unwrap() {
                ScheduleResult::Unsolved(report) => {
                    assert_eq!(report.category, category);
                    assert_eq!(report.status, status);
                }
                other => panic!("expected a failure report, got {other:?}"),
            }
        }
    }

    #[test]
    fn infeasible_message_names_the_constraints() {
        let report = explain_failure(&SolveStatus::Infeasible);
        assert_eq!(
            report.message,
            "no feasible assignment satisfies hour, group, and teacher constraints"
        );
    }

    #[test]
    fn success_without_values_is_inconsistent() {
        let input = two_subject_input();
        let empty = SolverRun {
            status: SolveStatus::Feasible,
            values: None,
            elapsed: Duration::ZERO,
        };
        assert!(matches!(
            interpret(&input, &empty),
            Err(TimetableError::InternalConsistency(_))
        ));
    }

    #[test]
    fn wrongly_shaped_values_are_inconsistent() {
        let input = two_subject_input();
        let short = run(SolveStatus::Optimal, vec![1.0, 1.0, 1.0], 2.0);
        assert!(matches!(
            interpret(&input, &short),
            Err(TimetableError::InternalConsistency(_))
        ));
    }

    #[test]
    fn objective_must_be_a_finite_count() {
        assert_eq!(extract_objective(&SolveStatus::Optimal, Some(2.9999)).unwrap(), 3);
        assert!(extract_objective(&SolveStatus::Optimal, Some(f64::NAN)).is_err());
        assert!(extract_objective(&SolveStatus::Optimal, None).is_err());
        assert!(extract_objective(&SolveStatus::Infeasible, Some(1.0)).is_err());
    }

    #[test]
    fn wrong_hour_count_is_caught() {
        let input = two_subject_input();
        // Maths only placed once
        let solved = run(SolveStatus::Optimal, vec![1.0, 0.0, 0.0, 1.0], 1.0);
        assert!(matches!(
            interpret(&input, &solved),
            Err(TimetableError::InternalConsistency(_))
        ));
    }

    #[test]
    fn teacher_clash_is_caught() {
        let mut input = two_subject_input();
        input.subjects[1].teacher = "Dupont".to_string();
        let solved = run(SolveStatus::Optimal, vec![1.0, 1.0, 1.0, 0.0], 2.0);
        match interpret(&input, &solved) {
            Err(TimetableError::InternalConsistency(msg)) => assert!(msg.contains("teacher")),
            other => panic!("expected a teacher clash, got {other:?}"),
        }
    }

    #[test]
    fn classroom_count_must_match_peak_when_optimal() {
        let input = two_subject_input();
        let loose = run(SolveStatus::Optimal, vec![1.0, 1.0, 0.0, 1.0], 3.0);
        assert!(interpret(&input, &loose).is_err());

        let feasible = run(SolveStatus::Feasible, vec![1.0, 1.0, 0.0, 1.0], 3.0);
        assert!(matches!(
            interpret(&input, &feasible).unwrap(),
            ScheduleResult::Scheduled(_)
        ));
    }
}
