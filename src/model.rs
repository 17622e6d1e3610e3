use crate::data::{SlotIndex, Subject, SubjectIndex, TimetableInput};
use crate::error::{Result, TimetableError};
use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint, variable};
use itertools::Itertools;
use log::{info, trace};
use std::collections::BTreeMap;

/// Identifier (group or teacher) → indices of the subjects that share it.
pub type ConflictIndex = BTreeMap<String, Vec<SubjectIndex>>;

/// Binary decision variables `x[i,j]`, stored subject-major.
#[derive(Debug, Clone)]
pub struct VariableGrid {
    num_subjects: usize,
    num_slots: usize,
    cells: Vec<Variable>,
}

impl VariableGrid {
    pub fn num_subjects(&self) -> usize {
        self.num_subjects
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn get(&self, subject: SubjectIndex, slot: SlotIndex) -> Variable {
        self.cells[subject * self.num_slots + slot]
    }

    /// Every slot variable of one subject.
    pub fn row(&self, subject: SubjectIndex) -> impl Iterator<Item = Variable> + '_ {
        self.cells[subject * self.num_slots..(subject + 1) * self.num_slots]
            .iter()
            .copied()
    }

    /// Every subject variable of one slot.
    pub fn column(&self, slot: SlotIndex) -> impl Iterator<Item = Variable> + '_ {
        (0..self.num_subjects).map(move |subject| self.get(subject, slot))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// What a constraint enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Subject is taught exactly its required hours.
    Hours { subject: SubjectIndex },
    /// A group attends at most one subject in the slot.
    Group { group: String, slot: SlotIndex },
    /// A teacher teaches at most one subject in the slot.
    Teacher { teacher: String, slot: SlotIndex },
    /// Load of the slot stays under MaxLoad.
    Load { slot: SlotIndex },
}

pub struct ModelConstraint {
    pub kind: ConstraintKind,
    pub constraint: Constraint,
}

/// A complete model, ready to hand to the solver.
pub struct TimetableModel {
    pub problem: ProblemVariables,
    pub grid: VariableGrid,
    pub max_load: Variable,
    pub constraints: Vec<ModelConstraint>,
    pub objective: Expression,
}

/// Builds the full model for `input`.
pub fn build_model(input: &TimetableInput) -> Result<TimetableModel> {
    validate(input)?;

    let num_subjects = input.subjects.len();
    let num_slots = input.slots.len();
    info!(
        "Setting up ILP model with {} subjects and {} slots...",
        num_subjects, num_slots
    );

    let groups_index = build_groups_index(&input.subjects);
    let teachers_index = build_teachers_index(&input.subjects);
    trace!(
        "Indexed {} groups and {} teachers.",
        groups_index.len(),
        teachers_index.len()
    );

    let mut problem = ProblemVariables::new();
    let grid = build_variables(&mut problem, num_subjects, num_slots);
    // MaxLoad can never exceed the number of subjects
    let max_load = problem.add(variable().min(0.0).max(num_subjects as f64));

    let constraints = build_constraints(
        &grid,
        max_load,
        &input.subjects,
        &groups_index,
        &teachers_index,
    );
    info!(
        "Model has {} decision variables and {} constraints.",
        grid.len(),
        constraints.len()
    );

    Ok(TimetableModel {
        problem,
        grid,
        max_load,
        constraints,
        objective: build_objective(max_load),
    })
}

fn validate(input: &TimetableInput) -> Result<()> {
    if input.subjects.is_empty() {
        return Err(TimetableError::InvalidInput(
            "at least one subject is required".to_string(),
        ));
    }
    if input.slots.is_empty() {
        return Err(TimetableError::InvalidInput(
            "at least one slot is required".to_string(),
        ));
    }

    let num_slots = input.slots.len();
    for (i, subject) in input.subjects.iter().enumerate() {
        if subject.hours == 0 {
            return Err(TimetableError::InvalidInput(format!(
                "subject {} ({}) requires zero hours",
                i, subject.name
            )));
        }
        if subject.hours as usize > num_slots {
            return Err(TimetableError::InvalidInput(format!(
                "subject {} ({}) requires {} hours but only {} slots exist",
                i, subject.name, subject.hours, num_slots
            )));
        }
        if subject.teacher.trim().is_empty() {
            return Err(TimetableError::InvalidInput(format!(
                "subject {} ({}) has no teacher",
                i, subject.name
            )));
        }
        if subject.group_tokens().next().is_none() {
            return Err(TimetableError::InvalidInput(format!(
                "subject {} ({}) has no student group",
                i, subject.name
            )));
        }
    }
    Ok(())
}

/// Maps each trimmed group token to the subjects attending it.
pub fn build_groups_index(subjects: &[Subject]) -> ConflictIndex {
    subjects
        .iter()
        .enumerate()
        .flat_map(|(i, s)| s.group_tokens().unique().map(move |g| (g.to_string(), i)))
        .into_group_map()
        .into_iter()
        .collect()
}

/// Maps each teacher to the subjects they teach.
pub fn build_teachers_index(subjects: &[Subject]) -> ConflictIndex {
    subjects
        .iter()
        .enumerate()
        .map(|(i, s)| (s.teacher.clone(), i))
        .into_group_map()
        .into_iter()
        .collect()
}

// x_ij = 1 if subject i is taught in slot j
//        0 otherwise
pub fn build_variables(
    problem: &mut ProblemVariables,
    num_subjects: usize,
    num_slots: usize,
) -> VariableGrid {
    let cells = problem.add_vector(variable().binary(), num_subjects * num_slots);
    VariableGrid {
        num_subjects,
        num_slots,
        cells,
    }
}

pub fn build_constraints(
    grid: &VariableGrid,
    max_load: Variable,
    subjects: &[Subject],
    groups_index: &ConflictIndex,
    teachers_index: &ConflictIndex,
) -> Vec<ModelConstraint> {
    let num_slots = grid.num_slots();
    let mut constraints = Vec::new();

    trace!("Adding 'exact hours' constraints...");
    for (i, subject) in subjects.iter().enumerate() {
        let taught: Expression = grid.row(i).sum();
        let hours = f64::from(subject.hours);
        constraints.push(ModelConstraint {
            kind: ConstraintKind::Hours { subject: i },
            constraint: constraint!(taught == hours),
        });
    }

    trace!("Adding 'no group overlap' constraints...");
    for (group, members) in groups_index {
        for j in 0..num_slots {
            constraints.push(ModelConstraint {
                kind: ConstraintKind::Group {
                    group: group.clone(),
                    slot: j,
                },
                constraint: at_most_one(grid, members, j),
            });
        }
    }

    trace!("Adding 'no teacher overlap' constraints...");
    for (teacher, members) in teachers_index {
        for j in 0..num_slots {
            constraints.push(ModelConstraint {
                kind: ConstraintKind::Teacher {
                    teacher: teacher.clone(),
                    slot: j,
                },
                constraint: at_most_one(grid, members, j),
            });
        }
    }

    trace!("Adding 'slot load under MaxLoad' constraints...");
    for j in 0..num_slots {
        let load: Expression = grid.column(j).sum();
        constraints.push(ModelConstraint {
            kind: ConstraintKind::Load { slot: j },
            constraint: constraint!(load <= max_load),
        });
    }

    constraints
}

fn at_most_one(grid: &VariableGrid, members: &[SubjectIndex], slot: SlotIndex) -> Constraint {
    let busy: Expression = members.iter().map(|&i| grid.get(i, slot)).sum();
    constraint!(busy <= 1)
}

/// Minimise the peak load; the optimum is the number of classrooms required.
pub fn build_objective(max_load: Variable) -> Expression {
    Expression::from(max_load)
}
