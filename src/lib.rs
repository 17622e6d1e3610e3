//! Weekly timetabling as a mixed-integer program.
//!
//! Subjects are placed into slots so that no student group or teacher is
//! double-booked, every subject gets exactly its hours, and the peak number
//! of simultaneous classes (the classroom count) is minimised. The model is
//! solved with HiGHS through `good_lp`.

pub mod config;
pub mod data;
pub mod error;
pub mod interpret;
pub mod model;
pub mod server;
pub mod solver;

pub use data::{ScheduleResult, Subject, TimetableInput};
pub use error::{Result, TimetableError};
pub use solver::{SolverSettings, solve};
