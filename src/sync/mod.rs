//! Sync planning: from project rules and catalog listings to copy tasks

pub mod glob;
pub mod planner;
pub mod task;

pub use glob::{Glob, GlobSet, matches};
pub use planner::{Plan, PlanFailure, PlanTargets, SyncPlanner};
pub use task::{CopyTask, ImageRef};
