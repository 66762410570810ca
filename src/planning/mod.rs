pub mod allocation;
pub mod planner;

pub use allocation::{alloc_for_count, alloc_for_signal, choose_profile};
pub use planner::{build_plan, PlanError};
