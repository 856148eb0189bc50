//! Execution engine for hfspaces
//!
//! The engine orchestrates:
//! 1. Planning - One change per configured or recorded space
//! 2. Diffing - Show the per-space mutation steps
//! 3. Executing - Run each space's plan, saving state after every space

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ExecuteOptions, ExecuteSummary, execute};
pub use planner::{build_destroy_plan, build_plan};
