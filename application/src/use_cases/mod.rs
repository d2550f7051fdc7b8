//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod consult;
pub mod council;
pub mod expert_loop;
pub mod findings_store;
pub mod parallel;
pub mod pipeline_input;
pub mod reasoning;
pub(crate) mod shared;
pub mod tool_gateway;
