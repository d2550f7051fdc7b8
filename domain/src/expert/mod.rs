//! Expert domain
//!
//! An expert is a role-bound persona ([`role::ExpertRole`]) that runs one
//! bounded agentic session ([`session::ExpertSession`]). Which model decides
//! tool calls and which one writes the analysis is captured by
//! [`strategy::ReasoningStrategy`].

pub mod catalog;
pub mod role;
pub mod session;
pub mod strategy;
