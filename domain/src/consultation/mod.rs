//! Consultation domain
//!
//! A [`request::ConsultationRequest`] goes in, a
//! [`result::ConsultationResult`] comes out. In between, council runs pass
//! through the phases in [`phase::CouncilPhase`], driven by a
//! [`plan::CouncilPlan`] and cross-examined through
//! [`review::ReviewVerdict`]s.

pub mod phase;
pub mod plan;
pub mod request;
pub mod result;
pub mod review;
