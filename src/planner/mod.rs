//! Iterative retrieval-refinement: expand the goal, search, rerank with
//! feedback, and summarize.

pub mod capability;
mod domain;
pub mod refine;

pub use domain::Domain;
pub use refine::{LoopPolicy, PlanError, RefineRequest, RefinementOutcome, StopReason, refine};
