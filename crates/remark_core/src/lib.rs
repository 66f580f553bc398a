//! Core data types for the remark LLM request orchestrator.
//!
//! This crate provides the types shared by the rate governor and the fallback
//! orchestrator, plus the traits provider adapters implement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attempt;
mod call;
mod failure;
mod model_id;
mod traits;

pub use attempt::{AttemptOutcome, AttemptRecord};
pub use call::{CallOptions, CallOptionsBuilder, CallResponse, Completion};
pub use failure::FailureClass;
pub use model_id::{ModelId, Provider};
pub use traits::{ModelCatalog, ProviderCall};
