//! Test utilities for orchestrator tests.
//!
//! This module provides scripted provider and catalog mocks.

#![allow(dead_code)]

pub mod mock_provider;

pub use mock_provider::{MockCatalog, MockResponse, ScriptedProvider};

use remark_core::ModelId;
use remark_rate_limit::{RateGovernor, RemarkConfig};
use std::sync::Arc;

/// Parse a model id.
pub fn model(id: &str) -> ModelId {
    id.parse().expect("valid model id")
}

/// In-memory governor with default tuning (4000ms base delay everywhere).
pub fn governor() -> Arc<RateGovernor> {
    Arc::new(RateGovernor::in_memory(&RemarkConfig::default()))
}
