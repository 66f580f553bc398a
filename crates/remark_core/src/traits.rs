//! Traits implemented by provider adapters.

use crate::{CallOptions, CallResponse, ModelId, Provider};
use async_trait::async_trait;
use remark_error::ProviderResult;

/// Uniform generation capability supplied by vendor adapters.
///
/// The orchestrator treats implementations as opaque. Errors must carry the
/// vendor's human-readable text (status codes, "quota", "retry in Ns"), because
/// that text is all the failure classifier looks at. Network timeouts are the
/// adapter's responsibility.
#[async_trait]
pub trait ProviderCall: Send + Sync {
    /// Generate text for `prompt` with the given model.
    async fn call(
        &self,
        model: &ModelId,
        prompt: &str,
        options: &CallOptions,
    ) -> ProviderResult<CallResponse>;
}

/// Lists the models a credential can use.
///
/// Used as the lightweight probe when validating a key and to disambiguate
/// quota-shaped errors. Providers without a listing endpoint return
/// `ProviderErrorKind::Unsupported`.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Model names (without provider prefix) available for `provider`.
    async fn list_models(&self, provider: Provider) -> ProviderResult<Vec<String>>;
}
