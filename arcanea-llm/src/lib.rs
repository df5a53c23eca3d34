//! Arcanea LLM - Generation Capability Surface
//!
//! Provider-agnostic traits for the generation operations the runtime
//! consumes. The core only chooses a `provider_id` and checks `success`;
//! real provider implementations are supplied by the host application.

mod mock;
mod request;

pub use mock::{Capability, MockGenerationProvider, RecordedCall};
pub use request::{
    CapabilityResponse, ContentRequest, GenerationOptions, GenerationRequest, DEFAULT_PROVIDER_ID,
};

use arcanea_core::CapabilityError;
use async_trait::async_trait;

// ============================================================================
// GENERATION PROVIDER TRAIT
// ============================================================================

/// The external generate/analyze/enhance/transform/validate surface.
/// Implementations must be thread-safe (Send + Sync).
///
/// `Ok` with `success: false` and `Err` are both failures to callers; `Err`
/// is reserved for transport-level problems.
///
/// # Example
/// ```ignore
/// struct ClaudeGateway { /* ... */ }
///
/// #[async_trait]
/// impl GenerationProvider for ClaudeGateway {
///     async fn generate_text(&self, request: GenerationRequest) -> Result<CapabilityResponse, CapabilityError> {
///         // Call the provider named by request.provider_id
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text from a prompt.
    async fn generate_text(
        &self,
        request: GenerationRequest,
    ) -> Result<CapabilityResponse, CapabilityError>;

    /// Generate an image from a prompt.
    async fn generate_image(
        &self,
        request: GenerationRequest,
    ) -> Result<CapabilityResponse, CapabilityError>;

    /// Analyze content. Defaults to a text generation with an analysis prompt.
    async fn analyze(&self, request: ContentRequest) -> Result<CapabilityResponse, CapabilityError> {
        self.generate_text(request.into_generation("Analyze")).await
    }

    /// Improve content. Defaults to a text generation with an enhancement prompt.
    async fn enhance(&self, request: ContentRequest) -> Result<CapabilityResponse, CapabilityError> {
        self.generate_text(request.into_generation("Enhance")).await
    }

    /// Rewrite content. Defaults to a text generation with a transformation prompt.
    async fn transform(
        &self,
        request: ContentRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        self.generate_text(request.into_generation("Transform")).await
    }

    /// Check content. Defaults to a text generation with a validation prompt.
    async fn validate(
        &self,
        request: ContentRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        self.generate_text(request.into_generation("Validate")).await
    }
}
