//! Mock provider for tests and offline runs

use crate::request::{CapabilityResponse, ContentRequest, GenerationRequest, DEFAULT_PROVIDER_ID};
use crate::GenerationProvider;
use arcanea_core::CapabilityError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

/// Which capability a recorded call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    GenerateText,
    GenerateImage,
    Analyze,
    Enhance,
    Transform,
    Validate,
}

/// One call observed by the mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedCall {
    pub capability: Capability,
    pub provider_id: String,
    pub guardian: Option<String>,
    /// Prompt for generations, instruction plus content for content calls
    pub prompt: String,
}

/// Deterministic provider for testing.
///
/// Text generations answer `"[<provider>] <prompt>"` unless a scripted
/// response matches. Rules match on prompt substrings; the first matching
/// error rule wins over failure rules, which win over scripted responses.
#[derive(Debug, Default)]
pub struct MockGenerationProvider {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Vec<(String, Value)>,
    failures: Vec<String>,
    errors: Vec<String>,
    delay: Option<Duration>,
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer with `data` when the prompt contains `needle`.
    pub fn respond_when(mut self, needle: impl Into<String>, data: Value) -> Self {
        self.responses.push((needle.into(), data));
        self
    }

    /// Reply `success: false` when the prompt contains `needle`.
    pub fn fail_when(mut self, needle: impl Into<String>) -> Self {
        self.failures.push(needle.into());
        self
    }

    /// Return a transport error when the prompt contains `needle`.
    pub fn error_when(mut self, needle: impl Into<String>) -> Self {
        self.errors.push(needle.into());
        self
    }

    /// Sleep before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Snapshot of all calls so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Calls that went through one capability.
    pub fn calls_for(&self, capability: Capability) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.capability == capability)
            .collect()
    }

    async fn answer(
        &self,
        call: RecordedCall,
        default: Value,
    ) -> Result<CapabilityResponse, CapabilityError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let prompt = call.prompt.clone();
        let provider = call.provider_id.clone();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }

        if let Some(needle) = self.errors.iter().find(|n| prompt.contains(n.as_str())) {
            return Err(CapabilityError::RequestFailed {
                provider,
                reason: format!("mock error for '{}'", needle),
            });
        }
        if let Some(needle) = self.failures.iter().find(|n| prompt.contains(n.as_str())) {
            return Ok(CapabilityResponse::failure(format!(
                "mock failure for '{}'",
                needle
            )));
        }
        let data = self
            .responses
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, data)| data.clone())
            .unwrap_or(default);
        Ok(CapabilityResponse::ok(data))
    }

    async fn answer_content(
        &self,
        capability: Capability,
        request: ContentRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        let content = match &request.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let provider_id = request
            .provider_id
            .unwrap_or_else(|| DEFAULT_PROVIDER_ID.to_string());
        let prompt = format!("{} {}", request.instruction, content);
        let default = json!(format!("[{:?}:{}] {}", capability, provider_id, prompt));
        self.answer(
            RecordedCall {
                capability,
                provider_id,
                guardian: request.guardian,
                prompt,
            },
            default,
        )
        .await
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate_text(
        &self,
        request: GenerationRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        let default = json!(format!("[{}] {}", request.provider_id, request.prompt));
        self.answer(
            RecordedCall {
                capability: Capability::GenerateText,
                provider_id: request.provider_id,
                guardian: request.options.guardian,
                prompt: request.prompt,
            },
            default,
        )
        .await
    }

    async fn generate_image(
        &self,
        request: GenerationRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        let default = json!({
            "url": format!("mock://{}/image/{}", request.provider_id, self.call_count()),
            "prompt": request.prompt,
        });
        self.answer(
            RecordedCall {
                capability: Capability::GenerateImage,
                provider_id: request.provider_id,
                guardian: request.options.guardian,
                prompt: request.prompt,
            },
            default,
        )
        .await
    }

    async fn analyze(&self, request: ContentRequest) -> Result<CapabilityResponse, CapabilityError> {
        self.answer_content(Capability::Analyze, request).await
    }

    async fn enhance(&self, request: ContentRequest) -> Result<CapabilityResponse, CapabilityError> {
        self.answer_content(Capability::Enhance, request).await
    }

    async fn transform(
        &self,
        request: ContentRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        self.answer_content(Capability::Transform, request).await
    }

    async fn validate(
        &self,
        request: ContentRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        self.answer_content(Capability::Validate, request).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_text_echoes_provider_and_prompt() {
        let mock = MockGenerationProvider::new();
        let resp = mock
            .generate_text(GenerationRequest::new("openai-gpt4", "Describe a storm"))
            .await
            .unwrap();
        assert!(resp.success);
        assert_eq!(resp.data, Some(json!("[openai-gpt4] Describe a storm")));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_response_and_failure_rules() {
        let mock = MockGenerationProvider::new()
            .respond_when("cosmology", json!({"cosmology": "twin suns"}))
            .fail_when("forbidden");

        let ok = mock
            .generate_text(GenerationRequest::new("p", "Build a cosmology"))
            .await
            .unwrap();
        assert_eq!(ok.data, Some(json!({"cosmology": "twin suns"})));

        let failed = mock
            .generate_text(GenerationRequest::new("p", "a forbidden cosmology"))
            .await
            .unwrap();
        assert!(!failed.success);
        assert!(failed.error.unwrap().contains("forbidden"));
    }

    #[tokio::test]
    async fn test_error_rule_returns_err() {
        let mock = MockGenerationProvider::new().error_when("boom");
        let err = mock
            .generate_image(GenerationRequest::new("midjourney", "boom portrait"))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::RequestFailed { .. }));
        assert_eq!(mock.calls_for(Capability::GenerateImage).len(), 1);
    }

    #[tokio::test]
    async fn test_content_calls_are_recorded_by_capability() {
        let mock = MockGenerationProvider::new();
        mock.analyze(ContentRequest::new("Find themes", json!("a tale")).with_guardian("aiyami"))
            .await
            .unwrap();
        mock.validate(ContentRequest::new("Check", json!({"k": 1})))
            .await
            .unwrap();

        let analyzed = mock.calls_for(Capability::Analyze);
        assert_eq!(analyzed.len(), 1);
        assert_eq!(analyzed[0].guardian.as_deref(), Some("aiyami"));
        assert_eq!(mock.calls_for(Capability::Validate)[0].prompt, r#"Check {"k":1}"#);
    }
}
