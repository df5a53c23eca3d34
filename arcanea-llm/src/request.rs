//! Request and response shapes for the capability surface

use arcanea_core::{CapabilityError, ValueMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider id used when a content request does not name one.
pub const DEFAULT_PROVIDER_ID: &str = "anthropic-claude";

/// Tuning knobs forwarded to the provider untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Guardian persona biasing the request, if any
    pub guardian: Option<String>,
    /// Anything else the caller wants the provider to see
    #[serde(default, skip_serializing_if = "ValueMap::is_empty")]
    pub extra: ValueMap,
}

/// A single `generate_text` / `generate_image` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub provider_id: String,
    pub prompt: String,
    #[serde(default)]
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(provider_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// An analyze/enhance/transform/validate call over existing content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub provider_id: Option<String>,
    pub guardian: Option<String>,
    /// What to do with the content
    pub instruction: String,
    pub content: Value,
    /// Caller context (trigger context or workflow run context)
    #[serde(default)]
    pub context: Value,
}

impl ContentRequest {
    pub fn new(instruction: impl Into<String>, content: Value) -> Self {
        Self {
            provider_id: None,
            guardian: None,
            instruction: instruction.into(),
            content,
            context: Value::Null,
        }
    }

    pub fn with_guardian(mut self, guardian: impl Into<String>) -> Self {
        self.guardian = Some(guardian.into());
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Fold into a plain text generation, prefixing the instruction with `verb`.
    pub fn into_generation(self, verb: &str) -> GenerationRequest {
        let content = match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let prompt = format!("{} the following. {}\n\n{}", verb, self.instruction, content);
        GenerationRequest {
            provider_id: self
                .provider_id
                .unwrap_or_else(|| DEFAULT_PROVIDER_ID.to_string()),
            prompt,
            options: GenerationOptions {
                guardian: self.guardian,
                ..Default::default()
            },
        }
    }
}

/// Uniform `{success, data?, error?}` reply from every capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CapabilityResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Convert to the payload, treating `success: false` as an error.
    pub fn into_result(self, provider: &str) -> Result<Value, CapabilityError> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(CapabilityError::Rejected {
                provider: provider.to_string(),
                message: self
                    .error
                    .unwrap_or_else(|| "unspecified failure".to_string()),
            })
        }
    }
}
