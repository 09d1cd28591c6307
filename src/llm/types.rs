//! Wire types for text-generation requests

use serde::{Deserialize, Serialize};

/// Decoding parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParameters {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub repetition_penalty: f32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.7,
            repetition_penalty: 1.1,
        }
    }
}

/// A single text-completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmRequest {
    pub inputs: String,
    pub parameters: GenerationParameters,
}

impl LlmRequest {
    pub fn new(inputs: impl Into<String>) -> Self {
        Self {
            inputs: inputs.into(),
            parameters: GenerationParameters::default(),
        }
    }
}

/// One element of the response array
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedText {
    pub generated_text: String,
}

/// Normalized response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    /// Full generated text; usually echoes the prompt before the continuation
    pub text: String,
}

impl LlmResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
