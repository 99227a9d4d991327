//! services/api/src/adapters/tutor_llm.rs
//!
//! This module contains the adapter for the tutoring LLM.
//! It implements the `GenerativeTextService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig, error::OpenAIError, types::responses::CreateResponseArgs, Client,
};
use async_trait::async_trait;
use tutor_core::ports::{CompletionRequest, GenerativeTextService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerativeTextService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiTutorAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTutorAdapter {
    /// Creates a new `OpenAiTutorAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `GenerativeTextService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerativeTextService for OpenAiTutorAdapter {
    /// Sends the system instruction and the student's question, returning the reply text.
    async fn complete(&self, request: CompletionRequest) -> PortResult<String> {
        let CompletionRequest {
            system_prompt,
            user_message,
            max_tokens,
            temperature,
        } = request;

        let args = CreateResponseArgs::default()
            .model(&self.model)
            .instructions(system_prompt)
            .input(user_message)
            .max_output_tokens(max_tokens)
            .temperature(temperature)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .responses()
            .create(args)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .output_text()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                PortError::Unexpected("Tutor LLM response contained no text content.".to_string())
            })
    }
}
