//! Routine generation — one prompt, one completion call, no retries.

use std::sync::Arc;

use crate::config::CoachConfig;
use crate::conversation::Profile;
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::script::{STEPS, SYSTEM_INSTRUCTION};

/// Stateless wrapper over the LLM provider that turns a completed profile
/// into a WhatsApp-ready routine.
pub struct RoutineGenerator {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
    max_output_tokens: u32,
}

impl RoutineGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &CoachConfig) -> Self {
        Self {
            llm,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Build the generation prompt from the accumulated profile.
    pub fn build_prompt(profile: &Profile) -> String {
        format!(
            "Por favor crea una rutina de calistenia personalizada para el siguiente perfil:\n\n\
             {}\n\n\
             Genera la respuesta completa en formato texto para WhatsApp (usando *negritas*, emojis, etc.).\n\
             No incluyas saludos genéricos como \"Claro, aquí tienes la rutina\", empieza directamente con el saludo motivador personalizado para el cliente.",
            profile.to_prompt_section(STEPS)
        )
    }

    /// Generate the routine. Single attempt; errors bubble to the caller,
    /// which degrades to the fixed apology.
    pub async fn generate(&self, profile: &Profile) -> Result<String, LlmError> {
        let messages = vec![
            ChatMessage::system(SYSTEM_INSTRUCTION),
            ChatMessage::user(Self::build_prompt(profile)),
        ];
        let request = CompletionRequest::new(messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_output_tokens);

        let response = self.llm.complete(request).await?;

        let routine = response.content.trim().to_string();
        if routine.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: response.model,
                reason: "empty completion".to_string(),
            });
        }

        tracing::info!(
            model = %response.model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "routine generated"
        );
        Ok(routine)
    }
}
