//! Gemini `generateContent` provider.
//!
//! Wire format: system messages map to `systemInstruction`, user/assistant
//! messages to `contents` with roles `user`/`model`. The first candidate's
//! text parts are concatenated into the completion content.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::CoachConfig;
use crate::error::LlmError;
use crate::llm::{CompletionRequest, CompletionResponse, LlmProvider, Role};

const PROVIDER: &str = "gemini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the Gemini REST API.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

impl GeminiProvider {
    pub fn new(config: &CoachConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_body(&self, request: &CompletionRequest) -> GenerateContentRequest {
        let system_text: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some(
                    match m.role {
                        Role::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: (!system_text.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: system_text.join("\n"),
                }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_body(&request);

        tracing::info!(model = %self.model, messages = request.messages.len(), "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(map_api_error(status, &raw));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&raw).map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("malformed response body: {e}"),
            })?;

        let content: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "no candidate text in response".to_string(),
            });
        }

        let usage = parsed.usage_metadata.unwrap_or(UsageMetadata {
            prompt_token_count: 0,
            candidates_token_count: 0,
        });

        tracing::debug!(
            input_tokens = usage.prompt_token_count,
            output_tokens = usage.candidates_token_count,
            "generateContent ok"
        );

        Ok(CompletionResponse {
            content,
            model: self.model.clone(),
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        })
    }
}

fn map_api_error(status: StatusCode, raw: &str) -> LlmError {
    let detail = serde_json::from_str::<ErrorResponse>(raw)
        .ok()
        .and_then(|e| e.error);
    let reason = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthFailed {
            provider: PROVIDER.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
            provider: PROVIDER.to_string(),
            retry_after: None,
        },
        _ => LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: match detail.as_ref().and_then(|d| d.status.as_ref()) {
                Some(api_status) => format!("{api_status}: {reason}"),
                None => reason,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    fn provider() -> GeminiProvider {
        let config = CoachConfig {
            model: "gemini-2.5-flash".to_string(),
            api_key: SecretString::from("test-key"),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.7,
            max_output_tokens: 4096,
        };
        GeminiProvider::new(&config)
    }

    #[test]
    fn endpoint_targets_the_model() {
        assert_eq!(
            provider().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn system_messages_become_system_instruction() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("Eres un entrenador."),
            ChatMessage::user("Crea una rutina."),
        ])
        .with_temperature(0.7)
        .with_max_tokens(1024);

        let body = provider().build_body(&request);
        let system = body.system_instruction.expect("system instruction");
        assert_eq!(system.parts[0].text, "Eres un entrenador.");
        assert!(system.role.is_none());

        assert_eq!(body.contents.len(), 1);
        assert_eq!(body.contents[0].role.as_deref(), Some("user"));
        assert_eq!(body.contents[0].parts[0].text, "Crea una rutina.");
        assert_eq!(body.generation_config.temperature, Some(0.7));
        assert_eq!(body.generation_config.max_output_tokens, Some(1024));
    }

    #[test]
    fn assistant_messages_map_to_model_role() {
        let request = CompletionRequest::new(vec![
            ChatMessage::user("hola"),
            ChatMessage::assistant("¡hola!"),
        ]);
        let body = provider().build_body(&request);
        assert!(body.system_instruction.is_none());
        assert_eq!(body.contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn request_body_uses_camel_case_wire_names() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("s"),
            ChatMessage::user("u"),
        ])
        .with_max_tokens(64);
        let json = serde_json::to_value(provider().build_body(&request)).unwrap();
        assert!(json.get("systemInstruction").is_some());
        assert!(json["generationConfig"].get("maxOutputTokens").is_some());
        assert!(json["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn response_parsing_extracts_candidate_text() {
        let raw = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Hola "}, {"text": "💪"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "Hola 💪");
        assert_eq!(parsed.usage_metadata.unwrap().prompt_token_count, 12);
    }

    #[test]
    fn error_mapping_by_status() {
        let raw = r#"{"error": {"code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            map_api_error(StatusCode::TOO_MANY_REQUESTS, raw),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            map_api_error(StatusCode::FORBIDDEN, raw),
            LlmError::AuthFailed { .. }
        ));
        match map_api_error(StatusCode::BAD_REQUEST, raw) {
            LlmError::RequestFailed { reason, .. } => {
                assert!(reason.contains("RESOURCE_EXHAUSTED"));
                assert!(reason.contains("quota"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_mapping_survives_junk_bodies() {
        match map_api_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>") {
            LlmError::RequestFailed { reason, .. } => assert!(reason.contains("500")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
