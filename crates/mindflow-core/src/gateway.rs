//! Model Gateway
//!
//! Executes exactly one request/response cycle against a model provider:
//! seed the instructions, send the JSON payload, then clean, parse, and
//! validate whatever text comes back. Parse failures and provider safety
//! refusals are indistinguishable to callers; both consult the per-agent
//! recovery policy table before an error is allowed to escape.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};

use crate::agent::AgentKind;
use crate::contract::AgentOutput;
use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{GenerationOptions, ModelProvider};

/// Fixed assistant turn that closes the instruction seed exchange.
const SEED_ACK: &str = "I understand my role and instructions. Ready to process input.";

const FORMAT_INSTRUCTIONS: &str =
    "Return only valid JSON without any markdown formatting or additional text.";

/// Stateless bridge between agent contracts and a model provider.
pub struct ModelGateway {
    provider: Arc<dyn ModelProvider>,
    options: GenerationOptions,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn ModelProvider>, options: GenerationOptions) -> Self {
        Self { provider, options }
    }

    /// Call the agent identified by `O::KIND` and validate its response
    /// against the typed contract.
    pub async fn call<O: AgentOutput>(&self, input: &impl Serialize) -> Result<O> {
        let payload = serde_json::to_value(input)?;
        let raw = self.call_raw(O::KIND, payload).await?;
        O::from_value(&raw)
    }

    /// One full request cycle returning parsed (but not yet validated) JSON.
    async fn call_raw(&self, kind: AgentKind, payload: Value) -> Result<Value> {
        let messages = seed_exchange(kind.instructions(), &decorate_payload(payload.clone()))?;

        let outcome = match self.provider.generate(&messages, &self.options).await {
            Ok(completion) => parse_completion(&completion.content),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(value) => Ok(value),
            Err(err) if err.is_safety_ambiguous() => match kind.fallback(&payload) {
                Some(synthetic) => {
                    tracing::warn!(agent = %kind, error = %err, "substituting fallback output");
                    Ok(synthetic)
                }
                None => {
                    tracing::error!(agent = %kind, error = %err, "agent call failed");
                    Err(err)
                }
            },
            Err(err) => {
                tracing::error!(agent = %kind, error = %err, "agent call failed");
                Err(err)
            }
        }
    }
}

/// Instructions as a seeded user turn, a fixed acknowledgement, then the
/// JSON payload as the live user turn.
fn seed_exchange(instructions: &str, payload: &Value) -> Result<Vec<Message>> {
    Ok(vec![
        Message::user(instructions),
        Message::assistant(SEED_ACK),
        Message::user(serde_json::to_string(payload)?),
    ])
}

fn decorate_payload(mut payload: Value) -> Value {
    if let Some(map) = payload.as_object_mut() {
        map.insert("responseFormat".into(), json!("json"));
        map.insert("formatInstructions".into(), json!(FORMAT_INSTRUCTIONS));
    }
    payload
}

/// Strip markdown code fences, then parse; if that fails, retry on the
/// outermost `{...}` span.
fn parse_completion(text: &str) -> Result<Value> {
    let cleaned = strip_code_fences(text);

    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(first_err) => match extract_braced(&cleaned).and_then(|span| {
            serde_json::from_str::<Value>(span).ok()
        }) {
            Some(value) => Ok(value),
            None => Err(AgentError::Parse(format!(
                "completion is not valid JSON: {first_err}"
            ))),
        },
    }
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn extract_braced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{
        ExplorationInput, ExplorationOutput, QuestionInput, QuestionOutput, SafetyInput,
        SafetyOutput, SafetyStatus,
    };
    use crate::provider::Completion;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider fake that replays a queue of canned outcomes.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<std::result::Result<String, AgentError>>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<std::result::Result<String, AgentError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
            })
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn generate(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("scripted provider exhausted"));
            reply.map(|content| Completion {
                content,
                model: options.model.clone(),
                usage: None,
                finish_reason: None,
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn gateway(replies: Vec<std::result::Result<String, AgentError>>) -> ModelGateway {
        ModelGateway::new(ScriptedProvider::new(replies), GenerationOptions::default())
    }

    fn exploration_input() -> ExplorationInput {
        ExplorationInput {
            user_prompt: "Photosynthesis".into(),
            user_background: None,
            latest_context_summary: String::new(),
        }
    }

    fn question_input() -> QuestionInput {
        QuestionInput {
            subtopic: "Light Reactions".into(),
            broader_topic: "Photosynthesis".into(),
            difficulty: "beginner".into(),
            last_quiz_score: None,
            latest_context_summary: String::new(),
        }
    }

    #[test]
    fn test_fenced_payload_parses_identically() {
        let plain = r#"{"subtopics": ["A"], "summary": "s"}"#;
        let fenced = format!("```json\n{plain}\n```");
        assert_eq!(
            parse_completion(plain).unwrap(),
            parse_completion(&fenced).unwrap()
        );
    }

    #[test]
    fn test_brace_extraction_recovery() {
        let noisy = "Here is your answer:\n{\"summary\": \"ok\"}\nHope that helps!";
        let value = parse_completion(noisy).unwrap();
        assert_eq!(value["summary"], "ok");
    }

    #[test]
    fn test_unparseable_completion_is_parse_error() {
        let err = parse_completion("not json at all").unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn test_seed_exchange_shape() {
        let payload = decorate_payload(json!({"userPrompt": "Photosynthesis"}));
        let messages = seed_exchange("INSTRUCTIONS", &payload).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "INSTRUCTIONS");
        assert_eq!(messages[1].content, SEED_ACK);
        assert!(messages[2].content.contains("\"responseFormat\":\"json\""));
        assert!(messages[2].content.contains("Photosynthesis"));
    }

    #[tokio::test]
    async fn test_exploration_falls_back_on_garbage() {
        let gw = gateway(vec![Ok("complete nonsense".into())]);
        let out: ExplorationOutput = gw.call(&exploration_input()).await.unwrap();
        assert_eq!(out.subtopics, vec!["Basic Overview"]);
        assert_eq!(out.broader_topic.as_deref(), Some("Photosynthesis"));
    }

    #[tokio::test]
    async fn test_question_propagates_parse_error() {
        let gw = gateway(vec![Ok("not json at all".into())]);
        let result: Result<QuestionOutput> = gw.call(&question_input()).await;
        assert!(matches!(result.unwrap_err(), AgentError::Parse(_)));
    }

    #[tokio::test]
    async fn test_safety_refusal_becomes_needs_help() {
        let gw = gateway(vec![Err(AgentError::SafetyDeclined("SAFETY".into()))]);
        let input = SafetyInput {
            content: "I want to hurt myself".into(),
            context: None,
        };
        let out: SafetyOutput = gw.call(&input).await.unwrap();
        assert_eq!(out.status, SafetyStatus::NeedsHelp);
    }

    #[tokio::test]
    async fn test_network_error_is_never_recovered() {
        let gw = gateway(vec![Err(AgentError::Network("connection reset".into()))]);
        let result: Result<ExplorationOutput> = gw.call(&exploration_input()).await;
        assert!(matches!(result.unwrap_err(), AgentError::Network(_)));
    }

    #[tokio::test]
    async fn test_contract_violation_skips_fallback() {
        // Valid JSON with an empty subtopic list: this is an InvalidResponse,
        // not a parse failure, so the exploration fallback must not engage.
        let gw = gateway(vec![Ok(r#"{"subtopics": [], "summary": "s"}"#.into())]);
        let result: Result<ExplorationOutput> = gw.call(&exploration_input()).await;
        assert!(matches!(result.unwrap_err(), AgentError::InvalidResponse { .. }));
    }
}
