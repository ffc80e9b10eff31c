//! Typed Agent Contracts
//!
//! One input/output pair per agent. Outputs are never deserialized blindly:
//! each one is mapped out of the gateway's parsed JSON with explicit
//! field-by-field validation, so a contract violation surfaces as
//! [`AgentError::InvalidResponse`] instead of corrupting session state.
//! Extra fields the model volunteers are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::AgentKind;
use crate::error::{AgentError, Result};

/// A validated agent output, tagged at compile time by its agent kind.
pub trait AgentOutput: Sized {
    /// The agent this contract belongs to.
    const KIND: AgentKind;

    /// Map parsed JSON into the typed record, rejecting missing or
    /// wrong-typed required fields.
    fn from_value(value: &Value) -> Result<Self>;
}

fn invalid(kind: AgentKind, reason: impl Into<String>) -> AgentError {
    AgentError::InvalidResponse {
        agent: kind.name().into(),
        reason: reason.into(),
    }
}

fn require_object(value: &Value, kind: AgentKind) -> Result<()> {
    if value.is_object() {
        Ok(())
    } else {
        Err(invalid(kind, "response is not a JSON object"))
    }
}

fn require_str(value: &Value, field: &str, kind: AgentKind) -> Result<String> {
    match value.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(invalid(kind, format!("field '{field}' is empty"))),
        Some(_) => Err(invalid(kind, format!("field '{field}' is not a string"))),
        None => Err(invalid(kind, format!("missing field '{field}'"))),
    }
}

fn require_bool(value: &Value, field: &str, kind: AgentKind) -> Result<bool> {
    match value.get(field) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid(kind, format!("field '{field}' is not a boolean"))),
        None => Err(invalid(kind, format!("missing field '{field}'"))),
    }
}

fn require_str_list(value: &Value, field: &str, kind: AgentKind) -> Result<Vec<String>> {
    match value.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(String::from)
                    .ok_or_else(|| invalid(kind, format!("field '{field}' has a non-string entry")))
            })
            .collect(),
        Some(_) => Err(invalid(kind, format!("field '{field}' is not a list"))),
        None => Err(invalid(kind, format!("missing field '{field}'"))),
    }
}

fn optional_str(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn str_list_or_default(value: &Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Exploration
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorationInput {
    pub user_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_background: Option<String>,
    pub latest_context_summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorationOutput {
    pub subtopics: Vec<String>,
    pub broader_topic: Option<String>,
    pub prerequisites: Vec<String>,
    pub summary: String,
}

impl AgentOutput for ExplorationOutput {
    const KIND: AgentKind = AgentKind::Exploration;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        let subtopics = require_str_list(value, "subtopics", Self::KIND)?;
        if subtopics.is_empty() {
            return Err(invalid(Self::KIND, "field 'subtopics' is empty"));
        }
        Ok(Self {
            subtopics,
            broader_topic: optional_str(value, "broaderTopic"),
            prerequisites: str_list_or_default(value, "prerequisites"),
            summary: require_str(value, "summary", Self::KIND)?,
        })
    }
}

// ============================================================================
// Deep dive
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepDiveInput {
    pub subtopic: String,
    pub broader_topic: String,
    pub difficulty: String,
    pub prior_feedback: Vec<String>,
    pub latest_context_summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepDiveOutput {
    pub breakdown: String,
    pub analogy: Option<String>,
    pub mermaid_diagram: Option<String>,
    pub code_example: Option<String>,
}

impl AgentOutput for DeepDiveOutput {
    const KIND: AgentKind = AgentKind::DeepDive;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        Ok(Self {
            breakdown: require_str(value, "breakdown", Self::KIND)?,
            analogy: optional_str(value, "analogy"),
            mermaid_diagram: optional_str(value, "mermaidDiagram"),
            code_example: optional_str(value, "codeExample"),
        })
    }
}

// ============================================================================
// Interactive
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveInput {
    pub user_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broader_topic: Option<String>,
    pub latest_context_summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveOutput {
    pub response: String,
}

impl AgentOutput for InteractiveOutput {
    const KIND: AgentKind = AgentKind::Interactive;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        Ok(Self {
            response: require_str(value, "response", Self::KIND)?,
        })
    }
}

// ============================================================================
// Question
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub subtopic: String,
    pub broader_topic: String,
    pub difficulty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_quiz_score: Option<f32>,
    pub latest_context_summary: String,
}

/// Shape of quiz question the agent produced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Mcq,
    Open,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutput {
    pub question: String,
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
}

impl AgentOutput for QuestionOutput {
    const KIND: AgentKind = AgentKind::Question;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        let question = require_str(value, "question", Self::KIND)?;

        let question_type = match value.get("questionType").and_then(Value::as_str) {
            Some(t) if t.eq_ignore_ascii_case("mcq") => QuestionType::Mcq,
            _ => QuestionType::Open,
        };

        let options = match question_type {
            QuestionType::Mcq => {
                let options = require_str_list(value, "options", Self::KIND)?;
                if options.is_empty() {
                    return Err(invalid(Self::KIND, "MCQ question has no options"));
                }
                Some(options)
            }
            QuestionType::Open => value
                .get("options")
                .and_then(Value::as_array)
                .map(|_| str_list_or_default(value, "options"))
                .filter(|opts| !opts.is_empty()),
        };

        Ok(Self {
            question,
            question_type,
            options,
            correct_answer: optional_str(value, "correctAnswer"),
            explanation: optional_str(value, "explanation"),
        })
    }
}

// ============================================================================
// Answer evaluation
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvalInput {
    pub subtopic: String,
    pub broader_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_asked: Option<String>,
    pub user_question_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub latest_context_summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvalOutput {
    pub is_correct: bool,
    pub feedback: String,
    pub encouragement: Option<String>,
}

impl AgentOutput for AnswerEvalOutput {
    const KIND: AgentKind = AgentKind::AnswerEval;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        Ok(Self {
            is_correct: require_bool(value, "isCorrect", Self::KIND)?,
            feedback: require_str(value, "feedback", Self::KIND)?,
            encouragement: optional_str(value, "encouragement"),
        })
    }
}

// ============================================================================
// Classifier
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierInput {
    pub user_input: String,
    pub available_agents: Vec<AgentDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierOutput {
    pub next_agent: String,
}

impl AgentOutput for ClassifierOutput {
    const KIND: AgentKind = AgentKind::Classifier;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        Ok(Self {
            next_agent: require_str(value, "nextAgent", Self::KIND)?,
        })
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInput {
    pub request: String,
    pub current_difficulty: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOutput {
    pub prompt_addition: String,
}

impl AgentOutput for ConfigOutput {
    const KIND: AgentKind = AgentKind::Config;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        Ok(Self {
            prompt_addition: optional_str(value, "promptAddition")
                .unwrap_or_else(|| "Configuration updated successfully.".into()),
        })
    }
}

// ============================================================================
// Safety
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyInput {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Safety classification verdict
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyStatus {
    Safe,
    NeedsHelp,
    Inappropriate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyOutput {
    pub status: SafetyStatus,
    pub explanation: String,
}

impl AgentOutput for SafetyOutput {
    const KIND: AgentKind = AgentKind::Safety;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        let status = match value.get("status").and_then(Value::as_str) {
            Some("SAFE") => SafetyStatus::Safe,
            Some("NEEDS_HELP") => SafetyStatus::NeedsHelp,
            Some("INAPPROPRIATE") => SafetyStatus::Inappropriate,
            Some(other) => {
                return Err(invalid(Self::KIND, format!("unknown status '{other}'")));
            }
            None => return Err(invalid(Self::KIND, "missing field 'status'")),
        };
        Ok(Self {
            status,
            explanation: optional_str(value, "explanation").unwrap_or_default(),
        })
    }
}

// ============================================================================
// Flashcards
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

fn flashcard_list(value: &Value, kind: AgentKind) -> Result<Vec<Flashcard>> {
    match value.get("flashcards") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|card| {
                Ok(Flashcard {
                    front: require_str(card, "front", kind)?,
                    back: require_str(card, "back", kind)?,
                })
            })
            .collect(),
        Some(_) => Err(invalid(kind, "field 'flashcards' is not a list")),
        None => Err(invalid(kind, "missing field 'flashcards'")),
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardInput {
    pub concepts: Vec<String>,
    pub latest_context_summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardOutput {
    pub flashcards: Vec<Flashcard>,
}

impl AgentOutput for FlashcardOutput {
    const KIND: AgentKind = AgentKind::Flashcard;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        let flashcards = flashcard_list(value, Self::KIND)?;
        if flashcards.is_empty() {
            return Err(invalid(Self::KIND, "field 'flashcards' is empty"));
        }
        Ok(Self { flashcards })
    }
}

// ============================================================================
// Cheatsheet
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheatsheetInput {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub latest_context_summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheatsheetOutput {
    pub cheatsheet: String,
}

impl AgentOutput for CheatsheetOutput {
    const KIND: AgentKind = AgentKind::Cheatsheet;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        Ok(Self {
            cheatsheet: require_str(value, "cheatsheet", Self::KIND)?,
        })
    }
}

// ============================================================================
// Mermaid
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MermaidInput {
    pub topic: String,
    pub concepts: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MermaidOutput {
    pub mermaid_code: String,
}

impl AgentOutput for MermaidOutput {
    const KIND: AgentKind = AgentKind::Mermaid;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        Ok(Self {
            mermaid_code: optional_str(value, "mermaidCode")
                .unwrap_or_else(|| "graph TD\nA[Topic] --> B[Subtopic]".into()),
        })
    }
}

// ============================================================================
// Summary consolidation
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryInput {
    pub topic: String,
    pub completed_subtopics: Vec<String>,
    pub quiz_history: Vec<String>,
    pub quiz_outcomes: Vec<String>,
    pub latest_context_summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOutput {
    pub summary: String,
    pub key_points: Vec<String>,
    pub struggled_areas: Vec<String>,
    pub success_areas: Vec<String>,
    pub recommended_next_steps: Vec<String>,
}

impl AgentOutput for SummaryOutput {
    const KIND: AgentKind = AgentKind::SummaryConsolidation;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        Ok(Self {
            summary: require_str(value, "summary", Self::KIND)?,
            key_points: str_list_or_default(value, "keyPoints"),
            struggled_areas: str_list_or_default(value, "struggledAreas"),
            success_areas: str_list_or_default(value, "successAreas"),
            recommended_next_steps: str_list_or_default(value, "recommendedNextSteps"),
        })
    }
}

// ============================================================================
// Retention
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionInput {
    pub concepts: Vec<String>,
    pub relationships: Vec<String>,
    pub user_progress: BTreeMap<String, u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionOutput {
    pub flashcards: Vec<Flashcard>,
    pub concept_map: Option<String>,
    pub key_takeaways: Vec<String>,
}

impl AgentOutput for RetentionOutput {
    const KIND: AgentKind = AgentKind::Retention;

    fn from_value(value: &Value) -> Result<Self> {
        require_object(value, Self::KIND)?;
        Ok(Self {
            flashcards: flashcard_list(value, Self::KIND)?,
            concept_map: optional_str(value, "conceptMap"),
            key_takeaways: str_list_or_default(value, "keyTakeaways"),
        })
    }
}
