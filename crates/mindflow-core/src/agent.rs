//! Prompt Template Registry
//!
//! Maps each agent name to its static instruction text and to its place in
//! the recovery policy table. Instructions never change at runtime; the
//! registry is lookup only.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::prompts;

/// The agents MindFlow orchestrates. One prompt template and one typed
/// input/output contract per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    Exploration,
    DeepDive,
    Interactive,
    Question,
    AnswerEval,
    Classifier,
    Config,
    Safety,
    Flashcard,
    Cheatsheet,
    Mermaid,
    SummaryConsolidation,
    Retention,
}

impl AgentKind {
    /// All registered agents, in registry order.
    pub const ALL: [AgentKind; 13] = [
        AgentKind::Exploration,
        AgentKind::DeepDive,
        AgentKind::Interactive,
        AgentKind::Question,
        AgentKind::AnswerEval,
        AgentKind::Classifier,
        AgentKind::Config,
        AgentKind::Safety,
        AgentKind::Flashcard,
        AgentKind::Cheatsheet,
        AgentKind::Mermaid,
        AgentKind::SummaryConsolidation,
        AgentKind::Retention,
    ];

    /// Registry identifier for this agent.
    pub fn name(self) -> &'static str {
        match self {
            AgentKind::Exploration => "exploration",
            AgentKind::DeepDive => "deep-dive",
            AgentKind::Interactive => "interactive",
            AgentKind::Question => "question",
            AgentKind::AnswerEval => "answer-eval",
            AgentKind::Classifier => "classifier",
            AgentKind::Config => "config",
            AgentKind::Safety => "safety",
            AgentKind::Flashcard => "flashcard",
            AgentKind::Cheatsheet => "cheatsheet",
            AgentKind::Mermaid => "mermaid",
            AgentKind::SummaryConsolidation => "summary-consolidation",
            AgentKind::Retention => "retention",
        }
    }

    /// One-line description, used to build the classifier's agent list.
    pub fn description(self) -> &'static str {
        match self {
            AgentKind::Exploration => "Opens a new topic and maps the learning path",
            AgentKind::DeepDive => "Explains one subtopic in depth",
            AgentKind::Interactive => "Free-form tutoring conversation",
            AgentKind::Question => "Poses a quiz question on a subtopic",
            AgentKind::AnswerEval => "Grades a quiz answer and gives feedback",
            AgentKind::Classifier => "Routes input to the right agent",
            AgentKind::Config => "Adjusts tutoring style preferences",
            AgentKind::Safety => "Classifies content for safety concerns",
            AgentKind::Flashcard => "Builds flashcards from covered material",
            AgentKind::Cheatsheet => "Compresses the session into a reference sheet",
            AgentKind::Mermaid => "Draws concept relationships as a diagram",
            AgentKind::SummaryConsolidation => "Produces the end-of-session summary",
            AgentKind::Retention => "Creates memory aids for studied concepts",
        }
    }

    /// Static instruction text for this agent.
    pub fn instructions(self) -> &'static str {
        match self {
            AgentKind::Exploration => prompts::EXPLORATION_INSTRUCTIONS,
            AgentKind::DeepDive => prompts::DEEP_DIVE_INSTRUCTIONS,
            AgentKind::Interactive => prompts::INTERACTIVE_INSTRUCTIONS,
            AgentKind::Question => prompts::QUESTION_INSTRUCTIONS,
            AgentKind::AnswerEval => prompts::ANSWER_EVAL_INSTRUCTIONS,
            AgentKind::Classifier => prompts::CLASSIFIER_INSTRUCTIONS,
            AgentKind::Config => prompts::CONFIG_INSTRUCTIONS,
            AgentKind::Safety => prompts::SAFETY_INSTRUCTIONS,
            AgentKind::Flashcard => prompts::FLASHCARD_INSTRUCTIONS,
            AgentKind::Cheatsheet => prompts::CHEATSHEET_INSTRUCTIONS,
            AgentKind::Mermaid => prompts::MERMAID_INSTRUCTIONS,
            AgentKind::SummaryConsolidation => prompts::SUMMARY_CONSOLIDATION_INSTRUCTIONS,
            AgentKind::Retention => prompts::RETENTION_INSTRUCTIONS,
        }
    }

    /// Look up an agent by registry name.
    pub fn from_name(name: &str) -> Option<AgentKind> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Recovery policy table: the synthetic output to substitute when this
    /// agent's call fails ambiguously (unparseable output or a provider
    /// safety refusal). Agents without an entry propagate the error.
    pub fn fallback(self, input: &Value) -> Option<Value> {
        match self {
            AgentKind::Exploration => {
                let topic = input
                    .get("userPrompt")
                    .and_then(Value::as_str)
                    .unwrap_or("your topic");
                Some(json!({
                    "subtopics": ["Basic Overview"],
                    "broaderTopic": topic,
                    "prerequisites": [],
                    "summary": "I apologize, but I encountered an error processing your request. Let's start with the basics.",
                }))
            }
            AgentKind::Safety => Some(json!({
                "status": "NEEDS_HELP",
                "explanation": "Support resources available",
            })),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_roundtrip() {
        for kind in AgentKind::ALL {
            assert_eq!(AgentKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(AgentKind::from_name("quiz-master"), None);
    }

    #[test]
    fn test_instructions_document_contracts() {
        for kind in AgentKind::ALL {
            let text = kind.instructions();
            assert!(text.contains("INPUT FORMAT"), "{} missing input docs", kind);
            assert!(text.contains("OUTPUT FORMAT"), "{} missing output docs", kind);
        }
    }

    #[test]
    fn test_fallback_table_membership() {
        let input = json!({"userPrompt": "Photosynthesis"});
        assert!(AgentKind::Exploration.fallback(&input).is_some());
        assert!(AgentKind::Safety.fallback(&input).is_some());
        assert!(AgentKind::Question.fallback(&input).is_none());
        assert!(AgentKind::DeepDive.fallback(&input).is_none());
    }

    #[test]
    fn test_exploration_fallback_echoes_topic() {
        let input = json!({"userPrompt": "Photosynthesis"});
        let fallback = AgentKind::Exploration.fallback(&input).unwrap();
        assert_eq!(fallback["broaderTopic"], "Photosynthesis");
        assert_eq!(fallback["subtopics"][0], "Basic Overview");
    }
}
