//! Agent Orchestrator
//!
//! The public session API. Each operation builds an agent input from the
//! learning state, routes it through the model gateway, validates the
//! typed response, then updates state and returns the result. State is
//! only touched after a call has fully validated, so a failed call leaves
//! the session exactly as it was.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use mindflow_core::contract::{
    AgentDescriptor, AnswerEvalInput, AnswerEvalOutput, CheatsheetInput, CheatsheetOutput,
    ClassifierInput, ClassifierOutput, ConfigInput, ConfigOutput, DeepDiveInput, DeepDiveOutput,
    ExplorationInput, ExplorationOutput, FlashcardInput, FlashcardOutput, InteractiveInput,
    InteractiveOutput, MermaidInput, MermaidOutput, QuestionInput, QuestionOutput, RetentionInput,
    RetentionOutput, SafetyInput, SafetyOutput, SafetyStatus, SummaryInput, SummaryOutput,
};
use mindflow_core::{AgentError, AgentKind, ModelGateway, Result};

use crate::safety::{CrisisResources, ResourceLookup, SafetyReport, default_resources};
use crate::state::{Difficulty, HistoryKind, LearningState};

/// Response to a newly started topic: the overview plus the next-step
/// prompt presented to the learner.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStart {
    pub overview: String,
    pub subtopics: Vec<String>,
    pub prerequisites: Vec<String>,
    pub user_prompt: String,
}

/// One learner's tutoring session. All operations are sequential; the
/// caller must not issue a new call while one is in flight.
pub struct TutorSession {
    gateway: ModelGateway,
    state: LearningState,
    resources: Arc<dyn ResourceLookup>,
    user_ip: Option<String>,
    style_addendum: Option<String>,
}

impl TutorSession {
    pub fn new(
        gateway: ModelGateway,
        resources: Arc<dyn ResourceLookup>,
        user_ip: Option<String>,
    ) -> Self {
        Self {
            gateway,
            state: LearningState::new(),
            resources,
            user_ip,
            style_addendum: None,
        }
    }

    /// Read-only snapshot of the session state.
    pub fn state(&self) -> &LearningState {
        &self.state
    }

    /// Caller-driven difficulty change. The orchestrator never escalates
    /// difficulty on its own.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.state.difficulty = difficulty;
    }

    fn require_topic(&self) -> Result<()> {
        if self.state.has_topic() {
            Ok(())
        } else {
            Err(AgentError::Session("no active topic".into()))
        }
    }

    /// Context handed to the next agent call. Derived strictly from
    /// history appended before this point; the in-flight call's own output
    /// is never part of its context.
    fn context_summary(&self) -> String {
        let summary = self.state.context_summary();
        match &self.style_addendum {
            Some(addendum) if summary.is_empty() => format!("Learner preference: {addendum}"),
            Some(addendum) => format!("Learner preference: {addendum}\n{summary}"),
            None => summary,
        }
    }

    /// Begin a new learning topic. On success the previous session state
    /// is fully discarded.
    pub async fn start_new_topic(
        &mut self,
        topic: &str,
        user_background: Option<&str>,
    ) -> Result<TopicStart> {
        let input = ExplorationInput {
            user_prompt: topic.into(),
            user_background: user_background.map(String::from),
            latest_context_summary: String::new(),
        };
        let exploration: ExplorationOutput = self.gateway.call(&input).await?;

        self.state.reset();
        self.state.current_topic = topic.into();
        self.state.learning_path = exploration.subtopics.clone();
        self.state
            .record(HistoryKind::Explanation, exploration.summary.clone(), None);

        tracing::info!(topic, subtopics = exploration.subtopics.len(), "topic started");

        Ok(TopicStart {
            user_prompt: compose_next_step(topic, &exploration.subtopics),
            overview: exploration.summary,
            subtopics: exploration.subtopics,
            prerequisites: exploration.prerequisites,
        })
    }

    /// Explain one subtopic. The returned breakdown is the reassembled
    /// markdown document, which is also what lands in history.
    pub async fn explanation(&mut self, subtopic: &str) -> Result<DeepDiveOutput> {
        self.require_topic()?;

        let input = DeepDiveInput {
            subtopic: subtopic.into(),
            broader_topic: self.state.current_topic.clone(),
            difficulty: self.state.difficulty.as_str().into(),
            prior_feedback: self
                .state
                .entries_of(HistoryKind::Feedback)
                .map(|entry| entry.content.clone())
                .collect(),
            latest_context_summary: self.context_summary(),
        };
        let mut explanation: DeepDiveOutput = self.gateway.call(&input).await?;

        explanation.breakdown = format_explanation(subtopic, &explanation);
        self.state.active_subtopic = subtopic.into();
        self.state
            .record(HistoryKind::Explanation, explanation.breakdown.clone(), None);

        Ok(explanation)
    }

    /// Pose a quiz question on a subtopic. The expected answer is kept for
    /// grading; a failed call leaves it untouched.
    pub async fn quiz_question(&mut self, subtopic: &str) -> Result<QuestionOutput> {
        self.require_topic()?;

        let input = QuestionInput {
            subtopic: subtopic.into(),
            broader_topic: self.state.current_topic.clone(),
            difficulty: self.state.difficulty.as_str().into(),
            last_quiz_score: self.state.last_quiz_score,
            latest_context_summary: self.context_summary(),
        };
        let question: QuestionOutput = self.gateway.call(&input).await?;

        self.state
            .record(HistoryKind::Quiz, question.question.clone(), None);
        self.state.last_quiz_answer = question.correct_answer.clone();

        Ok(question)
    }

    /// Grade the learner's answer and fold the verdict into progress.
    pub async fn feedback(
        &mut self,
        subtopic: &str,
        user_answer: &str,
        correct_answer: Option<&str>,
    ) -> Result<AnswerEvalOutput> {
        self.require_topic()?;

        let input = AnswerEvalInput {
            subtopic: subtopic.into(),
            broader_topic: self.state.current_topic.clone(),
            question_asked: self
                .state
                .last_entry_of(HistoryKind::Quiz)
                .map(|entry| entry.content.clone()),
            user_question_answer: user_answer.into(),
            correct_answer: correct_answer
                .map(String::from)
                .or_else(|| self.state.last_quiz_answer.clone()),
            latest_context_summary: self.context_summary(),
        };
        let evaluation: AnswerEvalOutput = self.gateway.call(&input).await?;

        let outcome = if evaluation.is_correct {
            "correct"
        } else {
            "incorrect"
        };
        self.state.record(
            HistoryKind::Feedback,
            evaluation.feedback.clone(),
            Some(outcome.into()),
        );

        if evaluation.is_correct {
            self.state.progress.mastered_concepts.insert(subtopic.into());
        } else {
            self.state.progress.needs_review.insert(subtopic.into());
        }
        self.state.progress.completed_subtopics.insert(subtopic.into());
        self.state.last_quiz_score = Some(if evaluation.is_correct { 1.0 } else { 0.0 });

        Ok(evaluation)
    }

    /// Close the session with a structured recap.
    pub async fn session_summary(&mut self) -> Result<SummaryOutput> {
        self.require_topic()?;

        let input = SummaryInput {
            topic: self.state.current_topic.clone(),
            completed_subtopics: self
                .state
                .progress
                .completed_subtopics
                .iter()
                .cloned()
                .collect(),
            quiz_history: self
                .state
                .entries_of(HistoryKind::Quiz)
                .map(|entry| entry.content.clone())
                .collect(),
            quiz_outcomes: self
                .state
                .entries_of(HistoryKind::Feedback)
                .map(|entry| entry.outcome.clone().unwrap_or_else(|| "unknown".into()))
                .collect(),
            latest_context_summary: self.context_summary(),
        };
        let summary: SummaryOutput = self.gateway.call(&input).await?;

        self.state
            .record(HistoryKind::Summary, summary.summary.clone(), None);

        Ok(summary)
    }

    /// Generate memory aids. Read-only: repeated calls with unchanged state
    /// and identical model output return identical structures.
    pub async fn retention_aids(&self, concepts: &[String]) -> Result<RetentionOutput> {
        let input = RetentionInput {
            concepts: concepts.to_vec(),
            relationships: self
                .state
                .entries_of(HistoryKind::Explanation)
                .map(|entry| entry.content.clone())
                .collect(),
            user_progress: concepts
                .iter()
                .map(|concept| {
                    let mastered = self.state.progress.mastered_concepts.contains(concept);
                    (concept.clone(), u8::from(mastered))
                })
                .collect::<BTreeMap<_, _>>(),
        };
        self.gateway.call(&input).await
    }

    /// Classify content for crisis or abuse signals. Never fails: any
    /// error from the classifier degrades to a needs-help verdict, and
    /// resource resolution bottoms out in built-in defaults.
    pub async fn check_content_safety(&self, content: &str, context: Option<&str>) -> SafetyReport {
        let input = SafetyInput {
            content: content.into(),
            context: context.map(String::from),
        };

        let verdict: SafetyOutput = match self.gateway.call(&input).await {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::warn!(error = %err, "safety classification failed, escalating");
                SafetyOutput {
                    status: SafetyStatus::NeedsHelp,
                    explanation: "Support resources available".into(),
                }
            }
        };

        if verdict.status == SafetyStatus::Safe {
            return SafetyReport::safe(verdict.explanation);
        }

        let resources = self.resolve_resources().await;
        SafetyReport::escalated(verdict.status, verdict.explanation, &resources)
    }

    async fn resolve_resources(&self) -> CrisisResources {
        match self.resources.resolve(self.user_ip.as_deref()).await {
            Ok(resources) if !resources.is_empty() => resources,
            Ok(_) => default_resources(),
            Err(err) => {
                tracing::warn!(error = %err, "resource lookup failed, retrying without location");
                match self.resources.resolve(None).await {
                    Ok(resources) if !resources.is_empty() => resources,
                    _ => default_resources(),
                }
            }
        }
    }

    /// Route free-form input to the agent best suited to handle it. An
    /// answer outside the registry falls back to the interactive agent.
    pub async fn classify_next_agent(&self, user_input: &str) -> Result<AgentKind> {
        let input = ClassifierInput {
            user_input: user_input.into(),
            available_agents: AgentKind::ALL
                .into_iter()
                .filter(|kind| *kind != AgentKind::Classifier)
                .map(|kind| AgentDescriptor {
                    name: kind.name().into(),
                    description: kind.description().into(),
                })
                .collect(),
        };
        let choice: ClassifierOutput = self.gateway.call(&input).await?;

        Ok(AgentKind::from_name(choice.next_agent.trim())
            .filter(|kind| *kind != AgentKind::Classifier)
            .unwrap_or(AgentKind::Interactive))
    }

    /// Free-form tutoring turn inside the current topic.
    pub async fn interactive_turn(&self, user_message: &str) -> Result<InteractiveOutput> {
        let input = InteractiveInput {
            user_message: user_message.into(),
            broader_topic: self
                .state
                .has_topic()
                .then(|| self.state.current_topic.clone()),
            latest_context_summary: self.context_summary(),
        };
        self.gateway.call(&input).await
    }

    /// Translate a style preference into an instruction addendum that
    /// rides along in the context of subsequent agent calls.
    pub async fn configure(&mut self, request: &str) -> Result<ConfigOutput> {
        let input = ConfigInput {
            request: request.into(),
            current_difficulty: self.state.difficulty.as_str().into(),
        };
        let config: ConfigOutput = self.gateway.call(&input).await?;

        self.style_addendum = Some(config.prompt_addition.clone());
        Ok(config)
    }

    /// Build flashcards for the given concepts.
    pub async fn flashcards(&self, concepts: &[String]) -> Result<FlashcardOutput> {
        let input = FlashcardInput {
            concepts: concepts.to_vec(),
            latest_context_summary: self.context_summary(),
        };
        self.gateway.call(&input).await
    }

    /// Compress the session into a one-page reference.
    pub async fn cheatsheet(&self) -> Result<CheatsheetOutput> {
        self.require_topic()?;

        let input = CheatsheetInput {
            topic: self.state.current_topic.clone(),
            subtopics: self.state.learning_path.clone(),
            latest_context_summary: self.context_summary(),
        };
        self.gateway.call(&input).await
    }

    /// Draw the learning path's concept relationships as a diagram.
    pub async fn concept_diagram(&self) -> Result<MermaidOutput> {
        self.require_topic()?;

        let input = MermaidInput {
            topic: self.state.current_topic.clone(),
            concepts: self.state.learning_path.clone(),
        };
        self.gateway.call(&input).await
    }
}

fn compose_next_step(topic: &str, subtopics: &[String]) -> String {
    let mut prompt = format!("Here's the path we'll take through {topic}:\n");
    for (index, subtopic) in subtopics.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", index + 1, subtopic));
    }
    prompt.push_str("\nWhich subtopic would you like to start with?");
    prompt
}

/// Reassemble the deep-dive pieces into one markdown document. Optional
/// sections only appear when the agent produced them.
fn format_explanation(subtopic: &str, explanation: &DeepDiveOutput) -> String {
    let mut doc = format!("# {subtopic}\n\n{}", explanation.breakdown);

    if let Some(analogy) = &explanation.analogy {
        doc.push_str(&format!("\n\n## Analogy\n{analogy}"));
    }
    if let Some(diagram) = &explanation.mermaid_diagram {
        doc.push_str(&format!("\n\n## Diagram\n```mermaid\n{diagram}\n```"));
    }
    if let Some(code) = &explanation.code_example {
        doc.push_str(&format!("\n\n## Code Example\n```\n{code}\n```"));
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::StaticResourceLookup;
    use async_trait::async_trait;
    use mindflow_core::provider::{Completion, GenerationOptions, ModelProvider};
    use mindflow_core::{Message, Result as CoreResult};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider fake that replays canned outcomes and records the JSON
    /// payload of every request it sees.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<std::result::Result<String, AgentError>>>,
        payloads: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<std::result::Result<String, AgentError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                payloads: Mutex::new(Vec::new()),
            })
        }

        fn last_payload(&self) -> String {
            self.payloads.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn generate(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> CoreResult<Completion> {
            self.payloads
                .lock()
                .unwrap()
                .push(messages.last().unwrap().content.clone());
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

        async fn health_check(&self) -> CoreResult<bool> {
            Ok(true)
        }
    }

    fn session(provider: Arc<ScriptedProvider>) -> TutorSession {
        TutorSession::new(
            ModelGateway::new(provider, GenerationOptions::default()),
            Arc::new(StaticResourceLookup),
            None,
        )
    }

    const MAPPER_REPLY: &str = r#"{
        "subtopics": ["Light Reactions", "Dark Reactions"],
        "summary": "Overview text",
        "prerequisites": []
    }"#;

    #[tokio::test]
    async fn test_start_new_topic_initializes_state() {
        let provider = ScriptedProvider::new(vec![Ok(MAPPER_REPLY.into())]);
        let mut session = session(provider);

        let start = session.start_new_topic("Photosynthesis", None).await.unwrap();

        assert_eq!(
            session.state().learning_path,
            vec!["Light Reactions", "Dark Reactions"]
        );
        assert_eq!(session.state().current_topic, "Photosynthesis");
        assert_eq!(session.state().session_history.len(), 1);

        let entry = &session.state().session_history[0];
        assert_eq!(entry.kind, HistoryKind::Explanation);
        assert_eq!(entry.content, "Overview text");

        assert_eq!(start.overview, "Overview text");
        assert!(start.user_prompt.contains("1. Light Reactions"));
        assert!(start.user_prompt.contains("2. Dark Reactions"));
    }

    #[tokio::test]
    async fn test_restart_discards_previous_session() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok(r#"{"isCorrect": true, "feedback": "Well done"}"#.into()),
            Ok(r#"{"subtopics": ["Momentum"], "summary": "Physics overview", "prerequisites": []}"#
                .into()),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        session
            .feedback("Light Reactions", "chlorophyll", None)
            .await
            .unwrap();
        session.start_new_topic("Physics", None).await.unwrap();

        let state = session.state();
        assert_eq!(state.current_topic, "Physics");
        assert_eq!(state.learning_path, vec!["Momentum"]);
        assert!(state.progress.mastered_concepts.is_empty());
        assert!(state.progress.completed_subtopics.is_empty());
        assert_eq!(state.session_history.len(), 1);
        assert_eq!(state.session_history[0].content, "Physics overview");
    }

    #[tokio::test]
    async fn test_failed_topic_start_leaves_state_untouched() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Err(AgentError::Network("connection reset".into())),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        let err = session.start_new_topic("Physics", None).await.unwrap_err();

        assert!(matches!(err, AgentError::Network(_)));
        assert_eq!(session.state().current_topic, "Photosynthesis");
        assert_eq!(session.state().session_history.len(), 1);
    }

    #[tokio::test]
    async fn test_explanation_formats_optional_sections() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok(r#"{
                "breakdown": "Chlorophyll absorbs light.",
                "analogy": "Like solar panels on a roof.",
                "codeExample": "energy = photons * efficiency"
            }"#
            .into()),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        let explanation = session.explanation("Light Reactions").await.unwrap();

        assert!(explanation.breakdown.starts_with("# Light Reactions"));
        assert!(explanation.breakdown.contains("## Analogy"));
        assert!(explanation.breakdown.contains("## Code Example"));
        assert!(!explanation.breakdown.contains("## Diagram"));

        assert_eq!(session.state().active_subtopic, "Light Reactions");
        assert_eq!(session.state().session_history.len(), 2);
        assert_eq!(
            session.state().session_history[1].content,
            explanation.breakdown
        );
    }

    #[tokio::test]
    async fn test_explanation_requires_topic() {
        let provider = ScriptedProvider::new(vec![]);
        let mut session = session(provider);
        let err = session.explanation("Light Reactions").await.unwrap_err();
        assert!(matches!(err, AgentError::Session(_)));
    }

    #[tokio::test]
    async fn test_invalid_explanation_mutates_nothing() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok(r#"{"analogy": "no breakdown field"}"#.into()),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        let err = session.explanation("Light Reactions").await.unwrap_err();

        assert!(matches!(err, AgentError::InvalidResponse { .. }));
        assert_eq!(session.state().session_history.len(), 1);
        assert!(session.state().active_subtopic.is_empty());
    }

    #[tokio::test]
    async fn test_quiz_appends_history_and_stores_answer() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok(r#"{
                "question": "What pigment absorbs light?",
                "questionType": "MCQ",
                "options": ["Chlorophyll", "Keratin"],
                "correctAnswer": "Chlorophyll"
            }"#
            .into()),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        let question = session.quiz_question("Light Reactions").await.unwrap();

        assert_eq!(question.options.as_ref().unwrap().len(), 2);
        assert_eq!(
            session.state().last_quiz_answer.as_deref(),
            Some("Chlorophyll")
        );
        let quiz_entry = session.state().last_entry_of(HistoryKind::Quiz).unwrap();
        assert_eq!(quiz_entry.content, "What pigment absorbs light?");
    }

    #[tokio::test]
    async fn test_malformed_quiz_never_touches_stored_answer() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok("not json at all".into()),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        session.state.last_quiz_answer = Some("previous answer".into());

        let err = session.quiz_question("Light Reactions").await.unwrap_err();

        assert!(err.is_safety_ambiguous());
        assert_eq!(
            session.state().last_quiz_answer.as_deref(),
            Some("previous answer")
        );
        assert!(session.state().last_entry_of(HistoryKind::Quiz).is_none());
    }

    #[tokio::test]
    async fn test_incorrect_feedback_updates_review_set() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok(r#"{"isCorrect": false, "feedback": "Not quite..."}"#.into()),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        let evaluation = session
            .feedback("Light Reactions", "wrong answer", None)
            .await
            .unwrap();

        assert!(!evaluation.is_correct);
        let state = session.state();
        assert!(state.progress.needs_review.contains("Light Reactions"));
        assert!(state.progress.mastered_concepts.is_empty());
        assert!(state.progress.completed_subtopics.contains("Light Reactions"));
        assert_eq!(state.last_quiz_score, Some(0.0));

        let entry = state.last_entry_of(HistoryKind::Feedback).unwrap();
        assert_eq!(entry.content, "Not quite...");
        assert_eq!(entry.outcome.as_deref(), Some("incorrect"));
    }

    #[tokio::test]
    async fn test_correct_feedback_updates_mastered_set() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok(r#"{"isCorrect": true, "feedback": "Exactly right."}"#.into()),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        session
            .feedback("Light Reactions", "chlorophyll", Some("chlorophyll"))
            .await
            .unwrap();

        let state = session.state();
        assert!(state.progress.mastered_concepts.contains("Light Reactions"));
        assert!(state.progress.needs_review.is_empty());
        assert_eq!(state.last_quiz_score, Some(1.0));
    }

    #[tokio::test]
    async fn test_history_timestamps_strictly_increase() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok(r#"{"breakdown": "Light is captured."}"#.into()),
            Ok(r#"{"question": "How?", "questionType": "OPEN"}"#.into()),
            Ok(r#"{"isCorrect": true, "feedback": "Good."}"#.into()),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        session.explanation("Light Reactions").await.unwrap();
        session.quiz_question("Light Reactions").await.unwrap();
        session.feedback("Light Reactions", "by pigments", None).await.unwrap();

        let history = &session.state().session_history;
        assert_eq!(history.len(), 4);
        for pair in history.windows(2) {
            assert!(pair[1].timestamp > pair[0].timestamp);
        }
    }

    #[tokio::test]
    async fn test_retention_aids_are_read_only_and_idempotent() {
        let retention_reply = r#"{
            "flashcards": [{"front": "ATP?", "back": "Energy currency"}],
            "keyTakeaways": ["Energy flows downhill"]
        }"#;
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok(retention_reply.into()),
            Ok(retention_reply.into()),
        ]);
        let mut session = session(provider);

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        let history_len = session.state().session_history.len();

        let concepts = vec!["Light Reactions".to_string()];
        let first = session.retention_aids(&concepts).await.unwrap();
        let second = session.retention_aids(&concepts).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(session.state().session_history.len(), history_len);
    }

    #[tokio::test]
    async fn test_safety_escalation_bundles_resources() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"{"status": "NEEDS_HELP", "explanation": "crisis signals"}"#.into(),
        )]);
        let session = session(provider);

        let report = session
            .check_content_safety("I want to hurt myself", None)
            .await;

        assert_eq!(report.status, SafetyStatus::NeedsHelp);
        assert!(!report.suggested_resources.is_empty());
        assert!(report.supportive_message.unwrap().contains("tel:"));
    }

    #[tokio::test]
    async fn test_safety_check_never_fails() {
        let provider =
            ScriptedProvider::new(vec![Err(AgentError::Network("connection reset".into()))]);
        let session = session(provider);

        let report = session.check_content_safety("anything", None).await;

        assert_eq!(report.status, SafetyStatus::NeedsHelp);
        assert!(report.supportive_message.is_some());
    }

    #[tokio::test]
    async fn test_safe_content_passes_through() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"{"status": "SAFE", "explanation": "educational"}"#.into(),
        )]);
        let session = session(provider);

        let report = session.check_content_safety("teach me calculus", None).await;

        assert_eq!(report.status, SafetyStatus::Safe);
        assert!(report.supportive_message.is_none());
        assert!(report.suggested_resources.is_empty());
    }

    #[tokio::test]
    async fn test_classifier_falls_back_to_interactive() {
        let provider = ScriptedProvider::new(vec![
            Ok(r#"{"nextAgent": "quiz-master"}"#.into()),
            Ok(r#"{"nextAgent": "deep-dive"}"#.into()),
        ]);
        let session = session(provider);

        let unknown = session.classify_next_agent("quiz me").await.unwrap();
        assert_eq!(unknown, AgentKind::Interactive);

        let known = session.classify_next_agent("explain more").await.unwrap();
        assert_eq!(known, AgentKind::DeepDive);
    }

    #[tokio::test]
    async fn test_context_excludes_in_flight_output() {
        let provider = ScriptedProvider::new(vec![
            Ok(MAPPER_REPLY.into()),
            Ok(r#"{"breakdown": "Fresh explanation body."}"#.into()),
        ]);
        let mut session = session(provider.clone());

        session.start_new_topic("Photosynthesis", None).await.unwrap();
        session.explanation("Light Reactions").await.unwrap();

        let payload: serde_json::Value =
            serde_json::from_str(&provider.last_payload()).unwrap();
        let context = payload["latestContextSummary"].as_str().unwrap();
        assert_eq!(context, "Overview text");
        assert!(!context.contains("Fresh explanation body."));
    }

    #[tokio::test]
    async fn test_configure_threads_preference_into_context() {
        let provider = ScriptedProvider::new(vec![
            Ok(r#"{"promptAddition": "Use simpler vocabulary."}"#.into()),
            Ok(r#"{"response": "Sure, let's keep it simple."}"#.into()),
        ]);
        let mut session = session(provider.clone());

        session.configure("use simpler words").await.unwrap();
        session.interactive_turn("what is osmosis?").await.unwrap();

        let payload: serde_json::Value =
            serde_json::from_str(&provider.last_payload()).unwrap();
        let context = payload["latestContextSummary"].as_str().unwrap();
        assert!(context.contains("Use simpler vocabulary."));
    }
}
