//! Learning State
//!
//! One mutable session record per learner: the active topic, the learning
//! path, mastery progress, and an append-only history of agent
//! interactions.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Target difficulty for explanations and questions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category of a session history entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Explanation,
    Quiz,
    Feedback,
    Summary,
}

/// Immutable audit record of one agent interaction
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Assigned at append time, never by the caller
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "type")]
    pub kind: HistoryKind,

    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// Per-subtopic mastery tracking. Set semantics: re-evaluating a subtopic
/// does not accumulate duplicates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub completed_subtopics: BTreeSet<String>,
    pub mastered_concepts: BTreeSet<String>,
    pub needs_review: BTreeSet<String>,
}

/// The full mutable state of one learning session
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningState {
    pub current_topic: String,
    pub active_subtopic: String,
    pub learning_path: Vec<String>,
    pub progress: Progress,
    pub session_history: Vec<HistoryEntry>,
    pub difficulty: Difficulty,
    pub last_quiz_score: Option<f32>,
    pub last_quiz_answer: Option<String>,
}

impl LearningState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-initialize to defaults, preserving nothing.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Append a history entry stamped with the current time. If the clock
    /// has not advanced past the previous entry, nudge forward one
    /// nanosecond so timestamps stay strictly increasing.
    pub fn record(&mut self, kind: HistoryKind, content: impl Into<String>, outcome: Option<String>) {
        let mut timestamp = Utc::now();
        if let Some(last) = self.session_history.last() {
            if timestamp <= last.timestamp {
                timestamp = last.timestamp + Duration::nanoseconds(1);
            }
        }
        self.session_history.push(HistoryEntry {
            timestamp,
            kind,
            content: content.into(),
            outcome,
        });
    }

    /// Chronological newline-join of all history content, for use as the
    /// context summary in the next agent input.
    pub fn context_summary(&self) -> String {
        self.session_history
            .iter()
            .map(|entry| entry.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The most recent entry of the given kind.
    pub fn last_entry_of(&self, kind: HistoryKind) -> Option<&HistoryEntry> {
        self.session_history
            .iter()
            .rev()
            .find(|entry| entry.kind == kind)
    }

    /// All entries of the given kind, in chronological order.
    pub fn entries_of(&self, kind: HistoryKind) -> impl Iterator<Item = &HistoryEntry> {
        self.session_history
            .iter()
            .filter(move |entry| entry.kind == kind)
    }

    pub fn has_topic(&self) -> bool {
        !self.current_topic.is_empty()
    }
}
