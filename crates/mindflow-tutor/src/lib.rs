//! # mindflow-tutor
//!
//! Learning-session orchestration for MindFlow: the per-session state
//! machine, the tutor operations that sequence agent calls through the
//! model gateway, and the safety-escalation path that substitutes
//! crisis-support content for risky or ambiguous responses.
//!
//! ## Flow
//!
//! ```text
//! caller → TutorSession op → build agent input from LearningState
//!        → ModelGateway call → validate typed response
//!        → update LearningState → typed result
//! ```

pub mod orchestrator;
pub mod safety;
pub mod state;

pub use orchestrator::{TopicStart, TutorSession};
pub use safety::{
    CrisisResources, GeoResourceLookup, ResourceLookup, SafetyReport, StaticResourceLookup,
};
pub use state::{Difficulty, HistoryEntry, HistoryKind, LearningState, Progress};
