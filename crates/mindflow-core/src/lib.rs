//! # mindflow-core
//!
//! Core orchestration logic for the MindFlow tutoring service.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ModelGateway                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐  │
//! │  │   Registry   │  │    Typed     │  │   ModelProvider   │  │
//! │  │ (AgentKind)  │──│  Contracts   │──│    (Strategy)     │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ModelProvider` trait enables swapping the remote model backend
//! without changing orchestration logic; every agent response is validated
//! against its typed contract before any session state is touched.

pub mod agent;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod message;
pub mod prompts;
pub mod provider;

pub use agent::AgentKind;
pub use error::{AgentError, Result};
pub use gateway::ModelGateway;
pub use message::{Message, Role};
pub use provider::{Completion, FinishReason, GenerationOptions, ModelProvider, TokenUsage};
