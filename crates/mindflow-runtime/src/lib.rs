//! # mindflow-runtime
//!
//! Runtime model providers for the MindFlow tutoring service.
//!
//! ## Providers
//!
//! - **Gemini** (default): Google Generative Language API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mindflow_runtime::GeminiProvider;
//!
//! let provider = GeminiProvider::from_env()?;
//! let gateway = ModelGateway::new(Arc::new(provider), options);
//! ```

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiProvider};

// Re-export core types for convenience
pub use mindflow_core::{
    AgentError, AgentKind, GenerationOptions, Message, ModelGateway, ModelProvider, Result, Role,
};
