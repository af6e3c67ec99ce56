pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod search;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorKind, GatewayError, NodeError, ResearchError};
pub use generator::nodes::{NodeContext, NodeKind};
pub use generator::state::{AgentState, ParagraphState, SearchDocument, SearchRecord};
pub use generator::workflow::{ProgressEvent, ResearchEngine, ResearchOutcome};
pub use llm::{ChatMessage, LLMClient, LlmGateway};
pub use search::{SearchGateway, TavilyClient};
