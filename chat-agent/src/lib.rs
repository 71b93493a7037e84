pub mod clients;
pub mod config;
pub mod core;
pub mod input;
pub mod memory;
pub mod render;
pub mod tools;

pub use clients::{
    FunctionDefinition, InferenceRequest, InferenceResponse, LLMClient, LLMError, Message,
    MessageRole, ModelInfo, OpenRouterClient, ToolDefinition,
};
pub use config::{ClientConfig, ConfigError, Credential};
pub use self::core::{Agent, AgentError};
pub use input::{LineSource, ReaderLines, ScriptedLines, stdin_lines};
pub use memory::Conversation;
pub use render::{BlockRenderer, ContentBlock, RendererRegistry, TextRenderer, decompose};
pub use tools::{ToolManager, default_tools};
