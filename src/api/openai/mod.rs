pub mod client;
pub mod models;

pub use client::OpenAiClient;
pub use models::{
    ChatCompletionRequest, ChatMessage, FunctionDefinition, OpenAiError, ToolDefinition,
};
