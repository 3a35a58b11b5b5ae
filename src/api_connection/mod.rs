pub mod connection;
pub mod content;
pub mod endpoints;

pub use connection::ApiConnectionError;
pub use endpoints::{ChatCompletionRequest, ChatMessage, JsonSchema, Provider, ResponseFormat};
