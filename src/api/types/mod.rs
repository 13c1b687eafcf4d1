//! API request/response types

pub mod chat;
pub mod error;
pub mod json;

pub use chat::{ChatReadyResponse, ChatRequest, ChatResponse, ResponseUsage};
pub use error::{ApiError, ApiErrorBody};
pub use json::Json;
