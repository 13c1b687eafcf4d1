//! Upstream provider implementation

mod groq;
mod http_client;

pub use groq::GroqProvider;
pub use http_client::{HttpClient, HttpClientTrait, HttpResponse};
