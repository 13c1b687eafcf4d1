//! Infrastructure layer - provider client and logging

pub mod llm;
pub mod logging;
