//! Versioned public API

pub mod chat;
