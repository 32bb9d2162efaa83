//! promptlens
//!
//! HTTP gateway that validates OpenAI and Google Gemini API keys, lists the
//! models a key can use, and turns uploaded images into text prompts through
//! the providers' vision models. Key validation can run synchronously or as
//! a background job polled through an in-memory job registry.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
