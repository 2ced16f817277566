//! LLM integration for docqa.
//!
//! Defines the generation client abstraction and provider implementations.
//! Answer synthesis talks to a provider exclusively through the
//! [`LlmClient`] trait; the provider is selected at runtime by
//! [`create_client`].

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
