//! LLM Provider Clients and Abstractions
//!
//! Every research backend sits behind the [`LLMClient`] trait so the research
//! pipeline handles one result shape regardless of provider.
//!
//! # Supported Providers
//!
//! - `gpt4` - OpenAI chat completions (feature `openai`)
//! - `claude` - Anthropic messages API (feature `anthropic`)
//! - `mistral` - Mistral chat completions over HTTP
//! - `grok` - xAI chat completions over HTTP
//!
//! # Streaming
//!
//! All providers support streaming via `stream_with_system`, which returns a
//! [`DeltaStream`] of text deltas. The HTTP providers decode server-sent
//! events with [`sse::SseDeltaDecoder`].

/// Core LLM client trait and provider construction.
pub mod client;
/// Embedding client for the company-research cache.
pub mod embeddings;
/// Registry of constructed provider clients.
pub mod provider_registry;
/// Server-sent event decoding for HTTP providers.
pub mod sse;

mod grok;
mod http;
mod mistral;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub mod anthropic;

pub use client::{DeltaStream, LLMClient, Provider};
pub use embeddings::{EmbeddingClient, OpenAIEmbeddings};
pub use grok::GrokClient;
pub use mistral::MistralClient;
pub use provider_registry::ProviderRegistry;
