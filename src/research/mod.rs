//! Company research pipeline
//!
//! A submitted query flows through these stages:
//!
//! 1. [`normalizer`] - fetch a URL or enrich a company name with search snippets
//! 2. a provider call with the prompt from [`prompts`]
//! 3. [`extractor`] - split the report into its marked sections
//! 4. persistence of the research result and the assistant reply, with
//!    citations from [`sources`]
//!
//! [`orchestrator`] runs that as one cancellable background job per message,
//! started by the [`scheduler`]. [`gateway`] is the streaming variant used by
//! `POST /api/research/stream`.

pub mod extractor;
pub mod gateway;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
pub mod scheduler;
pub mod sources;

pub use gateway::{StreamOutcome, StreamingGateway};
pub use normalizer::InputNormalizer;
pub use orchestrator::{JobOutcome, JobStage, ResearchOrchestrator};
pub use scheduler::JobScheduler;
