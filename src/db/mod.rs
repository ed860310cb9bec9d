//! Persistence for conversations, messages and research results.
//!
//! - [`traits::ResearchStore`] is the store interface used everywhere else
//! - [`turso::TursoClient`] implements it over libsql (local file or in-memory)

pub mod traits;
pub mod turso;

pub use traits::{DatabaseProvider, NewMessage, ResearchStore};
pub use turso::TursoClient;
