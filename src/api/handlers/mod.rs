//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Conversation creation, listing and cancellation.
pub mod conversations;
/// Query submission.
pub mod messages;
/// Streaming research replies.
pub mod research;
/// Research history: listing, summaries, notes.
pub mod research_results;
/// Health check and migrations.
pub mod system;
