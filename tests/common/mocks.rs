//! Mock implementations for testing.
//!
//! The mock LLM client answers by system prompt: the research prompt gets the
//! configured report, the sources prompt gets the configured sources JSON.
//! It can also fail, stream the report in chunks, or cancel a conversation
//! while a call is in flight. [`ResultHookStore`] wraps a real store to act
//! when a research result is written.

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use scout::db::{NewMessage, ResearchStore};
use scout::llm::{DeltaStream, EmbeddingClient, LLMClient};
use scout::research::prompts::{
    GENERAL_INFO_SYSTEM_PROMPT, RESEARCH_SYSTEM_PROMPT, SOURCES_SYSTEM_PROMPT,
};
use scout::types::{
    AppError, CompanyResearch, Conversation, ConversationStatus, Message, MessageMetadata,
    MigrationReport, ModelKind, NewResearchResult, ResearchResult, ResearchSummary, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Provider call during which the mock cancels the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelPoint {
    Research,
    Sources,
}

struct CancelHook {
    at: CancelPoint,
    store: Arc<dyn ResearchStore>,
    conversation_id: String,
}

pub struct MockLLMClient {
    kind: ModelKind,
    report: String,
    sources: String,
    fail_research: bool,
    fail_sources: bool,
    general_info: Option<String>,
    chunks: Option<Vec<Result<String>>>,
    cancel: Option<CancelHook>,
    research_calls: AtomicUsize,
    sources_calls: AtomicUsize,
    general_info_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLLMClient {
    /// Answers research calls with `report` and source calls with `sources`
    pub fn new(report: &str, sources: &str) -> Self {
        Self {
            kind: ModelKind::Gpt4,
            report: report.to_string(),
            sources: sources.to_string(),
            fail_research: false,
            fail_sources: false,
            general_info: None,
            chunks: None,
            cancel: None,
            research_calls: AtomicUsize::new(0),
            sources_calls: AtomicUsize::new(0),
            general_info_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_kind(mut self, kind: ModelKind) -> Self {
        self.kind = kind;
        self
    }

    /// Every research call fails with a provider error
    pub fn failing_research(mut self) -> Self {
        self.fail_research = true;
        self
    }

    pub fn failing_sources(mut self) -> Self {
        self.fail_sources = true;
        self
    }

    /// Answer general information calls with `text`; without it they fail
    pub fn with_general_info(mut self, text: &str) -> Self {
        self.general_info = Some(text.to_string());
        self
    }

    /// Stream these items instead of the report split at blank lines
    pub fn with_chunks(mut self, chunks: Vec<Result<String>>) -> Self {
        self.chunks = Some(chunks);
        self
    }

    /// Cancel `conversation_id` when the call at `at` is made
    pub fn cancel_at(
        mut self,
        at: CancelPoint,
        store: Arc<dyn ResearchStore>,
        conversation_id: &str,
    ) -> Self {
        self.cancel = Some(CancelHook {
            at,
            store,
            conversation_id: conversation_id.to_string(),
        });
        self
    }

    pub fn research_calls(&self) -> usize {
        self.research_calls.load(Ordering::SeqCst)
    }

    pub fn sources_calls(&self) -> usize {
        self.sources_calls.load(Ordering::SeqCst)
    }

    pub fn general_info_calls(&self) -> usize {
        self.general_info_calls.load(Ordering::SeqCst)
    }

    /// User prompts received by research calls, in order
    pub fn research_prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    async fn maybe_cancel(&self, point: CancelPoint) {
        if let Some(hook) = &self.cancel {
            if hook.at == point {
                hook.store
                    .cancel_conversation(&hook.conversation_id)
                    .await
                    .expect("mock cancel should succeed");
            }
        }
    }

    fn research_failure() -> AppError {
        AppError::provider("Mock", "Service Unavailable")
    }

    /// The report split after each blank line, separators kept
    fn report_chunks(&self) -> Vec<Result<String>> {
        let mut chunks = Vec::new();
        let mut rest = self.report.as_str();
        while let Some(idx) = rest.find("\n\n") {
            chunks.push(Ok(rest[..idx + 2].to_string()));
            rest = &rest[idx + 2..];
        }
        if !rest.is_empty() {
            chunks.push(Ok(rest.to_string()));
        }
        chunks
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        if system == RESEARCH_SYSTEM_PROMPT {
            self.research_calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(prompt.to_string());
            self.maybe_cancel(CancelPoint::Research).await;
            if self.fail_research {
                return Err(Self::research_failure());
            }
            return Ok(self.report.clone());
        }

        if system == SOURCES_SYSTEM_PROMPT {
            self.sources_calls.fetch_add(1, Ordering::SeqCst);
            self.maybe_cancel(CancelPoint::Sources).await;
            if self.fail_sources {
                return Err(AppError::provider("Mock", "Bad Gateway"));
            }
            return Ok(self.sources.clone());
        }

        if system == GENERAL_INFO_SYSTEM_PROMPT {
            self.general_info_calls.fetch_add(1, Ordering::SeqCst);
            return self
                .general_info
                .clone()
                .ok_or_else(|| AppError::provider("Mock", "Service Unavailable"));
        }

        Err(AppError::Internal(format!("unexpected system prompt: {system}")))
    }

    async fn stream_with_system(&self, system: &str, prompt: &str) -> Result<DeltaStream> {
        if system != RESEARCH_SYSTEM_PROMPT {
            return Err(AppError::Internal("unexpected streaming prompt".to_string()));
        }
        self.research_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        self.maybe_cancel(CancelPoint::Research).await;
        if self.fail_research {
            return Err(Self::research_failure());
        }

        let items = match &self.chunks {
            Some(chunks) => chunks
                .iter()
                .map(|item| match item {
                    Ok(text) => Ok(text.clone()),
                    Err(e) => Err(AppError::Internal(e.to_string())),
                })
                .collect(),
            None => self.report_chunks(),
        };
        Ok(Box::new(stream::iter(items)))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn kind(&self) -> ModelKind {
        self.kind
    }
}

/// Embeds every text as a constant vector, or always fails
pub struct MockEmbeddings {
    pub should_fail: bool,
}

#[async_trait]
impl EmbeddingClient for MockEmbeddings {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        if self.should_fail {
            return Err(AppError::provider("OpenAI embeddings", "Too Many Requests"));
        }
        Ok(vec![0.25; 8])
    }
}

/// What [`ResultHookStore`] does when a research result is written
pub enum ResultHook {
    /// Store the result, then cancel this conversation
    CancelConversation(String),
    /// Reject the write with a database error
    Fail,
}

/// Delegates to `inner`, except around `create_research_result`
pub struct ResultHookStore {
    inner: Arc<dyn ResearchStore>,
    hook: ResultHook,
}

impl ResultHookStore {
    pub fn new(inner: Arc<dyn ResearchStore>, hook: ResultHook) -> Self {
        Self { inner, hook }
    }
}

#[async_trait]
impl ResearchStore for ResultHookStore {
    async fn create_conversation(
        &self,
        title: &str,
        status: ConversationStatus,
    ) -> Result<Conversation> {
        self.inner.create_conversation(title, status).await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        self.inner.get_conversation(id).await
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.inner.list_conversations().await
    }

    async fn cancel_conversation(&self, id: &str) -> Result<()> {
        self.inner.cancel_conversation(id).await
    }

    async fn is_cancelled(&self, conversation_id: &str) -> Result<bool> {
        self.inner.is_cancelled(conversation_id).await
    }

    async fn add_message(&self, message: NewMessage) -> Result<Message> {
        self.inner.add_message(message).await
    }

    async fn get_message(&self, id: &str) -> Result<Option<Message>> {
        self.inner.get_message(id).await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.inner.list_messages(conversation_id).await
    }

    async fn update_message(
        &self,
        id: &str,
        content: &str,
        metadata: Option<&MessageMetadata>,
    ) -> Result<()> {
        self.inner.update_message(id, content, metadata).await
    }

    async fn create_research_result(&self, result: NewResearchResult) -> Result<ResearchResult> {
        match &self.hook {
            ResultHook::CancelConversation(conversation_id) => {
                let stored = self.inner.create_research_result(result).await?;
                self.inner.cancel_conversation(conversation_id).await?;
                Ok(stored)
            }
            ResultHook::Fail => Err(AppError::Database("disk I/O error".to_string())),
        }
    }

    async fn list_research_results(&self) -> Result<Vec<ResearchResult>> {
        self.inner.list_research_results().await
    }

    async fn research_summaries(&self, limit: usize) -> Result<Vec<ResearchSummary>> {
        self.inner.research_summaries(limit).await
    }

    async fn toggle_research_result(&self, id: &str) -> Result<bool> {
        self.inner.toggle_research_result(id).await
    }

    async fn update_research_notes(&self, id: &str, notes: &str) -> Result<()> {
        self.inner.update_research_notes(id, notes).await
    }

    async fn delete_research_result(&self, id: &str) -> Result<()> {
        self.inner.delete_research_result(id).await
    }

    async fn store_company_research(&self, research: CompanyResearch) -> Result<String> {
        self.inner.store_company_research(research).await
    }

    async fn company_research_count(&self) -> Result<usize> {
        self.inner.company_research_count().await
    }

    async fn run_migrations(&self) -> Result<MigrationReport> {
        self.inner.run_migrations().await
    }
}
