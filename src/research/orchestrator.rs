//! Background research job
//!
//! One job runs per submitted user message:
//!
//! ```text
//! Started -> InputNormalized -> GeneratedContent -> SectionsExtracted
//!         -> ResultStored -> ResponseStored -> Done
//! ```
//!
//! Cancellation is cooperative. The conversation's persisted `is_cancelled`
//! flag is re-read after every external call; an in-flight provider call
//! always completes and its output is discarded. A stored research result is
//! never rolled back.

use crate::db::{NewMessage, ResearchStore};
use crate::llm::{EmbeddingClient, ProviderRegistry};
use crate::research::extractor::{self, Section};
use crate::research::normalizer::InputNormalizer;
use crate::research::prompts::RESEARCH_SYSTEM_PROMPT;
use crate::research::sources::generate_sources;
use crate::types::{
    AppError, CompanyMetadata, CompanyResearch, Message, MessageMetadata, ModelKind,
    NewResearchResult, Result,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reply written when a job finds its conversation already cancelled
pub const CANCELLED_REPLY: &str = "Research was cancelled.";

/// Assistant reply for a job that failed after it started
pub fn apology(reason: &str) -> String {
    format!(
        "I apologize, but I encountered an error while researching: {}.",
        reason.trim().trim_end_matches('.')
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Started,
    InputNormalized,
    GeneratedContent,
    SectionsExtracted,
    ResultStored,
    ResponseStored,
    Done,
}

/// How a job ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Result and assistant reply both persisted
    Completed { message_id: String, result_id: String },
    /// Stopped at a checkpoint after the given stage
    Cancelled { at: JobStage },
    /// Apology reply written
    Failed { reason: String },
}

/// Re-reads the persisted cancellation flag of one conversation
pub struct CancellationProbe {
    store: Arc<dyn ResearchStore>,
    conversation_id: String,
}

impl CancellationProbe {
    pub fn new(store: Arc<dyn ResearchStore>, conversation_id: &str) -> Self {
        Self {
            store,
            conversation_id: conversation_id.to_string(),
        }
    }

    pub async fn is_cancelled(&self) -> Result<bool> {
        self.store.is_cancelled(&self.conversation_id).await
    }
}

pub struct ResearchOrchestrator {
    store: Arc<dyn ResearchStore>,
    providers: Arc<ProviderRegistry>,
    normalizer: Arc<InputNormalizer>,
    embeddings: Option<Arc<dyn EmbeddingClient>>,
}

impl ResearchOrchestrator {
    pub fn new(
        store: Arc<dyn ResearchStore>,
        providers: Arc<ProviderRegistry>,
        normalizer: Arc<InputNormalizer>,
    ) -> Self {
        Self {
            store,
            providers,
            normalizer,
            embeddings: None,
        }
    }

    /// Cache an embedding of every completed report
    pub fn with_embeddings(mut self, embeddings: Arc<dyn EmbeddingClient>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Run the job for one user message.
    ///
    /// # Errors
    ///
    /// `NotFound` when the message or its conversation does not exist (no
    /// reply can be written), or a store error while writing the terminal
    /// reply. Every other failure becomes [`JobOutcome::Failed`].
    pub async fn run(&self, message_id: &str, model: ModelKind) -> Result<JobOutcome> {
        let message = self
            .store
            .get_message(message_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Message".to_string()))?;

        let conversation = self
            .store
            .get_conversation(&message.conversation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Conversation".to_string()))?;

        if conversation.is_cancelled {
            self.store
                .add_message(NewMessage::assistant(
                    &conversation.id,
                    CANCELLED_REPLY,
                    model,
                ))
                .await?;
            let outcome = JobOutcome::Cancelled {
                at: JobStage::Started,
            };
            info!(message_id, ?outcome, "Research job finished");
            return Ok(outcome);
        }

        let probe = CancellationProbe::new(self.store.clone(), &conversation.id);

        let outcome = match self.execute(&message, model, &probe).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = e.to_string();
                error!(message_id, error = %reason, "Research job failed");
                self.store
                    .add_message(NewMessage::assistant(
                        &conversation.id,
                        &apology(&reason),
                        model,
                    ))
                    .await?;
                JobOutcome::Failed { reason }
            }
        };

        info!(message_id, ?outcome, "Research job finished");
        Ok(outcome)
    }

    async fn execute(
        &self,
        message: &Message,
        model: ModelKind,
        probe: &CancellationProbe,
    ) -> Result<JobOutcome> {
        let llm = self.providers.get(model)?;
        info!(message_id = %message.id, provider = %model, "Research job started");

        let input = self.normalizer.normalize(&message.content, llm.as_ref()).await;
        trace_stage(&message.id, JobStage::InputNormalized);
        if probe.is_cancelled().await? {
            return Ok(cancelled(JobStage::InputNormalized));
        }

        let content = llm
            .generate_with_system(RESEARCH_SYSTEM_PROMPT, &input)
            .await?;
        trace_stage(&message.id, JobStage::GeneratedContent);
        if probe.is_cancelled().await? {
            return Ok(cancelled(JobStage::GeneratedContent));
        }

        if content.trim().is_empty() {
            return Err(AppError::NoContentGenerated);
        }

        let new_result = research_result(&message.content, &content);
        let company_name = new_result.company_name.clone();
        trace_stage(&message.id, JobStage::SectionsExtracted);

        let result = self.store.create_research_result(new_result).await?;
        trace_stage(&message.id, JobStage::ResultStored);

        if probe.is_cancelled().await? {
            return Ok(cancelled(JobStage::ResultStored));
        }

        self.cache_embedding(&company_name, &content).await;

        let sources = generate_sources(llm.as_ref(), &content).await;
        if probe.is_cancelled().await? {
            return Ok(cancelled(JobStage::ResultStored));
        }

        let reply = self
            .store
            .add_message(
                NewMessage::assistant(&message.conversation_id, &content, model)
                    .with_metadata(MessageMetadata { sources }),
            )
            .await?;
        trace_stage(&message.id, JobStage::ResponseStored);
        trace_stage(&message.id, JobStage::Done);

        Ok(JobOutcome::Completed {
            message_id: reply.id,
            result_id: result.id,
        })
    }

    /// Append the report to the embedding cache; failures are logged only
    async fn cache_embedding(&self, name: &str, content: &str) {
        let Some(embeddings) = &self.embeddings else {
            return;
        };

        let embedding = match embeddings.embed(content).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "Embedding failed, skipping company research cache");
                return;
            }
        };

        let metadata = company_metadata(content);
        let research = CompanyResearch {
            name: name.to_string(),
            content: content.to_string(),
            embedding,
            metadata: (metadata != CompanyMetadata::default()).then_some(metadata),
        };
        if let Err(e) = self.store.store_company_research(research).await {
            warn!(error = %e, "Failed to store company research");
        }
    }
}

/// Split a finished report into the fields of a research result
pub(crate) fn research_result(query: &str, content: &str) -> NewResearchResult {
    let report = extractor::extract(content);
    NewResearchResult {
        company_name: query.trim().to_string(),
        business_analysis: report.text(Section::BusinessAnalysis),
        key_people: report.key_people(),
        recent_developments: report.text(Section::RecentDevelopments),
        highlights: report.text(Section::Highlights),
        industry: extractor::overview_field(content, "Industry"),
        funding: extractor::funding(content),
        links: report.links,
    }
}

fn trace_stage(message_id: &str, stage: JobStage) {
    debug!(message_id, ?stage, "Research job advanced");
}

fn cancelled(at: JobStage) -> JobOutcome {
    info!(?at, "Research job observed cancellation");
    JobOutcome::Cancelled { at }
}

fn company_metadata(report: &str) -> CompanyMetadata {
    CompanyMetadata {
        industry: extractor::overview_field(report, "Industry"),
        founded: extractor::overview_field(report, "Founded"),
        headquarters: extractor::overview_field(report, "Headquarters"),
        revenue: extractor::labeled_value(report, "Revenue"),
        employees: extractor::labeled_value(report, "Employees"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apology_format() {
        assert_eq!(
            apology("No research content generated"),
            "I apologize, but I encountered an error while researching: No research content generated."
        );
        assert_eq!(
            apology("Grok API error: Bad Gateway."),
            "I apologize, but I encountered an error while researching: Grok API error: Bad Gateway."
        );
    }

    #[test]
    fn test_company_metadata_from_overview() {
        let report = "🏢 COMPANY OVERVIEW\n• Industry: Fintech\n• Founded: 2019\n\n💼 BUSINESS ANALYSIS\n• Revenue: $5M\n";
        let metadata = company_metadata(report);

        assert_eq!(metadata.industry.as_deref(), Some("Fintech"));
        assert_eq!(metadata.founded.as_deref(), Some("2019"));
        assert_eq!(metadata.headquarters, None);
        assert_eq!(metadata.revenue.as_deref(), Some("$5M"));
    }
}
