//! Streaming research replies
//!
//! The gateway forwards provider deltas to an HTTP client while keeping one
//! assistant message per stream up to date in the store. Persistence runs on
//! its own task, so a disconnected client does not lose the reply.

use crate::db::{NewMessage, ResearchStore};
use crate::llm::ProviderRegistry;
use crate::research::normalizer::InputNormalizer;
use crate::research::orchestrator::{apology, research_result, CancellationProbe};
use crate::research::prompts::RESEARCH_SYSTEM_PROMPT;
use crate::research::sources::generate_sources;
use crate::types::{AppError, Message, MessageMetadata, ModelKind, Result};
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const CHANNEL_CAPACITY: usize = 64;

/// How a stream ended
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Completed {
        message_id: String,
        result_id: String,
    },
    /// Forwarding stopped; the last checkpointed content stays
    Cancelled,
    Failed {
        reason: String,
    },
}

/// The single assistant message owned by one stream
struct ReplyWriter {
    store: Arc<dyn ResearchStore>,
    conversation_id: String,
    model: ModelKind,
    message_id: Option<String>,
    written: String,
}

impl ReplyWriter {
    fn new(store: Arc<dyn ResearchStore>, conversation_id: &str, model: ModelKind) -> Self {
        Self {
            store,
            conversation_id: conversation_id.to_string(),
            model,
            message_id: None,
            written: String::new(),
        }
    }

    /// Insert the reply the first time, overwrite it afterwards
    async fn write(&mut self, content: &str, metadata: Option<MessageMetadata>) -> Result<String> {
        let id = match &self.message_id {
            Some(id) => {
                self.store
                    .update_message(id, content, metadata.as_ref())
                    .await?;
                id.clone()
            }
            None => {
                let mut message =
                    NewMessage::assistant(&self.conversation_id, content, self.model);
                if let Some(metadata) = metadata {
                    message = message.with_metadata(metadata);
                }
                let stored = self.store.add_message(message).await?;
                self.message_id = Some(stored.id.clone());
                stored.id
            }
        };
        self.written = content.to_string();
        Ok(id)
    }

    /// Content to store for a failed stream: the apology after whatever was
    /// already checkpointed
    fn with_apology(&self, apology: &str) -> String {
        if self.written.trim().is_empty() {
            apology.to_string()
        } else {
            format!("{}\n\n{}", self.written.trim_end(), apology)
        }
    }
}

pub struct StreamingGateway {
    store: Arc<dyn ResearchStore>,
    providers: Arc<ProviderRegistry>,
    normalizer: Arc<InputNormalizer>,
    streams: Mutex<Vec<JoinHandle<()>>>,
}

impl StreamingGateway {
    pub fn new(
        store: Arc<dyn ResearchStore>,
        providers: Arc<ProviderRegistry>,
        normalizer: Arc<InputNormalizer>,
    ) -> Self {
        Self {
            store,
            providers,
            normalizer,
            streams: Mutex::new(Vec::new()),
        }
    }

    /// Look up the message a stream is requested for
    pub async fn open(&self, message_id: &str) -> Result<Message> {
        self.store
            .get_message(message_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Message".to_string()))
    }

    /// Spawn the stream task and hand back the receiving end of its deltas
    pub fn start(self: &Arc<Self>, message: Message, content: String) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let gateway = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let message_id = message.id.clone();
            if let Err(e) = gateway.run(message, &content, tx).await {
                error!(message_id, error = %e, "Research stream could not record its reply");
            }
        });

        let mut streams = self.streams.lock();
        streams.retain(|stream| !stream.is_finished());
        streams.push(handle);
        rx
    }

    /// Streams started and not yet finished
    pub fn in_flight(&self) -> usize {
        self.streams
            .lock()
            .iter()
            .filter(|stream| !stream.is_finished())
            .count()
    }

    /// Wait until every started stream has written its final reply
    pub async fn wait_idle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = self.streams.lock().drain(..).collect();
            if pending.is_empty() {
                return;
            }
            for stream in pending {
                if let Err(e) = stream.await {
                    error!(error = %e, "Research stream panicked");
                }
            }
        }
    }

    /// Stream a reply for `message`, sending each delta to `tx`.
    ///
    /// Send failures only stop forwarding; the reply is still persisted.
    pub async fn run(
        &self,
        message: Message,
        content: &str,
        tx: mpsc::Sender<String>,
    ) -> Result<StreamOutcome> {
        let probe = CancellationProbe::new(self.store.clone(), &message.conversation_id);
        let mut writer =
            ReplyWriter::new(self.store.clone(), &message.conversation_id, message.model);

        let outcome = match self
            .stream_reply(&message, content, &probe, &tx, &mut writer)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = e.to_string();
                error!(message_id = %message.id, error = %reason, "Research stream failed");
                let text = apology(&reason);
                if tx.send(text.clone()).await.is_err() {
                    debug!(message_id = %message.id, "Client gone before the apology was sent");
                }
                // Partial content stays in front of the apology
                let stored = writer.with_apology(&text);
                writer.write(&stored, None).await?;
                StreamOutcome::Failed { reason }
            }
        };

        info!(message_id = %message.id, ?outcome, "Research stream finished");
        Ok(outcome)
    }

    async fn stream_reply(
        &self,
        message: &Message,
        content: &str,
        probe: &CancellationProbe,
        tx: &mpsc::Sender<String>,
        writer: &mut ReplyWriter,
    ) -> Result<StreamOutcome> {
        let llm = self.providers.get(message.model)?;

        let input = self.normalizer.normalize(content, llm.as_ref()).await;
        if probe.is_cancelled().await? {
            return Ok(StreamOutcome::Cancelled);
        }

        let mut stream = llm
            .stream_with_system(RESEARCH_SYSTEM_PROMPT, &input)
            .await?;

        let mut accumulated = String::new();
        let mut forwarding = true;

        while let Some(item) = stream.next().await {
            let delta = match item {
                Ok(delta) => delta,
                Err(e) => {
                    warn!(message_id = %message.id, error = %e, "Skipping bad stream item");
                    continue;
                }
            };
            accumulated.push_str(&delta);

            let checkpoint = delta.contains("\n\n");
            if forwarding && tx.send(delta).await.is_err() {
                debug!(message_id = %message.id, "Client disconnected, persisting only");
                forwarding = false;
            }

            if checkpoint {
                writer.write(&accumulated, None).await?;
                if probe.is_cancelled().await? {
                    return Ok(StreamOutcome::Cancelled);
                }
            }
        }

        if accumulated.trim().is_empty() {
            return Err(AppError::NoContentGenerated);
        }

        let sources = generate_sources(llm.as_ref(), &accumulated).await;
        let reply_id = writer
            .write(&accumulated, Some(MessageMetadata { sources }))
            .await?;

        let result = self
            .store
            .create_research_result(research_result(content, &accumulated))
            .await?;

        Ok(StreamOutcome::Completed {
            message_id: reply_id,
            result_id: result.id,
        })
    }
}
