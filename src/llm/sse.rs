//! Server-sent event decoding for OpenAI-compatible streaming endpoints
//!
//! Mistral and Grok stream `data: {json}` lines terminated by `data: [DONE]`.
//! Bytes are buffered until a full line is available so multi-byte
//! characters split across network chunks decode intact. A line whose payload
//! is not valid JSON is logged and skipped; it never ends the stream.

use crate::llm::client::DeltaStream;
use crate::types::AppError;
use futures::StreamExt;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Incremental decoder turning raw SSE bytes into text deltas.
#[derive(Debug, Default)]
pub struct SseDeltaDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a network chunk, returning every delta completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut deltas = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.done {
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(delta) = self.decode_line(line.trim_end_matches(['\r', '\n'])) {
                deltas.push(delta);
            }
        }
        deltas
    }

    /// Flush a trailing line that arrived without a newline.
    pub fn finish(&mut self) -> Vec<String> {
        if self.buffer.is_empty() || self.done {
            self.buffer.clear();
            return Vec::new();
        }
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        self.decode_line(line.trim_end_matches('\r'))
            .into_iter()
            .collect()
    }

    fn decode_line(&mut self, line: &str) -> Option<String> {
        let data = line.strip_prefix("data:")?.trim_start();
        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => {
                let text: String = chunk
                    .choices
                    .into_iter()
                    .filter_map(|choice| choice.delta.content)
                    .collect();
                (!text.is_empty()).then_some(text)
            }
            Err(e) => {
                warn!(error = %e, line = %data, "Skipping malformed stream line");
                None
            }
        }
    }
}

/// Adapt a streaming HTTP response into a [`DeltaStream`].
pub fn delta_stream(response: reqwest::Response, provider: &'static str) -> DeltaStream {
    let mut bytes = response.bytes_stream();

    let output = async_stream::stream! {
        let mut decoder = SseDeltaDecoder::new();
        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for delta in decoder.push(&chunk) {
                        yield Ok(delta);
                    }
                    if decoder.is_done() {
                        break;
                    }
                }
                Err(e) => {
                    yield Err(AppError::provider(provider, format!("Stream error: {}", e)));
                    break;
                }
            }
        }
        for delta in decoder.finish() {
            yield Ok(delta);
        }
    };

    Box::new(Box::pin(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_line(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_decodes_deltas_and_stops_at_done() {
        let mut decoder = SseDeltaDecoder::new();
        let payload = format!("{}{}data: [DONE]\n", data_line("Hello"), data_line(" world"));

        let deltas = decoder.push(payload.as_bytes());

        assert_eq!(deltas, vec!["Hello".to_string(), " world".to_string()]);
        assert!(decoder.is_done());
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let mut decoder = SseDeltaDecoder::new();
        let payload = format!("{}data: {{not json\n{}", data_line("a"), data_line("b"));

        let deltas = decoder.push(payload.as_bytes());

        assert_eq!(deltas, vec!["a".to_string(), "b".to_string()]);
        assert!(!decoder.is_done());
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut decoder = SseDeltaDecoder::new();
        let line = data_line("💼 BUSINESS ANALYSIS");
        let bytes = line.as_bytes();
        // Split inside the four-byte emoji
        let split = line.find('💼').unwrap() + 2;

        let mut deltas = decoder.push(&bytes[..split]);
        assert!(deltas.is_empty());
        deltas.extend(decoder.push(&bytes[split..]));

        assert_eq!(deltas, vec!["💼 BUSINESS ANALYSIS".to_string()]);
    }

    #[test]
    fn test_ignores_comments_and_role_only_chunks() {
        let mut decoder = SseDeltaDecoder::new();
        let payload = ": keep-alive\n\ndata: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n";

        assert!(decoder.push(payload.as_bytes()).is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDeltaDecoder::new();
        let line = data_line("tail");
        let unterminated = line.trim_end_matches('\n');

        assert!(decoder.push(unterminated.as_bytes()).is_empty());
        assert_eq!(decoder.finish(), vec!["tail".to_string()]);
    }
}
