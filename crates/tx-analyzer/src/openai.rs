// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! OpenAI API client for streamed chat completions
//!
//! Requests are sent with `stream: true` and the server-sent event body is
//! decoded incrementally into text deltas. Nothing is retried: a failed
//! request or a broken stream ends the completion.

use std::{collections::VecDeque, time::Duration};

use futures::{
    Stream, StreamExt,
    stream::{self, BoxStream},
};
use reqwest::{
    Client, ClientBuilder,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, error, info, instrument};
use url::Url;
use uuid::Uuid;

use crate::{
    config::OpenAiConfig,
    error::{AnalyzerError, AnalyzerResult},
    types::ChatMessage,
};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const DONE_SENTINEL: &str = "[DONE]";

/// Stream of completion text deltas
pub type DeltaStream = BoxStream<'static, AnalyzerResult<String>>;

/// OpenAI Chat Completion API request
#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

/// One `data:` payload of a streamed completion
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
    error: Option<OpenAiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChunkDelta {
    content: Option<String>,
}

/// OpenAI API error response
#[derive(Debug, Clone, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

/// OpenAI API error details
#[derive(Debug, Clone, Deserialize)]
struct OpenAiError {
    message: String,
    r#type: Option<String>,
    code: Option<String>,
}

/// Incremental decoder for an OpenAI server-sent event stream
///
/// Bytes are buffered until a full line is available, so chunk boundaries may
/// fall anywhere, including inside a multi-byte UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` terminator has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk, returning every text delta completed by it
    pub fn push(&mut self, chunk: &[u8]) -> AnalyzerResult<Vec<String>> {
        self.buffer.extend_from_slice(chunk);

        let mut deltas = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(delta) = self.decode_line(&line)? {
                deltas.push(delta);
            }
        }
        Ok(deltas)
    }

    /// Flush a trailing line that was not newline terminated
    pub fn finish(&mut self) -> AnalyzerResult<Vec<String>> {
        let line = std::mem::take(&mut self.buffer);
        Ok(self.decode_line(&line)?.into_iter().collect())
    }

    fn decode_line(&mut self, line: &[u8]) -> AnalyzerResult<Option<String>> {
        if self.done {
            return Ok(None);
        }

        let line = std::str::from_utf8(line)
            .map_err(|e| AnalyzerError::invalid_response(format!("invalid UTF-8 in stream: {e}")))?
            .trim_end_matches(['\r', '\n']);

        // Blank separators, comments and `event:`/`id:` fields carry no text
        let Some(data) = line.strip_prefix("data:") else {
            return Ok(None);
        };
        let data = data.trim_start();

        if data == DONE_SENTINEL {
            self.done = true;
            return Ok(None);
        }

        let chunk: ChatCompletionChunk = serde_json::from_str(data).map_err(|e| {
            AnalyzerError::invalid_response(format!("failed to parse stream chunk: {e}"))
        })?;

        if let Some(error) = chunk.error {
            return Err(AnalyzerError::openai(error.message));
        }

        Ok(chunk
            .choices
            .into_iter()
            .filter_map(|choice| choice.delta.content)
            .reduce(|mut acc, content| {
                acc.push_str(&content);
                acc
            })
            .filter(|content| !content.is_empty()))
    }
}

/// OpenAI API client for streamed chat completions
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    /// HTTP client for API requests
    client: Client,
    /// Base URL for OpenAI API
    base_url: Url,
    /// Bound on waiting for the response headers
    timeout: Duration,
    /// Chat model
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: OpenAiConfig) -> AnalyzerResult<Self> {
        config.validate()?;

        let base_url = match config.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_API_URL)
                .map_err(|e| AnalyzerError::config(format!("Invalid default URL: {e}")))?,
        };

        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
            .map_err(|e| AnalyzerError::config(format!("Invalid API key format: {e}")))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = ClientBuilder::new()
            .connect_timeout(timeout)
            .default_headers(headers)
            .user_agent("tx-analyzer/0.1.0")
            .build()
            .map_err(|e| AnalyzerError::config(format!("Failed to create HTTP client: {e}")))?;

        info!(
            base_url = %base_url,
            model = %config.model,
            timeout_seconds = config.timeout_seconds,
            "Created OpenAI client"
        );

        Ok(Self {
            client,
            base_url,
            timeout,
            model: config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Configured chat model
    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> AnalyzerResult<Url> {
        // Ensure base URL ends with slash for proper joining
        let mut base_url = self.base_url.clone();
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        base_url
            .join("chat/completions")
            .map_err(|e| AnalyzerError::config(format!("Invalid base URL: {e}")))
    }

    /// Start a streamed completion and return its text deltas
    ///
    /// The returned stream ends at the `[DONE]` terminator or when the body
    /// ends; a decoding or transport error is yielded once and ends it.
    #[instrument(skip(self, messages), fields(model = %self.model, request_id))]
    pub async fn stream_chat(&self, messages: &[ChatMessage]) -> AnalyzerResult<DeltaStream> {
        let request_id = Uuid::new_v4();
        Span::current().record("request_id", request_id.to_string());

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: true,
        };
        let url = self.completions_url()?;

        debug!(
            request_id = %request_id,
            message_count = messages.len(),
            "Starting streamed chat completion"
        );

        let response = tokio::time::timeout(self.timeout, self.client.post(url).json(&request).send())
            .await
            .map_err(|_| AnalyzerError::Timeout {
                timeout_seconds: self.timeout.as_secs(),
            })??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::handle_error_response(status.as_u16(), &body));
        }

        info!(request_id = %request_id, "Chat completion stream opened");
        Ok(Self::decode_stream(response.bytes_stream()))
    }

    fn decode_stream<S, B>(bytes: S) -> DeltaStream
    where
        S: Stream<Item = reqwest::Result<B>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
    {
        let state = (
            Box::pin(bytes),
            SseDecoder::new(),
            VecDeque::<String>::new(),
            false,
        );

        stream::unfold(state, |(mut bytes, mut decoder, mut pending, mut finished)| async move {
            loop {
                if let Some(delta) = pending.pop_front() {
                    return Some((Ok(delta), (bytes, decoder, pending, finished)));
                }
                if finished || decoder.is_done() {
                    return None;
                }

                let decoded = match bytes.next().await {
                    Some(Ok(chunk)) => decoder.push(chunk.as_ref()),
                    Some(Err(e)) => Err(AnalyzerError::from(e)),
                    None => {
                        finished = true;
                        decoder.finish()
                    }
                };

                match decoded {
                    Ok(deltas) => pending.extend(deltas),
                    Err(e) => {
                        error!(error = %e, "Chat completion stream failed");
                        pending.clear();
                        return Some((Err(e), (bytes, decoder, pending, true)));
                    }
                }
            }
        })
        .boxed()
    }

    /// Map an error response from the OpenAI API
    fn handle_error_response(status_code: u16, response_text: &str) -> AnalyzerError {
        let error_msg = match serde_json::from_str::<OpenAiErrorResponse>(response_text) {
            Ok(error_response) => format!(
                "OpenAI API error ({status_code}): {} (type: {:?}, code: {:?})",
                error_response.error.message, error_response.error.r#type, error_response.error.code
            ),
            Err(_) => format!("HTTP {status_code} error: {response_text}"),
        };

        error!("{}", error_msg);

        match status_code {
            401 | 403 => AnalyzerError::authentication(error_msg),
            429 => AnalyzerError::rate_limit(60),
            500..=599 => AnalyzerError::service_unavailable(error_msg),
            _ => AnalyzerError::openai(error_msg),
        }
    }
}
