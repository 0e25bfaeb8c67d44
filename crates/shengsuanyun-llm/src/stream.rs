//! Server-sent event stream reassembly
//!
//! The router streams `data: <json>` lines terminated by `data: [DONE]`.
//! Byte chunks split lines (and UTF-8 sequences) at arbitrary points, and
//! a tool call's JSON arguments arrive in fragments spread over many
//! events. [`StreamReassembler`] owns the line buffer and the per-index
//! tool-call accumulators for exactly one stream.

use std::collections::{BTreeMap, VecDeque};
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};

use crate::error::LlmError;
use crate::protocol::ChatCompletionResponse;
use crate::types::{AiMessage, FunctionCall, ToolCall, ToolCallChunk};
use crate::types::message::default_tool_type;

/// Stream of message increments, one per decoded event
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<AiMessage, LlmError>> + Send>>;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Counters for lines that produced no increment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Increments emitted
    pub events: usize,
    /// `data:` lines whose payload was not a valid event
    pub malformed: usize,
    /// Valid events without `choices[0].delta`
    pub without_delta: usize,
    /// Non-empty lines without the `data:` prefix (comments, `event:` fields)
    pub ignored_lines: usize,
}

/// Tool call being assembled in one accumulator slot
#[derive(Debug, Clone)]
struct ToolCallBuilder {
    id: String,
    tool_type: String,
    name: String,
    arguments: String,
}

impl ToolCallBuilder {
    fn start(chunk: &ToolCallChunk) -> Self {
        Self {
            id: chunk.id.clone().unwrap_or_default(),
            tool_type: chunk.tool_type.clone().unwrap_or_else(default_tool_type),
            name: String::new(),
            arguments: String::new(),
        }
    }

    fn append(&mut self, chunk: &ToolCallChunk) {
        let Some(function) = &chunk.function else {
            return;
        };
        if let Some(name) = &function.name {
            self.name.push_str(name);
        }
        if let Some(arguments) = &function.arguments {
            self.arguments.push_str(arguments);
        }
    }

    fn snapshot(&self, index: u32) -> ToolCall {
        ToolCall {
            id: self.id.clone(),
            tool_type: self.tool_type.clone(),
            function: FunctionCall {
                name: self.name.clone(),
                arguments: self.arguments.clone(),
            },
            index: Some(index),
        }
    }
}

enum Line {
    Event(AiMessage),
    Done,
    Skipped,
}

/// Incremental decoder for one event stream
///
/// Feed raw body chunks to [`push`](Self::push); each complete `data:` line
/// holding an event with a delta yields one [`AiMessage`]. Once `[DONE]`
/// is seen every further byte is ignored. The state is single-reader and
/// lives only as long as the stream it decodes.
#[derive(Debug, Default)]
pub struct StreamReassembler {
    /// Bytes of an incomplete UTF-8 sequence carried to the next chunk
    pending: Vec<u8>,
    /// Text after the last newline
    buffer: String,
    tool_calls: BTreeMap<u32, ToolCallBuilder>,
    done: bool,
    stats: StreamStats,
}

impl StreamReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one body chunk, returning the increments it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<AiMessage> {
        if self.done {
            return Vec::new();
        }

        self.decode(chunk);

        // Lines are read in place; the consumed prefix is removed once.
        let buffer = std::mem::take(&mut self.buffer);
        let mut messages = Vec::new();
        let mut start = 0;
        while let Some(offset) = buffer[start..].find('\n') {
            let end = start + offset;
            let line = &buffer[start..end];
            start = end + 1;

            match self.process_line(line) {
                Line::Event(message) => messages.push(message),
                Line::Skipped => {}
                Line::Done => {
                    self.done = true;
                    self.pending.clear();
                    return messages;
                }
            }
        }

        self.buffer = buffer;
        self.buffer.drain(..start);
        messages
    }

    /// Whether the `[DONE]` sentinel has been seen
    pub const fn is_done(&self) -> bool {
        self.done
    }

    pub const fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Every tool call assembled so far, ordered by slot index
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.tool_calls
            .iter()
            .map(|(&index, builder)| builder.snapshot(index))
            .collect()
    }

    /// Append decoded text to the line buffer
    ///
    /// Invalid sequences become U+FFFD; a sequence cut off at the end of
    /// the chunk waits for the next one.
    fn decode(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        let mut consumed = 0;
        while consumed < self.pending.len() {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    consumed = self.pending.len();
                }
                Err(e) => {
                    let valid_end = consumed + e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[consumed..valid_end]));
                    consumed = valid_end;

                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            consumed += len;
                        }
                        None => break,
                    }
                }
            }
        }

        self.pending.drain(..consumed);
    }

    fn process_line(&mut self, line: &str) -> Line {
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            if !line.trim().is_empty() {
                self.stats.ignored_lines += 1;
                tracing::trace!(line, "ignoring non-data line");
            }
            return Line::Skipped;
        };

        let data = payload.trim();
        if data == DONE_SENTINEL {
            return Line::Done;
        }

        let event = match serde_json::from_str::<ChatCompletionResponse>(data) {
            Ok(event) => event,
            Err(e) => {
                self.stats.malformed += 1;
                let err = LlmError::Parse(e.to_string());
                tracing::debug!(error = %err, "skipping stream event");
                return Line::Skipped;
            }
        };

        let Some(delta) = event.first_choice().and_then(|choice| choice.delta.as_ref()) else {
            self.stats.without_delta += 1;
            tracing::trace!("skipping stream event without delta");
            return Line::Skipped;
        };

        for chunk in delta.tool_calls.iter().flatten() {
            let index = chunk.index.unwrap_or(0);
            self.tool_calls
                .entry(index)
                .or_insert_with(|| ToolCallBuilder::start(chunk))
                .append(chunk);
        }

        self.stats.events += 1;
        Line::Event(AiMessage::from_delta(event, self.tool_calls()))
    }
}

struct State {
    body: Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>,
    reassembler: StreamReassembler,
    ready: VecDeque<AiMessage>,
    finished: bool,
}

/// Turn a response body into a stream of message increments
///
/// Ends after `[DONE]`, at the end of the body, or after yielding the first
/// transport error. Dropping the returned stream drops the body, which
/// stops further reads from the connection.
pub fn reassemble<S, E>(body: S) -> ChatStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<LlmError>,
{
    let state = State {
        body: Box::pin(body.map(|chunk| chunk.map_err(Into::into))),
        reassembler: StreamReassembler::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(message) = state.ready.pop_front() {
                return Some((Ok(message), state));
            }

            if state.finished || state.reassembler.is_done() {
                let stats = state.reassembler.stats();
                tracing::debug!(
                    events = stats.events,
                    malformed = stats.malformed,
                    without_delta = stats.without_delta,
                    ignored_lines = stats.ignored_lines,
                    tool_calls = state.reassembler.tool_calls.len(),
                    "stream finished"
                );
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let messages = state.reassembler.push(&chunk);
                    state.ready.extend(messages);
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "stream interrupted");
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => state.finished = true,
            }
        }
    }))
}
