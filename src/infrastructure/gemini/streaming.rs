//! SSE decoding for `streamGenerateContent?alt=sse` responses.
//!
//! Events arrive as `data: {json}` blocks separated by blank lines. Chunk
//! boundaries can split events and even UTF-8 codepoints, so raw bytes are
//! buffered and events are cut on the `\n\n` separator before decoding.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

use super::errors::GeminiApiError;
use super::types::GenerateContentResponse;

/// Incremental SSE event splitter over a byte stream.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: BytesMut,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Pop the next complete event block, without the trailing separator.
    fn next_event(&mut self) -> Option<String> {
        let separator = self
            .buffer
            .windows(2)
            .position(|window| window == b"\n\n")?;
        let event = self.buffer.split_to(separator + 2);
        Some(String::from_utf8_lossy(&event[..separator]).into_owned())
    }

    /// Drain all complete events currently buffered, decoded to text deltas.
    /// Events without usable text (keep-alives, empty candidates) are
    /// dropped.
    pub fn drain_text(&mut self) -> Vec<String> {
        let mut deltas = Vec::new();
        while let Some(event) = self.next_event() {
            if let Some(text) = decode_event(&event) {
                deltas.push(text);
            }
        }
        deltas
    }

    /// Decode whatever remains after the upstream closed. A final event is
    /// allowed to arrive without its trailing blank line.
    pub fn finish(&mut self) -> Vec<String> {
        let mut deltas = self.drain_text();
        if !self.buffer.is_empty() {
            let rest = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            if let Some(text) = decode_event(&rest) {
                deltas.push(text);
            }
        }
        deltas
    }
}

/// Extract the text delta from one SSE event block.
fn decode_event(event: &str) -> Option<String> {
    let mut payload = String::new();
    for line in event.lines() {
        if let Some(data) = line.strip_prefix("data:") {
            payload.push_str(data.trim_start());
        }
    }
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    let response: GenerateContentResponse = serde_json::from_str(&payload).ok()?;
    let text = response.text();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Adapt a raw byte stream into a stream of text deltas.
pub fn sse_text_stream<S>(bytes: S) -> impl Stream<Item = Result<String, GeminiApiError>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Unpin,
{
    struct State<S> {
        inner: S,
        parser: SseParser,
        pending: std::collections::VecDeque<String>,
        done: bool,
    }

    futures::stream::unfold(
        State {
            inner: bytes,
            parser: SseParser::new(),
            pending: std::collections::VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(text) = state.pending.pop_front() {
                    return Some((Ok(text), state));
                }
                if state.done {
                    return None;
                }
                match state.inner.next().await {
                    Some(Ok(chunk)) => {
                        state.parser.push(&chunk);
                        state.pending.extend(state.parser.drain_text());
                    }
                    Some(Err(err)) => {
                        state.done = true;
                        return Some((Err(GeminiApiError::Network(err)), state));
                    }
                    None => {
                        state.done = true;
                        state.pending.extend(state.parser.finish());
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> String {
        format!(
            "data: {{\"candidates\":[{{\"content\":{{\"parts\":[{{\"text\":\"{text}\"}}]}}}}]}}\n\n"
        )
    }

    #[test]
    fn test_single_event() {
        let mut parser = SseParser::new();
        parser.push(event("少年握紧了剑柄。").as_bytes());
        assert_eq!(parser.drain_text(), vec!["少年握紧了剑柄。"]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let full = event("风雪夜归人");
        let bytes = full.as_bytes();
        // Split inside a multi-byte codepoint.
        let mid = bytes.len() / 2;
        let mut parser = SseParser::new();
        parser.push(&bytes[..mid]);
        assert!(parser.drain_text().is_empty());
        parser.push(&bytes[mid..]);
        assert_eq!(parser.drain_text(), vec!["风雪夜归人"]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut parser = SseParser::new();
        let chunk = format!("{}{}", event("一"), event("二"));
        parser.push(chunk.as_bytes());
        assert_eq!(parser.drain_text(), vec!["一", "二"]);
    }

    #[test]
    fn test_keepalive_and_done_dropped() {
        let mut parser = SseParser::new();
        parser.push(b": keep-alive\n\ndata: [DONE]\n\n");
        assert!(parser.drain_text().is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut parser = SseParser::new();
        let full = event("结尾");
        parser.push(full.trim_end().as_bytes());
        assert!(parser.drain_text().is_empty());
        assert_eq!(parser.finish(), vec!["结尾"]);
    }

    #[tokio::test]
    async fn test_stream_adapter_yields_deltas_in_order() {
        let chunks: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from(event("第一"))),
            Ok(Bytes::from(event("第二"))),
        ];
        let stream = sse_text_stream(futures::stream::iter(chunks));
        let collected: Vec<String> = stream.map(|item| item.unwrap()).collect().await;
        assert_eq!(collected, vec!["第一", "第二"]);
    }
}
