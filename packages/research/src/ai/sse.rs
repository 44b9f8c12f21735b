//! Incremental SSE parsing shared by the provider streams.
//!
//! Both providers deliver report tokens over server-sent events. The
//! buffer accumulates raw chunks, splits complete lines, and hands back
//! `data:` payloads; partial lines stay buffered until the next chunk.

/// One parsed server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload.
    Data(String),

    /// The `data: [DONE]` terminator (OpenAI convention; Gemini streams
    /// simply end).
    Done,
}

/// Line buffer over an SSE byte stream.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buffer: String,
}

impl SseBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw chunk and drain every complete event it completes.
    ///
    /// Blank separator lines and non-data fields (`event:`, `id:`,
    /// `retry:`) are skipped.
    pub fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line = self.buffer[..newline].trim().to_string();
            self.buffer.drain(..=newline);

            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Drain a trailing event left without a final newline.
    pub fn finish(mut self) -> Option<SseEvent> {
        let line = std::mem::take(&mut self.buffer);
        parse_line(line.trim())
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let data = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:"))?;
    let data = data.trim();

    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    Some(SseEvent::Data(data.to_string()))
}
