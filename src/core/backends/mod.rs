//! HTTP implementations of [`CompletionClient`](crate::core::completion::CompletionClient).

pub mod errors;
pub mod ollama;
pub mod openai_compat;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_server;

use memchr::memchr;
use tracing::debug;

pub use errors::format_api_error;
pub use ollama::OllamaClient;
pub use openai_compat::OpenAiCompatClient;
pub use registry::ClientRegistry;

/// Splits a byte stream into trimmed text lines.
///
/// Bytes after the last newline stay buffered until more arrive or the
/// stream ends.
#[derive(Default)]
pub(crate) struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub(crate) fn next_line(&mut self) -> Option<String> {
        loop {
            let newline_pos = memchr(b'\n', &self.buffer)?;
            let line = match std::str::from_utf8(&self.buffer[..newline_pos]) {
                Ok(text) => Some(text.trim().to_string()),
                Err(err) => {
                    debug!(error = %err, "Dropping non-UTF-8 stream line");
                    None
                }
            };
            self.buffer.drain(..=newline_pos);
            if let Some(line) = line {
                return Some(line);
            }
        }
    }

    /// Whatever is left once the stream closes without a final newline.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8(rest).ok()?;
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_split_across_chunks_are_reassembled() {
        let mut lines = LineBuffer::default();
        lines.push(b"data: {\"a\"");
        assert_eq!(lines.next_line(), None);
        lines.push(b":1}\r\n\ndata: [DONE]");
        assert_eq!(lines.next_line().as_deref(), Some("data: {\"a\":1}"));
        assert_eq!(lines.next_line().as_deref(), Some(""));
        assert_eq!(lines.next_line(), None);
        assert_eq!(lines.finish().as_deref(), Some("data: [DONE]"));
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn invalid_utf8_lines_are_skipped() {
        let mut lines = LineBuffer::default();
        lines.push(&[0xff, 0xfe, b'\n']);
        lines.push(b"ok\n");
        assert_eq!(lines.next_line().as_deref(), Some("ok"));
    }
}
