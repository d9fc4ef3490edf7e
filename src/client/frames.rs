//! Decoding of the relay's `data: <fragment>\n\n` frames.

use std::fmt;

use memchr::memchr;
use serde::{Deserialize, Serialize};

use super::error::ClientError;
use crate::server::framing::DATA_MARKER;

/// How the response body is turned back into text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FrameMode {
    /// Parse event lines: `data:` is stripped only at the start of a line and
    /// the data lines of one event are joined with `\n`.
    #[default]
    Events,
    /// Remove every `data: ` substring from each read, keeping everything
    /// else (including the blank-line terminators) as text.
    Legacy,
}

impl fmt::Display for FrameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameMode::Events => write!(f, "events"),
            FrameMode::Legacy => write!(f, "legacy"),
        }
    }
}

/// Incremental decoder for one response body.
#[derive(Debug)]
pub struct FrameDecoder {
    mode: FrameMode,
    /// Bytes of a UTF-8 sequence split across reads.
    pending_bytes: Vec<u8>,
    /// Text after the last complete line (events mode).
    partial_line: String,
    /// Data lines of the event being read (events mode).
    data_lines: Vec<String>,
}

impl FrameDecoder {
    pub fn new(mode: FrameMode) -> Self {
        Self {
            mode,
            pending_bytes: Vec::new(),
            partial_line: String::new(),
            data_lines: Vec::new(),
        }
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    /// Feed one read of the body; returns the text chunks it completes.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, ClientError> {
        let text = self.decode_utf8(bytes)?;
        Ok(match self.mode {
            FrameMode::Legacy => legacy_chunk(&text).into_iter().collect(),
            FrameMode::Events => {
                self.partial_line.push_str(&text);
                self.drain_lines()
            }
        })
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Result<Vec<String>, ClientError> {
        if !self.pending_bytes.is_empty() {
            let count = self.pending_bytes.len();
            self.pending_bytes.clear();
            return Err(ClientError::Decode(format!(
                "stream ended inside a UTF-8 sequence ({count} trailing bytes)"
            )));
        }
        if self.mode == FrameMode::Legacy {
            return Ok(Vec::new());
        }

        let mut chunks = Vec::new();
        if !self.partial_line.is_empty() {
            let line = std::mem::take(&mut self.partial_line);
            self.process_line(&line, &mut chunks);
        }
        if let Some(chunk) = self.dispatch() {
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    fn decode_utf8(&mut self, bytes: &[u8]) -> Result<String, ClientError> {
        self.pending_bytes.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending_bytes) {
            Ok(text) => {
                let text = text.to_string();
                self.pending_bytes.clear();
                Ok(text)
            }
            Err(err) if err.error_len().is_some() => {
                let offset = err.valid_up_to();
                self.pending_bytes.clear();
                Err(ClientError::Decode(format!(
                    "invalid UTF-8 in response body at byte {offset}"
                )))
            }
            Err(err) => {
                // Incomplete sequence at the end: keep it for the next read.
                let valid = err.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending_bytes[..valid]).into_owned();
                self.pending_bytes.drain(..valid);
                Ok(text)
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let mut chunks = Vec::new();
        while let Some(newline_pos) = memchr(b'\n', self.partial_line.as_bytes()) {
            let line: String = self.partial_line.drain(..=newline_pos).collect();
            self.process_line(&line[..newline_pos], &mut chunks);
        }
        chunks
    }

    fn process_line(&mut self, line: &str, chunks: &mut Vec<String>) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            if let Some(chunk) = self.dispatch() {
                chunks.push(chunk);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data_lines.push(value.to_string());
        }
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data_lines.is_empty() {
            return None;
        }
        let chunk = self.data_lines.join("\n");
        self.data_lines.clear();
        Some(chunk)
    }
}

fn legacy_chunk(text: &str) -> Option<String> {
    let cleaned = text.replace(DATA_MARKER, "");
    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::framing::encode_frame;

    fn decode_all(mode: FrameMode, reads: &[&[u8]]) -> String {
        let mut decoder = FrameDecoder::new(mode);
        let mut message = String::new();
        for read in reads {
            for chunk in decoder.push(read).expect("push") {
                message.push_str(&chunk);
            }
        }
        for chunk in decoder.finish().expect("finish") {
            message.push_str(&chunk);
        }
        message
    }

    #[test]
    fn legacy_strips_marker_from_each_read() {
        assert_eq!(decode_all(FrameMode::Legacy, &[b"data: 4", b"data: ."]), "4.");
    }

    #[test]
    fn legacy_keeps_terminators_and_strips_marker_inside_content() {
        let message = decode_all(
            FrameMode::Legacy,
            &[b"data: say data: twice\n\n", b"data: ok\n\n"],
        );
        assert_eq!(message, "say twice\n\nok\n\n");
    }

    #[test]
    fn events_reassemble_fragments_split_across_reads() {
        let message = decode_all(
            FrameMode::Events,
            &[b"data: Hel", b"lo\n", b"\ndata: , wor", b"ld\n\n"],
        );
        assert_eq!(message, "Hello, world");
    }

    #[test]
    fn events_keep_marker_text_inside_content() {
        let message = decode_all(FrameMode::Events, &[b"data: the data: field\n\n"]);
        assert_eq!(message, "the data: field");
    }

    #[test]
    fn events_join_multiline_frames() {
        let frame = encode_frame("line one\nline two\n");
        let message = decode_all(FrameMode::Events, &[frame.as_bytes()]);
        assert_eq!(message, "line one\nline two\n");
    }

    #[test]
    fn events_ignore_comments_and_other_fields() {
        let message = decode_all(
            FrameMode::Events,
            &[b": keep-alive\n\nevent: message\nid: 7\ndata: x\r\n\r\n"],
        );
        assert_eq!(message, "x");
    }

    #[test]
    fn events_flush_unterminated_event_at_end() {
        let message = decode_all(FrameMode::Events, &[b"data: tail"]);
        assert_eq!(message, "tail");
    }

    #[test]
    fn events_accept_marker_without_space() {
        let message = decode_all(FrameMode::Events, &[b"data:tight\n\n"]);
        assert_eq!(message, "tight");
    }

    #[test]
    fn multibyte_character_split_across_reads() {
        let bytes = "data: héllo\n\n".as_bytes();
        // Split inside the two-byte 'é'.
        let split = "data: h".len() + 1;
        let message = decode_all(FrameMode::Events, &[&bytes[..split], &bytes[split..]]);
        assert_eq!(message, "héllo");
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let mut decoder = FrameDecoder::new(FrameMode::Legacy);
        let err = decoder.push(&[b'd', 0xff, b'x']).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn truncated_utf8_at_end_is_a_decode_error() {
        let mut decoder = FrameDecoder::new(FrameMode::Events);
        assert!(decoder.push(&[0xc3]).unwrap().is_empty());
        assert!(matches!(decoder.finish(), Err(ClientError::Decode(_))));
    }

    #[test]
    fn single_line_fragment_matches_legacy_frame() {
        assert_eq!(encode_frame("4"), "data: 4\n\n");
        assert_eq!(encode_frame(""), "data: \n\n");
    }

    #[test]
    fn multiline_fragment_gets_one_data_line_per_line() {
        assert_eq!(encode_frame("a\r\nb"), "data: a\ndata: b\n\n");
    }

    #[test]
    fn events_normalize_line_ending_carriage_returns_only() {
        let frames: String = ["foo\r", "\nbar", "x\ry"]
            .iter()
            .map(|fragment| encode_frame(fragment))
            .collect();
        let message = decode_all(FrameMode::Events, &[frames.as_bytes()]);
        assert_eq!(message, "foo\nbarx\ry");
    }

    #[test]
    fn legacy_decoding_of_multiline_frame_matches_original_output() {
        let frame = encode_frame("a\nb");
        assert_eq!(decode_all(FrameMode::Legacy, &[frame.as_bytes()]), "a\nb\n\n");
    }
}
