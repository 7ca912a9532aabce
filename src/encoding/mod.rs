//! Output charsets and streaming transcoding.
//!
//! Charset labels are resolved through `encoding_rs`. [`TextStreamer`] takes
//! the serializer's UTF-8 output buffer, transcodes it in fixed-size chunks
//! and writes the bytes to a sink once the buffer grows past a threshold.

use std::io::Write;

use encoding_rs::{CoderResult, Encoder, EncoderResult, Encoding};

use crate::error::EncodeError;

/// Buffer size, in bytes, above which [`TextStreamer::flush_if_long_enough`]
/// writes the buffer out.
pub const FLUSH_THRESHOLD: usize = 1024;

/// Size of the scratch buffer each transcoded chunk is written through.
const CHUNK_SIZE: usize = 4096;

/// Resolves a charset label (e.g. `"latin1"`, `"UTF-8"`) to the encoding
/// used for output.
///
/// Labels naming an encoding that cannot be produced (UTF-16, replacement)
/// resolve to their output encoding as defined by the Encoding Standard.
///
/// # Errors
///
/// Returns [`EncodeError::EncodingUnsupported`] for unknown labels.
///
/// # Examples
///
/// ```
/// use docencode::encoding::resolve_charset;
///
/// assert_eq!(resolve_charset("latin1").unwrap().name(), "windows-1252");
/// assert!(resolve_charset("no-such-charset").is_err());
/// ```
pub fn resolve_charset(label: &str) -> Result<&'static Encoding, EncodeError> {
    Encoding::for_label(label.trim().as_bytes())
        .map(Encoding::output_encoding)
        .ok_or_else(|| EncodeError::EncodingUnsupported(label.to_string()))
}

/// Incrementally transcodes serializer output into a byte sink.
///
/// The streamer does not own the text buffer: the encoder appends to a
/// `String` and hands it to the streamer, which drains it on every flush.
pub struct TextStreamer<'s> {
    sink: &'s mut dyn Write,
    encoder: Encoder,
    plain_text: bool,
    threshold: usize,
}

impl<'s> TextStreamer<'s> {
    /// Creates a streamer writing `encoding` bytes to `sink`.
    ///
    /// In `plain_text` mode characters the encoding cannot represent are
    /// written as `?`. Otherwise they use the encoding's own fallback
    /// (numeric character references).
    pub fn new(sink: &'s mut dyn Write, encoding: &'static Encoding, plain_text: bool) -> Self {
        Self {
            sink,
            encoder: encoding.new_encoder(),
            plain_text,
            threshold: FLUSH_THRESHOLD,
        }
    }

    /// Overrides the flush threshold.
    #[must_use]
    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Writes and clears `buffer` if it has grown past the flush threshold.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Io`] if the sink fails.
    pub fn flush_if_long_enough(&mut self, buffer: &mut String) -> Result<(), EncodeError> {
        if buffer.len() > self.threshold {
            self.flush(buffer)?;
        }
        Ok(())
    }

    /// Writes and clears `buffer` unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Io`] if the sink fails.
    pub fn force_flush(&mut self, buffer: &mut String) -> Result<(), EncodeError> {
        self.flush(buffer)?;
        self.sink.flush()?;
        Ok(())
    }

    fn flush(&mut self, buffer: &mut String) -> Result<(), EncodeError> {
        let result = self.encode_and_write(buffer);
        buffer.clear();
        result
    }

    fn encode_and_write(&mut self, text: &str) -> Result<(), EncodeError> {
        if text.is_empty() {
            return Ok(());
        }
        tracing::trace!(len = text.len(), plain = self.plain_text, "flushing output buffer");

        let mut chunk = [0u8; CHUNK_SIZE];
        let mut src = text;
        loop {
            let (done, read, written) = if self.plain_text {
                // Leave room for the '?' that stands in for an unmappable char.
                let limit = CHUNK_SIZE - 1;
                let (result, read, mut written) = self
                    .encoder
                    .encode_from_utf8_without_replacement(src, &mut chunk[..limit], false);
                if let EncoderResult::Unmappable(_) = result {
                    chunk[written] = b'?';
                    written += 1;
                }
                (result == EncoderResult::InputEmpty, read, written)
            } else {
                let (result, read, written, _) =
                    self.encoder.encode_from_utf8(src, &mut chunk, false);
                (result == CoderResult::InputEmpty, read, written)
            };
            src = &src[read..];
            self.sink.write_all(&chunk[..written])?;
            if done {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A sink that records every write call separately.
    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<Vec<u8>>,
    }

    impl Write for RecordingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_resolve_charset_labels() {
        assert_eq!(resolve_charset("utf8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(resolve_charset(" ISO-8859-1 ").unwrap(), encoding_rs::WINDOWS_1252);
        assert_eq!(resolve_charset("utf-16le").unwrap(), encoding_rs::UTF_8);
        assert!(matches!(
            resolve_charset("klingon"),
            Err(EncodeError::EncodingUnsupported(label)) if label == "klingon"
        ));
    }

    #[test]
    fn test_short_buffer_is_kept() {
        let mut sink = RecordingSink::default();
        let mut streamer = TextStreamer::new(&mut sink, encoding_rs::UTF_8, false);
        let mut buffer = "short".to_string();
        streamer.flush_if_long_enough(&mut buffer).unwrap();
        assert_eq!(buffer, "short");
        drop(streamer);
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn test_long_buffer_is_flushed_and_cleared() {
        let mut sink = RecordingSink::default();
        let mut streamer =
            TextStreamer::new(&mut sink, encoding_rs::UTF_8, false).with_flush_threshold(4);
        let mut buffer = "hello".to_string();
        streamer.flush_if_long_enough(&mut buffer).unwrap();
        assert!(buffer.is_empty());
        drop(streamer);
        assert_eq!(sink.writes.concat(), b"hello");
    }

    #[test]
    fn test_empty_force_flush_writes_nothing() {
        let mut sink = RecordingSink::default();
        let mut streamer = TextStreamer::new(&mut sink, encoding_rs::UTF_8, true);
        streamer.force_flush(&mut String::new()).unwrap();
        drop(streamer);
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn test_plain_text_replaces_unmappable_with_question_mark() {
        let mut sink = RecordingSink::default();
        let mut streamer = TextStreamer::new(&mut sink, encoding_rs::WINDOWS_1252, true);
        streamer.force_flush(&mut "caf\u{e9} \u{4e16}!".to_string()).unwrap();
        drop(streamer);
        assert_eq!(sink.writes.concat(), b"caf\xe9 ?!");
    }

    #[test]
    fn test_markup_uses_numeric_references() {
        let mut sink = RecordingSink::default();
        let mut streamer = TextStreamer::new(&mut sink, encoding_rs::WINDOWS_1252, false);
        streamer.force_flush(&mut "\u{4e16}".to_string()).unwrap();
        drop(streamer);
        assert_eq!(sink.writes.concat(), b"&#19990;");
    }

    #[test]
    fn test_large_input_spans_chunks() {
        let mut sink = RecordingSink::default();
        let mut streamer = TextStreamer::new(&mut sink, encoding_rs::UTF_8, false);
        let text = "x".repeat(CHUNK_SIZE * 2 + 10);
        streamer.force_flush(&mut text.clone()).unwrap();
        drop(streamer);
        assert!(sink.writes.len() >= 3);
        assert_eq!(sink.writes.concat(), text.as_bytes());
    }

    #[test]
    fn test_sink_failure_is_io_error() {
        let mut sink = FailingSink;
        let mut streamer = TextStreamer::new(&mut sink, encoding_rs::UTF_8, false);
        let mut buffer = "data".to_string();
        let err = streamer.force_flush(&mut buffer).unwrap_err();
        assert!(matches!(err, EncodeError::Io(_)));
        assert!(buffer.is_empty());
    }
}
