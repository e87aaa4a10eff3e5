//! Simulator codec implementation using tokio-util.
//!
//! This module provides [`SimCodec`], which implements both the `Encoder`
//! and `Decoder` traits from tokio-util for the simulator protocol.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::commands::Command;
use crate::error::CodecError;
use crate::updates::{Batch, decode_frame};

/// Default maximum message size (16 MB).
const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Codec for encoding commands and decoding update batches.
///
/// The simulator protocol frames each JSON body with a Content-Length
/// header:
/// ```text
/// Content-Length: <length>\r\n
/// \r\n
/// <JSON body>
/// ```
///
/// Inbound bodies decode to a [`Batch`] of updates. A body that is not
/// valid JSON yields an empty batch rather than an error, so one bad
/// frame cannot kill the connection; corrupt framing, on the other hand,
/// leaves the byte stream unrecoverable and is reported as an error.
#[derive(Debug, Clone)]
pub struct SimCodec {
    /// Maximum allowed message size in bytes.
    max_message_size: usize,
}

impl SimCodec {
    /// Create a new codec with default settings.
    pub fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Create a new codec with a custom maximum message size.
    ///
    /// Messages larger than this will be rejected with [`CodecError::MessageTooLarge`].
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }
}

impl Default for SimCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SimCodec {
    type Item = Batch;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Look for the header/body separator (\r\n\r\n)
        let Some(header_end) = find_header_end(src) else {
            // Need more data
            return Ok(None);
        };

        // Parse the Content-Length header
        let header_bytes = &src[..header_end];
        let content_length = parse_content_length(header_bytes)?;

        // Check message size limit
        if content_length > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: content_length,
                max: self.max_message_size,
            });
        }

        // Calculate total message length (header + \r\n\r\n + body)
        let total_length = header_end + 4 + content_length;

        // Check if we have the complete message
        if src.len() < total_length {
            // Need more data - reserve space for efficiency
            src.reserve(total_length - src.len());
            return Ok(None);
        }

        // Parse the JSON body
        let body_start = header_end + 4;
        let body_bytes = &src[body_start..total_length];
        let batch = match serde_json::from_slice(body_bytes) {
            Ok(value) => decode_frame(&value),
            Err(error) => {
                // Framing is intact, only this body is garbage. Skip it.
                warn!(%error, "discarding frame with unparseable JSON body");
                Vec::new()
            }
        };

        // Consume the processed bytes
        src.advance(total_length);

        Ok(Some(batch))
    }
}

impl Encoder<Command> for SimCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        // Serialize the command to JSON
        let json = serde_json::to_vec(&item).map_err(CodecError::JsonSerialize)?;

        // Write the header
        dst.reserve(32 + json.len()); // "Content-Length: " + digits + "\r\n\r\n" + body
        dst.put_slice(b"Content-Length: ");
        dst.put_slice(json.len().to_string().as_bytes());
        dst.put_slice(b"\r\n\r\n");

        // Write the body
        dst.put_slice(&json);

        Ok(())
    }
}

/// Find the position of the header/body separator (\r\n\r\n).
///
/// Returns the index of the first `\r` in the separator, or None if not found.
pub(crate) fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Parse the Content-Length value from the header section.
pub(crate) fn parse_content_length(header: &[u8]) -> Result<usize, CodecError> {
    let header_str = std::str::from_utf8(header).map_err(|_| CodecError::InvalidUtf8)?;

    for line in header_str.split("\r\n") {
        if let Some(value) = line.strip_prefix("Content-Length:") {
            return value
                .trim()
                .parse()
                .map_err(|_| CodecError::MalformedContentLength);
        }
    }

    Err(CodecError::MissingContentLength)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updates::Update;

    fn make_frame(json: &str) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_slice(format!("Content-Length: {}\r\n\r\n{}", json.len(), json).as_bytes());
        buf
    }

    #[test]
    fn decode_complete_frame() {
        let mut codec = SimCodec::new();
        let json = r#"[["nextline", 4], ["banking", "User"]]"#;
        let mut buf = make_frame(json);

        let batch = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], Update::NextLine(4));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_incomplete_header() {
        let mut codec = SimCodec::new();
        let mut buf = BytesMut::from("Content-Length: 10");

        let result = codec.decode(&mut buf).unwrap();
        assert!(result.is_none());
        assert!(!buf.is_empty()); // Data preserved
    }

    #[test]
    fn decode_incomplete_body() {
        let mut codec = SimCodec::new();
        let mut buf = BytesMut::from("Content-Length: 100\r\n\r\n[[\"nextline\",");

        let result = codec.decode(&mut buf).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn decode_multiple_frames() {
        let mut codec = SimCodec::new();
        let json1 = r#"[["nextline", 1]]"#;
        let json2 = r#"[["nextline", 2]]"#;

        let mut buf = BytesMut::new();
        buf.put_slice(&make_frame(json1));
        buf.put_slice(&make_frame(json2));

        let batch1 = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(batch1, vec![Update::NextLine(1)]);

        let batch2 = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(batch2, vec![Update::NextLine(2)]);

        assert!(buf.is_empty());
    }

    #[test]
    fn decode_frame_too_large() {
        let mut codec = SimCodec::with_max_size(10);
        let mut buf = BytesMut::from("Content-Length: 100\r\n\r\n");

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::MessageTooLarge { .. })));
    }

    #[test]
    fn decode_garbage_body_yields_empty_batch() {
        let mut codec = SimCodec::new();
        let mut buf = make_frame("not json at all");
        buf.put_slice(&make_frame(r#"[["nextline", 9]]"#));

        let batch = codec.decode(&mut buf).unwrap().unwrap();
        assert!(batch.is_empty());

        // The stream keeps going afterwards.
        let batch = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(batch, vec![Update::NextLine(9)]);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_missing_content_length() {
        let mut codec = SimCodec::new();
        let mut buf = BytesMut::from("X-Whatever: 3\r\n\r\nabc");

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::MissingContentLength)));
    }

    #[test]
    fn encode_command() {
        let mut codec = SimCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Command::Stop, &mut buf).unwrap();

        let s = std::str::from_utf8(&buf).unwrap();
        assert!(s.starts_with("Content-Length: "));
        assert!(s.contains("\r\n\r\n"));
        assert!(s.ends_with(r#"["stop"]"#));
    }
}
