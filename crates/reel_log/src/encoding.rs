//! Chunk codec.
//!
//! A recorded chunk is newline-delimited JSON, one [`Message`] per line.
//! Decoding keeps the recorded order; the engine relies on it and never sorts.

use crate::message::Message;
use reel_core::{CoreError, SessionTime};
use thiserror::Error;
use tracing::warn;

/// Decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Chunk is not UTF-8
    #[error("Chunk is not valid UTF-8 at byte {offset}")]
    InvalidUtf8 {
        /// First invalid byte
        offset: usize,
    },
    /// A line is not a valid message
    #[error("Invalid message on line {line}: {reason}")]
    InvalidMessage {
        /// One-based line number within the chunk
        line: usize,
        /// Parser error
        reason: String,
    },
}

impl From<DecodeError> for CoreError {
    fn from(err: DecodeError) -> Self {
        CoreError::InvalidEncoding {
            reason: err.to_string(),
        }
    }
}

/// Decode one chunk into messages
///
/// Blank lines are skipped. A message stamped earlier than its predecessor is
/// kept in place and logged.
///
/// # Errors
///
/// Returns error on the first line that fails to parse
pub fn decode_chunk(bytes: &[u8]) -> Result<Vec<Message>, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;

    let mut messages = Vec::new();
    let mut last_time: Option<SessionTime> = None;
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let message: Message =
            serde_json::from_str(line).map_err(|e| DecodeError::InvalidMessage {
                line: i + 1,
                reason: e.to_string(),
            })?;
        if last_time.is_some_and(|last| message.time() < last) {
            warn!(
                line = i + 1,
                kind = message.kind_name(),
                time = %message.time(),
                "message out of recorded order"
            );
        }
        last_time = Some(message.time());
        messages.push(message);
    }
    Ok(messages)
}

/// Encode messages in the chunk format
///
/// # Errors
///
/// Returns error if a message cannot be serialized
pub fn encode_messages<'a, I>(messages: I) -> Result<Vec<u8>, CoreError>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut out = Vec::new();
    for message in messages {
        serde_json::to_writer(&mut out, message)?;
        out.push(b'\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{CreateDocument, RemoveNode};
    use reel_core::NodeId;

    #[test]
    fn test_decode_chunk() {
        let chunk = br#"{"tp":"create_document","time":0}

{"tp":"remove_node","time":4,"id":3}
"#;
        let messages = decode_chunk(chunk).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].kind_name(), "remove_node");
    }

    #[test]
    fn test_decode_reports_line() {
        let chunk = b"{\"tp\":\"create_document\",\"time\":0}\n{oops}\n";
        let err = decode_chunk(chunk).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidMessage { line: 2, .. }));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode_chunk(&[b'{', 0xff, b'}']).unwrap_err();
        assert_eq!(err, DecodeError::InvalidUtf8 { offset: 1 });
    }

    #[test]
    fn test_decode_keeps_out_of_order_messages() {
        let chunk = br#"{"tp":"remove_node","time":9,"id":1}
{"tp":"remove_node","time":2,"id":2}"#;
        let messages = decode_chunk(chunk).unwrap();
        assert_eq!(messages[0].id(), NodeId::new(1));
        assert_eq!(messages[1].id(), NodeId::new(2));
    }

    #[test]
    fn test_encode_then_decode() {
        let messages = vec![
            Message::CreateDocument(CreateDocument {
                time: SessionTime::zero(),
                id: NodeId::ROOT,
            }),
            Message::RemoveNode(RemoveNode {
                time: SessionTime::from_millis(8),
                id: NodeId::new(5),
            }),
        ];
        let bytes = encode_messages(&messages).unwrap();
        assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 2);
        assert_eq!(decode_chunk(&bytes).unwrap(), messages);
    }
}
