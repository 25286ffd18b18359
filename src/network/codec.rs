//! Binary codec for radio datagrams.
//!
//! All bincode configuration lives here so the client link and the server always agree
//! on the byte layout. Integers are fixed-width, which keeps every [`RadioCommand`]
//! datagram the same size regardless of the values it carries.
//!
//! # Examples
//!
//! ```
//! use fieldstate::network::codec::{decode_message, encode_message_into, MAX_DATAGRAM_SIZE};
//! use fieldstate::network::messages::RadioMessage;
//! use fieldstate::{PlayerId, RadioCommand};
//!
//! let message = RadioMessage::command(RadioCommand::KickStatus {
//!     team: 1,
//!     player: PlayerId::new(3),
//!     enabled: true,
//! });
//!
//! let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
//! let len = encode_message_into(&message, &mut buffer).expect("fits in one datagram");
//! let decoded = decode_message(&buffer[..len]).expect("decodes");
//! assert_eq!(decoded, message);
//! ```
//!
//! [`RadioCommand`]: crate::RadioCommand

use std::fmt;

use crate::network::messages::RadioMessage;

/// Upper bound on the size of any datagram this crate sends or accepts.
///
/// Handshakes carry an interface name, so they are the largest messages; the bound is
/// generous for those and far below typical path MTUs.
pub const MAX_DATAGRAM_SIZE: usize = 512;

fn config() -> impl bincode::config::Config {
    bincode::config::standard()
        .with_fixed_int_encoding()
        .with_limit::<MAX_DATAGRAM_SIZE>()
}

/// What the codec was doing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecOperation {
    /// Encoding a radio message into a fresh vector.
    EncodeMessage,
    /// Decoding a received radio datagram.
    DecodeMessage,
    /// Encoding into a caller-provided send buffer.
    EncodeIntoBuffer,
}

impl fmt::Display for CodecOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncodeMessage => write!(f, "encoding radio message"),
            Self::DecodeMessage => write!(f, "decoding radio datagram"),
            Self::EncodeIntoBuffer => write!(f, "encoding into send buffer"),
        }
    }
}

/// Errors that can occur during encoding or decoding.
///
/// bincode only exposes its failures through `Display`, so the messages are kept as
/// strings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// The encoding operation failed.
    EncodeError {
        /// The underlying bincode error message.
        message: String,
        /// The operation that was being performed.
        operation: CodecOperation,
    },
    /// The decoding operation failed.
    DecodeError {
        /// The underlying bincode error message.
        message: String,
        /// The operation that was being performed.
        operation: CodecOperation,
    },
    /// The provided buffer was too small for encoding.
    BufferTooSmall {
        /// The required buffer size (0 if unknown).
        required: usize,
        /// The actual buffer size provided.
        provided: usize,
    },
    /// The encoded message does not fit in one datagram.
    DatagramTooLarge {
        /// Encoded length in bytes.
        len: usize,
        /// [`MAX_DATAGRAM_SIZE`].
        max: usize,
    },
    /// A datagram decoded cleanly but left unread bytes behind.
    TrailingBytes {
        /// Bytes consumed by the decoder.
        consumed: usize,
        /// Total datagram length.
        len: usize,
    },
}

impl CodecError {
    /// Creates a new encode error with the given message and operation.
    pub fn encode(message: impl Into<String>, operation: CodecOperation) -> Self {
        Self::EncodeError {
            message: message.into(),
            operation,
        }
    }

    /// Creates a new decode error with the given message and operation.
    pub fn decode(message: impl Into<String>, operation: CodecOperation) -> Self {
        Self::DecodeError {
            message: message.into(),
            operation,
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncodeError { message, operation } => {
                write!(f, "encoding failed while {operation}: {message}")
            },
            Self::DecodeError { message, operation } => {
                write!(f, "decoding failed while {operation}: {message}")
            },
            Self::BufferTooSmall { required, provided } => {
                if *required > 0 {
                    write!(
                        f,
                        "buffer too small: needed {required} bytes, but only {provided} provided"
                    )
                } else {
                    write!(f, "buffer too small: only {provided} bytes provided")
                }
            },
            Self::DatagramTooLarge { len, max } => {
                write!(f, "{len}-byte message exceeds the {max}-byte datagram limit")
            },
            Self::TrailingBytes { consumed, len } => {
                write!(
                    f,
                    "datagram has {} trailing bytes after a {consumed}-byte message",
                    len.saturating_sub(*consumed)
                )
            },
        }
    }
}

impl std::error::Error for CodecError {}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

fn check_datagram_len(len: usize) -> CodecResult<usize> {
    if len > MAX_DATAGRAM_SIZE {
        return Err(CodecError::DatagramTooLarge {
            len,
            max: MAX_DATAGRAM_SIZE,
        });
    }
    Ok(len)
}

/// Encodes a radio message into a new vector.
///
/// # Errors
///
/// Returns [`CodecError::DatagramTooLarge`] if the message exceeds [`MAX_DATAGRAM_SIZE`].
pub fn encode_message(message: &RadioMessage) -> CodecResult<Vec<u8>> {
    let bytes = bincode::serde::encode_to_vec(message, config())
        .map_err(|e| CodecError::encode(e.to_string(), CodecOperation::EncodeMessage))?;
    check_datagram_len(bytes.len())?;
    Ok(bytes)
}

/// Encodes a radio message into a reusable send buffer, returning the encoded length.
///
/// # Errors
///
/// Returns [`CodecError::BufferTooSmall`] if the message does not fit in `buffer`, and
/// [`CodecError::DatagramTooLarge`] if it exceeds [`MAX_DATAGRAM_SIZE`].
pub fn encode_message_into(message: &RadioMessage, buffer: &mut [u8]) -> CodecResult<usize> {
    let len = bincode::serde::encode_into_slice(message, buffer, config()).map_err(|e| match e {
        bincode::error::EncodeError::UnexpectedEnd => CodecError::BufferTooSmall {
            required: 0,
            provided: buffer.len(),
        },
        other => CodecError::encode(other.to_string(), CodecOperation::EncodeIntoBuffer),
    })?;
    check_datagram_len(len)
}

/// Whether `message` encodes into a single datagram.
#[must_use]
pub fn fits_in_datagram(message: &RadioMessage) -> bool {
    encode_message(message).is_ok()
}

/// Decodes one radio datagram.
///
/// A datagram must contain exactly one message; trailing garbage is rejected.
pub fn decode_message(bytes: &[u8]) -> CodecResult<RadioMessage> {
    let (message, consumed): (RadioMessage, usize) =
        bincode::serde::decode_from_slice(bytes, config())
            .map_err(|e| CodecError::decode(e.to_string(), CodecOperation::DecodeMessage))?;
    if consumed != bytes.len() {
        return Err(CodecError::TrailingBytes {
            consumed,
            len: bytes.len(),
        });
    }
    Ok(message)
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::network::messages::{MessageBody, RADIO_MAGIC};
    use crate::{PlayerId, RadioCommand};

    fn battery(charge: u8) -> RadioMessage {
        RadioMessage::command(RadioCommand::BatteryCharge {
            team: 2,
            player: PlayerId::new(5),
            charge,
        })
    }

    #[test]
    fn test_command_datagrams_have_fixed_size() {
        let low = encode_message(&battery(0)).unwrap();
        let high = encode_message(&battery(255)).unwrap();
        assert_eq!(low.len(), high.len());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(
            encode_message(&battery(17)).unwrap(),
            encode_message(&battery(17)).unwrap()
        );
    }

    #[test]
    fn test_encode_into_small_buffer_fails_cleanly() {
        let mut buffer = [0u8; 2];
        let result = encode_message_into(&battery(1), &mut buffer);
        assert!(matches!(
            result,
            Err(CodecError::BufferTooSmall { provided: 2, .. })
                | Err(CodecError::EncodeError { .. })
        ));
    }

    #[test]
    fn test_handshake_with_interface_fits_one_datagram() {
        let message = RadioMessage::handshake_request(7, "FieldState.RadioSensor");
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
        let len = encode_message_into(&message, &mut buffer).unwrap();
        let decoded = decode_message(&buffer[..len]).unwrap();
        assert_eq!(decoded.header.magic, RADIO_MAGIC);
        assert!(matches!(decoded.body, MessageBody::HandshakeRequest { nonce: 7, .. }));
    }

    #[test]
    fn test_truncated_datagram_is_rejected() {
        let bytes = encode_message(&battery(9)).unwrap();
        let result = decode_message(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(CodecError::DecodeError { .. })));
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = encode_message(&battery(9)).unwrap();
        bytes.push(0);
        let result = decode_message(&bytes);
        assert!(matches!(result, Err(CodecError::TrailingBytes { .. })));
    }

    #[test]
    fn test_unknown_body_variant_is_rejected() {
        let mut bytes = encode_message(&battery(9)).unwrap();
        // magic (u16) is followed by the u32 variant tag of the body
        bytes[2] = 0xEE;
        assert!(decode_message(&bytes).is_err());
    }

    #[test]
    fn test_oversized_length_prefix_is_rejected() {
        let mut bytes = encode_message(&RadioMessage::handshake_request(1, "x")).unwrap();
        // magic (2) + variant tag (4) + nonce (4), then the u64 string length
        bytes[10..18].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(decode_message(&bytes).is_err());
    }

    #[test]
    fn test_oversized_message_is_rejected() {
        let message = RadioMessage::handshake_request(1, &"x".repeat(600));
        assert!(matches!(
            encode_message(&message),
            Err(CodecError::DatagramTooLarge {
                max: MAX_DATAGRAM_SIZE,
                ..
            })
        ));

        let mut roomy = vec![0u8; 4 * MAX_DATAGRAM_SIZE];
        assert!(matches!(
            encode_message_into(&message, &mut roomy),
            Err(CodecError::DatagramTooLarge { .. })
        ));
        assert!(!fits_in_datagram(&message));
    }

    #[test]
    fn test_largest_handshake_fits_exactly() {
        // magic (2) + variant tag (4) + nonce (4) + string length (8)
        let largest = "x".repeat(MAX_DATAGRAM_SIZE - 18);
        let bytes = encode_message(&RadioMessage::handshake_reply(3, &largest)).unwrap();
        assert_eq!(bytes.len(), MAX_DATAGRAM_SIZE);

        let one_more = "x".repeat(MAX_DATAGRAM_SIZE - 17);
        assert!(!fits_in_datagram(&RadioMessage::handshake_request(3, &one_more)));
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::BufferTooSmall {
            required: 100,
            provided: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("buffer too small"));
        assert!(msg.contains("100"));

        let err = CodecError::TrailingBytes {
            consumed: 10,
            len: 12,
        };
        assert!(err.to_string().contains("2 trailing bytes"));

        let err = CodecError::decode("boom", CodecOperation::DecodeMessage);
        assert!(err.to_string().contains("radio datagram"));
    }
}
