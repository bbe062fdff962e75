//! Tokio codec for newline-delimited JSON framing.
//!
//! This module provides a Tokio-compatible codec that carries the access
//! network's request/response vocabulary over TCP, enabling automatic
//! message encoding and decoding using Tokio's `Framed` streams.
//!
//! # Overview
//!
//! Every frame is one JSON object followed by a single `\n`. The codec is
//! generic over the transmit and receive types so the same implementation
//! serves both ends of a connection:
//!
//! - [`ClientCodec`]: sends [`Request`], receives [`Response`]
//! - [`ServerCodec`]: sends [`Response`], receives [`Request`]
//!
//! ```text
//! TCP Stream -> Decoder -> Request/Response (parsed)
//! Request/Response -> Encoder -> TCP Stream (JSON line)
//! ```
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use doorlink_protocol::{ClientCodec, Request};
//! use futures::{SinkExt, StreamExt};
//!
//! # async fn example() -> doorlink_core::Result<()> {
//! let stream = TcpStream::connect("192.168.1.129:8080").await?;
//! let mut framed = Framed::new(stream, ClientCodec::new());
//!
//! framed.send(Request::IdentityProbe).await?;
//!
//! if let Some(Ok(response)) = framed.next().await {
//!     println!("Received: {:?}", response);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # DoS Protection
//!
//! The codec rejects frames larger than its configured limit (default
//! 64 KB), both on encode and while buffering an unterminated line on
//! decode. Legitimate messages are a few hundred bytes at most.
//!
//! # Error Handling
//!
//! Decode errors can occur when:
//! - A line exceeds the maximum frame size
//! - A line is not valid JSON for the expected type
//!
//! Blank lines and a trailing `\r` before the terminator are tolerated so
//! hand-driven sessions (telnet, netcat) work during commissioning.

use bytes::{BufMut, BytesMut};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use tokio_util::codec::{Decoder, Encoder};

use crate::message::{Request, Response};
use doorlink_core::{Error, Result};

/// Default maximum frame size in bytes (64 KB).
///
/// Generous for every legitimate message in the vocabulary while bounding
/// the memory an unterminated or malicious stream can pin.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Newline-delimited JSON codec, generic over frame direction.
///
/// `Tx` is the type written with [`Encoder`], `Rx` the type produced by
/// [`Decoder`]. Use the [`ClientCodec`] and [`ServerCodec`] aliases rather
/// than naming the generic form directly.
#[derive(Debug)]
pub struct WireCodec<Tx, Rx> {
    /// Maximum allowed frame size in bytes.
    max_frame_size: usize,
    _direction: PhantomData<fn(Tx) -> Rx>,
}

/// Codec for the initiating side: sends requests, reads responses.
pub type ClientCodec = WireCodec<Request, Response>;

/// Codec for the accepting side: reads requests, sends responses.
pub type ServerCodec = WireCodec<Response, Request>;

impl<Tx, Rx> WireCodec<Tx, Rx> {
    /// Create a new codec with the default maximum frame size.
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            _direction: PhantomData,
        }
    }

    /// Create a new codec with a custom maximum frame size.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            _direction: PhantomData,
        }
    }

    /// Get the current maximum frame size.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl<Tx, Rx> Default for WireCodec<Tx, Rx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tx, Rx> Decoder for WireCodec<Tx, Rx>
where
    Rx: DeserializeOwned,
{
    type Item = Rx;
    type Error = Error;

    /// Decode one message from the byte stream.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Rx))` - A complete line was decoded
    /// - `Ok(None)` - Need more data to complete the line
    /// - `Err(Error)` - Oversized or malformed frame
    ///
    /// # Errors
    ///
    /// Returns an error if the buffered line exceeds `max_frame_size` or
    /// a complete line is not valid JSON for the expected type.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let Some(pos) = src.iter().position(|b| *b == b'\n') else {
                // No terminator yet. Bound what a stalled peer can buffer.
                if src.len() > self.max_frame_size {
                    return Err(Error::FrameTooLarge {
                        size: src.len(),
                        max: self.max_frame_size,
                    });
                }
                return Ok(None);
            };

            let frame = src.split_to(pos + 1);
            let line = &frame[..pos];
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if line.is_empty() {
                continue;
            }

            if line.len() > self.max_frame_size {
                return Err(Error::FrameTooLarge {
                    size: line.len(),
                    max: self.max_frame_size,
                });
            }

            return serde_json::from_slice(line).map(Some).map_err(|e| {
                Error::InvalidFrame {
                    message: e.to_string(),
                }
            });
        }
    }
}

impl<Tx, Rx> Encoder<Tx> for WireCodec<Tx, Rx>
where
    Tx: Serialize,
{
    type Error = Error;

    /// Encode one message as a JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoded frame exceeds `max_frame_size` or
    /// the message cannot be serialized.
    fn encode(&mut self, item: Tx, dst: &mut BytesMut) -> Result<()> {
        let payload = serde_json::to_vec(&item).map_err(|e| Error::InvalidFrame {
            message: e.to_string(),
        })?;

        let framed_len = payload.len() + 1;
        if framed_len > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                size: framed_len,
                max: self.max_frame_size,
            });
        }

        dst.reserve(framed_len);
        dst.extend_from_slice(&payload);
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ScanStatus;

    #[test]
    fn test_codec_new() {
        let codec = ClientCodec::new();
        assert_eq!(codec.max_frame_size(), DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn test_codec_with_custom_max_size() {
        let codec = ClientCodec::with_max_frame_size(128 * 1024);
        assert_eq!(codec.max_frame_size(), 128 * 1024);
    }

    #[test]
    fn test_decode_complete_line() {
        let mut codec = ServerCodec::new();
        let mut buffer = BytesMut::from(&b"{\"op\":\"identity_probe\"}\n"[..]);

        let decoded = codec.decode(&mut buffer).unwrap();
        assert_eq!(decoded, Some(Request::IdentityProbe));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = ServerCodec::new();
        let mut buffer = BytesMut::from(&b"{\"op\":\"identity"[..]);

        let decoded = codec.decode(&mut buffer).unwrap();
        assert!(decoded.is_none());
        // Partial bytes stay buffered for the next read.
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_decode_multiple_lines_in_buffer() {
        let mut codec = ServerCodec::new();
        let mut buffer =
            BytesMut::from(&b"{\"op\":\"identity_probe\"}\n{\"op\":\"status\"}\n"[..]);

        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(Request::IdentityProbe)
        );
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Request::Status));
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_decode_empty_buffer() {
        let mut codec = ServerCodec::new();
        let mut buffer = BytesMut::new();

        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_skips_blank_lines() {
        let mut codec = ServerCodec::new();
        let mut buffer = BytesMut::from(&b"\n\r\n{\"op\":\"lock\"}\n"[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Request::Lock));
    }

    #[test]
    fn test_decode_tolerates_crlf() {
        let mut codec = ServerCodec::new();
        let mut buffer = BytesMut::from(&b"{\"op\":\"unlock_entry\"}\r\n"[..]);

        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(Request::UnlockEntry)
        );
    }

    #[test]
    fn test_decode_malformed_line() {
        let mut codec = ServerCodec::new();
        let mut buffer = BytesMut::from(&b"not json at all\n"[..]);

        let result = codec.decode(&mut buffer);
        assert!(matches!(result, Err(Error::InvalidFrame { .. })));
    }

    #[test]
    fn test_decode_unterminated_line_too_large() {
        let mut codec = ServerCodec::with_max_frame_size(16);
        let mut buffer = BytesMut::from(&b"{\"op\":\"submit_scan\",\"credential\":"[..]);

        let result = codec.decode(&mut buffer);
        assert!(matches!(result, Err(Error::FrameTooLarge { .. })));
    }

    #[test]
    fn test_encode_appends_newline() {
        let mut codec = ClientCodec::new();
        let mut buffer = BytesMut::new();

        codec.encode(Request::Status, &mut buffer).unwrap();

        assert_eq!(buffer.last(), Some(&b'\n'));
        let line = &buffer[..buffer.len() - 1];
        assert!(!line.contains(&b'\n'));
        let value: serde_json::Value = serde_json::from_slice(line).unwrap();
        assert_eq!(value["op"], "status");
    }

    #[test]
    fn test_encode_frame_too_large() {
        let mut codec = ClientCodec::with_max_frame_size(8);
        let mut buffer = BytesMut::new();

        let result = codec.encode(Request::IdentityProbe, &mut buffer);
        if let Err(Error::FrameTooLarge { size, max }) = result {
            assert_eq!(max, 8);
            assert!(size > max);
        } else {
            panic!("Expected FrameTooLarge error");
        }
    }

    #[test]
    fn test_roundtrip_request() {
        let mut client = ClientCodec::new();
        let mut server = ServerCodec::new();
        let mut buffer = BytesMut::new();

        let original = Request::SubmitScan {
            credential: doorlink_core::Credential::new("080058DBB1").unwrap(),
            action: doorlink_core::NodeRole::Exit,
            origin_identity: doorlink_core::DeviceIdentity::new("E4:65:B8:27:73:08").unwrap(),
        };

        client.encode(original.clone(), &mut buffer).unwrap();
        let decoded = server.decode(&mut buffer).unwrap();
        assert_eq!(decoded, Some(original));
    }

    #[test]
    fn test_roundtrip_response() {
        let mut server = ServerCodec::new();
        let mut client = ClientCodec::new();
        let mut buffer = BytesMut::new();

        let original = Response::ScanResult {
            status: ScanStatus::Success,
            message: "Entry logged".to_string(),
            user_name: Some("Alice Johnson".to_string()),
        };

        server.encode(original.clone(), &mut buffer).unwrap();
        let decoded = client.decode(&mut buffer).unwrap();
        assert_eq!(decoded, Some(original));
    }
}
