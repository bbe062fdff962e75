//! Property-based tests for the wire vocabulary.
//!
//! These tests use proptest to generate random valid inputs and verify
//! that framing invariants hold across the whole input space.

use bytes::BytesMut;
use doorlink_core::{Credential, DeviceIdentity, NodeRole};
use doorlink_protocol::{ClientCodec, Request, Response, ServerCodec};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

/// Strategy for generating normalized credentials (1-32 uppercase hex chars).
fn valid_credential() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9A-F]{1,32}")
        .expect("Failed to create credential regex strategy")
}

/// Strategy for generating MAC-shaped device identities.
fn valid_identity() -> impl Strategy<Value = String> {
    prop::string::string_regex("([0-9A-F]{2}:){5}[0-9A-F]{2}")
        .expect("Failed to create identity regex strategy")
}

/// Strategy for generating scanner roles.
fn valid_role() -> impl Strategy<Value = NodeRole> {
    prop_oneof![Just(NodeRole::Entry), Just(NodeRole::Exit)]
}

/// Strategy for arbitrary single-line garbage (no frame terminator).
fn garbage_line() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("no newline", |b| *b != b'\n'), 0..256)
}

proptest! {
    /// Property: any valid submission survives the encode/decode path intact.
    ///
    /// The client encodes with [`ClientCodec`] and the server decodes with
    /// [`ServerCodec`]; the decoded request must equal the original for
    /// every valid credential, role and identity combination.
    #[test]
    fn prop_submit_scan_roundtrip(
        credential in valid_credential(),
        role in valid_role(),
        identity in valid_identity(),
    ) {
        let original = Request::SubmitScan {
            credential: Credential::new(&credential).expect("strategy emits valid credentials"),
            action: role,
            origin_identity: DeviceIdentity::new(&identity).expect("strategy emits valid identities"),
        };

        let mut wire = BytesMut::new();
        ClientCodec::new().encode(original.clone(), &mut wire).expect("encode");

        let decoded = ServerCodec::new().decode(&mut wire).expect("decode");
        prop_assert_eq!(decoded, Some(original));
        prop_assert!(wire.is_empty(), "decode must consume the full frame");
    }

    /// Property: every encoded frame is exactly one terminated line.
    #[test]
    fn prop_encoded_frame_is_single_line(
        credential in valid_credential(),
        role in valid_role(),
        identity in valid_identity(),
    ) {
        let request = Request::SubmitScan {
            credential: Credential::new(&credential).expect("valid credential"),
            action: role,
            origin_identity: DeviceIdentity::new(&identity).expect("valid identity"),
        };

        let mut wire = BytesMut::new();
        ClientCodec::new().encode(request, &mut wire).expect("encode");

        prop_assert_eq!(wire.last(), Some(&b'\n'));
        let body = &wire[..wire.len() - 1];
        prop_assert!(!body.contains(&b'\n'), "body must not embed the terminator");
    }

    /// Property: arbitrary garbage never panics the decoder.
    ///
    /// A hostile or confused peer can write anything. The decoder must
    /// either wait for more data, produce a message, or return an error;
    /// it must never panic or loop.
    #[test]
    fn prop_decoder_survives_garbage(line in garbage_line()) {
        let mut codec: ServerCodec = ServerCodec::new();

        let mut unterminated = BytesMut::from(&line[..]);
        let _ = codec.decode(&mut unterminated);

        let mut terminated = BytesMut::from(&line[..]);
        terminated.extend_from_slice(b"\n");
        let _ = codec.decode(&mut terminated);
    }

    /// Property: denial messages survive the wire byte-for-byte.
    ///
    /// Scanners classify denials by matching substrings of the server's
    /// text, so framing must not alter the message.
    #[test]
    fn prop_denial_message_preserved(message in "[ -~]{1,120}") {
        let original = Response::scan_error(message.clone());

        let mut wire = BytesMut::new();
        ServerCodec::new().encode(original, &mut wire).expect("encode");

        let decoded = ClientCodec::new().decode(&mut wire).expect("decode");
        match decoded {
            Some(Response::ScanResult { message: decoded_message, .. }) => {
                prop_assert_eq!(decoded_message, message);
            }
            other => prop_assert!(false, "expected scan_result, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod standard_tests {
    use super::*;

    /// Standard test: credential strategy output always validates.
    #[test]
    fn test_valid_credential_strategy() {
        proptest!(|(credential in valid_credential())| {
            prop_assert!(Credential::new(&credential).is_ok());
        });
    }

    /// Standard test: identity strategy output always validates.
    #[test]
    fn test_valid_identity_strategy() {
        proptest!(|(identity in valid_identity())| {
            prop_assert!(DeviceIdentity::new(&identity).is_ok());
        });
    }
}
