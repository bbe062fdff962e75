//! Golden wire-format tests.
//!
//! Scanners, actuators and the access server are deployed independently,
//! so the exact JSON documents exchanged between them must stay stable.
//! These tests pin the field names and tag values both sides rely on.

use bytes::BytesMut;
use doorlink_core::{Credential, DeviceIdentity, DeviceKind, DoorStatistics, NodeRole};
use doorlink_protocol::{ClientCodec, DoorReport, Request, Response, ScanStatus, ServerCodec};
use tokio_util::codec::{Decoder, Encoder};

fn decode_request(raw: &str) -> Request {
    let mut codec = ServerCodec::new();
    let mut buffer = BytesMut::from(raw.as_bytes());
    codec
        .decode(&mut buffer)
        .expect("line should decode")
        .expect("line should be complete")
}

fn decode_response(raw: &str) -> Response {
    let mut codec = ClientCodec::new();
    let mut buffer = BytesMut::from(raw.as_bytes());
    codec
        .decode(&mut buffer)
        .expect("line should decode")
        .expect("line should be complete")
}

#[test]
fn server_accepts_documented_probe_line() {
    let request = decode_request("{\"op\":\"identity_probe\"}\n");
    assert_eq!(request, Request::IdentityProbe);
}

#[test]
fn server_accepts_documented_submit_line() {
    let request = decode_request(
        "{\"op\":\"submit_scan\",\"credential\":\"080058DBB1\",\"action\":\"exit\",\"origin_identity\":\"E4:65:B8:27:73:08\"}\n",
    );

    match request {
        Request::SubmitScan {
            credential,
            action,
            origin_identity,
        } => {
            assert_eq!(credential, Credential::new("080058DBB1").unwrap());
            assert_eq!(action, NodeRole::Exit);
            assert_eq!(
                origin_identity,
                DeviceIdentity::new("E4:65:B8:27:73:08").unwrap()
            );
        }
        other => panic!("Expected submit_scan, got {other:?}"),
    }
}

#[test]
fn submit_line_normalizes_credential_case() {
    let request =
        decode_request("{\"op\":\"submit_scan\",\"credential\":\"08 00 58 db b1\",\"action\":\"entry\",\"origin_identity\":\"aa:bb:cc:dd:ee:ff\"}\n");

    match request {
        Request::SubmitScan { credential, .. } => {
            assert_eq!(credential.as_str(), "080058DBB1");
        }
        other => panic!("Expected submit_scan, got {other:?}"),
    }
}

#[test]
fn client_accepts_documented_identity_line() {
    let response = decode_response(
        "{\"kind\":\"identity\",\"device_type\":\"access_server\",\"identity\":\"E4:65:B8:27:73:08\"}\n",
    );

    assert_eq!(
        response,
        Response::identity(
            DeviceKind::AccessServer,
            DeviceIdentity::new("E4:65:B8:27:73:08").unwrap()
        )
    );
}

#[test]
fn client_accepts_documented_denial_line() {
    let response =
        decode_response("{\"kind\":\"scan_result\",\"status\":\"error\",\"message\":\"User already inside\"}\n");

    match response {
        Response::ScanResult {
            status,
            message,
            user_name,
        } => {
            assert_eq!(status, ScanStatus::Error);
            assert_eq!(message, "User already inside");
            assert_eq!(user_name, None);
        }
        other => panic!("Expected scan_result, got {other:?}"),
    }
}

#[test]
fn door_status_line_round_trips_through_both_codecs() {
    let mut stats = DoorStatistics::default();
    stats.record_unlock(doorlink_core::DoorReason::Entry);

    let report = DoorReport {
        device_type: DeviceKind::DoorController,
        mac_address: DeviceIdentity::new("D8:3A:DD:78:01:07").unwrap(),
        door_open: true,
        door_closed: false,
        last_operation: Some(doorlink_core::DoorOperation::UnlockEntry),
        time_until_close_ms: Some(3100),
        statistics: stats,
    };

    let mut server = ServerCodec::new();
    let mut buffer = BytesMut::new();
    server
        .encode(Response::DoorStatus(report.clone()), &mut buffer)
        .unwrap();

    let text = String::from_utf8(buffer.to_vec()).unwrap();
    assert!(text.contains("\"kind\":\"door_status\""));
    assert!(text.contains("\"mac_address\":\"D8:3A:DD:78:01:07\""));
    assert!(text.ends_with('\n'));

    let mut client = ClientCodec::new();
    let mut buffer = BytesMut::from(text.as_bytes());
    let decoded = client.decode(&mut buffer).unwrap();
    assert_eq!(decoded, Some(Response::DoorStatus(report)));
}

#[test]
fn malformed_submit_line_is_rejected() {
    let mut codec = ServerCodec::new();

    // Credential fails validation during deserialization.
    let mut buffer = BytesMut::from(
        &b"{\"op\":\"submit_scan\",\"credential\":\"ZZZZ\",\"action\":\"entry\",\"origin_identity\":\"AA\"}\n"[..],
    );
    assert!(codec.decode(&mut buffer).is_err());

    // Unknown action value.
    let mut buffer = BytesMut::from(
        &b"{\"op\":\"submit_scan\",\"credential\":\"AB12\",\"action\":\"sideways\",\"origin_identity\":\"AA\"}\n"[..],
    );
    assert!(codec.decode(&mut buffer).is_err());
}

#[test]
fn pipelined_exchange_decodes_in_order() {
    let mut client = ClientCodec::new();
    let mut server = ServerCodec::new();
    let mut wire = BytesMut::new();

    client.encode(Request::IdentityProbe, &mut wire).unwrap();
    client.encode(Request::Status, &mut wire).unwrap();

    assert_eq!(server.decode(&mut wire).unwrap(), Some(Request::IdentityProbe));
    assert_eq!(server.decode(&mut wire).unwrap(), Some(Request::Status));
    assert_eq!(server.decode(&mut wire).unwrap(), None);
}
