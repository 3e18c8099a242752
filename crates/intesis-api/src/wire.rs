//! Wire codec for the TCP control protocol.
//!
//! The protocol is plaintext JSON over TCP, brace-delimited (see
//! [`crate::frame`]). Requests and responses share a two-level shape:
//! `{ "command": "...", "data": { ... } }`. There is no request id —
//! correlation is by command kind only.

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ── Command vocabulary ───────────────────────────────────────────────

pub const CMD_CONNECT_REQ: &str = "connect_req";
pub const CMD_CONNECT_RSP: &str = "connect_rsp";
pub const CMD_SET: &str = "set";
pub const CMD_SET_ACK: &str = "set_ack";
pub const CMD_STATUS: &str = "status";
pub const CMD_RSSI: &str = "rssi";
pub const CMD_GET: &str = "get";

/// Auth reply status that means success.
pub const AUTH_OK: &str = "ok";

/// Housekeeping uid sent on keepalive `get` requests.
pub const KEEPALIVE_UID: i32 = 10;

// ── Requests ─────────────────────────────────────────────────────────

/// An outgoing command.
///
/// All data fields are always serialized — the real endpoint tolerates
/// zero values, and observed traffic always carries the full set.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest {
    pub command: &'static str,
    pub data: RequestData,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub device_id: i64,
    pub uid: i32,
    pub value: i32,
    /// Always 0 — the protocol carries no real sequencing.
    pub seq_no: i32,
    pub token: i64,
}

impl CommandRequest {
    /// The authentication handshake. The token is single-use.
    pub fn connect(token: i64) -> Self {
        Self {
            command: CMD_CONNECT_REQ,
            data: RequestData {
                token,
                ..RequestData::default()
            },
        }
    }

    /// A parameter write against a device.
    pub fn set(device_id: i64, uid: i32, value: i32) -> Self {
        Self {
            command: CMD_SET,
            data: RequestData {
                device_id,
                uid,
                value,
                ..RequestData::default()
            },
        }
    }

    /// The keepalive `get` that keeps the socket warm between commands.
    pub fn keepalive(device_id: i64) -> Self {
        Self {
            command: CMD_GET,
            data: RequestData {
                device_id,
                uid: KEEPALIVE_UID,
                ..RequestData::default()
            },
        }
    }

    /// Serialize to the exact wire shape.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(|e| Error::Encode {
            message: e.to_string(),
        })
    }
}

// ── Responses ────────────────────────────────────────────────────────

/// An inbound message from the control server.
///
/// `status` is populated only on the auth reply; `rssi`/`seq_no` only on
/// set acknowledgements and signal-strength pushes. Everything defaults
/// so that any structurally valid message decodes.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub data: ResponseData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(default)]
    pub device_id: i64,
    #[serde(default)]
    pub seq_no: i32,
    #[serde(default)]
    pub rssi: i32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub uid: i32,
    #[serde(default)]
    pub value: i64,
}

impl CommandResponse {
    /// Parse one frame into a typed response.
    pub fn decode(frame: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(frame).map_err(|e| Error::Decode {
            message: e.to_string(),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn connect_request_wire_shape() {
        let req = CommandRequest::connect(575_497_412);
        let json = String::from_utf8(req.encode().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"command":"connect_req","data":{"deviceId":0,"uid":0,"value":0,"seqNo":0,"token":575497412}}"#
        );
    }

    #[test]
    fn set_request_wire_shape() {
        let req = CommandRequest::set(127_934_703_953, 1, 0);
        let json = String::from_utf8(req.encode().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"command":"set","data":{"deviceId":127934703953,"uid":1,"value":0,"seqNo":0,"token":0}}"#
        );
    }

    #[test]
    fn keepalive_request_uses_housekeeping_uid() {
        let req = CommandRequest::keepalive(42);
        assert_eq!(req.command, CMD_GET);
        assert_eq!(req.data.uid, KEEPALIVE_UID);
        assert_eq!(req.data.device_id, 42);
    }

    #[test]
    fn decode_auth_ack() {
        let resp =
            CommandResponse::decode(br#"{"command":"connect_rsp","data":{"status":"ok"}}"#)
                .unwrap();
        assert_eq!(resp.command, CMD_CONNECT_RSP);
        assert_eq!(resp.data.status, AUTH_OK);
    }

    #[test]
    fn decode_set_ack() {
        let resp = CommandResponse::decode(
            br#"{"command":"set_ack","data":{"deviceId":127934703953,"seqNo":85,"rssi":198}}"#,
        )
        .unwrap();
        assert_eq!(resp.command, CMD_SET_ACK);
        assert_eq!(resp.data.device_id, 127_934_703_953);
        assert_eq!(resp.data.seq_no, 85);
        assert_eq!(resp.data.rssi, 198);
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let err = CommandResponse::decode(b"{\"command\":").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn decode_tolerates_unknown_fields() {
        let resp = CommandResponse::decode(
            br#"{"command":"status","data":{"deviceId":1,"uid":10,"value":231,"extra":true}}"#,
        )
        .unwrap();
        assert_eq!(resp.command, CMD_STATUS);
        assert_eq!(resp.data.uid, 10);
        assert_eq!(resp.data.value, 231);
    }
}
