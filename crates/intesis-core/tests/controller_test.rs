// End-to-end controller tests: wiremock stands in for the cloud API,
// a scripted TcpListener stands in for the control endpoint.
#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use intesis_api::SessionConfig;
use intesis_core::{CoreError, HvacConfig, HvacController};

const DEVICE: i64 = 127_934_703_953;

const AUTH_OK_REPLY: &[u8] = br#"{"command":"connect_rsp","data":{"status":"ok"}}"#;
const AUTH_ERR_REPLY: &[u8] = br#"{"command":"connect_rsp","data":{"status":"err_token"}}"#;
const SET_ACK_REPLY: &[u8] =
    br#"{"command":"set_ack","data":{"deviceId":127934703953,"seqNo":85,"rssi":198}}"#;

// ── Helpers ─────────────────────────────────────────────────────────

fn control_body(server_ip: &str, server_port: u16) -> serde_json::Value {
    serde_json::json!({
        "config": {
            "token": 575497412,
            "serverIP": server_ip,
            "serverPort": server_port,
            "hash": "abc",
            "inst": [{
                "id": 1,
                "name": "Home",
                "devices": [{
                    "id": DEVICE.to_string(),
                    "name": "Lounge",
                    "familyId": 4864,
                    "modelId": 554,
                    "installationId": 1,
                    "zoneId": 1,
                    "widgets": [1, 2, 9, 10]
                }]
            }]
        },
        "status": {
            "hash": "x",
            "status": [
                {"deviceId": DEVICE, "uid": 1, "value": 1},
                {"deviceId": DEVICE, "uid": 2, "value": 1},
                {"deviceId": DEVICE, "uid": 9, "value": 215},
                {"deviceId": DEVICE, "uid": 10, "value": 230},
                {"deviceId": DEVICE, "uid": 65535, "value": 1},
                {"deviceId": 42, "uid": 1, "value": 0}
            ]
        },
        "errorCode": 0,
        "errorMessage": ""
    })
}

async fn mount_control(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api.php/get/control"))
        .and(body_string_contains("version=1.8.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn test_config(hostname: &str) -> HvacConfig {
    HvacConfig {
        hostname: hostname.to_string(),
        username: "user@example.com".into(),
        password: SecretString::from("hunter2"),
        http_timeout: Duration::from_secs(5),
        session: SessionConfig {
            auth_timeout: Duration::from_secs(5),
            set_timeout: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(60),
            keepalive_device: 0,
        },
        tcp_server: None,
    }
}

/// A control endpoint that answers the handshake and one set command.
async fn spawn_control_endpoint(auth_reply: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_frame(&mut stream).await;
        stream.write_all(auth_reply).await.unwrap();
        if auth_reply == AUTH_OK_REPLY {
            read_frame(&mut stream).await;
            stream.write_all(SET_ACK_REPLY).await.unwrap();
        }
        hold_open(&mut stream).await;
    });
    addr
}

async fn read_frame(stream: &mut TcpStream) -> String {
    let mut buf = [0u8; 1024];
    let n = stream.read(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

async fn hold_open(stream: &mut TcpStream) {
    let mut buf = [0u8; 1024];
    while stream.read(&mut buf).await.unwrap_or(0) > 0 {}
}

// ── Construction ────────────────────────────────────────────────────

#[tokio::test]
async fn missing_credentials_rejected() {
    let config = HvacConfig::default();
    assert!(matches!(
        HvacController::new(config),
        Err(CoreError::Config { .. })
    ));
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn devices_flattens_installations() {
    let server = MockServer::start().await;
    mount_control(&server, control_body("10.0.0.1", 5210)).await;

    let controller = HvacController::new(test_config(&server.uri())).unwrap();
    let devices = controller.devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name, "Lounge");
    assert_eq!(devices[0].numeric_id().unwrap(), DEVICE);
    assert_eq!(
        devices[0].capabilities(),
        vec!["power", "mode", "setpoint", "temperature"]
    );
}

#[tokio::test]
async fn has_device_checks_numeric_id() {
    let server = MockServer::start().await;
    mount_control(&server, control_body("10.0.0.1", 5210)).await;

    let controller = HvacController::new(test_config(&server.uri())).unwrap();
    assert!(controller.has_device(DEVICE).await.unwrap());
    assert!(!controller.has_device(999).await.unwrap());
}

#[tokio::test]
async fn status_names_uids_and_skips_unknowns() {
    let server = MockServer::start().await;
    mount_control(&server, control_body("10.0.0.1", 5210)).await;

    let controller = HvacController::new(test_config(&server.uri())).unwrap();
    let snapshot = controller.status(DEVICE).await.unwrap();

    // The uid 65535 entry and the other device's entries are dropped.
    assert_eq!(snapshot.raw.len(), 4);
    assert_eq!(snapshot.get("power"), Some(1));
    assert_eq!(snapshot.get("mode"), Some(1));
    assert_eq!(snapshot.get("setpoint"), Some(215));
    assert_eq!(snapshot.celsius("temperature"), Some(23.0));

    let pretty = snapshot.pretty();
    assert_eq!(pretty["power"], "on");
    assert_eq!(pretty["mode"], "heat");
}

#[tokio::test]
async fn get_reads_one_parameter() {
    let server = MockServer::start().await;
    mount_control(&server, control_body("10.0.0.1", 5210)).await;

    let controller = HvacController::new(test_config(&server.uri())).unwrap();
    assert_eq!(controller.get(DEVICE, "setpoint").await.unwrap(), 215);

    let err = controller.get(DEVICE, "flux").await.unwrap_err();
    assert!(matches!(err, CoreError::UnknownParameter { .. }));
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn set_runs_full_transaction() {
    let endpoint = spawn_control_endpoint(AUTH_OK_REPLY).await;
    let server = MockServer::start().await;
    mount_control(&server, control_body("127.0.0.1", endpoint.port())).await;

    let controller = HvacController::new(test_config(&server.uri())).unwrap();
    controller.set(DEVICE, 1, 1).await.unwrap();
}

#[tokio::test]
async fn set_named_maps_through_catalogue() {
    let endpoint = spawn_control_endpoint(AUTH_OK_REPLY).await;
    let server = MockServer::start().await;
    mount_control(&server, control_body("127.0.0.1", endpoint.port())).await;

    let controller = HvacController::new(test_config(&server.uri())).unwrap();
    controller.set_named(DEVICE, "power", "on").await.unwrap();
}

#[tokio::test]
async fn set_surfaces_auth_rejection() {
    let endpoint = spawn_control_endpoint(AUTH_ERR_REPLY).await;
    let server = MockServer::start().await;
    mount_control(&server, control_body("127.0.0.1", endpoint.port())).await;

    let controller = HvacController::new(test_config(&server.uri())).unwrap();
    let err = controller.set(DEVICE, 1, 1).await.unwrap_err();
    assert!(err.is_auth(), "got {err}");
}

#[tokio::test]
async fn set_honors_tcp_server_override() {
    let endpoint = spawn_control_endpoint(AUTH_OK_REPLY).await;
    let server = MockServer::start().await;
    // The cloud names an endpoint nothing listens on; the override wins.
    mount_control(&server, control_body("203.0.113.1", 1)).await;

    let mut config = test_config(&server.uri());
    config.tcp_server = Some(endpoint.to_string());
    let controller = HvacController::new(config).unwrap();
    controller.set(DEVICE, 1, 1).await.unwrap();
}

#[tokio::test]
async fn set_surfaces_cloud_error() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "config": {},
        "status": {},
        "errorCode": 5,
        "errorMessage": "Invalid username or password"
    });
    mount_control(&server, body).await;

    let controller = HvacController::new(test_config(&server.uri())).unwrap();
    let err = controller.set(DEVICE, 1, 1).await.unwrap_err();
    assert!(matches!(err, CoreError::Cloud { code: 5, .. }));
}
