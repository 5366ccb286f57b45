//! Verify login and occupancy handling against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected results. A recording transport replays the simulated response
//! and captures the request the client sent. Every client starts from a
//! saved session for user `u1`, so construction itself never hits the
//! transport.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use gymgroup_core::{
    ApiError, ClientConfig, GymClient, HttpMethod, HttpRequest, HttpResponse, Transport,
    TransportError,
};

const BASE_URL: &str = "http://localhost:3000/np/";

/// Replays one simulated response and records every request.
struct RecordingTransport {
    response: Option<HttpResponse>,
    requests: Rc<RefCell<Vec<HttpRequest>>>,
}

impl Transport for RecordingTransport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.response
            .take()
            .ok_or_else(|| TransportError::Other("no simulated response left".to_string()))
    }
}

fn client(
    dir: &Path,
    username: &str,
    password: &str,
    response: HttpResponse,
) -> (GymClient<RecordingTransport>, Rc<RefCell<Vec<HttpRequest>>>) {
    let state_file = dir.join("state.json");
    std::fs::write(
        &state_file,
        r#"{"cookies":{"JSESSIONID":"restored"},"login_resp":{"uuid":"u1","homeClubUuid":"g1"}}"#,
    )
    .unwrap();

    let requests = Rc::new(RefCell::new(Vec::new()));
    let transport = RecordingTransport {
        response: Some(response),
        requests: Rc::clone(&requests),
    };
    let config = ClientConfig::new(username, password)
        .with_base_url(BASE_URL)
        .with_state_file(state_file);
    (GymClient::with_transport(config, transport), requests)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated_response(sim: &serde_json::Value) -> HttpResponse {
    let headers = sim
        .get("set_cookie")
        .and_then(|c| c.as_str())
        .map(|c| vec![("Set-Cookie".to_string(), c.to_string())])
        .unwrap_or_default();
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers,
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

fn assert_error(name: &str, expected: &str, err: ApiError) {
    match expected {
        "HttpError" => assert!(matches!(err, ApiError::HttpError { .. }), "{name}: got {err:?}"),
        "Forbidden" => assert!(matches!(err, ApiError::Forbidden { .. }), "{name}: got {err:?}"),
        "DeserializationError" => {
            assert!(matches!(err, ApiError::DeserializationError(_)), "{name}: got {err:?}")
        }
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    let raw = include_str!("../../test-vectors/login.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (mut client, requests) = client(
            dir.path(),
            case["username"].as_str().unwrap(),
            case["password"].as_str().unwrap(),
            simulated_response(&case["simulated_response"]),
        );

        let result = client.login();

        // Verify request
        let requests = requests.borrow();
        assert_eq!(requests.len(), 1, "{name}: exactly one request");
        let req = &requests[0];
        let expected_req = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert_eq!(
            req.header("Content-Type"),
            expected_req["content_type"].as_str(),
            "{name}: content type"
        );
        assert_eq!(req.body.as_deref(), expected_req["body"].as_str(), "{name}: body");
        assert_eq!(req.header("Cookie"), Some("JSESSIONID=restored"), "{name}: cookie");

        // Verify outcome
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, expected_error.as_str().unwrap(), result.unwrap_err());
            assert_eq!(client.user_id(), Some("u1"), "{name}: identity unchanged");
            continue;
        }

        result.unwrap();
        let identity = &case["expected_identity"];
        assert_eq!(client.user_id(), identity["user_id"].as_str(), "{name}: user_id");
        assert_eq!(client.home_gym(), identity["home_gym"].as_str(), "{name}: home_gym");

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("state.json")).unwrap())
                .unwrap();
        let login_body: serde_json::Value =
            serde_json::from_str(case["simulated_response"]["body"].as_str().unwrap()).unwrap();
        assert_eq!(saved["login_resp"], login_body, "{name}: saved login_resp");
        assert_eq!(saved["cookies"], case["expected_cookies"], "{name}: saved cookies");
    }
}

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

#[test]
fn occupancy_test_vectors() {
    let raw = include_str!("../../test-vectors/occupancy.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (mut client, requests) = client(
            dir.path(),
            "member@example.com",
            "hunter2",
            simulated_response(&case["simulated_response"]),
        );

        let result = client.get_gym_occupancy(case["location_id"].as_str().unwrap());

        // Verify request
        let requests = requests.borrow();
        assert_eq!(requests.len(), 1, "{name}: exactly one request");
        let req = &requests[0];
        let expected_req = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert!(req.body.is_none(), "{name}: body should be None");

        // Verify parse
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, expected_error.as_str().unwrap(), result.unwrap_err());
        } else {
            assert_eq!(result.unwrap(), case["expected_result"].as_i64(), "{name}: parsed result");
        }
    }
}
