use super::*;
use crate::frame::FrameIdGenerator;
use crate::test_helpers::{MockTransport, OK_BODY, RecordingHandler, reply};
use crate::transport::TransportError;

use EventKind::*;

fn bound(request: Request) -> PlatformRequest {
    let url = Url::parse("https://example.test/Platform/User/?lc=en").unwrap();
    let options = RequestOptions::for_api_key("key-123", Some(Duration::from_secs(1))).unwrap();
    PlatformRequest::new(FrameIdGenerator::new().next_id(), request, url, options)
}

#[tokio::test]
async fn success_path_emits_full_sequence() {
    let transport = MockTransport::new(vec![reply(200, OK_BODY)]);
    let handler = RecordingHandler::default();

    let done = bound(Request::get("/User/")).execute(&transport, &handler).await;

    assert_eq!(handler.events(), vec![BeforeSend, HttpSuccess, HttpDone, ResponseParsed, Success, Done]);
    assert!(done.phase().is_finished());
    assert_eq!(done.status(), Some(200));
    assert!(!done.response().unwrap().is_error());
    assert!(done.error().is_none());
}

#[tokio::test]
async fn http_500_takes_fail_path() {
    let transport = MockTransport::new(vec![reply(500, "Internal Server Error")]);
    let handler = RecordingHandler::default();

    let done = bound(Request::get("/User/")).execute(&transport, &handler).await;

    assert_eq!(handler.events(), vec![BeforeSend, HttpFail, HttpDone, Error, Done]);
    assert_eq!(done.status(), Some(500));
    assert!(done.response().is_none());
    assert!(matches!(done.error(), Some(PlatformError::Network { status: Some(500), .. })));
}

#[tokio::test]
async fn transport_failure_takes_fail_path() {
    let transport = MockTransport::new(vec![Err(TransportError::Timeout)]);
    let handler = RecordingHandler::default();

    let done = bound(Request::get("/User/")).execute(&transport, &handler).await;

    assert_eq!(handler.events(), vec![BeforeSend, HttpFail, HttpDone, Error, Done]);
    assert_eq!(done.status(), None);
    assert!(matches!(done.error(), Some(PlatformError::Network { status: None, .. })));
}

#[tokio::test]
async fn corrupt_body_skips_parsed_and_success() {
    let transport = MockTransport::new(vec![reply(200, "not json")]);
    let handler = RecordingHandler::default();

    let done = bound(Request::get("/User/")).execute(&transport, &handler).await;

    assert_eq!(handler.events(), vec![BeforeSend, HttpSuccess, HttpDone, Error, Done]);
    assert!(done.response().is_none());
    assert!(matches!(done.error(), Some(PlatformError::CorruptResponse(_))));
}

#[tokio::test]
async fn application_error_still_succeeds() {
    let transport = MockTransport::new(vec![reply(200, r#"{"ErrorCode":99,"ErrorStatus":"NotFound"}"#)]);
    let handler = RecordingHandler::default();

    let done = bound(Request::get("/User/")).execute(&transport, &handler).await;

    assert_eq!(handler.events(), vec![BeforeSend, HttpSuccess, HttpDone, ResponseParsed, Success, Done]);
    assert!(done.response().unwrap().is_error());
}

#[tokio::test]
async fn before_send_failure_never_reaches_transport() {
    let transport = MockTransport::ok();
    let handler = RecordingHandler { fail_before_send: Some(PlatformError::CsrfTokenMissing), ..Default::default() };

    let done = bound(Request::get("/User/")).execute(&transport, &handler).await;

    assert_eq!(handler.events(), vec![BeforeSend, Error, Done]);
    assert!(transport.sent().is_empty());
    assert_eq!(done.error(), Some(&PlatformError::CsrfTokenMissing));
}

#[tokio::test]
async fn transformed_options_are_sent() {
    let transport = MockTransport::ok();
    let handler = RecordingHandler { extra_header: Some(("Authorization", "Bearer abc")), ..Default::default() };

    let body = serde_json::json!({ "a": 1 });
    let done = bound(Request::post("/Forum/Post/", body)).execute(&transport, &handler).await;

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let sent = &sent[0];
    assert_eq!(sent.method, reqwest::Method::POST);
    assert_eq!(sent.body.as_deref(), Some(r#"{"a":1}"#));
    assert_eq!(sent.timeout, Some(Duration::from_secs(1)));
    assert_eq!(sent.headers.get(API_KEY_HEADER).unwrap(), "key-123");
    assert_eq!(sent.headers.get("content-type").unwrap(), "application/json");
    assert_eq!(sent.headers.get("authorization").unwrap(), "Bearer abc");
    assert_eq!(done.options().header("Authorization"), Some("Bearer abc"));
}

#[test]
fn with_header_rejects_invalid_values() {
    let err = RequestOptions::default().with_header("X-Test", "bad\nvalue").unwrap_err();
    assert!(matches!(err, PlatformError::InvalidHeader(_)));

    let err = RequestOptions::default().with_header("bad header", "v").unwrap_err();
    assert!(matches!(err, PlatformError::InvalidHeader(_)));
}

#[test]
fn new_request_is_idle() {
    let req = bound(Request::get("/User/"));
    assert_eq!(req.phase(), RequestPhase::Idle);
    assert_eq!(req.url().query(), Some("lc=en"));
    assert_eq!(req.options().header(API_KEY_HEADER), Some("key-123"));
}
