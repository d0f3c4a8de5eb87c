use super::*;
use crate::config::DEFAULT_CONNECT_TIMEOUT_MS;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve exactly one connection with a canned HTTP/1.1 response.
async fn serve_once(status_line: &'static str, body: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let reply = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(reply.as_bytes()).await;
        let _ = socket.shutdown().await;
    });
    Url::parse(&format!("http://{addr}/Platform/User/")).unwrap()
}

fn get(url: Url, timeout: Option<Duration>) -> TransportRequest {
    TransportRequest { url, method: Method::GET, headers: HeaderMap::new(), body: None, timeout }
}

#[test]
fn success_range() {
    let ok = TransportResponse { status: 204, body: String::new() };
    let redirect = TransportResponse { status: 302, body: String::new() };
    let server_error = TransportResponse { status: 500, body: String::new() };
    assert!(ok.is_success());
    assert!(!redirect.is_success());
    assert!(!server_error.is_success());
}

#[test]
fn transport_error_maps_to_statusless_network_error() {
    let err: PlatformError = TransportError::Timeout.into();
    assert!(matches!(err, PlatformError::Network { status: None, .. }));
}

#[tokio::test]
async fn http_transport_returns_status_and_body() {
    let url = serve_once("200 OK", r#"{"ErrorCode":1}"#).await;
    let transport = HttpTransport::new(Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)).unwrap();

    let resp = transport.send(get(url, None)).await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, r#"{"ErrorCode":1}"#);
}

#[tokio::test]
async fn http_transport_passes_error_statuses_through() {
    let url = serve_once("500 Internal Server Error", "oops").await;
    let transport = HttpTransport::new(Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)).unwrap();

    let resp = transport.send(get(url, None)).await.unwrap();
    assert_eq!(resp.status, 500);
    assert!(!resp.is_success());
}

#[tokio::test]
async fn http_transport_reports_timeouts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let transport = HttpTransport::new(Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)).unwrap();
    let url = Url::parse(&format!("http://{addr}/")).unwrap();
    let err = transport
        .send(get(url, Some(Duration::from_millis(100))))
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::Timeout);
}
