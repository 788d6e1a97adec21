mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use common::{RecordingPublisher, RecordingStorage, router_with};

/// Sends one HTTP/1.1 request and returns the raw response.
async fn roundtrip(addr: SocketAddr, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn serves_comment_routes_over_http() {
    let storage = Arc::new(RecordingStorage::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let router = router_with(storage.clone(), publisher.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(margin::serve_listener(listener, router, async move {
        let _ = stopped.await;
    }));

    let created = roundtrip(addr, "POST", "/comments/doc-123", r#"{"text":"hello"}"#).await;
    assert!(created.starts_with("HTTP/1.1 200"), "{created}");
    assert!(created.contains("application/json"));
    assert!(created.contains(r#""PK":"doc-123""#));

    let listed = roundtrip(addr, "GET", "/comments/doc-123", "").await;
    assert!(listed.starts_with("HTTP/1.1 200"), "{listed}");
    assert!(listed.contains(r#""text":"hello""#));

    let missing = roundtrip(addr, "GET", "/nothing/here", "").await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

    let unknown_method = roundtrip(addr, "BREW", "/comments/doc-123", "").await;
    assert!(unknown_method.starts_with("HTTP/1.1 404"), "{unknown_method}");

    let invalid = roundtrip(addr, "POST", "/comments/doc-123", "{oops").await;
    assert!(invalid.starts_with("HTTP/1.1 400"), "{invalid}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();

    assert_eq!(storage.puts(), 1);
    assert_eq!(publisher.published().len(), 1);
}
