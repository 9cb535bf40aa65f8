//! Round-trip tests against a canned-response HTTP server.
//!
//! The server here is a bare `TcpListener` that answers every connection
//! with one pre-baked HTTP response. That is all the client contract
//! needs: one request, one response, no keep-alive.

use std::time::Duration;

use api::{ApiError, FileApiClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Spawns a one-shot HTTP server returning `status` and `body` for every
/// request, and returns its base URL plus a handle yielding the raw request.
async fn canned_server(status: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        // Read headers, then keep reading until the announced body length
        // has arrived so assertions can look at POST bodies.
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            if n == 0 {
                break;
            }
            if let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + body_len {
                    break;
                }
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).to_string()
    });

    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn list_files_normalizes_both_field_spellings() {
    let body = r#"[
        {"name":"docs","size":0,"lastModified":1700000000000,"isDirectory":true,"path":"docs"},
        {"filename":"a.txt","size":12,"modified":1690000000000,"directory":false,"path":"a.txt"}
    ]"#;
    let (base, handle) = canned_server("200 OK", body).await;

    let client = FileApiClient::new(&base).unwrap();
    let entries = client.list_files("").await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].display_name(), "docs");
    assert_eq!(entries[0].is_directory, Some(true));
    assert_eq!(entries[1].display_name(), "a.txt");
    assert_eq!(entries[1].size, Some(12));

    let request = handle.await.unwrap();
    assert!(request.starts_with("GET /api/files HTTP/1.1"));
}

#[tokio::test]
async fn list_files_sends_folder_query() {
    let (base, handle) = canned_server("200 OK", "[]").await;

    let client = FileApiClient::new(&base).unwrap();
    client.list_files("docs/reports").await.unwrap();

    let request = handle.await.unwrap();
    assert!(request.starts_with("GET /api/files?folder=docs%2Freports HTTP/1.1"));
}

#[tokio::test]
async fn error_body_surfaces_as_status_error() {
    let (base, _handle) = canned_server("500 Internal Server Error", r#"{"error":"broken disk"}"#).await;

    let client = FileApiClient::new(&base).unwrap();
    let err = client.list_files("").await.unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "broken disk");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn upload_posts_multipart_with_folder_field() {
    let (base, handle) = canned_server("200 OK", "{}").await;

    let client = FileApiClient::new(&base).unwrap();
    client
        .upload_bytes("hello.txt", b"hello".to_vec(), "inbox")
        .await
        .unwrap();

    let request = handle.await.unwrap();
    assert!(request.starts_with("POST /upload HTTP/1.1"));
    assert!(request.contains("multipart/form-data"));
}

#[tokio::test]
async fn delete_file_hits_delete_path() {
    let (base, handle) = canned_server("200 OK", "{}").await;

    let client = FileApiClient::new(&base).unwrap();
    client.delete_file("old report.pdf", "archive").await.unwrap();

    let request = handle.await.unwrap();
    assert!(request.starts_with("GET /delete/old%20report.pdf?folder=archive HTTP/1.1"));
}

#[tokio::test]
async fn delete_folder_sends_path_query() {
    let (base, handle) = canned_server("200 OK", "{}").await;

    let client = FileApiClient::new(&base).unwrap();
    client.delete_folder("docs/old").await.unwrap();

    let request = handle.await.unwrap();
    assert!(request.starts_with("GET /api/delete-folder?path=docs%2Fold HTTP/1.1"));
}

#[tokio::test]
async fn create_folder_posts_form_fields() {
    let (base, handle) = canned_server("200 OK", "{}").await;

    let client = FileApiClient::new(&base).unwrap();
    client.create_folder("new folder", "docs").await.unwrap();

    let request = handle.await.unwrap();
    assert!(request.starts_with("POST /api/folders HTTP/1.1"));
    assert!(request.contains("application/x-www-form-urlencoded"));
    assert!(request.contains("name=new+folder&parent=docs"));
}

#[tokio::test]
async fn storage_info_parses_usage() {
    let body = r#"{"totalSize":123,"usedSpace":512,"totalSpace":1024}"#;
    let (base, _handle) = canned_server("200 OK", body).await;

    let client = FileApiClient::new(&base).unwrap();
    let info = client.storage_info("").await.unwrap();

    assert_eq!(info.total_size, 123);
    assert_eq!(info.used_percent(), 50);
}

#[tokio::test]
async fn download_returns_raw_bytes() {
    let (base, handle) = canned_server("200 OK", "raw-bytes-here").await;

    let client = FileApiClient::new(&base).unwrap();
    let bytes = client.download_file("blob.bin", "").await.unwrap();

    assert_eq!(&bytes[..], b"raw-bytes-here");
    let request = handle.await.unwrap();
    assert!(request.starts_with("GET /download/blob.bin HTTP/1.1"));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        FileApiClient::with_timeout(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = client.list_files("").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
