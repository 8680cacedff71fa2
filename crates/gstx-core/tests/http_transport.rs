//! HTTP transport tests against a one-shot local responder.

use gstx_core::models::config::ApiConfig;
use gstx_core::{
    ApiClient, ApiError, ExtractionId, ExtractionSubmitter, GstxError, HistoryStore, UploadFile,
    Validator,
};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one connection, capture the request and answer with `response`.
async fn serve_once(response: String) -> (ApiConfig, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });

    let config = ApiConfig {
        base_url: format!("http://{}", addr),
        ..ApiConfig::default()
    };
    (config, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(header_end) = find(&buf, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            if headers.contains("transfer-encoding: chunked") {
                if buf.ends_with(b"0\r\n\r\n") {
                    break;
                }
                continue;
            }
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn http_response(status: &str, extra_headers: &[&str], body: &str) -> String {
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for header in extra_headers {
        response.push_str(header);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");
    response.push_str(body);
    response
}

#[tokio::test]
async fn test_stats_request_and_decode() {
    let (config, server) = serve_once(http_response(
        "200 OK",
        &[],
        r#"{"total_extractions": 3, "total_invoice_amount": 600.0, "unique_suppliers": 2, "api_status": "active"}"#,
    ))
    .await;
    let client = ApiClient::from_config(&config).unwrap();

    let stats = client.stats().await.unwrap();

    assert_eq!(stats.total_extractions, 3);
    assert_eq!(stats.unique_suppliers, 2);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /stats HTTP/1.1\r\n"));
    let lowered = request.to_lowercase();
    assert!(lowered.contains("accept: application/json"));
    assert!(lowered.contains("user-agent: gstx/"));
}

#[tokio::test]
async fn test_unavailable_carries_detail() {
    let (config, server) = serve_once(http_response(
        "503 Service Unavailable",
        &[],
        r#"{"detail": "GST Invoice Extractor service is not available. Check API configuration."}"#,
    ))
    .await;
    let client = ApiClient::from_config(&config).unwrap();

    let result = client.stats().await;

    assert_eq!(
        result,
        Err(ApiError::Unavailable {
            message: "GST Invoice Extractor service is not available. Check API configuration."
                .to_string()
        })
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_missing_extraction_is_not_found() {
    let (config, server) = serve_once(http_response(
        "404 Not Found",
        &[],
        r#"{"detail": "Extraction ID not found"}"#,
    ))
    .await;
    let client = ApiClient::from_config(&config).unwrap();

    let result = client.extraction(&ExtractionId::new("extract_00000000_0")).await;

    assert!(matches!(result, Err(ApiError::NotFound { .. })));
    let request = server.await.unwrap();
    assert!(request.starts_with("GET /extraction/extract_00000000_0 HTTP/1.1\r\n"));
}

#[tokio::test]
async fn test_text_submission_posts_json() {
    let (config, server) = serve_once(http_response(
        "200 OK",
        &[],
        r#"{"success": true, "message": "Invoice data extracted successfully from text", "extraction_id": "extract_1a2b3c4d_1710000000"}"#,
    ))
    .await;
    let submitter =
        ExtractionSubmitter::new(ApiClient::from_config(&config).unwrap(), Validator::default());

    let id = submitter.submit_text("  Tax Invoice No 7  ").await.unwrap();

    assert_eq!(id.as_str(), "extract_1a2b3c4d_1710000000");
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /extract/text HTTP/1.1\r\n"));
    assert!(request.to_lowercase().contains("content-type: application/json"));
    assert!(request.ends_with(r#"{"invoice_text":"  Tax Invoice No 7  "}"#));
}

#[tokio::test]
async fn test_image_submission_posts_multipart() {
    let (config, server) = serve_once(http_response(
        "200 OK",
        &[],
        r#"{"success": true, "extraction_id": "extract_img"}"#,
    ))
    .await;
    let submitter =
        ExtractionSubmitter::new(ApiClient::from_config(&config).unwrap(), Validator::default());
    let file = UploadFile::new("bill.png", "image/png", b"\x89PNG\r\n\x1a\nrest".to_vec());

    submitter.submit_image(&file).await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /extract/image HTTP/1.1\r\n"));
    assert!(request.to_lowercase().contains("content-type: multipart/form-data; boundary="));
    assert!(request.contains(r#"name="file"; filename="bill.png""#));
    assert!(request.to_lowercase().contains("content-type: image/png"));
}

#[tokio::test]
async fn test_download_reads_content_disposition() {
    let (config, server) = serve_once(http_response(
        "200 OK",
        &["Content-Disposition: attachment; filename=\"gst_invoice_extract_a.json\""],
        r#"{"supplier_details": {"name": "Shree Traders"}}"#,
    ))
    .await;
    let store = HistoryStore::new(ApiClient::from_config(&config).unwrap());

    let download = store.download(&ExtractionId::new("extract_a")).await.unwrap();

    assert_eq!(download.filename, "gst_invoice_extract_a.json");
    let record = download.parse_record().unwrap();
    assert_eq!(record.extraction_id, Some(ExtractionId::new("extract_a")));

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /extraction/extract_a/download HTTP/1.1\r\n"));
}

#[tokio::test]
async fn test_delete_sends_delete() {
    let (config, server) = serve_once(http_response(
        "200 OK",
        &[],
        r#"{"message": "Extraction deleted successfully"}"#,
    ))
    .await;
    let client = ApiClient::from_config(&config).unwrap();

    client
        .delete_extraction(&ExtractionId::new("extract_b"))
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("DELETE /extraction/extract_b HTTP/1.1\r\n"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ApiConfig {
        base_url: format!("http://{}", addr),
        ..ApiConfig::default()
    };
    let submitter =
        ExtractionSubmitter::new(ApiClient::from_config(&config).unwrap(), Validator::default());

    let result = submitter.submit_text("invoice").await;

    match result {
        Err(GstxError::Api(ApiError::Transport(message))) => {
            assert!(message.contains("could not connect"), "{}", message)
        }
        other => panic!("expected a transport error, got {:?}", other),
    }
    assert!(!submitter.is_busy());
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        drop(socket);
    });

    let config = ApiConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 1,
        ..ApiConfig::default()
    };
    let client = ApiClient::from_config(&config).unwrap();

    let result = client.stats().await;

    match result {
        Err(ApiError::Transport(message)) => assert!(message.contains("timed out"), "{}", message),
        other => panic!("expected a timeout, got {:?}", other),
    }
    server.abort();
}
