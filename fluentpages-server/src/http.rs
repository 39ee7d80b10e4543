//! Just enough HTTP/1.1 for one JSON response per connection.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{io_err, ServerError};

const MAX_HEADERS: usize = 100;

/// Longest request line or header line accepted, terminator included.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Request line of an incoming request. Headers are read and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Request {
    /// Parse a request target (`/page_form/3/?user=alice`).
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, Vec::new()),
        };
        Self {
            method: method.to_string(),
            path: path.to_string(),
            query,
        }
    }

    /// First value of query parameter `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// `{"success": false, "error": message}` with `status`.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "success": false, "error": message.into() }),
        }
    }
}

/// [`read_request`] bounded by `limit`; a peer that stalls gets
/// [`ServerError::Timeout`].
pub async fn read_request_within<R>(
    reader: &mut R,
    limit: Duration,
) -> Result<Option<Request>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    tokio::time::timeout(limit, read_request(reader))
        .await
        .map_err(|_| ServerError::Timeout(limit))?
}

/// Read one request head. `Ok(None)` when the peer closed before sending anything.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let line = match read_line(reader).await? {
        Some(line) => line,
        None => return Ok(None),
    };

    let mut parts = line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version)) if version.starts_with("HTTP/") => {
            (method.to_string(), target.to_string())
        }
        _ => {
            return Err(ServerError::BadRequest(format!(
                "invalid request line '{}'",
                line.trim_end()
            )))
        }
    };

    let mut headers = 0;
    while let Some(header) = read_line(reader).await? {
        if header.trim_end().is_empty() {
            break;
        }
        headers += 1;
        if headers > MAX_HEADERS {
            return Err(ServerError::BadRequest("too many headers".to_string()));
        }
    }

    Ok(Some(Request::new(&method, &target)))
}

/// One line of at most [`MAX_LINE_BYTES`]. `Ok(None)` at end of stream.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = (&mut *reader)
        .take(MAX_LINE_BYTES as u64 + 1)
        .read_line(&mut line)
        .await
        .map_err(|e| io_err("http request read", e))?;
    if n == 0 {
        return Ok(None);
    }
    if n > MAX_LINE_BYTES {
        return Err(ServerError::BadRequest(format!(
            "line longer than {MAX_LINE_BYTES} bytes"
        )));
    }
    Ok(Some(line))
}

pub async fn write_response<W>(writer: &mut W, response: &Response) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_string(&response.body)?;
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason(response.status),
        body.len()
    );
    writer
        .write_all(head.as_bytes())
        .await
        .map_err(|e| io_err("http response write", e))?;
    writer
        .write_all(body.as_bytes())
        .await
        .map_err(|e| io_err("http response write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("http response flush", e))?;
    Ok(())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

/// Percent-decoding with `+` as space; malformed escapes pass through.
fn decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn target_with_query() {
        let req = Request::new("GET", "/page_form/3/?user=ann+lee&x=%2Fy&flag");
        assert_eq!(req.path, "/page_form/3/");
        assert_eq!(req.param("user"), Some("ann lee"));
        assert_eq!(req.param("x"), Some("/y"));
        assert_eq!(req.param("flag"), Some(""));
        assert_eq!(req.param("missing"), None);
    }

    #[test]
    fn malformed_escapes_pass_through() {
        assert_eq!(decode("100%"), "100%");
        assert_eq!(decode("%zz"), "%zz");
        assert_eq!(decode("%41"), "A");
    }

    #[tokio::test]
    async fn reads_request_head() {
        let raw = b"GET /get_layout/1/ HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n";
        let mut reader = BufReader::new(&raw[..]);
        let req = read_request(&mut reader).await.expect("read").expect("request");
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/get_layout/1/");
    }

    #[tokio::test]
    async fn empty_connection_is_none() {
        let mut reader = BufReader::new(&b""[..]);
        assert!(read_request(&mut reader).await.expect("read").is_none());
    }

    #[tokio::test]
    async fn garbage_request_line_is_rejected() {
        let mut reader = BufReader::new(&b"hello\r\n\r\n"[..]);
        let err = read_request(&mut reader).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn oversized_request_line_is_rejected() {
        let raw = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(MAX_LINE_BYTES));
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_request(&mut reader).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)), "got: {err}");
    }

    #[tokio::test]
    async fn oversized_header_is_rejected() {
        let raw = format!(
            "GET / HTTP/1.1\r\nX-Pad: {}\r\n\r\n",
            "a".repeat(MAX_LINE_BYTES)
        );
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_request(&mut reader).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)), "got: {err}");
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_peer_times_out() {
        let (_client, server) = tokio::io::duplex(64);
        let mut reader = BufReader::new(server);
        let err = read_request_within(&mut reader, Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Timeout(_)), "got: {err}");
    }

    #[tokio::test]
    async fn response_has_length_and_json_body() {
        let mut out = Vec::new();
        write_response(&mut out, &Response::error(404, "Layout not found"))
            .await
            .expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let (head, body) = text.split_once("\r\n\r\n").expect("head/body");
        assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(head.contains(&format!("Content-Length: {}", body.len())));
        let parsed: Value = serde_json::from_str(body).expect("json body");
        assert_eq!(parsed, json!({"success": false, "error": "Layout not found"}));
    }
}
