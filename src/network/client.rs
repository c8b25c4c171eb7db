use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::utils::from_json;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// What a peer answers to `GET /chain`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerChain {
    pub length: usize,
    pub chain: Vec<Block>,
}

/// One read of a peer's chain. Resolution calls this exactly once per peer.
pub trait PeerClient {
    fn fetch_chain(&self, peer: &str) -> Result<PeerChain>;
}

/// Plain HTTP/1.1 over a blocking socket, bounded by connect and read timeouts
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    timeout: Duration,
}

struct Endpoint {
    authority: String,
    path_prefix: String,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> HttpPeerClient {
        HttpPeerClient { timeout }
    }

    fn parse_endpoint(peer: &str) -> Result<Endpoint> {
        let rest = if let Some(rest) = peer.strip_prefix("http://") {
            rest
        } else if peer.starts_with("https://") {
            return Err(LedgerError::Network(format!(
                "TLS peers are not supported: {peer}"
            )));
        } else {
            peer
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(LedgerError::Network(format!("Invalid peer endpoint: {peer}")));
        }

        // "[::1]" is a bare IPv6 host, "[::1]:5000" already has its port
        let has_port = match authority.strip_prefix('[') {
            Some(v6) => v6.contains("]:"),
            None => authority.contains(':'),
        };
        let authority = if has_port {
            authority.to_string()
        } else {
            format!("{authority}:80")
        };

        Ok(Endpoint {
            authority,
            path_prefix: path.trim_end_matches('/').to_string(),
        })
    }

    fn connect(&self, authority: &str) -> Result<TcpStream> {
        let addrs = authority
            .to_socket_addrs()
            .map_err(|e| LedgerError::Network(format!("Failed to resolve {authority}: {e}")))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        Err(LedgerError::Network(match last_error {
            Some(e) => format!("Failed to connect to {authority}: {e}"),
            None => format!("No addresses found for {authority}"),
        }))
    }

    fn get(&self, peer: &str, path: &str) -> Result<Vec<u8>> {
        let endpoint = Self::parse_endpoint(peer)?;
        let mut stream = self.connect(&endpoint.authority)?;

        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(|e| LedgerError::Network(format!("Failed to set read timeout: {e}")))?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|e| LedgerError::Network(format!("Failed to set write timeout: {e}")))?;

        let request = format!(
            "GET {}{path} HTTP/1.1\r\nHost: {}\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
            endpoint.path_prefix, endpoint.authority
        );
        stream
            .write_all(request.as_bytes())
            .map_err(|e| LedgerError::Network(format!("Failed to send request to {peer}: {e}")))?;

        // Peers may hold the connection open, so I stop as soon as the body is complete
        let mut response = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let read = stream
                .read(&mut buf)
                .map_err(|e| LedgerError::Network(format!("Failed to read from {peer}: {e}")))?;
            if read == 0 {
                break;
            }
            response.extend_from_slice(&buf[..read]);
            if response_is_complete(&response) {
                break;
            }
        }

        debug!("Read {} bytes from {peer}", response.len());
        parse_response(&response)
    }
}

impl PeerClient for HttpPeerClient {
    fn fetch_chain(&self, peer: &str) -> Result<PeerChain> {
        let body = self.get(peer, "/chain")?;
        let peer_chain: PeerChain = from_json(&body)?;
        if peer_chain.length != peer_chain.chain.len() {
            debug!(
                "Peer {peer} reports length {} but sent {} blocks",
                peer_chain.length,
                peer_chain.chain.len()
            );
        }
        Ok(peer_chain)
    }
}

/// Status line and framing headers of a response
struct Head {
    status_line: String,
    content_length: Option<usize>,
    chunked: bool,
}

/// Head and body offset, once the blank line after the headers has arrived
fn split_head(response: &[u8]) -> Option<(Head, usize)> {
    let header_end = response.windows(4).position(|w| w == b"\r\n\r\n")?;
    let text = String::from_utf8_lossy(&response[..header_end]);

    let mut lines = text.split("\r\n");
    let mut head = Head {
        status_line: lines.next().unwrap_or_default().to_string(),
        content_length: None,
        chunked: false,
    };
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name == "content-length" {
            head.content_length = value.parse::<usize>().ok();
        } else if name == "transfer-encoding" && value.eq_ignore_ascii_case("chunked") {
            head.chunked = true;
        }
    }
    Some((head, header_end + 4))
}

/// Whether the bytes so far hold a whole response. Without framing headers only EOF ends it.
fn response_is_complete(response: &[u8]) -> bool {
    let Some((head, body_start)) = split_head(response) else {
        return false;
    };
    let body = &response[body_start..];
    if head.chunked {
        decode_chunked(body).is_ok()
    } else {
        matches!(head.content_length, Some(len) if body.len() >= len)
    }
}

/// Split a raw HTTP response and return the body of a 200 answer
fn parse_response(response: &[u8]) -> Result<Vec<u8>> {
    let (head, body_start) = split_head(response)
        .ok_or_else(|| LedgerError::Network("Malformed HTTP response".to_string()))?;
    let body = &response[body_start..];

    let status_line = head.status_line.as_str();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| LedgerError::Network(format!("Bad status line: {status_line}")))?;
    if status != 200 {
        return Err(LedgerError::Network(format!("Peer answered {status_line}")));
    }

    if head.chunked {
        return decode_chunked(body);
    }
    match head.content_length {
        Some(len) if len <= body.len() => Ok(body[..len].to_vec()),
        Some(len) => Err(LedgerError::Network(format!(
            "Truncated body: expected {len} bytes, got {}",
            body.len()
        ))),
        None => Ok(body.to_vec()),
    }
}

fn decode_chunked(mut body: &[u8]) -> Result<Vec<u8>> {
    let malformed = || LedgerError::Network("Malformed chunked body".to_string());
    let mut decoded = Vec::new();
    loop {
        let line_end = body
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(malformed)?;
        let size_field = String::from_utf8_lossy(&body[..line_end]);
        let size_hex = size_field.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| malformed())?;
        body = &body[line_end + 2..];
        if size == 0 {
            return Ok(decoded);
        }
        if body.len() < size {
            return Err(malformed());
        }
        decoded.extend_from_slice(&body[..size]);
        body = body.get(size + 2..).ok_or_else(malformed)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        let endpoint = HttpPeerClient::parse_endpoint("http://127.0.0.1:5000").unwrap();
        assert_eq!(endpoint.authority, "127.0.0.1:5000");
        assert_eq!(endpoint.path_prefix, "");

        let endpoint = HttpPeerClient::parse_endpoint("peer.local/hunt/").unwrap();
        assert_eq!(endpoint.authority, "peer.local:80");
        assert_eq!(endpoint.path_prefix, "/hunt");

        let endpoint = HttpPeerClient::parse_endpoint("http://[::1]").unwrap();
        assert_eq!(endpoint.authority, "[::1]:80");
        let endpoint = HttpPeerClient::parse_endpoint("http://[::1]:5000/").unwrap();
        assert_eq!(endpoint.authority, "[::1]:5000");

        assert!(HttpPeerClient::parse_endpoint("https://secure:443").is_err());
        assert!(HttpPeerClient::parse_endpoint("http:///chain").is_err());
    }

    #[test]
    fn test_parse_response_with_length() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}trailing";
        assert_eq!(parse_response(raw).unwrap(), b"{}");
    }

    #[test]
    fn test_parse_response_rejects_errors() {
        let raw = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
        assert!(parse_response(raw).is_err());
        assert!(parse_response(b"garbage").is_err());
    }

    #[test]
    fn test_parse_chunked_response() {
        let raw =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n{\"a\"\r\n3\r\n:1}\r\n0\r\n\r\n";
        assert_eq!(parse_response(raw).unwrap(), br#"{"a":1}"#);
    }

    #[test]
    fn test_response_completion() {
        assert!(!response_is_complete(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n"));
        assert!(!response_is_complete(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\n{}"));
        assert!(response_is_complete(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}"));
        assert!(!response_is_complete(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\n{}\r\n"
        ));
        assert!(response_is_complete(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\n{}\r\n0\r\n\r\n"
        ));
        assert!(!response_is_complete(b"HTTP/1.1 200 OK\r\n\r\n{}"));
    }

    #[test]
    fn test_keep_alive_peer_answers_before_timeout() {
        use std::io::BufRead;
        use std::net::TcpListener;
        use std::time::Instant;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = std::io::BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let body = r#"{"length":0,"chain":[]}"#;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: keep-alive\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            // Hold the socket open well past the client timeout
            std::thread::sleep(Duration::from_secs(3));
        });

        let client = HttpPeerClient::new(Duration::from_secs(2));
        let started = Instant::now();
        let peer_chain = client.fetch_chain(&format!("http://{addr}")).unwrap();
        assert_eq!(peer_chain.length, 0);
        assert!(started.elapsed() < Duration::from_secs(2));
        server.join().unwrap();
    }

    #[test]
    fn test_unreachable_peer_is_an_error() {
        let client = HttpPeerClient::new(Duration::from_millis(200));
        // Port 1 on localhost is closed in any sane test environment
        let err = client.fetch_chain("http://127.0.0.1:1").unwrap_err();
        assert!(matches!(err, LedgerError::Network(_)));
    }
}
