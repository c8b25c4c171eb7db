use crate::core::SharedBlockchain;
use crate::error::{LedgerError, Result};
use crate::network::PeerChain;
use crate::utils::to_canonical_json;
use log::{debug, error, info, warn};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const TCP_READ_TIMEOUT: u64 = 5000;
const MAX_REQUEST_HEAD: usize = 16 * 1024;

/// Read-only HTTP endpoint that lets other nodes use this one as a peer
pub struct ChainServer {
    listener: TcpListener,
    blockchain: SharedBlockchain,
}

struct Request {
    method: String,
    path: String,
}

impl ChainServer {
    pub fn bind(addr: &str, blockchain: SharedBlockchain) -> Result<ChainServer> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| LedgerError::Network(format!("Failed to bind to {addr}: {e}")))?;
        Ok(ChainServer {
            listener,
            blockchain,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| LedgerError::Network(format!("Failed to read local address: {e}")))
    }

    /// Accept connections forever, one handler thread each
    pub fn run(self) -> Result<()> {
        info!("Serving /chain on {}", self.local_addr()?);

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let blockchain = self.blockchain.clone();
                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(stream, &blockchain) {
                            warn!("Error handling connection: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }
        Ok(())
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        thread::spawn(move || self.run())
    }

    fn handle_connection(mut stream: TcpStream, blockchain: &SharedBlockchain) -> Result<()> {
        stream
            .set_read_timeout(Some(Duration::from_millis(TCP_READ_TIMEOUT)))
            .map_err(|e| LedgerError::Network(format!("Failed to set read timeout: {e}")))?;

        let request = match read_request(&mut stream) {
            Ok(request) => request,
            Err(e) => {
                write_json(&mut stream, 400, r#"{"error":"bad request"}"#)?;
                return Err(e);
            }
        };
        debug!("{} {}", request.method, request.path);

        match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/chain") | ("GET", "/chain/") => {
                let chain = blockchain.chain_snapshot();
                let body = to_canonical_json(&PeerChain {
                    length: chain.len(),
                    chain,
                })?;
                write_json(&mut stream, 200, &body)
            }
            (_, "/chain") => write_json(&mut stream, 405, r#"{"error":"method not allowed"}"#),
            _ => write_json(&mut stream, 404, r#"{"error":"not found"}"#),
        }
    }
}

fn read_request(stream: &mut TcpStream) -> Result<Request> {
    let mut buf = [0u8; 4096];
    let mut data = Vec::new();
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream
            .read(&mut buf)
            .map_err(|e| LedgerError::Network(format!("Failed to read request: {e}")))?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if data.len() > MAX_REQUEST_HEAD {
            return Err(LedgerError::Network("Request head too large".to_string()));
        }
    }

    let head = String::from_utf8_lossy(&data);
    let line = head
        .split("\r\n")
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| LedgerError::Network("Empty request".to_string()))?;
    let mut parts = line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| LedgerError::Network("Missing method".to_string()))?;
    let path = parts
        .next()
        .ok_or_else(|| LedgerError::Network("Missing path".to_string()))?;

    Ok(Request {
        method: method.to_string(),
        path: path.split('?').next().unwrap_or(path).to_string(),
    })
}

fn write_json(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let response = format!(
        "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(response.as_bytes())
        .and_then(|_| stream.flush())
        .map_err(|e| LedgerError::Network(format!("Failed to write response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{HttpPeerClient, PeerClient};
    use crate::testnet::create_test_blockchain;

    #[test]
    fn test_serves_chain_to_http_client() {
        let (blockchain, _dir) = create_test_blockchain().unwrap();
        let expected = blockchain.get_chain().to_vec();
        let shared = SharedBlockchain::new(blockchain);

        let server = ChainServer::bind("127.0.0.1:0", shared).unwrap();
        let addr = server.local_addr().unwrap();
        let _handle = server.spawn();

        let client = HttpPeerClient::new(Duration::from_secs(5));
        let peer_chain = client.fetch_chain(&format!("http://{addr}")).unwrap();
        assert_eq!(peer_chain.length, 1);
        assert_eq!(peer_chain.chain, expected);
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let (blockchain, _dir) = create_test_blockchain().unwrap();
        let server = ChainServer::bind("127.0.0.1:0", SharedBlockchain::new(blockchain)).unwrap();
        let addr = server.local_addr().unwrap();
        let _handle = server.spawn();

        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /nothing HTTP/1.1\r\nHost: x\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        assert!(response.starts_with("HTTP/1.1 404"));
    }
}
