//! # Event-source transport.
//!
//! Owns the wire side of the stream connector: endpoint addressing, the
//! actual connect (unix socket, TCP, or TLS over TCP with optional mutual
//! auth), and the newline-delimited framing. Records cross this layer as raw
//! lines; semantic validation is the normalizer's concern.
//!
//! Certificate material is re-read from disk on every connect attempt, so
//! rotated certificates apply on the next reconnect.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{
    self,
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider},
    pki_types::{CertificateDer, ServerName, UnixTime},
    DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tokio_rustls::TlsConnector;

use crate::config::TlsConfig;
use crate::error::StreamError;

/// Address of the raw event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Local socket, e.g. `unix:///var/run/docker.sock`.
    Unix(PathBuf),
    /// TCP endpoint, e.g. `tcp://10.0.0.5:2376`.
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Parses an endpoint string of the form `unix://<path>` or
    /// `tcp://<host>:<port>`.
    pub fn parse(s: &str) -> Result<Self, StreamError> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(StreamError::Endpoint(s.to_string()));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }
        if let Some(rest) = s.strip_prefix("tcp://") {
            let (host, port) = rest
                .rsplit_once(':')
                .ok_or_else(|| StreamError::Endpoint(s.to_string()))?;
            let port: u16 = port
                .parse()
                .map_err(|_| StreamError::Endpoint(s.to_string()))?;
            if host.is_empty() {
                return Err(StreamError::Endpoint(s.to_string()));
            }
            return Ok(Endpoint::Tcp {
                host: host.to_string(),
                port,
            });
        }
        Err(StreamError::Endpoint(s.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

/// One live connection to the event source, framed as JSON lines.
pub(crate) enum EventTransport {
    #[cfg(unix)]
    Unix(Lines<BufReader<UnixStream>>),
    Tcp(Lines<BufReader<TcpStream>>),
    Tls(Box<Lines<BufReader<TlsStream<TcpStream>>>>),
}

impl EventTransport {
    /// Connects to the endpoint, negotiating TLS when configured.
    ///
    /// TLS settings only apply to TCP endpoints; over a local socket they are
    /// ignored (the caller warns about that combination once at startup).
    pub(crate) async fn connect(
        endpoint: &Endpoint,
        tls: Option<&TlsConfig>,
    ) -> Result<Self, StreamError> {
        match endpoint {
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let stream =
                    UnixStream::connect(path)
                        .await
                        .map_err(|source| StreamError::Connect {
                            endpoint: endpoint.to_string(),
                            source,
                        })?;
                Ok(EventTransport::Unix(BufReader::new(stream).lines()))
            }
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(StreamError::Connect {
                endpoint: endpoint.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "unix sockets are not available on this platform",
                ),
            }),
            Endpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(|source| StreamError::Connect {
                        endpoint: endpoint.to_string(),
                        source,
                    })?;
                match tls {
                    None => Ok(EventTransport::Tcp(BufReader::new(stream).lines())),
                    Some(tls) => {
                        let config = build_client_config(tls)?;
                        let sni = ServerName::try_from(host.clone()).map_err(|e| {
                            StreamError::Tls(format!("invalid server name `{host}`: {e}"))
                        })?;
                        let connector = TlsConnector::from(Arc::new(config));
                        let stream = connector.connect(sni, stream).await.map_err(|source| {
                            StreamError::Connect {
                                endpoint: endpoint.to_string(),
                                source,
                            }
                        })?;
                        Ok(EventTransport::Tls(Box::new(
                            BufReader::new(stream).lines(),
                        )))
                    }
                }
            }
        }
    }

    /// Reads the next frame. `Ok(None)` means the peer closed the stream.
    pub(crate) async fn next_line(&mut self) -> Result<Option<String>, StreamError> {
        let res = match self {
            #[cfg(unix)]
            EventTransport::Unix(lines) => lines.next_line().await,
            EventTransport::Tcp(lines) => lines.next_line().await,
            EventTransport::Tls(lines) => lines.next_line().await,
        };
        res.map_err(StreamError::Read)
    }
}

/// Builds the rustls client configuration from the configured PEM material.
///
/// With verification enabled this is mutual TLS: the CA bundle anchors the
/// server, and `cert.pem`/`key.pem` authenticate this client. With
/// verification disabled any server certificate is accepted and no client
/// certificate is presented.
fn build_client_config(tls: &TlsConfig) -> Result<rustls::ClientConfig, StreamError> {
    // pin the provider; the process-wide default is ambiguous when other
    // dependencies compile in their own
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| StreamError::Tls(format!("protocol versions: {e}")))?;

    if !tls.verify {
        return Ok(builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerification(provider)))
            .with_no_client_auth());
    }

    let ca_path = tls.cert_dir.join("ca.pem");
    let cert_path = tls.cert_dir.join("cert.pem");
    let key_path = tls.cert_dir.join("key.pem");

    let mut roots = RootCertStore::empty();
    for cert in read_certs(&ca_path)? {
        roots
            .add(cert)
            .map_err(|e| StreamError::Tls(format!("bad CA certificate in {ca_path:?}: {e}")))?;
    }
    let certs = read_certs(&cert_path)?;
    let key = {
        let mut reader = open_pem(&key_path)?;
        rustls_pemfile::private_key(&mut reader)
            .map_err(|e| StreamError::Tls(format!("read {key_path:?}: {e}")))?
            .ok_or_else(|| StreamError::Tls(format!("no private key in {key_path:?}")))?
    };

    builder
        .with_root_certificates(roots)
        .with_client_auth_cert(certs, key)
        .map_err(|e| StreamError::Tls(format!("client certificate rejected: {e}")))
}

fn open_pem(path: &std::path::Path) -> Result<std::io::BufReader<std::fs::File>, StreamError> {
    std::fs::File::open(path)
        .map(std::io::BufReader::new)
        .map_err(|e| StreamError::Tls(format!("open {path:?}: {e}")))
}

fn read_certs(path: &std::path::Path) -> Result<Vec<CertificateDer<'static>>, StreamError> {
    let mut reader = open_pem(path)?;
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StreamError::Tls(format!("read {path:?}: {e}")))
}

/// Server certificate verifier that accepts anything. Selected only when the
/// operator explicitly disables verification.
#[derive(Debug)]
struct NoVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unix_endpoint() {
        let ep = Endpoint::parse("unix:///var/run/docker.sock").unwrap();
        assert_eq!(ep, Endpoint::Unix(PathBuf::from("/var/run/docker.sock")));
        assert_eq!(ep.to_string(), "unix:///var/run/docker.sock");
    }

    #[test]
    fn parse_tcp_endpoint() {
        let ep = Endpoint::parse("tcp://10.0.0.5:2376").unwrap();
        assert_eq!(
            ep,
            Endpoint::Tcp {
                host: "10.0.0.5".into(),
                port: 2376
            }
        );
        assert_eq!(ep.to_string(), "tcp://10.0.0.5:2376");
    }

    #[test]
    fn parse_trims_whitespace() {
        assert!(Endpoint::parse("  tcp://localhost:2375 ").is_ok());
    }

    #[test]
    fn parse_rejects_malformed_endpoints() {
        for bad in [
            "",
            "unix://",
            "tcp://",
            "tcp://host",
            "tcp://:2375",
            "tcp://host:notaport",
            "http://host:2375",
            "/var/run/docker.sock",
        ] {
            let err = Endpoint::parse(bad).unwrap_err();
            assert_eq!(err.as_label(), "stream_endpoint", "input: {bad:?}");
        }
    }
}
