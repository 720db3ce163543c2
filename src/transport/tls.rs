//! TLS transport: a TCP connection wrapped in rustls.
//!
//! The collector is verified against the CA bundle in
//! [`TransportOptions::tls_ca_file`], using
//! [`TransportOptions::tls_peer_name`] as the expected name. With
//! `allow_self_signed`, a certificate that fails chain validation is still
//! accepted when it is byte-identical to one in the bundle.
//!
//! Only TLS 1.2 and 1.3 are offered. The lifecycle matches
//! [`TcpTransport`](super::TcpTransport): explicit connect, disconnect and
//! reconnect, never automatic.
//!
//! # Example
//!
//! ```no_run
//! use lumberjack_client::transport::{TlsTransport, TransportOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> lumberjack_client::Result<()> {
//! let options = TransportOptions::new("logs.local", 5043).tls_ca_file("/etc/ssl/collector-ca.pem");
//! let transport = TlsTransport::new(options).await?;
//! assert!(transport.is_connected());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::client::WebPkiServerVerifier;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_rustls::TlsConnector;

use super::tcp::open_tcp;
use super::{StreamTransport, Transport, TransportOptions};
use crate::error::{LumberjackError, Result};

/// A TLS connection to a collector.
pub struct TlsTransport {
    options: TransportOptions,
    connector: TlsConnector,
    server_name: ServerName<'static>,
    stream: Option<StreamTransport<TlsStream<TcpStream>>>,
}

impl TlsTransport {
    /// Validate `options`, load the CA bundle and, if `autoconnect` is
    /// set, connect.
    ///
    /// # Errors
    ///
    /// Fails without `tls_ca_file`, on an unreadable or empty bundle, or an
    /// invalid peer name.
    pub async fn new(options: TransportOptions) -> Result<Self> {
        options.validate()?;
        let Some(ca_file) = options.tls_ca_file.as_deref() else {
            return Err(LumberjackError::InvalidConfig(
                "tls_ca_file is required for TLS".to_string(),
            ));
        };

        let config = client_config(ca_file, options.allow_self_signed)?;
        let peer_name = options.tls_peer_name();
        let server_name = ServerName::try_from(peer_name.to_string())
            .map_err(|e| LumberjackError::Tls(format!("invalid peer name {}: {}", peer_name, e)))?;

        let mut transport = Self {
            options,
            connector: TlsConnector::from(Arc::new(config)),
            server_name,
            stream: None,
        };
        if transport.options.autoconnect {
            transport.connect().await?;
        }
        Ok(transport)
    }

    /// Open the connection and complete the handshake.
    ///
    /// Both the TCP connect and the handshake are bounded by
    /// `connection_timeout`.
    pub async fn connect(&mut self) -> Result<()> {
        let address = self.options.address();
        if self.stream.is_some() {
            return Err(LumberjackError::AlreadyConnected(address));
        }

        let tcp = open_tcp(&self.options).await?;
        let stream = tokio::time::timeout(
            self.options.connection_timeout,
            self.connector.connect(self.server_name.clone(), tcp),
        )
        .await
        .map_err(|_| LumberjackError::Timeout("handshake"))??;

        tracing::info!(
            %address,
            peer_name = self.options.tls_peer_name(),
            "TLS connection established"
        );
        self.stream = Some(StreamTransport::with_timeout(
            stream,
            self.options.socket_timeout,
        ));
        Ok(())
    }

    /// Send `close_notify` and drop the connection. No-op when not
    /// connected.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.get_mut().shutdown().await?;
            tracing::info!(address = %self.options.address(), "Disconnected from collector");
        }
        Ok(())
    }

    /// Drop the current connection (if any) and open a new one.
    pub async fn reconnect(&mut self) -> Result<()> {
        if let Err(e) = self.disconnect().await {
            tracing::debug!("Ignoring shutdown error before reconnect: {}", e);
        }
        self.connect().await
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// The validated options.
    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    fn stream_mut(&mut self) -> Result<&mut StreamTransport<TlsStream<TcpStream>>> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream),
            None => Err(LumberjackError::NotConnected(self.options.address())),
        }
    }
}

impl fmt::Debug for TlsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsTransport")
            .field("options", &self.options)
            .field("server_name", &self.server_name)
            .field("connected", &self.stream.is_some())
            .finish()
    }
}

impl Transport for TlsTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        self.stream_mut()?.send(bytes).await
    }

    async fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream_mut()?.recv_exact(buf).await
    }
}

fn client_config(ca_file: &Path, allow_self_signed: bool) -> Result<ClientConfig> {
    let certs = load_certs(ca_file)?;
    let mut roots = RootCertStore::empty();
    for cert in &certs {
        roots.add(cert.clone()).map_err(tls_error)?;
    }

    let provider = Arc::new(ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(tls_error)?;

    let config = if allow_self_signed {
        let webpki = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(tls_error)?;
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(PinnedSelfSigned {
                webpki,
                pinned: certs,
            }))
            .with_no_client_auth()
    } else {
        builder.with_root_certificates(roots).with_no_client_auth()
    };
    Ok(config)
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| LumberjackError::Tls(format!("cannot read {}: {}", path.display(), e)))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| LumberjackError::Tls(format!("cannot parse {}: {}", path.display(), e)))?;

    if certs.is_empty() {
        return Err(LumberjackError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn tls_error(e: impl fmt::Display) -> LumberjackError {
    LumberjackError::Tls(e.to_string())
}

/// WebPKI verification, falling back to an exact match against the CA
/// bundle for self-signed collector certificates.
#[derive(Debug)]
struct PinnedSelfSigned {
    webpki: Arc<WebPkiServerVerifier>,
    pinned: Vec<CertificateDer<'static>>,
}

impl ServerCertVerifier for PinnedSelfSigned {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        match self.webpki.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Err(e) if self.pinned.iter().any(|c| c.as_ref() == end_entity.as_ref()) => {
                tracing::debug!("Accepting self-signed certificate from CA bundle ({})", e);
                Ok(ServerCertVerified::assertion())
            }
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.webpki.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.webpki.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.webpki.supported_verify_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
    use tokio_rustls::TlsAcceptor;

    fn self_signed() -> rcgen::CertifiedKey {
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap()
    }

    fn pem_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn acceptor(key: &rcgen::CertifiedKey) -> TlsAcceptor {
        let config = rustls::ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(
                vec![key.cert.der().clone()],
                PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.key_pair.serialize_der())),
            )
            .unwrap();
        TlsAcceptor::from(Arc::new(config))
    }

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn test_self_signed_from_bundle_accepted() {
        let key = self_signed();
        let ca = pem_file(&key.cert.pem());
        let (listener, port) = listener().await;
        let acceptor = acceptor(&key);
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut tls = acceptor.accept(tcp).await.unwrap();
            let mut buf = [0u8; 6];
            tls.read_exact(&mut buf).await.unwrap();
            buf
        });

        let options = TransportOptions::new("127.0.0.1", port)
            .tls_ca_file(ca.path())
            .peer_name("localhost")
            .allow_self_signed(true);
        let mut transport = TlsTransport::new(options).await.unwrap();
        assert!(transport.is_connected());
        assert_eq!(transport.send(b"1W\0\0\0\x02").await.unwrap(), 6);
        assert_eq!(&server.await.unwrap(), b"1W\0\0\0\x02");

        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_unknown_certificate_rejected() {
        let key = self_signed();
        let other = self_signed();
        let ca = pem_file(&other.cert.pem());
        let (listener, port) = listener().await;
        let acceptor = acceptor(&key);
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let _ = acceptor.accept(tcp).await;
        });

        let options = TransportOptions::new("127.0.0.1", port)
            .tls_ca_file(ca.path())
            .peer_name("localhost")
            .allow_self_signed(true);
        let err = TlsTransport::new(options).await.unwrap_err();
        assert!(err.is_transport_failure(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_ca_file_required() {
        let err = TlsTransport::new(TransportOptions::new("127.0.0.1", 5043))
            .await
            .unwrap_err();
        assert!(matches!(err, LumberjackError::InvalidConfig(_)));
        assert!(err.to_string().contains("tls_ca_file"));
    }

    #[tokio::test]
    async fn test_empty_bundle_rejected() {
        let ca = pem_file("not a certificate\n");
        let options = TransportOptions::new("127.0.0.1", 5043)
            .tls_ca_file(ca.path())
            .autoconnect(false);
        let err = TlsTransport::new(options).await.unwrap_err();
        assert!(matches!(err, LumberjackError::Tls(_)));
        assert!(err.to_string().contains("no certificates"));
    }

    #[tokio::test]
    async fn test_not_connected_without_autoconnect() {
        let key = self_signed();
        let ca = pem_file(&key.cert.pem());
        let options = TransportOptions::new("127.0.0.1", 5043)
            .tls_ca_file(ca.path())
            .autoconnect(false);
        let mut transport = TlsTransport::new(options).await.unwrap();
        assert!(!transport.is_connected());
        assert!(format!("{:?}", transport).contains("connected: false"));

        let err = transport.send(b"x").await.unwrap_err();
        assert!(matches!(err, LumberjackError::NotConnected(_)));
    }
}
