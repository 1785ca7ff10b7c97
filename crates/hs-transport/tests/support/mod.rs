//! Local TLS servers and instrumented transports for dial tests.
#![allow(dead_code)]

use hs_transport::{DialContext, DialError, DialFuture, FnDialer, IoStream};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use std::io::Write;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;

/// A CA, a `localhost` leaf signed by it, and the CA written as a PEM file.
pub struct TestPki {
    pub ca_file: tempfile::NamedTempFile,
    pub chain: Vec<CertificateDer<'static>>,
    pub key_der: Vec<u8>,
}

/// 2048-bit RSA key for servers that must present an RSA certificate.
const RSA_LEAF_KEY: &str = include_str!("rsa2048.key.pem");

impl TestPki {
    /// ECDSA P-256 leaf.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_leaf_key(KeyPair::generate()?)
    }

    /// RSA leaf, so the server signs with RSA-PSS or PKCS#1.
    pub fn rsa() -> anyhow::Result<Self> {
        Self::with_leaf_key(KeyPair::from_pem(RSA_LEAF_KEY)?)
    }

    fn with_leaf_key(leaf_key: KeyPair) -> anyhow::Result<Self> {
        let ca_key = KeyPair::generate()?;
        let mut ca_params = CertificateParams::new(Vec::<String>::new())?;
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "helloshape test CA");
        let ca = ca_params.self_signed(&ca_key)?;

        let leaf = CertificateParams::new(vec!["localhost".to_string()])?.signed_by(
            &leaf_key,
            &ca,
            &ca_key,
        )?;

        let mut ca_file = tempfile::Builder::new().suffix(".pem").tempfile()?;
        ca_file.write_all(ca.pem().as_bytes())?;
        ca_file.flush()?;

        Ok(Self {
            ca_file,
            chain: vec![leaf.der().clone(), ca.der().clone()],
            key_der: leaf_key.serialize_der(),
        })
    }

    /// Plain self-signed `localhost` certificate that no root vouches for.
    pub fn self_signed_only() -> anyhow::Result<(Vec<CertificateDer<'static>>, Vec<u8>)> {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])?;
        Ok((
            vec![cert.cert.der().clone()],
            cert.key_pair.serialize_der(),
        ))
    }
}

pub fn server_config(
    chain: Vec<CertificateDer<'static>>,
    key_der: Vec<u8>,
) -> anyhow::Result<Arc<ServerConfig>> {
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_der));
    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_no_client_auth()
    .with_single_cert(chain, key)?;
    Ok(Arc::new(config))
}

/// Compliant TLS server answering `ping` with `pong`, one task per connection.
pub async fn spawn_tls_server(config: Arc<ServerConfig>) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let acceptor = TlsAcceptor::from(config);

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(tcp).await else {
                    return;
                };
                let mut buf = [0u8; 4];
                if tls.read_exact(&mut buf).await.is_ok() && &buf == b"ping" {
                    let _ = tls.write_all(b"pong").await;
                    let _ = tls.shutdown().await;
                }
            });
        }
    });

    Ok(addr)
}

/// Server that accepts one connection and never answers.
///
/// The receiver yields the number of bytes read once the client closes.
pub async fn spawn_silent_server() -> anyhow::Result<(SocketAddr, oneshot::Receiver<usize>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut tcp, _)) = listener.accept().await else {
            return;
        };
        let mut total = 0usize;
        let mut buf = [0u8; 1024];
        loop {
            match tcp.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => total += n,
            }
        }
        let _ = tx.send(total);
    });

    Ok((addr, rx))
}

/// Stream wrapper that records when it is dropped.
pub struct Tracked<S> {
    inner: S,
    dropped: Arc<AtomicBool>,
}

impl<S> Drop for Tracked<S> {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for Tracked<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for Tracked<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// What an instrumented dialer observed.
#[derive(Default)]
pub struct DialRecord {
    pub calls: AtomicUsize,
    pub dropped: Arc<AtomicBool>,
}

/// TCP dialer that counts calls and wraps streams in [`Tracked`].
pub fn recording_dialer(
    record: Arc<DialRecord>,
) -> FnDialer<impl Fn(DialContext, String, String) -> DialFuture + Send + Sync> {
    FnDialer::new(move |ctx: DialContext, _network: String, address: String| {
        let record = Arc::clone(&record);
        Box::pin(async move {
            record.calls.fetch_add(1, Ordering::SeqCst);
            let tcp = ctx
                .run(TcpStream::connect(address))
                .await
                .map_err(DialError::Cancelled)??;
            let stream: IoStream = Box::new(Tracked {
                inner: tcp,
                dropped: Arc::clone(&record.dropped),
            });
            Ok(stream)
        }) as DialFuture
    })
}

pub async fn ping(stream: &mut (impl AsyncRead + AsyncWrite + Unpin)) -> anyhow::Result<()> {
    stream.write_all(b"ping").await?;
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf).await?;
    anyhow::ensure!(&buf == b"pong", "unexpected reply {buf:?}");
    Ok(())
}
