//! # 传输拨号器抽象 / Transport-open capability
//!
//! 该模块定义了原始字节流连接的建立接口：
//! - `DialError`: 拨号过程中可能出现的错误类型
//! - `Dialer` trait: 注入式的异步拨号策略对象
//! - `TcpDialer`: 基于 tokio 的 TCP 拨号器
//! - `FnDialer`: 基于闭包的自定义拨号器（测试与组合）
//!
//! The TLS dial engine never opens sockets itself; it always goes through a
//! caller-supplied [`Dialer`].

use crate::context::{CancelReason, DialContext};
use async_trait::async_trait;
pub use hs_tls::{AsyncReadWrite, IoStream};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

/// 拨号过程中可能出现的错误类型
#[derive(Debug, Error)]
pub enum DialError {
    /// 底层网络 IO 操作失败
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// 拨号器不支持该网络类型
    #[error("unsupported network {0:?}")]
    UnsupportedNetwork(String),

    /// 地址无法解析为 host:port
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    /// 拨号上下文在连接完成前结束
    #[error("dial aborted: {0}")]
    Cancelled(CancelReason),

    #[error("other: {0}")]
    Other(String),
}

/// Future returned by [`FnDialer`] closures.
pub type DialFuture = Pin<Box<dyn Future<Output = Result<IoStream, DialError>> + Send + 'static>>;

/// 异步网络拨号器 trait
///
/// `network` follows the usual `tcp` / `tcp4` / `tcp6` naming; `address` is
/// `host:port` with IPv6 literals in brackets.
///
/// Implementations must stop promptly once `ctx` is done and must not leak a
/// half-open connection when they do.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(
        &self,
        ctx: &DialContext,
        network: &str,
        address: &str,
    ) -> Result<IoStream, DialError>;
}

/// Allow using `Box<D>` where `D: Dialer` as a Dialer itself.
#[async_trait]
impl<D> Dialer for Box<D>
where
    D: Dialer + ?Sized,
{
    async fn dial(
        &self,
        ctx: &DialContext,
        network: &str,
        address: &str,
    ) -> Result<IoStream, DialError> {
        (**self).dial(ctx, network, address).await
    }
}

#[async_trait]
impl<D> Dialer for Arc<D>
where
    D: Dialer + ?Sized,
{
    async fn dial(
        &self,
        ctx: &DialContext,
        network: &str,
        address: &str,
    ) -> Result<IoStream, DialError> {
        (**self).dial(ctx, network, address).await
    }
}

/// Split `host:port`, stripping brackets from IPv6 literals.
pub fn split_host_port(address: &str) -> Result<(&str, u16), DialError> {
    let invalid = || DialError::InvalidAddress(address.to_string());
    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    let host = match host.strip_prefix('[') {
        Some(rest) => rest.strip_suffix(']').ok_or_else(invalid)?,
        None if host.contains(':') => return Err(invalid()),
        None => host,
    };
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse().map_err(|_| invalid())?;
    Ok((host, port))
}

/// 基础 TCP 拨号器
///
/// 解析地址后按顺序尝试每个候选地址，每一步都受 `DialContext` 约束。
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl TcpDialer {
    async fn resolve(network: &str, address: &str) -> Result<Vec<SocketAddr>, DialError> {
        let want: fn(&SocketAddr) -> bool = match network {
            "tcp" => |_| true,
            "tcp4" => SocketAddr::is_ipv4,
            "tcp6" => SocketAddr::is_ipv6,
            other => return Err(DialError::UnsupportedNetwork(other.to_string())),
        };
        let (host, port) = split_host_port(address)?;
        let addrs: Vec<SocketAddr> = lookup_host((host, port)).await?.filter(want).collect();
        if addrs.is_empty() {
            return Err(DialError::Other(format!(
                "no {network} addresses found for {host}"
            )));
        }
        debug!(address, resolved = addrs.len(), "resolved dial address");
        Ok(addrs)
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(
        &self,
        ctx: &DialContext,
        network: &str,
        address: &str,
    ) -> Result<IoStream, DialError> {
        let addrs = ctx
            .run(Self::resolve(network, address))
            .await
            .map_err(DialError::Cancelled)??;

        let mut last_error = DialError::Other("no addresses to connect".into());
        for addr in addrs {
            match ctx.run(TcpStream::connect(addr)).await {
                Err(reason) => {
                    debug!(%addr, %reason, "tcp connect aborted");
                    return Err(DialError::Cancelled(reason));
                }
                Ok(Ok(stream)) => {
                    debug!(%addr, "tcp connected");
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(%addr, error = %e, "tcp set_nodelay failed");
                    }
                    return Ok(Box::new(stream));
                }
                Ok(Err(e)) => {
                    debug!(%addr, error = %e, "tcp connect failed");
                    last_error = DialError::from(e);
                }
            }
        }
        Err(last_error)
    }
}

/// 基于闭包的自定义拨号器
///
/// 闭包接收拥有所有权的参数并返回装箱的 Future，便于在测试中注入模拟行为，
/// 或在其它承载之上组合拨号逻辑。
///
/// ```rust,no_run
/// use hs_transport::{DialError, DialFuture, FnDialer};
///
/// let refuse = FnDialer::new(|_ctx, _network, address| {
///     Box::pin(async move { Err(DialError::Other(format!("refusing {address}"))) }) as DialFuture
/// });
/// ```
pub struct FnDialer<F> {
    inner: Arc<F>,
}

impl<F> Clone for FnDialer<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F> FnDialer<F>
where
    F: Fn(DialContext, String, String) -> DialFuture + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { inner: Arc::new(f) }
    }
}

#[async_trait]
impl<F> Dialer for FnDialer<F>
where
    F: Fn(DialContext, String, String) -> DialFuture + Send + Sync,
{
    async fn dial(
        &self,
        ctx: &DialContext,
        network: &str,
        address: &str,
    ) -> Result<IoStream, DialError> {
        (self.inner)(ctx.clone(), network.to_string(), address.to_string()).await
    }
}
