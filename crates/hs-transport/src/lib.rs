//! # hs-transport: Fingerprinted dial engine / 指纹化拨号引擎
//!
//! Opens a byte stream through an injected [`Dialer`] and completes a TLS
//! handshake whose ClientHello is shaped by a selected profile.
//!
//! 通过注入的 [`Dialer`] 建立字节流连接，并以所选指纹档案完成 TLS 握手。
//!
//! ## Modules / 模块
//! - `context`: cancellation and deadlines / 取消与截止时间
//! - `dialer`: transport-open capability / 传输连接能力
//! - `tls`: the dial pipeline / 拨号流程

pub mod context;
pub mod dialer;
pub mod tls;

pub use context::{CancelReason, DialContext};
pub use dialer::{
    split_host_port, AsyncReadWrite, DialError, DialFuture, Dialer, FnDialer, IoStream, TcpDialer,
};
pub use tls::{dial, DialConfig, DialPhase, DialState, TlsConnection, TlsDialError};
