//! Listening socket the extension shim connects to.
//!
//! The bridge hands out debugger control of every tab, so it only ever
//! listens on a loopback address and accepts exactly one shim.
//!
//! ```text
//! bind(127.0.0.1, port) ─► shim connects ─► WebSocket upgrade ─► READY ─► Connection
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::connection::{Connection, ReadyData};

// ============================================================================
// Constants
// ============================================================================

/// How long [`PendingServer::accept`] waits for the shim.
pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// PendingServer
// ============================================================================

/// Bound listener waiting for the shim.
///
/// # Example
///
/// ```ignore
/// let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 7878).await?;
/// println!("point the shim at {}", server.ws_url());
///
/// let (connection, ready) = server.accept().await?;
/// ```
#[derive(Debug)]
pub struct PendingServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl PendingServer {
    /// Binds a loopback address. Port 0 picks a free port.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `ip` is not a loopback address
    /// - [`Error::Io`] if the port cannot be bound
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        if !ip.is_loopback() {
            return Err(Error::config(format!(
                "Refusing to expose the bridge on {ip}. Bind a loopback address."
            )));
        }

        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let addr = listener.local_addr()?;

        debug!(%addr, "Bridge listening");

        Ok(Self { listener, addr })
    }

    /// Returns the bound port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the bound address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the URL the shim should connect to.
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Waits for the shim and completes the READY handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if no shim connects within
    ///   [`DEFAULT_ACCEPT_TIMEOUT`]
    /// - [`Error::Connection`] if the WebSocket upgrade fails
    /// - handshake errors from the connection
    pub async fn accept(self) -> Result<(Connection, ReadyData)> {
        self.accept_within(DEFAULT_ACCEPT_TIMEOUT).await
    }

    /// Like [`PendingServer::accept`] with a custom wait.
    ///
    /// # Errors
    ///
    /// Same as [`PendingServer::accept`].
    pub async fn accept_within(self, wait: Duration) -> Result<(Connection, ReadyData)> {
        let wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        let (stream, peer) = timeout(wait, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(wait_ms))??;

        debug!(%peer, "Shim connected");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        let (connection, ready) = Connection::open(ws_stream).await?;
        info!(addr = %self.addr, browser = %ready.browser, "Bridge established");

        Ok((connection, ready))
    }
}

// ============================================================================
// Tests
// ============================================================================
