//! Reachability probes.
//!
//! A probe answers one question: can a TCP connection to the backend be
//! opened within the timeout. Any connect error or timeout means not alive.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::net::TcpStream;
use url::Url;

/// Reachability check used by the health monitor.
pub trait Probe: Send + Sync {
    fn can_connect<'a>(&'a self, target: &'a Url, timeout: Duration) -> BoxFuture<'a, bool>;
}

/// Opens (and immediately drops) a TCP connection to the backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

impl Probe for TcpProbe {
    fn can_connect<'a>(&'a self, target: &'a Url, timeout: Duration) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let Some(addr) = socket_address(target) else {
                tracing::warn!(url = %target, "Backend unreachable: no host or port");
                return false;
            };

            match tokio::time::timeout(timeout, TcpStream::connect(addr.as_str())).await {
                Ok(Ok(_stream)) => true,
                Ok(Err(e)) => {
                    tracing::warn!(url = %target, error = %e, "Backend unreachable");
                    false
                }
                Err(_) => {
                    tracing::warn!(url = %target, timeout = ?timeout, "Backend unreachable: connect timed out");
                    false
                }
            }
        })
    }
}

/// `host:port` for a URL, falling back to the scheme's default port.
fn socket_address(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{}:{}", host, port))
}
