//! Address → channel cache for the node data-plane.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, instrument, warn};

use crate::errors::SdkError;
use crate::proto::node_api_client::NodeApiClient;

/// How long to probe a fresh channel for readiness before handing it out
/// connected lazily instead.
const READY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Caches one gRPC channel per node address.
///
/// The pool owns its channels; clients handed out by
/// [`ConnectionPool::create_client`] with `pooled = true` share them, while
/// unpooled clients own a private channel that closes when the last clone of
/// the client is dropped.
pub struct ConnectionPool {
    channels: Mutex<HashMap<String, Channel>>,
    connection_timeout: Duration,
}

impl ConnectionPool {
    pub fn new(connection_timeout: Duration) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            connection_timeout,
        }
    }

    /// Returns the cached channel for `addr`, opening and probing a new one
    /// if absent.
    #[instrument(skip(self))]
    pub async fn get(&self, addr: &str) -> Result<Channel, SdkError> {
        if let Some(channel) = self.channels.lock().get(addr) {
            return Ok(channel.clone());
        }

        let channel = self.connect(addr).await?;
        Ok(self
            .channels
            .lock()
            .entry(addr.to_string())
            .or_insert(channel)
            .clone())
    }

    /// Opens a channel to `addr`, probing readiness for up to 5 seconds. A
    /// probe timeout is only a warning: the channel is returned anyway and
    /// connects lazily on first use.
    async fn connect(&self, addr: &str) -> Result<Channel, SdkError> {
        if addr.trim().is_empty() {
            return Err(SdkError::Validation("empty node address".into()));
        }

        let endpoint = Endpoint::from_shared(format!("http://{}", addr))
            .map_err(|e| SdkError::Validation(format!("invalid node address {}: {}", addr, e)))?
            .timeout(self.connection_timeout);

        match tokio::time::timeout(READY_PROBE_TIMEOUT, endpoint.connect()).await {
            Ok(Ok(channel)) => {
                debug!(addr, "connection established");
                Ok(channel)
            }
            Ok(Err(e)) => Err(SdkError::Transport(format!(
                "failed to connect to {}: {}",
                addr, e
            ))),
            Err(_) => {
                warn!(addr, "connection not ready within timeout, proceeding anyway");
                Ok(endpoint.connect_lazy())
            }
        }
    }

    /// Returns a client over the pooled channel for `addr`, or over a fresh
    /// private channel when `pooled` is false.
    pub async fn create_client(
        &self,
        addr: &str,
        pooled: bool,
    ) -> Result<NodeApiClient<Channel>, SdkError> {
        let channel = if pooled {
            self.get(addr).await?
        } else {
            self.connect(addr).await?
        };
        Ok(NodeApiClient::new(channel))
    }

    /// Drops every pooled channel, closing the underlying connections.
    pub fn close(&self) {
        self.channels.lock().clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.channels.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn local_listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    #[tokio::test]
    async fn get_caches_one_channel_per_address() {
        let (_listener, addr) = local_listener().await;
        let pool = ConnectionPool::new(Duration::from_secs(1));

        pool.get(&addr).await.unwrap();
        pool.get(&addr).await.unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn unpooled_client_bypasses_the_cache() {
        let (_listener, addr) = local_listener().await;
        let pool = ConnectionPool::new(Duration::from_secs(1));

        pool.create_client(&addr, false).await.unwrap();
        assert_eq!(pool.len(), 0);

        pool.create_client(&addr, true).await.unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn close_clears_the_cache() {
        let (_listener, addr) = local_listener().await;
        let pool = ConnectionPool::new(Duration::from_secs(1));

        pool.get(&addr).await.unwrap();
        pool.close();
        assert_eq!(pool.len(), 0);
    }

    #[tokio::test]
    async fn rejects_empty_address() {
        let pool = ConnectionPool::new(Duration::from_secs(1));
        assert!(matches!(
            pool.get("  ").await,
            Err(SdkError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        // bind then drop to get an unused local port
        let (listener, addr) = local_listener().await;
        drop(listener);

        let pool = ConnectionPool::new(Duration::from_secs(1));
        assert!(matches!(
            pool.get(&addr).await,
            Err(SdkError::Transport(_))
        ));
    }
}
