use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::{Result, SinkError};
use crate::sink::Sink;
use crate::snapshot::Snapshot;

/// Largest UDP payload over IPv4
pub const MAX_DATAGRAM_BYTES: usize = 65_507;

/// Sends each snapshot as one compact JSON datagram
pub struct UdpBroadcastSink {
    target: String,
}

impl UdpBroadcastSink {
    /// `target` is `host:port`, e.g. `255.255.255.255:9999`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[async_trait]
impl Sink for UdpBroadcastSink {
    fn name(&self) -> &str {
        "broadcast"
    }

    async fn publish(&self, snapshot: &Snapshot) -> Result<()> {
        let payload = serde_json::to_vec(snapshot)?;
        if payload.len() > MAX_DATAGRAM_BYTES {
            return Err(SinkError::PayloadTooLarge {
                size: payload.len(),
                limit: MAX_DATAGRAM_BYTES,
            });
        }

        let target = tokio::net::lookup_host(&self.target)
            .await
            .map_err(|e| SinkError::InvalidTarget {
                target: self.target.clone(),
                message: e.to_string(),
            })?
            .find(|addr| addr.is_ipv4())
            .ok_or_else(|| SinkError::InvalidTarget {
                target: self.target.clone(),
                message: "no IPv4 address".to_string(),
            })?;

        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.set_broadcast(true)?;
        let sent = socket.send_to(&payload, target).await?;

        debug!(target = %target, bytes = sent, "Snapshot broadcast");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures::{record, snapshot};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_datagram_carries_compact_snapshot() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sink = UdpBroadcastSink::new(receiver.local_addr().unwrap().to_string());

        sink.publish(&snapshot(vec![record("AAPL", Some(1.0), 2.0)])).await.unwrap();

        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        let text = std::str::from_utf8(&buf[..len]).unwrap();
        assert!(!text.contains('\n'));
        let parsed: Snapshot = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.records[0].ticker.as_str(), "AAPL");
    }

    #[tokio::test]
    async fn test_unresolvable_target() {
        let sink = UdpBroadcastSink::new("not-a-target");
        assert_matches!(
            sink.publish(&snapshot(Vec::new())).await,
            Err(SinkError::InvalidTarget { .. })
        );
    }
}
